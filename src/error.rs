//! Error taxonomy shared by every component.
//!
//! Each variant maps to a process exit code so `main` can stay a thin wrapper:
//!
//! - `Io` (2): a file could not be opened, created or written
//! - `Validation` (3): input data or configuration violates a modelling precondition
//! - `Inference` (4): the sampler broke down numerically

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Inference error in chain {chain}: {source}")]
    Inference {
        chain: usize,
        #[source]
        source: SamplerFault,
    },

    #[error("I/O error on '{}': {context}: {source}", path.display())]
    Io {
        path: PathBuf,
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Underlying cause of a sampler failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplerFault {
    #[error("non-finite {parameter} at iteration {iteration}")]
    NonFinite {
        parameter: &'static str,
        iteration: usize,
    },

    #[error("change-point weights collapsed at iteration {iteration} (no finite mass over {n} positions)")]
    DegenerateSwitchWeights { iteration: usize, n: usize },

    #[error("invalid {parameter} distribution at iteration {iteration}: {message}")]
    Distribution {
        parameter: &'static str,
        iteration: usize,
        message: String,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn io(path: &Path, context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            context: context.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Io { .. } => 2,
            AppError::Validation(_) => 3,
            AppError::Inference { .. } => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn inference_error_keeps_sampler_cause() {
        let err = AppError::Inference {
            chain: 1,
            source: SamplerFault::NonFinite {
                parameter: "sigma",
                iteration: 17,
            },
        };
        assert_eq!(err.exit_code(), 4);
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains("sigma"), "{cause}");
        assert!(cause.contains("17"), "{cause}");
    }

    #[test]
    fn io_error_names_the_path() {
        let err = AppError::io(
            Path::new("out/report.csv"),
            "Failed to create report CSV",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("out/report.csv"));
    }
}
