//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - price / return series points (`PricePoint`, `ReturnPoint`)
//! - posterior draws and their container (`PosteriorSample`, `Posterior`)
//! - derived records (`ChangePointReport`, `ImpactSummary`, `DetectedEvent`)
//! - run configuration (`SamplerConfig`, `DetectConfig`, ...)

pub mod nan_as_null;
pub mod types;

pub use types::*;
