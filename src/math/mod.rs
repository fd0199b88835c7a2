//! Numerical helpers shared by the sampler, report builder and impact analyzer.

pub mod stats;

pub use stats::*;
