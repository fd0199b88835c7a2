//! Input/output helpers.
//!
//! - CSV ingest + validation for prices and events (`ingest`)
//! - CSV exports with fixed column contracts (`export`)
//! - run JSON read/write (`run_file`)

pub mod export;
pub mod ingest;
pub mod run_file;

pub use export::*;
pub use ingest::*;
pub use run_file::*;
