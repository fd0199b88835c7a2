//! `brent-cp` library crate.
//!
//! The binary (`brent-cp`) is a thin wrapper around this library so that:
//!
//! - the change-point model and reports are testable without spawning processes
//! - downstream services can load the exported tables through the same types

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod impact;
pub mod io;
pub mod logging;
pub mod math;
pub mod model;
pub mod preprocess;
pub mod report;
