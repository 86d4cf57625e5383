//! `primer-batch` library crate.
//!
//! The binary (`primer-designer`) is a thin wrapper around this library so that:
//!
//! - the batch pipeline is testable without spawning processes
//! - other front-ends can drive it with their own `PrimerDesignEngine`
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod batch;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
