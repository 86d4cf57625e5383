//! Input/output helpers.
//!
//! - FASTA ingest + sequence validation (`ingest`)
//! - configuration file read/write (`config_file`)
//! - result exports (CSV/JSON), batch and streaming (`export`)

pub mod config_file;
pub mod export;
pub mod ingest;

pub use config_file::*;
pub use export::*;
pub use ingest::*;
