//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - validated input sequences (`SequenceRecord`)
//! - designed primer pairs (`PrimerResult`) and batch outputs (`BatchResult`)
//! - run options (`ScheduleMode`, `OutputFormat`)

pub mod types;

pub use types::*;
