//! Batch execution.
//!
//! - `orchestrator`: runs the engine over a list of sequences and collects a
//!   `BatchResult`
//! - `streaming`: the constant-memory variant that writes each result as soon
//!   as it exists
//!
//! Both share the per-item pipeline in `orchestrator`, so a sequence is
//! handled identically whichever entry point is used.

pub mod orchestrator;
pub mod streaming;

pub use orchestrator::*;
pub use streaming::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Log a progress line every this many completed items.
pub const PROGRESS_INTERVAL: usize = 50;

/// Cooperative cancellation shared between a caller and a running batch.
///
/// Items already handed to the engine finish; items not yet started are
/// recorded as cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
