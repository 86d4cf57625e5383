//! Primer design engine boundary.
//!
//! The orchestrator only sees `PrimerDesignEngine` / `DesignContext`:
//!
//! - `params`: `ConfigBundle` -> engine-native `PRIMER_*` parameters
//! - `thermo`: Tm, GC and self-complementarity helpers
//! - `window`: the built-in exhaustive window-scan engine
//!
//! An engine is shared by every worker; each worker asks it for its own
//! `DesignContext` and reuses that context for every sequence it handles.

pub mod params;
pub mod thermo;
pub mod window;

pub use params::*;
pub use window::*;

use std::fmt;

use crate::domain::{PrimerPairDraft, SequenceRecord};
use crate::error::EngineError;

/// Sequences shorter than this are never handed to an engine.
pub const MIN_DESIGN_LENGTH: usize = 100;

/// Allowed values for the number of pairs requested per sequence.
pub const PAIR_COUNT_RANGE: std::ops::RangeInclusive<usize> = 1..=5;

pub trait PrimerDesignEngine: Sync {
    type Context: DesignContext;

    /// Build per-worker state. Called once per worker, not per sequence.
    fn context(&self, params: &NativeParams) -> Result<Self::Context, EngineError>;
}

pub trait DesignContext {
    /// Up to `num_return` pairs for `record`, best first.
    fn design(
        &mut self,
        record: &SequenceRecord,
        num_return: usize,
    ) -> Result<EngineOutput, EngineError>;
}

/// One pair as the engine reports it.
///
/// Positions are 0-based on the forward strand. `right_position` is the
/// index of the reverse primer's 5' base, so the amplicon spans
/// `left_position..=right_position`.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePair {
    pub left_sequence: String,
    pub right_sequence: String,
    pub left_position: u32,
    pub right_position: u32,
    pub left_tm: f64,
    pub right_tm: f64,
    pub left_penalty: f64,
    pub right_penalty: f64,
    pub product_size: u32,
}

impl CandidatePair {
    /// GC content is always recomputed here, never taken from the engine.
    pub fn into_draft(self, sequence_id: &str) -> PrimerPairDraft {
        let gc = |s: &str| thermo::gc_percent(s.trim().to_ascii_uppercase().as_bytes());
        let gc_forward = gc(&self.left_sequence);
        let gc_reverse = gc(&self.right_sequence);
        PrimerPairDraft {
            sequence_id: sequence_id.to_string(),
            forward_primer: self.left_sequence,
            reverse_primer: self.right_sequence,
            tm_forward: self.left_tm,
            tm_reverse: self.right_tm,
            gc_forward,
            gc_reverse,
            product_size: self.product_size,
            forward_start: self.left_position,
            reverse_start: self.right_position,
            penalty_forward: self.left_penalty,
            penalty_reverse: self.right_penalty,
        }
    }
}

/// Why candidates were discarded, per primer side and for pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineExplain {
    pub left: String,
    pub right: String,
    pub pair: String,
}

impl fmt::Display for EngineExplain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "left: {}; right: {}; pair: {}", self.left, self.right, self.pair)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    pub pairs: Vec<CandidatePair>,
    pub explain: Option<EngineExplain>,
}

/// Boundary checks every caller performs before `DesignContext::design`.
pub fn check_request(record: &SequenceRecord, num_return: usize) -> Result<(), EngineError> {
    if record.len() < MIN_DESIGN_LENGTH {
        return Err(EngineError::SequenceTooShort {
            length: record.len(),
            min_length: MIN_DESIGN_LENGTH,
        });
    }
    if !PAIR_COUNT_RANGE.contains(&num_return) {
        return Err(EngineError::InvalidPairCount(num_return));
    }
    Ok(())
}
