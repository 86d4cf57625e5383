//! Shared domain types.
//!
//! These types are intentionally small and serializable so they can be:
//!
//! - passed between the validator, orchestrator and engine
//! - exported to CSV/JSON
//! - summarized for reports

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{OutputError, ResultError};

/// IUPAC DNA alphabet: the four bases plus the eleven ambiguity codes.
pub const DNA_ALPHABET: &[u8; 15] = b"ATGCRYSWKMBDHVN";

/// Bases allowed in a designed primer.
pub const PRIMER_ALPHABET: &[u8; 4] = b"ATGC";

pub fn is_dna_symbol(c: char) -> bool {
    c.is_ascii() && DNA_ALPHABET.contains(&(c as u8))
}

/// A validated input sequence.
///
/// Only `io::ingest::validate_sequence` constructs these, so `length` always
/// equals `sequence.len()` and every symbol is in `DNA_ALPHABET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    id: String,
    sequence: String,
    description: Option<String>,
    length: usize,
}

impl SequenceRecord {
    pub(crate) fn new_unchecked(id: String, sequence: String, description: Option<String>) -> Self {
        let length = sequence.len();
        Self {
            id,
            sequence,
            description,
            length,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Engine-side values for one pair, before validation into a `PrimerResult`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimerPairDraft {
    pub sequence_id: String,
    pub forward_primer: String,
    pub reverse_primer: String,
    pub tm_forward: f64,
    pub tm_reverse: f64,
    pub gc_forward: f64,
    pub gc_reverse: f64,
    pub product_size: u32,
    pub forward_start: u32,
    pub reverse_start: u32,
    pub penalty_forward: f64,
    pub penalty_reverse: f64,
}

/// One designed primer pair for one template sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimerResult {
    sequence_id: String,
    forward_primer: String,
    reverse_primer: String,
    tm_forward: f64,
    tm_reverse: f64,
    gc_forward: f64,
    gc_reverse: f64,
    length_forward: u32,
    length_reverse: u32,
    product_size: u32,
    forward_start: u32,
    reverse_start: u32,
    penalty_forward: f64,
    penalty_reverse: f64,
}

pub const PRIMER_LENGTH_RANGE: (u32, u32) = (15, 50);
pub const PRIMER_TM_RANGE: (f64, f64) = (40.0, 80.0);
pub const MIN_PRODUCT_SIZE: u32 = 50;

impl PrimerResult {
    pub fn new(draft: PrimerPairDraft) -> Result<Self, ResultError> {
        let forward_primer = normalize_primer("forward_primer", &draft.forward_primer)?;
        let reverse_primer = normalize_primer("reverse_primer", &draft.reverse_primer)?;

        let length_forward = forward_primer.len() as u32;
        let length_reverse = reverse_primer.len() as u32;
        let (len_lo, len_hi) = PRIMER_LENGTH_RANGE;
        check_range("length_forward", length_forward as f64, len_lo as f64, len_hi as f64)?;
        check_range("length_reverse", length_reverse as f64, len_lo as f64, len_hi as f64)?;

        let (tm_lo, tm_hi) = PRIMER_TM_RANGE;
        check_range("tm_forward", draft.tm_forward, tm_lo, tm_hi)?;
        check_range("tm_reverse", draft.tm_reverse, tm_lo, tm_hi)?;
        check_range("gc_forward", draft.gc_forward, 0.0, 100.0)?;
        check_range("gc_reverse", draft.gc_reverse, 0.0, 100.0)?;
        check_range(
            "product_size",
            draft.product_size as f64,
            MIN_PRODUCT_SIZE as f64,
            f64::MAX,
        )?;
        check_range("penalty_forward", draft.penalty_forward, 0.0, f64::MAX)?;
        check_range("penalty_reverse", draft.penalty_reverse, 0.0, f64::MAX)?;

        Ok(Self {
            sequence_id: draft.sequence_id,
            forward_primer,
            reverse_primer,
            tm_forward: draft.tm_forward,
            tm_reverse: draft.tm_reverse,
            gc_forward: draft.gc_forward,
            gc_reverse: draft.gc_reverse,
            length_forward,
            length_reverse,
            product_size: draft.product_size,
            forward_start: draft.forward_start,
            reverse_start: draft.reverse_start,
            penalty_forward: draft.penalty_forward,
            penalty_reverse: draft.penalty_reverse,
        })
    }

    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }
    pub fn forward_primer(&self) -> &str {
        &self.forward_primer
    }
    pub fn reverse_primer(&self) -> &str {
        &self.reverse_primer
    }
    pub fn tm_forward(&self) -> f64 {
        self.tm_forward
    }
    pub fn tm_reverse(&self) -> f64 {
        self.tm_reverse
    }
    pub fn gc_forward(&self) -> f64 {
        self.gc_forward
    }
    pub fn gc_reverse(&self) -> f64 {
        self.gc_reverse
    }
    pub fn length_forward(&self) -> u32 {
        self.length_forward
    }
    pub fn length_reverse(&self) -> u32 {
        self.length_reverse
    }
    pub fn product_size(&self) -> u32 {
        self.product_size
    }
    pub fn forward_start(&self) -> u32 {
        self.forward_start
    }
    pub fn reverse_start(&self) -> u32 {
        self.reverse_start
    }
    pub fn penalty_forward(&self) -> f64 {
        self.penalty_forward
    }
    pub fn penalty_reverse(&self) -> f64 {
        self.penalty_reverse
    }

    pub fn tm_difference(&self) -> f64 {
        (self.tm_forward - self.tm_reverse).abs()
    }

    pub fn average_tm(&self) -> f64 {
        (self.tm_forward + self.tm_reverse) / 2.0
    }

    pub fn gc_difference(&self) -> f64 {
        (self.gc_forward - self.gc_reverse).abs()
    }

    pub fn total_penalty(&self) -> f64 {
        self.penalty_forward + self.penalty_reverse
    }
}

fn normalize_primer(field: &'static str, raw: &str) -> Result<String, ResultError> {
    let seq = raw.trim().to_ascii_uppercase();
    let mut bad: Vec<char> = seq
        .chars()
        .filter(|c| !c.is_ascii() || !PRIMER_ALPHABET.contains(&(*c as u8)))
        .collect();
    if bad.is_empty() {
        return Ok(seq);
    }
    bad.sort_unstable();
    bad.dedup();
    Err(ResultError::InvalidBases {
        field,
        symbols: bad.into_iter().collect(),
    })
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ResultError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ResultError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Why an item produced no results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected before the engine was called.
    Rejected,
    /// The engine ran but returned zero pairs.
    NoPrimers,
    /// The engine returned an error or panicked.
    EngineFault,
    /// Every returned pair violated a result invariant.
    InvalidResult,
    /// Not started because the batch was cancelled.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub sequence_id: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Output of a batch run.
///
/// `attempted` counts items handed to the per-item pipeline (cancelled items
/// are excluded); `succeeded` counts items with at least one result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub results: Vec<PrimerResult>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchResult {
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.attempted as f64
        }
    }

    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}

/// How the orchestrator schedules engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// One at a time, in input order.
    Sequential,
    /// A fixed-size worker pool; `None` uses one worker per CPU.
    Parallel { workers: Option<usize> },
}

/// Persisted result format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(OutputError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_draft(id: &str) -> PrimerPairDraft {
    PrimerPairDraft {
        sequence_id: id.to_string(),
        forward_primer: "ATGCGTACGTTAGCTAGCTA".to_string(),
        reverse_primer: "TTGACCGATGCATCGGATCA".to_string(),
        tm_forward: 59.87654,
        tm_reverse: 60.41234,
        gc_forward: 45.0,
        gc_reverse: 50.0,
        product_size: 240,
        forward_start: 12,
        reverse_start: 251,
        penalty_forward: 0.12345,
        penalty_reverse: 0.41299,
    }
}
