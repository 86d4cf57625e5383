//! Error types.
//!
//! `AppError` is what the binary sees: a message plus a process exit code.
//! Everything below it uses typed `thiserror` enums so library callers can
//! match on the failure instead of parsing strings.
//!
//! Exit codes:
//! - `1` generic / CLI misuse
//! - `2` input or configuration problem
//! - `3` no usable data
//! - `4` runtime or output failure

use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Invalid design parameter bundle. Always fatal to a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", join_violations(.0))]
    Invalid(Vec<FieldViolation>),
}

impl ConfigError {
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            ConfigError::Invalid(v) => v,
        }
    }

    /// Whether any violation names `field`.
    pub fn names_field(&self, field: &str) -> bool {
        self.violations().iter().any(|v| v.field == field)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Loading or saving a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("failed to access configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in configuration file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration data in {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Why a raw sequence was skipped. Reportable, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceRejection {
    #[error("sequence identifier is empty")]
    EmptyId,

    #[error("sequence too short: {length} bp (minimum: {min_length} bp)")]
    TooShort { length: usize, min_length: usize },

    #[error("invalid DNA bases found: {}", .symbols.iter().collect::<String>())]
    InvalidBases { symbols: Vec<char> },
}

/// Failure inside, or at the boundary of, the primer design engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("sequence too short for primer design: {length} bp (minimum: {min_length} bp)")]
    SequenceTooShort { length: usize, min_length: usize },

    #[error("requested pair count {0} is outside 1..=5")]
    InvalidPairCount(usize),

    #[error("engine parameter `{0}` is missing or has the wrong type")]
    MissingParam(&'static str),

    #[error("engine failure: {0}")]
    Failed(String),

    #[error("engine panicked: {0}")]
    Panicked(String),
}

/// A candidate pair that does not satisfy the result invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResultError {
    #[error("{field}: invalid DNA bases in primer: {symbols}")]
    InvalidBases { field: &'static str, symbols: String },

    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Reading a sequence source.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("FASTA file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read FASTA file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no valid DNA sequences found in {}", .0.display())]
    NoValidSequences(PathBuf),
}

/// Writing persisted results.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("unsupported output format '{0}' (expected 'csv' or 'json')")]
    UnsupportedFormat(String),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write JSON {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Statistics over an empty batch are undefined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("cannot summarize an empty batch")]
    EmptyBatch,
}

/// Fatal batch-level failures (per-item problems never surface here).
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to build worker pool: {0}")]
    Pool(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(2, e.to_string())
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::new(2, e.to_string())
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        let code = match e {
            EngineError::InvalidPairCount(_) | EngineError::MissingParam(_) => 2,
            _ => 4,
        };
        AppError::new(code, e.to_string())
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        let code = match e {
            IngestError::NoValidSequences(_) => 3,
            _ => 2,
        };
        AppError::new(code, e.to_string())
    }
}

impl From<OutputError> for AppError {
    fn from(e: OutputError) -> Self {
        let code = match e {
            OutputError::UnsupportedFormat(_) => 2,
            _ => 4,
        };
        AppError::new(code, e.to_string())
    }
}

impl From<BatchError> for AppError {
    fn from(e: BatchError) -> Self {
        match e {
            BatchError::Ingest(e) => e.into(),
            BatchError::Output(e) => e.into(),
            other => AppError::new(4, other.to_string()),
        }
    }
}
