//! Sequence ingest and validation.
//!
//! This module is responsible for turning raw `(id, sequence, description)`
//! triples into `SequenceRecord`s that are safe to hand to the engine.
//!
//! Design goals:
//! - **Record-level validation** (skip bad records, but report what happened)
//! - **Lazy reading** so the streaming pipeline never loads a whole file
//! - **Separation of concerns**: FASTA syntax is `bio`'s job, not ours

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bio::io::fasta;
use tracing::{debug, info, warn};

use crate::domain::{SequenceRecord, is_dna_symbol};
use crate::error::{IngestError, SequenceRejection};

/// Minimum sequence length accepted by default.
pub const DEFAULT_MIN_LENGTH: usize = 50;

/// An already-tokenized record from a sequence source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSequence {
    pub id: String,
    pub sequence: String,
    pub description: Option<String>,
}

/// Validate one raw record.
///
/// The stored sequence is upper-cased with all whitespace removed, and the
/// length is recomputed from it.
pub fn validate_sequence(
    raw_id: &str,
    raw_sequence: &str,
    raw_description: Option<&str>,
    min_length: usize,
) -> Result<SequenceRecord, SequenceRejection> {
    let id = raw_id.trim();
    if id.is_empty() {
        return Err(SequenceRejection::EmptyId);
    }

    let sequence: String = raw_sequence
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let length = sequence.chars().count();
    if length < min_length {
        return Err(SequenceRejection::TooShort { length, min_length });
    }

    let mut invalid: Vec<char> = sequence.chars().filter(|c| !is_dna_symbol(*c)).collect();
    if !invalid.is_empty() {
        invalid.sort_unstable();
        invalid.dedup();
        return Err(SequenceRejection::InvalidBases { symbols: invalid });
    }

    let description = raw_description
        .map(str::trim)
        .filter(|d| !d.is_empty() && *d != id)
        .map(str::to_string);

    Ok(SequenceRecord::new_unchecked(
        id.to_string(),
        sequence,
        description,
    ))
}

impl RawSequence {
    pub fn validate(&self, min_length: usize) -> Result<SequenceRecord, SequenceRejection> {
        validate_sequence(
            &self.id,
            &self.sequence,
            self.description.as_deref(),
            min_length,
        )
    }
}

/// Lazy FASTA reader. Finite; restart by opening the file again.
pub struct FastaSource {
    path: PathBuf,
    records: fasta::Records<BufReader<File>>,
}

impl FastaSource {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        if !path.exists() {
            return Err(IngestError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened FASTA source");
        Ok(Self {
            path: path.to_path_buf(),
            records: fasta::Reader::new(file).records(),
        })
    }
}

impl Iterator for FastaSource {
    type Item = Result<RawSequence, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map(|r| RawSequence {
                    id: r.id().to_string(),
                    sequence: String::from_utf8_lossy(r.seq()).into_owned(),
                    description: r.desc().map(str::to_string),
                })
                .map_err(|source| IngestError::Io {
                    path: self.path.clone(),
                    source,
                }),
        )
    }
}

/// A skipped record and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub id: String,
    pub reason: SequenceRejection,
}

/// Eager ingest output: valid records plus everything that was skipped.
#[derive(Debug, Clone)]
pub struct LoadedSequences {
    pub records: Vec<SequenceRecord>,
    pub rejected: Vec<Rejected>,
}

/// Validate every record from `source`, keeping the valid ones.
pub fn collect_sequences<I>(source: I, min_length: usize) -> Result<LoadedSequences, IngestError>
where
    I: IntoIterator<Item = Result<RawSequence, IngestError>>,
{
    let mut records = Vec::new();
    let mut rejected = Vec::new();
    for raw in source {
        let raw = raw?;
        match raw.validate(min_length) {
            Ok(rec) => {
                debug!(id = rec.id(), length = rec.len(), "accepted sequence");
                records.push(rec);
            }
            Err(reason) => {
                warn!(id = %raw.id, %reason, "skipping invalid sequence");
                rejected.push(Rejected { id: raw.id, reason });
            }
        }
    }
    Ok(LoadedSequences { records, rejected })
}

/// Read a whole FASTA file. Fails when nothing valid remains.
pub fn load_sequences(path: &Path, min_length: usize) -> Result<LoadedSequences, IngestError> {
    info!(path = %path.display(), "reading FASTA file");
    let loaded = collect_sequences(FastaSource::open(path)?, min_length)?;
    if loaded.records.is_empty() {
        return Err(IngestError::NoValidSequences(path.to_path_buf()));
    }
    info!(
        valid = loaded.records.len(),
        skipped = loaded.rejected.len(),
        "loaded sequences"
    );
    Ok(loaded)
}

/// Length statistics over every record in a file (valid or not).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

/// Result of checking a FASTA file for design compatibility.
#[derive(Debug, Clone)]
pub struct FastaReport {
    pub path: PathBuf,
    pub total: usize,
    pub valid: usize,
    pub rejected: Vec<Rejected>,
    pub duplicate_ids: Vec<String>,
    pub lengths: Option<LengthStats>,
}

impl FastaReport {
    pub fn invalid(&self) -> usize {
        self.rejected.len()
    }

    pub fn is_usable(&self) -> bool {
        self.valid > 0
    }
}

/// Scan a FASTA file without keeping sequences in memory.
pub fn validate_fasta(path: &Path, min_length: usize) -> Result<FastaReport, IngestError> {
    let mut total = 0usize;
    let mut valid = 0usize;
    let mut rejected = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicate_ids = Vec::new();
    let (mut len_min, mut len_max, mut len_sum) = (usize::MAX, 0usize, 0usize);

    for raw in FastaSource::open(path)? {
        let raw = raw?;
        total += 1;

        let raw_len = raw.sequence.chars().filter(|c| !c.is_whitespace()).count();
        len_min = len_min.min(raw_len);
        len_max = len_max.max(raw_len);
        len_sum += raw_len;

        if !seen.insert(raw.id.clone()) && !duplicate_ids.contains(&raw.id) {
            duplicate_ids.push(raw.id.clone());
        }

        match raw.validate(min_length) {
            Ok(_) => valid += 1,
            Err(reason) => rejected.push(Rejected { id: raw.id, reason }),
        }
    }

    let lengths = (total > 0).then(|| LengthStats {
        min: len_min,
        max: len_max,
        mean: len_sum as f64 / total as f64,
    });

    if !duplicate_ids.is_empty() {
        warn!(count = duplicate_ids.len(), "duplicate sequence identifiers");
    }

    Ok(FastaReport {
        path: path.to_path_buf(),
        total,
        valid,
        rejected,
        duplicate_ids,
        lengths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DNA_ALPHABET;
    use proptest::prelude::*;
    use std::io::Write;

    fn write_fasta(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn accepts_and_normalizes() {
        let raw = format!("{}\n{}", "acgt".repeat(10), "ACGN ".repeat(5));
        let rec = validate_sequence(" seq1 ", &raw, Some("a description"), 50).unwrap();
        assert_eq!(rec.id(), "seq1");
        assert_eq!(rec.len(), 60);
        assert_eq!(rec.sequence().len(), rec.len());
        assert!(rec.sequence().chars().all(|c| c.is_ascii_uppercase()));
        assert_eq!(rec.description(), Some("a description"));
    }

    #[test]
    fn rejects_short_sequences() {
        let err = validate_sequence("s", &"A".repeat(49), None, 50).unwrap_err();
        assert_eq!(
            err,
            SequenceRejection::TooShort {
                length: 49,
                min_length: 50
            }
        );
        assert!(validate_sequence("s", &"A".repeat(50), None, 50).is_ok());
    }

    #[test]
    fn rejects_invalid_symbols() {
        let seq = format!("{}XZX", "A".repeat(60));
        let err = validate_sequence("s", &seq, None, 50).unwrap_err();
        assert_eq!(
            err,
            SequenceRejection::InvalidBases {
                symbols: vec!['X', 'Z']
            }
        );
    }

    #[test]
    fn rejects_empty_id_and_drops_echoed_description() {
        let seq = "A".repeat(60);
        assert_eq!(
            validate_sequence("  ", &seq, None, 50).unwrap_err(),
            SequenceRejection::EmptyId
        );
        let rec = validate_sequence("s1", &seq, Some("s1"), 50).unwrap();
        assert_eq!(rec.description(), None);
    }

    #[test]
    fn reads_fasta_lazily_and_reports() {
        let long = "ACGT".repeat(30);
        let contents = format!(
            ">a first\n{long}\n>b\n{}\n>c\nACGT\n>a dup\n{long}\n",
            "ACGTX".repeat(30)
        );
        let f = write_fasta(&contents);

        let mut source = FastaSource::open(f.path()).unwrap();
        let first = source.next().unwrap().unwrap();
        assert_eq!(first.id, "a");
        assert_eq!(first.description.as_deref(), Some("first"));

        let loaded = load_sequences(f.path(), 50).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.rejected.len(), 2);

        let report = validate_fasta(f.path(), 50).unwrap();
        assert_eq!(report.total, 4);
        assert_eq!(report.valid, 2);
        assert_eq!(report.invalid(), 2);
        assert_eq!(report.duplicate_ids, vec!["a".to_string()]);
        let lengths = report.lengths.unwrap();
        assert_eq!(lengths.min, 4);
        assert_eq!(lengths.max, 150);
    }

    #[test]
    fn missing_file_and_all_invalid() {
        let err = FastaSource::open(Path::new("/definitely/not/here.fa")).err().unwrap();
        assert!(matches!(err, IngestError::NotFound(_)));

        let f = write_fasta(">x\nACGT\n");
        let err = load_sequences(f.path(), 50).unwrap_err();
        assert!(matches!(err, IngestError::NoValidSequences(_)));
    }

    proptest! {
        #[test]
        fn accepted_records_hold_invariants(raw in "[ACGTacgtNnRYryx \n]{0,120}") {
            if let Ok(rec) = validate_sequence("p", &raw, None, 10) {
                prop_assert_eq!(rec.len(), rec.sequence().len());
                prop_assert!(rec.sequence().bytes().all(|b| DNA_ALPHABET.contains(&b)));
                prop_assert!(rec.len() >= 10);
            }
        }
    }
}
