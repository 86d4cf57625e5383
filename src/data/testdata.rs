//! Random test FASTA generation.
//!
//! Each sequence gets a length drawn from `[min_length, max_length]` and a
//! target GC fraction drawn from `[gc_min, gc_max]`. The base composition is
//! exact for that target; only the order is random.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::info;

use crate::error::AppError;

/// FASTA line width for generated files.
pub const LINE_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct TestDataSpec {
    pub count: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// GC fraction in `[0, 1]`.
    pub gc_min: f64,
    pub gc_max: f64,
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TestDataSpec {
    fn default() -> Self {
        Self {
            count: 10,
            min_length: 200,
            max_length: 2000,
            gc_min: 0.3,
            gc_max: 0.7,
            seed: None,
        }
    }
}

impl TestDataSpec {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.count == 0 {
            return Err(AppError::new(2, "Sequence count must be > 0."));
        }
        if self.min_length == 0 || self.max_length < self.min_length {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid length range {}-{}: need 0 < min <= max.",
                    self.min_length, self.max_length
                ),
            ));
        }
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !(in_unit(self.gc_min) && in_unit(self.gc_max) && self.gc_min <= self.gc_max) {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid GC range {}-{}: need 0 <= min <= max <= 1.",
                    self.gc_min, self.gc_max
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestSequence {
    pub id: String,
    /// Target GC fraction the sequence was built for.
    pub gc: f64,
    pub sequence: String,
}

impl TestSequence {
    pub fn header(&self) -> String {
        format!(
            ">{} length={} gc={:.2}",
            self.id,
            self.sequence.len(),
            self.gc
        )
    }
}

/// A shuffled sequence with exactly `floor(length * gc)` G/C bases.
pub fn random_dna<R: Rng + ?Sized>(rng: &mut R, length: usize, gc: f64) -> String {
    let gc_count = ((length as f64 * gc).floor() as usize).min(length);
    let at_count = length - gc_count;

    let mut bases = Vec::with_capacity(length);
    bases.extend(std::iter::repeat_n(b'G', gc_count - gc_count / 2));
    bases.extend(std::iter::repeat_n(b'C', gc_count / 2));
    bases.extend(std::iter::repeat_n(b'A', at_count - at_count / 2));
    bases.extend(std::iter::repeat_n(b'T', at_count / 2));
    bases.shuffle(rng);

    bases.into_iter().map(char::from).collect()
}

pub fn generate_sequences(spec: &TestDataSpec) -> Result<Vec<TestSequence>, AppError> {
    spec.validate()?;

    let mut rng = match spec.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let sequences = (1..=spec.count)
        .map(|i| {
            let length = rng.gen_range(spec.min_length..=spec.max_length);
            let gc = rng.gen_range(spec.gc_min..=spec.gc_max);
            TestSequence {
                id: format!("test_seq_{i:03}"),
                gc,
                sequence: random_dna(&mut rng, length, gc),
            }
        })
        .collect();
    Ok(sequences)
}

/// Generate sequences and write them as FASTA. Returns the number written.
pub fn write_test_fasta(path: &Path, spec: &TestDataSpec) -> Result<usize, AppError> {
    let sequences = generate_sequences(spec)?;

    let io_err = |e: std::io::Error| {
        AppError::new(4, format!("Failed to write test data to {}: {e}", path.display()))
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }

    let mut w = BufWriter::new(File::create(path).map_err(io_err)?);
    for s in &sequences {
        writeln!(w, "{}", s.header()).map_err(io_err)?;
        for line in s.sequence.as_bytes().chunks(LINE_WIDTH) {
            w.write_all(line).map_err(io_err)?;
            w.write_all(b"\n").map_err(io_err)?;
        }
    }
    w.flush().map_err(io_err)?;

    info!(
        path = %path.display(),
        count = sequences.len(),
        seed = ?spec.seed,
        "test FASTA written"
    );
    Ok(sequences.len())
}
