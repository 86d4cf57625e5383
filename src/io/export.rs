//! Persist designed primers as CSV or JSON.
//!
//! Both formats share one row shape (`PrimerRow`) so the column order and the
//! rounding rules are defined exactly once. Rounding happens here and nowhere
//! else; `PrimerResult` keeps full precision.
//!
//! Two ways in:
//! - `write_results`: a whole batch at once
//! - `ResultSink` implementations: one result at a time, for streaming runs

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::ConfigBundle;
use crate::domain::{OutputFormat, PrimerResult};
use crate::error::OutputError;

/// One output row, in output column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimerRow<'a> {
    pub sequence_id: &'a str,
    pub forward_primer: &'a str,
    pub reverse_primer: &'a str,
    pub tm_forward: f64,
    pub tm_reverse: f64,
    pub gc_forward: f64,
    pub gc_reverse: f64,
    pub length_forward: u32,
    pub length_reverse: u32,
    pub product_size: u32,
    pub forward_start: u32,
    pub reverse_start: u32,
    pub penalty_forward: f64,
    pub penalty_reverse: f64,
}

impl PrimerRow<'_> {
    pub const HEADER: [&'static str; 14] = [
        "sequence_id",
        "forward_primer",
        "reverse_primer",
        "tm_forward",
        "tm_reverse",
        "gc_forward",
        "gc_reverse",
        "length_forward",
        "length_reverse",
        "product_size",
        "forward_start",
        "reverse_start",
        "penalty_forward",
        "penalty_reverse",
    ];
}

impl<'a> From<&'a PrimerResult> for PrimerRow<'a> {
    fn from(r: &'a PrimerResult) -> Self {
        PrimerRow {
            sequence_id: r.sequence_id(),
            forward_primer: r.forward_primer(),
            reverse_primer: r.reverse_primer(),
            tm_forward: round_to(r.tm_forward(), 2),
            tm_reverse: round_to(r.tm_reverse(), 2),
            gc_forward: round_to(r.gc_forward(), 2),
            gc_reverse: round_to(r.gc_reverse(), 2),
            length_forward: r.length_forward(),
            length_reverse: r.length_reverse(),
            product_size: r.product_size(),
            forward_start: r.forward_start(),
            reverse_start: r.reverse_start(),
            penalty_forward: round_to(r.penalty_forward(), 3),
            penalty_reverse: round_to(r.penalty_reverse(), 3),
        }
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[derive(Debug, Serialize)]
struct JsonMetadata {
    total_primers: usize,
    config_summary: std::collections::BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
struct JsonEnvelope<'a> {
    metadata: JsonMetadata,
    primers: Vec<PrimerRow<'a>>,
}

/// Write a whole batch of results to `path`.
pub fn write_results(
    results: &[PrimerResult],
    path: &Path,
    format: OutputFormat,
    config: &ConfigBundle,
) -> Result<(), OutputError> {
    ensure_parent(path)?;
    match format {
        OutputFormat::Csv => write_csv(results, path)?,
        OutputFormat::Json => write_json(results, path, config)?,
    }
    info!(
        path = %path.display(),
        primers = results.len(),
        format = format.extension(),
        "results written"
    );
    Ok(())
}

fn write_csv(results: &[PrimerResult], path: &Path) -> Result<(), OutputError> {
    let mut writer = csv_writer(path)?;
    let csv_err = |source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    writer.write_record(PrimerRow::HEADER).map_err(csv_err)?;
    for r in results {
        writer.serialize(PrimerRow::from(r)).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| io_err(path, source))
}

fn write_json(
    results: &[PrimerResult],
    path: &Path,
    config: &ConfigBundle,
) -> Result<(), OutputError> {
    let envelope = JsonEnvelope {
        metadata: JsonMetadata {
            total_primers: results.len(),
            config_summary: config.config_summary(),
        },
        primers: results.iter().map(PrimerRow::from).collect(),
    };

    let mut tmp = temp_beside(path)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut w, &envelope).map_err(|source| OutputError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        w.write_all(b"\n").map_err(|source| io_err(path, source))?;
        w.flush().map_err(|source| io_err(path, source))?;
    }
    tmp.persist(path).map_err(|e| io_err(path, e.error))?;
    Ok(())
}

/// `<dir>/<input stem>.primers.<ext>`.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}.primers.{}", format.extension()))
}

/// Warn (but continue) when a user-chosen path disagrees with the format.
pub fn check_output_extension(path: &Path, format: OutputFormat) -> bool {
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(format.extension()));
    if !matches {
        warn!(
            path = %path.display(),
            format = format.extension(),
            "output file extension does not match the output format"
        );
    }
    matches
}

fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|source| io_err(dir, source))
        }
        _ => Ok(()),
    }
}

fn temp_beside(path: &Path) -> Result<NamedTempFile, OutputError> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir).map_err(|source| io_err(path, source))
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, OutputError> {
    let file = File::create(path).map_err(|source| io_err(path, source))?;
    Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
}

fn io_err(path: &Path, source: std::io::Error) -> OutputError {
    OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Destination for results produced one at a time.
pub trait ResultSink {
    fn write(&mut self, result: &PrimerResult) -> Result<(), OutputError>;

    /// Results accepted so far.
    fn written(&self) -> usize;

    /// Finalise the destination. Returns the number of results written.
    fn finish(self) -> Result<usize, OutputError>
    where
        Self: Sized;
}

/// CSV written row by row; each row is flushed before `write` returns.
pub struct CsvStreamSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    header_written: bool,
    written: usize,
}

impl CsvStreamSink {
    pub fn create(path: &Path) -> Result<Self, OutputError> {
        ensure_parent(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: csv_writer(path)?,
            header_written: false,
            written: 0,
        })
    }

    fn csv_err(&self, source: csv::Error) -> OutputError {
        OutputError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn ensure_header(&mut self) -> Result<(), OutputError> {
        if !self.header_written {
            self.writer
                .write_record(PrimerRow::HEADER)
                .map_err(|e| self.csv_err(e))?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl ResultSink for CsvStreamSink {
    fn write(&mut self, result: &PrimerResult) -> Result<(), OutputError> {
        self.ensure_header()?;
        self.writer
            .serialize(PrimerRow::from(result))
            .map_err(|e| self.csv_err(e))?;
        self.writer
            .flush()
            .map_err(|source| io_err(&self.path, source))?;
        self.written += 1;
        Ok(())
    }

    fn written(&self) -> usize {
        self.written
    }

    fn finish(mut self) -> Result<usize, OutputError> {
        self.writer
            .flush()
            .map_err(|source| io_err(&self.path, source))?;
        debug!(path = %self.path.display(), rows = self.written, "CSV stream finished");
        Ok(self.written)
    }
}

/// A JSON array built incrementally in a temp file next to the destination
/// and renamed into place by `finish`. Dropped unfinished, nothing appears at
/// the destination.
pub struct JsonStreamSink {
    path: PathBuf,
    writer: BufWriter<NamedTempFile>,
    written: usize,
}

impl JsonStreamSink {
    pub fn create(path: &Path) -> Result<Self, OutputError> {
        ensure_parent(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(temp_beside(path)?),
            written: 0,
        })
    }
}

impl ResultSink for JsonStreamSink {
    fn write(&mut self, result: &PrimerResult) -> Result<(), OutputError> {
        let sep: &[u8] = if self.written == 0 { b"[\n  " } else { b",\n  " };
        self.writer
            .write_all(sep)
            .map_err(|source| io_err(&self.path, source))?;
        serde_json::to_writer(&mut self.writer, &PrimerRow::from(result)).map_err(|source| {
            OutputError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        self.writer
            .flush()
            .map_err(|source| io_err(&self.path, source))?;
        self.written += 1;
        Ok(())
    }

    fn written(&self) -> usize {
        self.written
    }

    fn finish(mut self) -> Result<usize, OutputError> {
        let tail: &[u8] = if self.written == 0 { b"[]\n" } else { b"\n]\n" };
        self.writer
            .write_all(tail)
            .map_err(|source| io_err(&self.path, source))?;
        let tmp = self
            .writer
            .into_inner()
            .map_err(|e| io_err(&self.path, e.into_error()))?;
        tmp.persist(&self.path)
            .map_err(|e| io_err(&self.path, e.error))?;
        debug!(path = %self.path.display(), items = self.written, "JSON stream finished");
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PrimerResult, sample_draft};

    fn results() -> Vec<PrimerResult> {
        vec![
            PrimerResult::new(sample_draft("seq_a")).unwrap(),
            PrimerResult::new(sample_draft("seq_b")).unwrap(),
        ]
    }

    #[test]
    fn rows_are_rounded_at_serialization() {
        let r = PrimerResult::new(sample_draft("s")).unwrap();
        let row = PrimerRow::from(&r);
        assert_eq!(row.tm_forward, 59.88);
        assert_eq!(row.tm_reverse, 60.41);
        assert_eq!(row.penalty_forward, 0.123);
        assert_eq!(row.penalty_reverse, 0.413);
        // The result itself keeps full precision.
        assert_eq!(r.tm_forward(), 59.87654);
    }

    #[test]
    fn csv_has_fixed_columns_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        write_results(&results(), &path, OutputFormat::Csv, &ConfigBundle::DEFAULT).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), PrimerRow::HEADER.join(","));
        let first: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(first[0], "seq_a");
        assert_eq!(first[3], "59.88");
        assert_eq!(first.len(), 14);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn empty_csv_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_results(&[], &path, OutputFormat::Csv, &ConfigBundle::DEFAULT).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), PrimerRow::HEADER.join(","));
    }

    #[test]
    fn json_has_metadata_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_results(&results(), &path, OutputFormat::Json, &ConfigBundle::DEFAULT).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["total_primers"], 2);
        assert_eq!(value["metadata"]["config_summary"]["optimal_size"], "20 bp");
        assert_eq!(value["primers"].as_array().unwrap().len(), 2);
        assert_eq!(value["primers"][1]["sequence_id"], "seq_b");
        assert_eq!(value["primers"][0]["gc_reverse"], 50.0);
        // No stray temp files are left next to the output.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn default_path_and_extension_check() {
        let p = default_output_path(Path::new("/data/run1/genes.fasta"), OutputFormat::Json);
        assert_eq!(p, PathBuf::from("/data/run1/genes.primers.json"));
        assert!(check_output_extension(Path::new("x.CSV"), OutputFormat::Csv));
        assert!(!check_output_extension(Path::new("x.txt"), OutputFormat::Json));
    }

    #[test]
    fn csv_stream_is_readable_mid_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.csv");
        let mut sink = CsvStreamSink::create(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        let rs = results();
        sink.write(&rs[0]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
        assert_eq!(sink.written(), 1);
        sink.write(&rs[1]).unwrap();
        assert_eq!(sink.finish().unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);

        let empty = dir.path().join("empty.csv");
        assert_eq!(CsvStreamSink::create(&empty).unwrap().finish().unwrap(), 0);
        // No successes, no header.
        assert_eq!(fs::read_to_string(&empty).unwrap(), "");
    }

    #[test]
    fn json_stream_is_a_valid_array_once_finished() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.json");
        let mut sink = JsonStreamSink::create(&path).unwrap();
        for r in &results() {
            sink.write(r).unwrap();
        }
        assert_eq!(sink.written(), 2);
        assert!(!path.exists());
        sink.finish().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn json_stream_edge_cases() {
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.json");
        JsonStreamSink::create(&empty).unwrap().finish().unwrap();
        assert_eq!(fs::read_to_string(&empty).unwrap().trim(), "[]");

        let abandoned = dir.path().join("abandoned.json");
        {
            let mut sink = JsonStreamSink::create(&abandoned).unwrap();
            sink.write(&results()[0]).unwrap();
        }
        assert!(!abandoned.exists());
        // Only the finished file remains; the abandoned temp file is gone.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
