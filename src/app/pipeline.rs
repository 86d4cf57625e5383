//! Shared "design pipeline" logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! FASTA check -> configuration -> batch or streaming design -> output file
//!
//! `app` then only decides what to print.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::batch::{BatchOrchestrator, StreamSummary, StreamingPipeline};
use crate::config::{ConfigBundle, Preset};
use crate::domain::{ItemFailure, OutputFormat, ScheduleMode};
use crate::engine::{PrimerDesignEngine, WindowScanEngine};
use crate::error::AppError;
use crate::io::config_file::load_config_file;
use crate::io::export::{
    CsvStreamSink, JsonStreamSink, ResultSink, check_output_extension, default_output_path,
    write_results,
};
use crate::io::ingest::{
    DEFAULT_MIN_LENGTH, FastaReport, FastaSource, load_sequences, validate_fasta,
};
use crate::report::{BatchStats, summarize};

/// Where the design parameters come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Preset(Preset),
    File(PathBuf),
}

impl ConfigSource {
    /// The bundle plus a display name.
    pub fn resolve(&self) -> Result<(String, ConfigBundle), AppError> {
        match self {
            ConfigSource::Preset(p) => Ok((p.name().to_string(), *p.bundle())),
            ConfigSource::File(path) => {
                let config = load_config_file(path)?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                Ok((format!("custom ({name})"), config))
            }
        }
    }
}

/// Everything one `design` run needs.
#[derive(Debug, Clone)]
pub struct DesignRequest {
    pub input: PathBuf,
    /// `None` writes next to the input.
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub config: ConfigSource,
    pub schedule: ScheduleMode,
    pub streaming: bool,
    pub pairs_per_sequence: usize,
    pub min_length: usize,
}

impl DesignRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            format: OutputFormat::Csv,
            config: ConfigSource::Preset(Preset::Standard),
            schedule: ScheduleMode::Parallel { workers: None },
            streaming: false,
            pairs_per_sequence: 1,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input, self.format))
    }
}

/// All computed outputs of a single `design` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub fasta: FastaReport,
    pub config_name: String,
    pub config: ConfigBundle,
    pub output_path: PathBuf,
    pub attempted: usize,
    pub succeeded: usize,
    pub results_written: usize,
    pub failures: Vec<ItemFailure>,
    /// Only in batch mode and only when something was designed.
    pub stats: Option<BatchStats>,
}

/// Check the FASTA file. Zero valid sequences is a "no data" error.
pub fn check_fasta(path: &Path, min_length: usize) -> Result<FastaReport, AppError> {
    let report = validate_fasta(path, min_length)?;
    if !report.is_usable() {
        return Err(AppError::new(
            3,
            format!("No valid DNA sequences found in {}", path.display()),
        ));
    }
    Ok(report)
}

/// Execute the full design pipeline with the built-in engine.
pub fn run_design(request: &DesignRequest) -> Result<RunOutput, AppError> {
    run_design_with(WindowScanEngine, request)
}

/// Execute the design pipeline with a caller-supplied engine.
pub fn run_design_with<E: PrimerDesignEngine>(
    engine: E,
    request: &DesignRequest,
) -> Result<RunOutput, AppError> {
    // 1) Check the input before doing any work.
    let fasta = check_fasta(&request.input, request.min_length)?;

    // 2) Resolve parameters.
    let (config_name, config) = request.config.resolve()?;

    // 3) Decide where results go.
    let output_path = request.output_path();
    if request.output.is_some() {
        check_output_extension(&output_path, request.format);
    }
    info!(
        input = %request.input.display(),
        output = %output_path.display(),
        config = %config_name,
        streaming = request.streaming,
        "design run configured"
    );

    // 4) Design and write.
    if request.streaming {
        let pipeline = StreamingPipeline::new(engine, config)
            .pairs_per_sequence(request.pairs_per_sequence)?
            .min_length(request.min_length);
        let source = FastaSource::open(&request.input)?;
        let summary = match request.format {
            OutputFormat::Csv => {
                stream_into(&pipeline, source, CsvStreamSink::create(&output_path)?)?
            }
            OutputFormat::Json => {
                stream_into(&pipeline, source, JsonStreamSink::create(&output_path)?)?
            }
        };
        return Ok(RunOutput {
            fasta,
            config_name,
            config,
            output_path,
            attempted: summary.attempted,
            succeeded: summary.succeeded,
            results_written: summary.results_written,
            failures: summary.failures,
            stats: None,
        });
    }

    let loaded = load_sequences(&request.input, request.min_length)?;
    let orchestrator =
        BatchOrchestrator::new(engine, config).pairs_per_sequence(request.pairs_per_sequence)?;
    let batch = orchestrator.run(&loaded.records, request.schedule)?;
    write_results(&batch.results, &output_path, request.format, &config)?;

    // 5) Statistics over whatever was designed.
    let stats = match summarize(&batch.results) {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!(error = %e, "no statistics for this run");
            None
        }
    };

    Ok(RunOutput {
        fasta,
        config_name,
        config,
        output_path,
        attempted: batch.attempted,
        succeeded: batch.succeeded,
        results_written: batch.results.len(),
        failures: batch.failures,
        stats,
    })
}

fn stream_into<E, S>(
    pipeline: &StreamingPipeline<E>,
    source: FastaSource,
    sink: S,
) -> Result<StreamSummary, AppError>
where
    E: PrimerDesignEngine,
    S: ResultSink,
{
    Ok(pipeline.run(source, sink)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::testing::ScriptedEngine;
    use std::fs;

    fn fasta(dir: &Path, entries: &[(&str, usize)]) -> PathBuf {
        let path = dir.join("input.fasta");
        let text: String = entries
            .iter()
            .map(|(id, len)| format!(">{id}\n{}\n", "ACGT".repeat(len / 4)))
            .collect();
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn batch_run_writes_default_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = fasta(dir.path(), &[("a", 200), ("fail-b", 200), ("tiny", 20)]);
        let mut request = DesignRequest::new(&input);
        request.schedule = ScheduleMode::Sequential;

        let run = run_design_with(ScriptedEngine::default(), &request).unwrap();
        assert_eq!(run.fasta.total, 3);
        assert_eq!(run.fasta.valid, 2);
        assert_eq!(run.attempted, 2);
        assert_eq!(run.succeeded, 1);
        assert_eq!(run.results_written, 1);
        assert_eq!(run.config_name, "standard");
        assert_eq!(run.output_path, dir.path().join("input.primers.csv"));
        assert!(run.output_path.exists());
        assert_eq!(run.stats.unwrap().total_primers, 1);
    }

    #[test]
    fn streaming_json_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = fasta(dir.path(), &[("a", 200), ("b", 200)]);
        let mut request = DesignRequest::new(&input);
        request.streaming = true;
        request.format = OutputFormat::Json;
        request.pairs_per_sequence = 2;
        request.output = Some(dir.path().join("out/results.json"));

        let run = run_design_with(ScriptedEngine::default(), &request).unwrap();
        assert_eq!(run.results_written, 4);
        assert!(run.stats.is_none());
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&run.output_path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 4);
    }

    #[test]
    fn unusable_input_is_a_no_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = fasta(dir.path(), &[("tiny", 20)]);
        let err = run_design_with(ScriptedEngine::default(), &DesignRequest::new(&input))
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);

        let missing = DesignRequest::new(dir.path().join("missing.fasta"));
        assert_eq!(run_design(&missing).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn bad_custom_config_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = fasta(dir.path(), &[("a", 200)]);
        let cfg = dir.path().join("cfg.json");
        fs::write(&cfg, r#"{ "product_size_range": [200, 100] }"#).unwrap();

        let mut request = DesignRequest::new(&input);
        request.config = ConfigSource::File(cfg);
        let err = run_design_with(ScriptedEngine::default(), &request).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("product_size_range"));
        assert!(!dir.path().join("input.primers.csv").exists());
    }
}
