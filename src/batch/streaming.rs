//! Constant-memory batch runs.
//!
//! Sequences are pulled from the source one at a time, designed, and every
//! result is handed to the sink before the next sequence is read. At most one
//! sequence's results are held in memory at any point.

use std::time::Instant;

use tracing::{info, warn};

use crate::batch::CancelFlag;
use crate::batch::orchestrator::{BatchOrchestrator, ItemOutcome, Progress};
use crate::config::ConfigBundle;
use crate::domain::{FailureKind, ItemFailure};
use crate::engine::PrimerDesignEngine;
use crate::error::{BatchError, EngineError, IngestError};
use crate::io::export::ResultSink;
use crate::io::ingest::{DEFAULT_MIN_LENGTH, RawSequence};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSummary {
    /// Valid sequences handed to the per-item pipeline.
    pub attempted: usize,
    /// Sequences with at least one written result.
    pub succeeded: usize,
    /// Raw records rejected by the validator and skipped.
    pub invalid: usize,
    pub results_written: usize,
    pub failures: Vec<ItemFailure>,
    /// True when the run stopped early because of cancellation.
    pub cancelled: bool,
}

impl StreamSummary {
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.attempted as f64
        }
    }
}

pub struct StreamingPipeline<E> {
    orchestrator: BatchOrchestrator<E>,
    min_length: usize,
}

impl<E: PrimerDesignEngine> StreamingPipeline<E> {
    pub fn new(engine: E, config: ConfigBundle) -> Self {
        Self {
            orchestrator: BatchOrchestrator::new(engine, config),
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn pairs_per_sequence(mut self, n: usize) -> Result<Self, EngineError> {
        self.orchestrator = self.orchestrator.pairs_per_sequence(n)?;
        Ok(self)
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.orchestrator = self.orchestrator.cancel_flag(flag);
        self
    }

    /// Design primers for every record from `source`, writing into `sink`.
    ///
    /// The sink is finished on success and dropped (releasing the
    /// destination) on any error.
    pub fn run<I, S>(&self, source: I, mut sink: S) -> Result<StreamSummary, BatchError>
    where
        I: IntoIterator<Item = Result<RawSequence, IngestError>>,
        S: ResultSink,
    {
        let started = Instant::now();
        info!("starting streaming primer design");

        let mut ctx = Ok(self.orchestrator.new_context()?);
        let progress = Progress::new(0);
        let mut summary = StreamSummary::default();

        for raw in source {
            let raw = raw?;
            let record = match raw.validate(self.min_length) {
                Ok(record) => record,
                Err(reason) => {
                    warn!(id = %raw.id, %reason, "skipping invalid sequence");
                    summary.invalid += 1;
                    continue;
                }
            };

            let outcome = self.orchestrator.process_item(&mut ctx, &record);
            if !outcome.is_attempted() {
                summary.cancelled = true;
                info!(
                    results = sink.written(),
                    "streaming run cancelled; remaining sequences not started"
                );
                break;
            }
            summary.attempted += 1;

            match outcome {
                ItemOutcome::Designed { results, .. } => {
                    for r in &results {
                        sink.write(r)?;
                    }
                    summary.succeeded += 1;
                }
                ItemOutcome::Failed(f) => summary.failures.push(f),
            }
            progress.tick();
        }

        summary.results_written = sink.finish()?;
        info!(
            succeeded = summary.succeeded,
            attempted = summary.attempted,
            invalid = summary.invalid,
            results = summary.results_written,
            no_primers = summary
                .failures
                .iter()
                .filter(|f| f.kind == FailureKind::NoPrimers)
                .count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "streaming design complete"
        );
        Ok(summary)
    }
}
