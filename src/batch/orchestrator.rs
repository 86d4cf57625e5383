//! Batch orchestration.
//!
//! A batch never aborts because of one sequence: rejections, engine errors,
//! engine panics, empty outputs and malformed pairs are all recorded as
//! `ItemFailure`s and the run continues. The only fatal errors are failing to
//! build the worker pool or the first engine context.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::batch::{CancelFlag, PROGRESS_INTERVAL};
use crate::config::ConfigBundle;
use crate::domain::{
    BatchResult, FailureKind, ItemFailure, PrimerResult, ScheduleMode, SequenceRecord,
};
use crate::engine::{
    DesignContext, MIN_DESIGN_LENGTH, NativeParams, PAIR_COUNT_RANGE, PrimerDesignEngine,
};
use crate::error::{BatchError, EngineError};

/// What happened to one sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// At least one valid pair. `invalid` counts pairs dropped by validation.
    Designed {
        results: Vec<PrimerResult>,
        invalid: usize,
    },
    Failed(ItemFailure),
}

impl ItemOutcome {
    fn failed(record: &SequenceRecord, kind: FailureKind, reason: impl Into<String>) -> Self {
        ItemOutcome::Failed(ItemFailure {
            sequence_id: record.id().to_string(),
            kind,
            reason: reason.into(),
        })
    }

    /// Cancelled items were never attempted.
    pub fn is_attempted(&self) -> bool {
        !matches!(self, ItemOutcome::Failed(f) if f.kind == FailureKind::Cancelled)
    }
}

pub struct BatchOrchestrator<E> {
    engine: E,
    params: NativeParams,
    pairs_per_sequence: usize,
    cancel: CancelFlag,
}

impl<E: PrimerDesignEngine> BatchOrchestrator<E> {
    pub fn new(engine: E, config: ConfigBundle) -> Self {
        Self {
            engine,
            params: NativeParams::from_config(&config),
            pairs_per_sequence: 1,
            cancel: CancelFlag::default(),
        }
    }

    /// Number of pairs requested per sequence (1..=5).
    pub fn pairs_per_sequence(mut self, n: usize) -> Result<Self, EngineError> {
        if !PAIR_COUNT_RANGE.contains(&n) {
            return Err(EngineError::InvalidPairCount(n));
        }
        self.pairs_per_sequence = n;
        Ok(self)
    }

    pub fn cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = flag;
        self
    }

    pub(crate) fn new_context(&self) -> Result<E::Context, EngineError> {
        self.engine.context(&self.params)
    }

    /// Run every sequence through the per-item pipeline.
    pub fn run(
        &self,
        sequences: &[SequenceRecord],
        mode: ScheduleMode,
    ) -> Result<BatchResult, BatchError> {
        let started = Instant::now();
        info!(
            sequences = sequences.len(),
            pairs = self.pairs_per_sequence,
            ?mode,
            "starting batch primer design"
        );

        // Fail fast on an engine that cannot be configured at all.
        let first = self.new_context()?;
        let progress = Progress::new(sequences.len());

        let outcomes: Vec<ItemOutcome> = match mode {
            ScheduleMode::Sequential => {
                let mut ctx = Ok(first);
                sequences
                    .iter()
                    .map(|record| {
                        let outcome = self.process_item(&mut ctx, record);
                        progress.tick();
                        outcome
                    })
                    .collect()
            }
            ScheduleMode::Parallel { workers } => {
                drop(first);
                let workers = workers.unwrap_or_else(num_cpus::get).max(1);
                let pool = ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|idx| format!("primer-worker-{idx}"))
                    .build()
                    .map_err(|e| BatchError::Pool(e.to_string()))?;
                debug!(workers, "worker pool ready");

                pool.install(|| {
                    sequences
                        .par_iter()
                        .map_init(
                            || self.new_context(),
                            |ctx, record| {
                                let outcome = self.process_item(ctx, record);
                                progress.tick();
                                outcome
                            },
                        )
                        .collect()
                })
            }
        };

        let batch = collect_outcomes(outcomes);
        info!(
            succeeded = batch.succeeded,
            attempted = batch.attempted,
            cancelled = batch.failures_of(FailureKind::Cancelled),
            results = batch.results.len(),
            success_rate = %format!("{:.1}%", batch.success_rate() * 100.0),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch design complete"
        );
        Ok(batch)
    }

    /// The per-item pipeline shared by every scheduling mode.
    ///
    /// `ctx` is this worker's engine context; it is rebuilt after a panic.
    pub(crate) fn process_item(
        &self,
        ctx: &mut Result<E::Context, EngineError>,
        record: &SequenceRecord,
    ) -> ItemOutcome {
        if self.cancel.is_cancelled() {
            return ItemOutcome::failed(record, FailureKind::Cancelled, "batch cancelled");
        }

        if record.len() < MIN_DESIGN_LENGTH {
            warn!(id = record.id(), length = record.len(), "sequence too short for design");
            let reason = EngineError::SequenceTooShort {
                length: record.len(),
                min_length: MIN_DESIGN_LENGTH,
            };
            return ItemOutcome::failed(record, FailureKind::Rejected, reason.to_string());
        }

        let context = match ctx {
            Ok(c) => c,
            Err(e) => {
                return ItemOutcome::failed(record, FailureKind::EngineFault, e.to_string());
            }
        };

        let n = self.pairs_per_sequence;
        let output = match catch_unwind(AssertUnwindSafe(|| context.design(record, n))) {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(id = record.id(), error = %e, "primer design failed");
                return ItemOutcome::failed(record, FailureKind::EngineFault, e.to_string());
            }
            Err(payload) => {
                let e = EngineError::Panicked(panic_message(payload.as_ref()));
                warn!(id = record.id(), error = %e, "primer design panicked");
                *ctx = self.new_context();
                return ItemOutcome::failed(record, FailureKind::EngineFault, e.to_string());
            }
        };

        if output.pairs.is_empty() {
            warn!(id = record.id(), "no primers found");
            let reason = match &output.explain {
                Some(explain) => {
                    debug!(id = record.id(), %explain, "engine explanation");
                    format!("no primers found ({explain})")
                }
                None => "no primers found".to_string(),
            };
            return ItemOutcome::failed(record, FailureKind::NoPrimers, reason);
        }

        let mut results = Vec::with_capacity(output.pairs.len());
        let mut errors = Vec::new();
        for pair in output.pairs {
            match PrimerResult::new(pair.into_draft(record.id())) {
                Ok(r) => results.push(r),
                Err(e) => {
                    debug!(id = record.id(), error = %e, "dropping malformed pair");
                    errors.push(e.to_string());
                }
            }
        }

        if results.is_empty() {
            warn!(id = record.id(), "every returned pair was malformed");
            return ItemOutcome::failed(record, FailureKind::InvalidResult, errors.join("; "));
        }

        debug!(id = record.id(), pairs = results.len(), "designed primers");
        ItemOutcome::Designed {
            results,
            invalid: errors.len(),
        }
    }
}

/// Fold per-item outcomes into a `BatchResult`, keeping outcome order.
pub fn collect_outcomes(outcomes: Vec<ItemOutcome>) -> BatchResult {
    let mut batch = BatchResult::default();
    for outcome in outcomes {
        if outcome.is_attempted() {
            batch.attempted += 1;
        }
        match outcome {
            ItemOutcome::Designed { results, .. } => {
                batch.succeeded += 1;
                batch.results.extend(results);
            }
            ItemOutcome::Failed(f) => batch.failures.push(f),
        }
    }
    batch
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Completed-item counter shared across workers.
pub(crate) struct Progress {
    total: usize,
    done: AtomicUsize,
}

impl Progress {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
        }
    }

    pub(crate) fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_INTERVAL == 0 {
            match self.total {
                0 => info!(done, "progress"),
                total => info!(done, total, "progress: {done}/{total} sequences"),
            }
        }
    }
}
