//! Reporting utilities: batch statistics and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::domain::PrimerResult;
use crate::error::StatsError;

/// min / max / mean over one quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Summary {
    fn of(values: impl Iterator<Item = f64>) -> Option<Summary> {
        let mut n = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for v in values {
            n += 1;
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        (n > 0).then(|| Summary {
            min,
            max,
            mean: sum / n as f64,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairSummary {
    pub forward: Summary,
    pub reverse: Summary,
}

/// Aggregate statistics over a non-empty set of results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchStats {
    pub total_primers: usize,
    pub tm_statistics: PairSummary,
    pub gc_statistics: PairSummary,
    pub product_size_statistics: Summary,
}

/// Summarize results. Statistics of nothing are undefined, so an empty slice
/// is an error rather than a zero-filled report.
pub fn summarize(results: &[PrimerResult]) -> Result<BatchStats, StatsError> {
    let stat = |f: fn(&PrimerResult) -> f64| {
        Summary::of(results.iter().map(f)).ok_or(StatsError::EmptyBatch)
    };

    Ok(BatchStats {
        total_primers: results.len(),
        tm_statistics: PairSummary {
            forward: stat(PrimerResult::tm_forward)?,
            reverse: stat(PrimerResult::tm_reverse)?,
        },
        gc_statistics: PairSummary {
            forward: stat(PrimerResult::gc_forward)?,
            reverse: stat(PrimerResult::gc_reverse)?,
        },
        product_size_statistics: stat(|r| r.product_size() as f64)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample_draft;

    fn result(tm_f: f64, gc_r: f64, product: u32) -> PrimerResult {
        let mut d = sample_draft("s");
        d.tm_forward = tm_f;
        d.gc_reverse = gc_r;
        d.product_size = product;
        PrimerResult::new(d).unwrap()
    }

    #[test]
    fn summarize_computes_min_max_mean() {
        let results = vec![
            result(58.0, 40.0, 100),
            result(60.0, 50.0, 200),
            result(62.0, 60.0, 600),
        ];
        let stats = summarize(&results).unwrap();
        assert_eq!(stats.total_primers, 3);
        assert!((stats.tm_statistics.forward.min - 58.0).abs() < 1e-12);
        assert!((stats.tm_statistics.forward.max - 62.0).abs() < 1e-12);
        assert!((stats.tm_statistics.forward.mean - 60.0).abs() < 1e-12);
        assert!((stats.gc_statistics.reverse.mean - 50.0).abs() < 1e-12);
        assert!((stats.product_size_statistics.mean - 300.0).abs() < 1e-12);
    }

    #[test]
    fn empty_batch_is_an_error() {
        assert_eq!(summarize(&[]).unwrap_err(), StatsError::EmptyBatch);
    }

    #[test]
    fn stats_serialize_to_the_report_shape() {
        let stats = summarize(&[result(60.0, 50.0, 200)]).unwrap();
        let v = serde_json::to_value(stats).unwrap();
        assert_eq!(v["total_primers"], 1);
        assert!(v["tm_statistics"]["forward"]["min"].is_number());
        assert!(v["gc_statistics"]["reverse"]["mean"].is_number());
        assert!(v["product_size_statistics"]["max"].is_number());
        assert_eq!(v.as_object().unwrap().len(), 4);
    }
}
