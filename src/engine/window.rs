//! Built-in exhaustive window-scan engine.
//!
//! Every window of `PRIMER_MIN_SIZE..=PRIMER_MAX_SIZE` bases is a forward
//! candidate; its reverse complement is a reverse candidate. Candidates that
//! pass the per-oligo filters are paired, and the `num_return` pairs with the
//! lowest pair penalty are returned.

use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use crate::domain::SequenceRecord;
use crate::engine::thermo::{self, Conditions};
use crate::engine::{
    CandidatePair, DesignContext, EngineExplain, EngineOutput, NativeParams, PrimerDesignEngine,
    check_request,
};
use crate::error::EngineError;

/// Settings read once from `NativeParams`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSettings {
    pub opt_size: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub opt_tm: f64,
    pub min_tm: f64,
    pub max_tm: f64,
    pub min_gc: f64,
    pub max_gc: f64,
    pub max_poly_x: u32,
    pub max_self_any: f64,
    pub max_self_end: f64,
    pub product_min: u32,
    pub product_max: u32,
    pub max_diff_tm: f64,
    pub conditions: Conditions,
}

impl ScanSettings {
    pub fn from_params(p: &NativeParams) -> Result<Self, EngineError> {
        let (product_min, product_max) = p.range("PRIMER_PRODUCT_SIZE_RANGE")?;
        Ok(Self {
            opt_size: p.int("PRIMER_OPT_SIZE")?,
            min_size: p.int("PRIMER_MIN_SIZE")?,
            max_size: p.int("PRIMER_MAX_SIZE")?,
            opt_tm: p.float("PRIMER_OPT_TM")?,
            min_tm: p.float("PRIMER_MIN_TM")?,
            max_tm: p.float("PRIMER_MAX_TM")?,
            min_gc: p.float("PRIMER_MIN_GC")?,
            max_gc: p.float("PRIMER_MAX_GC")?,
            max_poly_x: p.int("PRIMER_MAX_POLY_X")?,
            max_self_any: p.float("PRIMER_MAX_SELF_ANY")?,
            max_self_end: p.float("PRIMER_MAX_SELF_END")?,
            product_min,
            product_max,
            max_diff_tm: p.float("PRIMER_PAIR_MAX_DIFF_TM")?,
            conditions: Conditions {
                monovalent_mm: p.float("PRIMER_SALT_MONOVALENT")?,
                divalent_mm: p.float("PRIMER_SALT_DIVALENT")?,
                dntp_mm: p.float("PRIMER_DNTP_CONC")?,
                dna_nm: p.float("PRIMER_DNA_CONC")?,
            },
        })
    }
}

/// Stateless and shareable; all scratch space lives in the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowScanEngine;

impl PrimerDesignEngine for WindowScanEngine {
    type Context = WindowScanContext;

    fn context(&self, params: &NativeParams) -> Result<WindowScanContext, EngineError> {
        let settings = ScanSettings::from_params(params)?;
        if settings.min_size < 2 || settings.min_size > settings.max_size {
            return Err(EngineError::Failed(format!(
                "invalid primer size range {}-{}",
                settings.min_size, settings.max_size
            )));
        }
        Ok(WindowScanContext {
            settings,
            left: Vec::new(),
            right: Vec::new(),
        })
    }
}

#[derive(Debug, Clone)]
struct Oligo {
    /// Forward-strand index of the 5' base.
    position: usize,
    sequence: String,
    tm: f64,
    penalty: f64,
}

/// Per-side rejection counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OligoStats {
    pub considered: usize,
    pub ambiguous: usize,
    pub gc: usize,
    /// Tm has no value under the configured salt and DNA concentrations.
    pub tm_undefined: usize,
    pub tm_low: usize,
    pub tm_high: usize,
    pub poly_x: usize,
    pub self_any: usize,
    pub self_end: usize,
    pub ok: usize,
}

impl fmt::Display for OligoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "considered {}, ambiguous {}, GC content failed {}, Tm undefined {}, low tm {}, \
             high tm {}, long poly-x seq {}, high any compl {}, high end compl {}, ok {}",
            self.considered,
            self.ambiguous,
            self.gc,
            self.tm_undefined,
            self.tm_low,
            self.tm_high,
            self.poly_x,
            self.self_any,
            self.self_end,
            self.ok
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairStats {
    pub considered: usize,
    pub product_size: usize,
    pub tm_diff: usize,
    pub ok: usize,
}

impl fmt::Display for PairStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "considered {}, unacceptable product size {}, tm diff too large {}, ok {}",
            self.considered, self.product_size, self.tm_diff, self.ok
        )
    }
}

pub struct WindowScanContext {
    settings: ScanSettings,
    left: Vec<Oligo>,
    right: Vec<Oligo>,
}

impl WindowScanContext {
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Filter one oligo (already in 5'->3' orientation).
    fn evaluate(&self, oligo: &[u8], stats: &mut OligoStats) -> Option<(f64, f64)> {
        let s = &self.settings;
        stats.considered += 1;

        if !oligo.iter().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
            stats.ambiguous += 1;
            return None;
        }
        let gc = thermo::gc_percent(oligo);
        if gc < s.min_gc || gc > s.max_gc {
            stats.gc += 1;
            return None;
        }
        let Some(tm) = thermo::melting_temp(oligo, &s.conditions) else {
            stats.tm_undefined += 1;
            return None;
        };
        if tm < s.min_tm {
            stats.tm_low += 1;
            return None;
        }
        if tm > s.max_tm {
            stats.tm_high += 1;
            return None;
        }
        if thermo::longest_homopolymer(oligo) > s.max_poly_x as usize {
            stats.poly_x += 1;
            return None;
        }
        if thermo::self_any(oligo) > s.max_self_any {
            stats.self_any += 1;
            return None;
        }
        if thermo::self_end(oligo) > s.max_self_end {
            stats.self_end += 1;
            return None;
        }

        stats.ok += 1;
        let penalty =
            (tm - s.opt_tm).abs() + (oligo.len() as f64 - s.opt_size as f64).abs();
        Some((tm, penalty))
    }

    fn scan(&mut self, template: &[u8]) -> (OligoStats, OligoStats) {
        let mut left_stats = OligoStats::default();
        let mut right_stats = OligoStats::default();
        let mut left = std::mem::take(&mut self.left);
        let mut right = std::mem::take(&mut self.right);
        left.clear();
        right.clear();

        let n = template.len();
        let (min_size, max_size) = (self.settings.min_size as usize, self.settings.max_size as usize);
        for start in 0..n {
            for len in min_size..=max_size {
                let end = start + len;
                if end > n {
                    break;
                }
                let window = &template[start..end];

                if let Some((tm, penalty)) = self.evaluate(window, &mut left_stats) {
                    left.push(Oligo {
                        position: start,
                        sequence: String::from_utf8_lossy(window).into_owned(),
                        tm,
                        penalty,
                    });
                }

                let rc = thermo::reverse_complement(window);
                if let Some((tm, penalty)) = self.evaluate(&rc, &mut right_stats) {
                    right.push(Oligo {
                        position: end - 1,
                        sequence: String::from_utf8_lossy(&rc).into_owned(),
                        tm,
                        penalty,
                    });
                }
            }
        }

        self.left = left;
        self.right = right;
        (left_stats, right_stats)
    }

    fn pair_up(&mut self, num_return: usize) -> (Vec<RankedPair>, PairStats) {
        let s = self.settings;
        let mut stats = PairStats::default();

        self.left.sort_by(by_penalty_then_position);
        self.right.sort_by(by_penalty_then_position);

        let mut best: Vec<RankedPair> = Vec::with_capacity(num_return + 1);
        for (li, l) in self.left.iter().enumerate() {
            if let Some(worst) = best.last().filter(|_| best.len() == num_return)
                && l.penalty > worst.penalty
            {
                break;
            }
            for (ri, r) in self.right.iter().enumerate() {
                // Remaining rights only get worse; Tm difference is never negative.
                if let Some(worst) = best.last().filter(|_| best.len() == num_return)
                    && l.penalty + r.penalty > worst.penalty
                {
                    break;
                }
                stats.considered += 1;

                if r.position < l.position {
                    stats.product_size += 1;
                    continue;
                }
                let product = (r.position - l.position + 1) as u32;
                if product < s.product_min || product > s.product_max {
                    stats.product_size += 1;
                    continue;
                }
                let diff = (l.tm - r.tm).abs();
                if diff > s.max_diff_tm {
                    stats.tm_diff += 1;
                    continue;
                }
                stats.ok += 1;

                let candidate = RankedPair {
                    left: li,
                    right: ri,
                    left_position: l.position,
                    right_position: r.position,
                    left_len: l.sequence.len(),
                    right_len: r.sequence.len(),
                    penalty: l.penalty + r.penalty + diff,
                    product_size: product,
                };
                insert_ranked(&mut best, candidate, num_return);
            }
        }
        (best, stats)
    }
}

fn by_penalty_then_position(a: &Oligo, b: &Oligo) -> Ordering {
    a.penalty
        .total_cmp(&b.penalty)
        .then(a.position.cmp(&b.position))
        .then(a.sequence.len().cmp(&b.sequence.len()))
}

#[derive(Debug, Clone, Copy)]
struct RankedPair {
    left: usize,
    right: usize,
    left_position: usize,
    right_position: usize,
    left_len: usize,
    right_len: usize,
    penalty: f64,
    product_size: u32,
}

impl RankedPair {
    fn rank(&self, other: &Self) -> Ordering {
        self.penalty
            .total_cmp(&other.penalty)
            .then(self.left_position.cmp(&other.left_position))
            .then(self.right_position.cmp(&other.right_position))
            .then(self.left_len.cmp(&other.left_len))
            .then(self.right_len.cmp(&other.right_len))
    }
}

/// Keep `best` sorted and at most `cap` long.
fn insert_ranked(best: &mut Vec<RankedPair>, candidate: RankedPair, cap: usize) {
    let at = best
        .iter()
        .position(|b| candidate.rank(b) == Ordering::Less)
        .unwrap_or(best.len());
    if at >= cap {
        return;
    }
    best.insert(at, candidate);
    best.truncate(cap);
}

impl DesignContext for WindowScanContext {
    fn design(
        &mut self,
        record: &SequenceRecord,
        num_return: usize,
    ) -> Result<EngineOutput, EngineError> {
        check_request(record, num_return)?;

        let (left_stats, right_stats) = self.scan(record.sequence().as_bytes());
        let (ranked, pair_stats) = self.pair_up(num_return);
        trace!(
            id = record.id(),
            left = left_stats.ok,
            right = right_stats.ok,
            pairs = pair_stats.ok,
            "window scan finished"
        );

        let pairs: Vec<CandidatePair> = ranked
            .iter()
            .map(|p| {
                let l = &self.left[p.left];
                let r = &self.right[p.right];
                CandidatePair {
                    left_sequence: l.sequence.clone(),
                    right_sequence: r.sequence.clone(),
                    left_position: l.position as u32,
                    right_position: r.position as u32,
                    left_tm: l.tm,
                    right_tm: r.tm,
                    left_penalty: l.penalty,
                    right_penalty: r.penalty,
                    product_size: p.product_size,
                }
            })
            .collect();

        let explain = pairs.is_empty().then(|| EngineExplain {
            left: left_stats.to_string(),
            right: right_stats.to_string(),
            pair: pair_stats.to_string(),
        });

        Ok(EngineOutput { pairs, explain })
    }
}
