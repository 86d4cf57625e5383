//! Oligo thermodynamics and sequence heuristics.
//!
//! Melting temperature uses the SantaLucia (1998) unified nearest-neighbour
//! table with a sodium-equivalent salt correction for Mg2+ and dNTPs.
//! Self-complementarity is an ungapped antiparallel alignment score.

/// Gas constant, cal/(K*mol).
const R: f64 = 1.987;

/// Solution conditions for Tm, in the config's units (mM / nM).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub monovalent_mm: f64,
    pub divalent_mm: f64,
    pub dntp_mm: f64,
    pub dna_nm: f64,
}

impl Conditions {
    /// Monovalent-equivalent cation concentration in mol/L.
    ///
    /// Free Mg2+ is what dNTPs leave unbound; it counts as 120*sqrt([Mg]).
    pub fn sodium_equivalent(&self) -> f64 {
        let free_mg = (self.divalent_mm - self.dntp_mm).max(0.0);
        (self.monovalent_mm + 120.0 * free_mg.sqrt()) / 1000.0
    }
}

/// (dH kcal/mol, dS cal/K/mol) for a 5'->3' dinucleotide on the top strand.
fn nn_params(a: u8, b: u8) -> Option<(f64, f64)> {
    let p = match (a, b) {
        (b'A', b'A') | (b'T', b'T') => (-7.9, -22.2),
        (b'A', b'T') => (-7.2, -20.4),
        (b'T', b'A') => (-7.2, -21.3),
        (b'C', b'A') | (b'T', b'G') => (-8.5, -22.7),
        (b'G', b'T') | (b'A', b'C') => (-8.4, -22.4),
        (b'C', b'T') | (b'A', b'G') => (-7.8, -21.0),
        (b'G', b'A') | (b'T', b'C') => (-8.2, -22.2),
        (b'C', b'G') => (-10.6, -27.2),
        (b'G', b'C') => (-9.8, -24.4),
        (b'G', b'G') | (b'C', b'C') => (-8.0, -19.9),
        _ => return None,
    };
    Some(p)
}

fn terminal_init(base: u8) -> (f64, f64) {
    match base {
        b'G' | b'C' => (0.1, -2.8),
        _ => (2.3, 4.1),
    }
}

/// Nearest-neighbour Tm in degrees C. `None` for non-ACGT input or oligos
/// shorter than two bases.
pub fn melting_temp(oligo: &[u8], cond: &Conditions) -> Option<f64> {
    let (first, last) = match oligo {
        [first, .., last] => (*first, *last),
        _ => return None,
    };

    let (mut dh, mut ds) = terminal_init(first);
    let (h_end, s_end) = terminal_init(last);
    dh += h_end;
    ds += s_end;

    for w in oligo.windows(2) {
        let (h, s) = nn_params(w[0], w[1])?;
        dh += h;
        ds += s;
    }

    let na = cond.sodium_equivalent();
    if na <= 0.0 || cond.dna_nm <= 0.0 {
        return None;
    }
    ds += 0.368 * (oligo.len() - 1) as f64 * na.ln();

    let ct = cond.dna_nm * 1e-9;
    Some(dh * 1000.0 / (ds + R * (ct / 4.0).ln()) - 273.15)
}

pub fn gc_percent(seq: &[u8]) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    let gc = seq.iter().filter(|b| matches!(b, b'G' | b'C')).count();
    gc as f64 * 100.0 / seq.len() as f64
}

pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        other => other,
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|b| complement(*b)).collect()
}

/// Longest run of one repeated base.
pub fn longest_homopolymer(seq: &[u8]) -> usize {
    let mut best = 0;
    let mut run = 0;
    let mut prev = None;
    for &b in seq {
        run = if prev == Some(b) { run + 1 } else { 1 };
        prev = Some(b);
        best = best.max(run);
    }
    best
}

fn pairs(a: u8, b: u8) -> bool {
    matches!(a, b'A' | b'T' | b'G' | b'C') && complement(a) == b
}

/// Best ungapped local alignment of the oligo against itself, antiparallel
/// (+1 per Watson-Crick pair, -1 otherwise).
pub fn self_any(seq: &[u8]) -> f64 {
    let n = seq.len();
    let mut best = 0i32;
    // Base i of one strand faces base k - i of the other.
    for k in 0..(2 * n).saturating_sub(1) {
        let lo = k.saturating_sub(n - 1);
        let hi = k.min(n - 1);
        let mut run = 0i32;
        for i in lo..=hi {
            run = if pairs(seq[i], seq[k - i]) { run + 1 } else { (run - 1).max(0) };
            best = best.max(run);
        }
    }
    best as f64
}

/// Longest stretch of consecutive pairs anchored at the 3' terminal base.
pub fn self_end(seq: &[u8]) -> f64 {
    let n = seq.len();
    if n == 0 {
        return 0.0;
    }
    let mut best = 0usize;
    for j in 0..n {
        let mut i = n - 1;
        let mut jj = j;
        let mut run = 0usize;
        while jj < n && pairs(seq[i], seq[jj]) {
            run += 1;
            if i == 0 {
                break;
            }
            i -= 1;
            jj += 1;
        }
        best = best.max(run);
    }
    best as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD: Conditions = Conditions {
        monovalent_mm: 50.0,
        divalent_mm: 1.5,
        dntp_mm: 0.6,
        dna_nm: 50.0,
    };

    #[test]
    fn sodium_equivalent_counts_free_magnesium() {
        let na = STANDARD.sodium_equivalent();
        let expected = (50.0 + 120.0 * 0.9f64.sqrt()) / 1000.0;
        assert!((na - expected).abs() < 1e-12);

        let no_free = Conditions {
            dntp_mm: 2.0,
            ..STANDARD
        };
        assert!((no_free.sodium_equivalent() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn tm_is_in_a_plausible_band() {
        let tm = melting_temp(b"AGCGTACGTTAGCTAGGCTA", &STANDARD).unwrap();
        assert!(tm > 50.0 && tm < 70.0, "tm = {tm}");

        let at_rich = melting_temp(b"ATATTAATATTTAAATATTA", &STANDARD).unwrap();
        let gc_rich = melting_temp(b"GCGCCGGCGGCCGCGGCCGC", &STANDARD).unwrap();
        assert!(at_rich < tm && tm < gc_rich);
    }

    #[test]
    fn more_salt_raises_tm() {
        let low = melting_temp(b"AGCGTACGTTAGCTAGGCTA", &STANDARD).unwrap();
        let high = melting_temp(
            b"AGCGTACGTTAGCTAGGCTA",
            &Conditions {
                monovalent_mm: 200.0,
                ..STANDARD
            },
        )
        .unwrap();
        assert!(high > low);
    }

    #[test]
    fn tm_rejects_ambiguous_or_tiny_input() {
        assert!(melting_temp(b"ACGTNACGT", &STANDARD).is_none());
        assert!(melting_temp(b"A", &STANDARD).is_none());
    }

    #[test]
    fn sequence_helpers() {
        assert!((gc_percent(b"GGCCAATT") - 50.0).abs() < 1e-12);
        assert_eq!(reverse_complement(b"AACG"), b"CGTT".to_vec());
        assert_eq!(longest_homopolymer(b"ACGGGGTA"), 4);
        assert_eq!(longest_homopolymer(b""), 0);
    }

    #[test]
    fn palindromes_score_high_on_self_complementarity() {
        // GAATTC is its own reverse complement.
        assert!(self_any(b"GAATTC") >= 6.0);
        assert!(self_any(b"AAAAAA") < 1.0);
        assert!(self_end(b"AAAAGAATTC") >= 6.0);
        assert!(self_end(b"GAATTCAAAA") <= 2.0);
    }
}
