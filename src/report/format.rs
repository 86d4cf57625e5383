//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the design/batch code stays clean and testable
//! - output changes are localized

use std::fmt::Write as _;

use crate::config::{ConfigBundle, FIELD_SPECS, FieldCategory, Preset};
use crate::domain::{FailureKind, ItemFailure};
use crate::io::ingest::FastaReport;
use crate::report::{BatchStats, Summary};

/// Attempted vs. succeeded, plus a failure breakdown. Partial success is
/// never reported as success.
pub fn format_batch_outcome(
    attempted: usize,
    succeeded: usize,
    results: usize,
    failures: &[ItemFailure],
) -> String {
    let mut out = String::new();
    let rate = if attempted == 0 {
        0.0
    } else {
        succeeded as f64 * 100.0 / attempted as f64
    };

    let headline = match (attempted, succeeded) {
        (0, _) => "No sequences were attempted.".to_string(),
        (a, s) if a == s => format!("Designed primers for all {a} sequences."),
        (a, 0) => format!("Primer design failed for all {a} sequences."),
        (a, s) => format!("Partial success: designed primers for {s} of {a} sequences."),
    };
    let _ = writeln!(out, "{headline}");
    let _ = writeln!(
        out,
        "Sequences: attempted={attempted} succeeded={succeeded} failed={} ({rate:.1}% success)",
        attempted.saturating_sub(succeeded)
    );
    let _ = writeln!(out, "Primer pairs written: {results}");

    let kinds = [
        (FailureKind::Rejected, "rejected before design"),
        (FailureKind::NoPrimers, "no primers found"),
        (FailureKind::EngineFault, "engine errors"),
        (FailureKind::InvalidResult, "invalid engine output"),
        (FailureKind::Cancelled, "cancelled (not attempted)"),
    ];
    for (kind, label) in kinds {
        let n = failures.iter().filter(|f| f.kind == kind).count();
        if n > 0 {
            let _ = writeln!(out, "  {label}: {n}");
        }
    }
    out
}

/// Per-item failure lines, at most `limit` of them.
pub fn format_failures(failures: &[ItemFailure], limit: usize) -> String {
    let mut out = String::new();
    for f in failures.iter().take(limit) {
        let _ = writeln!(out, "  - {}: {}", truncate(&f.sequence_id, 32), f.reason);
    }
    if failures.len() > limit {
        let _ = writeln!(out, "  ... and {} more", failures.len() - limit);
    }
    out
}

pub fn format_stats(stats: &BatchStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Primer statistics (n={}):", stats.total_primers);
    let _ = writeln!(out, "{:<22} {:>10} {:>10} {:>10}", "", "min", "max", "mean");
    let _ = writeln!(out, "{:-<22} {:-<10} {:-<10} {:-<10}", "", "", "", "");
    let rows: [(&str, &Summary, &str); 5] = [
        ("Tm forward", &stats.tm_statistics.forward, "°C"),
        ("Tm reverse", &stats.tm_statistics.reverse, "°C"),
        ("GC forward", &stats.gc_statistics.forward, "%"),
        ("GC reverse", &stats.gc_statistics.reverse, "%"),
        ("Product size", &stats.product_size_statistics, "bp"),
    ];
    for (label, s, unit) in rows {
        let _ = writeln!(
            out,
            "{:<22} {:>10} {:>10} {:>10}",
            format!("{label} ({unit})"),
            format!("{:.2}", s.min),
            format!("{:.2}", s.max),
            format!("{:.2}", s.mean)
        );
    }
    out
}

/// Short summary block (the same keys as the JSON `config_summary`).
pub fn format_config_summary(name: &str, config: &ConfigBundle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Configuration: {name}");
    for (key, value) in config.config_summary() {
        let _ = writeln!(out, "  {:<22} {value}", key.replace('_', " "));
    }
    out
}

/// Every parameter of a bundle grouped by category.
pub fn format_config_detail(name: &str, config: &ConfigBundle) -> String {
    let values = serde_json::to_value(config).unwrap_or_default();
    let mut out = String::new();
    let _ = writeln!(out, "=== Configuration preset: {name} ===");
    for category in FieldCategory::ALL {
        let _ = writeln!(out, "\n{}:", category.title());
        for spec in FIELD_SPECS.iter().filter(|s| s.category == category) {
            let value = match &values[spec.name] {
                serde_json::Value::Null => "(unset)".to_string(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("-"),
                other => other.to_string(),
            };
            let _ = writeln!(
                out,
                "  {:<24} {:>10} {:<4} {}",
                spec.name, value, spec.unit, spec.description
            );
        }
    }
    out
}

/// `list-configs` table.
pub fn format_preset_table() -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:<34} {:>8} {:>12} {:>10} {:>12}",
        "preset", "description", "size", "Tm", "GC%", "product"
    );
    let _ = writeln!(
        out,
        "{:-<10} {:-<34} {:-<8} {:-<12} {:-<10} {:-<12}",
        "", "", "", "", "", ""
    );
    for preset in Preset::ALL {
        let c = preset.bundle();
        let _ = writeln!(
            out,
            "{:<10} {:<34} {:>8} {:>12} {:>10} {:>12}",
            preset.name(),
            truncate(preset.description(), 34),
            format!("{}-{}", c.primer_min_size, c.primer_max_size),
            format!("{}-{}", c.primer_min_tm, c.primer_max_tm),
            format!("{}-{}", c.primer_min_gc, c.primer_max_gc),
            format!("{}-{}", c.product_size_range.min, c.product_size_range.max),
        );
    }
    out
}

/// Every tunable parameter with its bounds, for `--show-params`.
pub fn format_parameter_info() -> String {
    let defaults = serde_json::to_value(ConfigBundle::DEFAULT).unwrap_or_default();
    let mut out = String::new();
    let _ = writeln!(out, "Primer design parameters\n");
    for category in FieldCategory::ALL {
        let _ = writeln!(out, "{}", category.title());
        let _ = writeln!(
            out,
            "  {:<24} {:>10} {:>12} {:<4} description",
            "parameter", "default", "range", "unit"
        );
        for spec in FIELD_SPECS.iter().filter(|s| s.category == category) {
            let default = match &defaults[spec.name] {
                serde_json::Value::Null => "(unset)".to_string(),
                v => v.to_string(),
            };
            let _ = writeln!(
                out,
                "  {:<24} {:>10} {:>12} {:<4} {}",
                spec.name,
                default,
                spec.range_label(),
                spec.unit,
                spec.description
            );
        }
        out.push('\n');
    }
    out.push_str("Constraints: min <= opt <= max for size and Tm, min GC <= max GC,\n");
    out.push_str("product_size_range is [min, max] with min < max.\n");
    out
}

pub fn format_fasta_report(report: &FastaReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "FASTA file: {}", report.path.display());
    let _ = writeln!(out, "  total sequences:   {}", report.total);
    let _ = writeln!(out, "  valid sequences:   {}", report.valid);
    let _ = writeln!(out, "  invalid sequences: {}", report.invalid());
    if let Some(l) = report.lengths {
        let _ = writeln!(
            out,
            "  length (bp):       min={} max={} mean={:.1}",
            l.min, l.max, l.mean
        );
    }
    if !report.duplicate_ids.is_empty() {
        let _ = writeln!(
            out,
            "  duplicate ids:     {}",
            report.duplicate_ids.join(", ")
        );
    }
    for r in report.rejected.iter().take(10) {
        let _ = writeln!(out, "  - {}: {}", truncate(&r.id, 32), r.reason);
    }
    if report.rejected.len() > 10 {
        let _ = writeln!(out, "  ... and {} more", report.rejected.len() - 10);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PrimerResult, sample_draft};
    use crate::report::summarize;

    fn failure(kind: FailureKind) -> ItemFailure {
        ItemFailure {
            sequence_id: "x".to_string(),
            kind,
            reason: "because".to_string(),
        }
    }

    #[test]
    fn partial_success_is_never_reported_as_success() {
        let text = format_batch_outcome(3, 2, 2, &[failure(FailureKind::NoPrimers)]);
        assert!(text.starts_with("Partial success"));
        assert!(text.contains("attempted=3 succeeded=2 failed=1"));
        assert!(text.contains("no primers found: 1"));

        let all = format_batch_outcome(2, 2, 2, &[]);
        assert!(all.starts_with("Designed primers for all 2"));
        let none = format_batch_outcome(0, 0, 0, &[]);
        assert!(none.starts_with("No sequences"));
    }

    #[test]
    fn stats_table_lists_every_quantity() {
        let r = PrimerResult::new(sample_draft("s")).unwrap();
        let text = format_stats(&summarize(&[r]).unwrap());
        for label in ["Tm forward", "Tm reverse", "GC forward", "GC reverse", "Product size"] {
            assert!(text.contains(label), "missing {label}");
        }
        assert!(text.contains("59.88"));
    }

    #[test]
    fn config_views_cover_all_fields() {
        let detail = format_config_detail("standard", &ConfigBundle::DEFAULT);
        for spec in FIELD_SPECS {
            assert!(detail.contains(spec.name), "missing {}", spec.name);
        }
        assert!(detail.contains("100-1000"));

        let info = format_parameter_info();
        assert!(info.contains("primer_max_poly_x"));

        let table = format_preset_table();
        assert!(table.contains("gc-rich"));
        assert!(table.contains("150-800"));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdefgh", 5), "abcd.");
    }

    #[test]
    fn failure_list_is_capped() {
        let failures: Vec<ItemFailure> = (0..5).map(|_| failure(FailureKind::EngineFault)).collect();
        let text = format_failures(&failures, 3);
        assert_eq!(text.lines().count(), 4);
        assert!(text.ends_with("... and 2 more\n"));
    }
}
