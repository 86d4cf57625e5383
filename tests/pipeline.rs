//! End-to-end runs of the design pipeline with the built-in engine.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use primer_batch::app::pipeline::{ConfigSource, DesignRequest, run_design};
use primer_batch::batch::BatchOrchestrator;
use primer_batch::config::{ConfigBundle, GC_RICH, Preset, RawConfig};
use primer_batch::data::{TestDataSpec, write_test_fasta};
use primer_batch::domain::{OutputFormat, ScheduleMode};
use primer_batch::engine::WindowScanEngine;
use primer_batch::error::StatsError;
use primer_batch::io::config_file::save_config_file;
use primer_batch::io::export::{PrimerRow, write_results};
use primer_batch::report::summarize;

fn three_templates(dir: &Path) -> PathBuf {
    let path = dir.join("templates.fasta");
    let spec = TestDataSpec {
        count: 3,
        min_length: 500,
        max_length: 500,
        gc_min: 0.45,
        gc_max: 0.55,
        seed: Some(2024),
    };
    write_test_fasta(&path, &spec).unwrap();
    path
}

fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, PrimerRow::HEADER);
    reader.records().map(Result::unwrap).collect()
}

fn num(row: &csv::StringRecord, idx: usize) -> f64 {
    row[idx].parse().unwrap()
}

#[test]
fn standard_preset_results_respect_the_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let mut request = DesignRequest::new(three_templates(dir.path()));
    request.schedule = ScheduleMode::Sequential;
    request.pairs_per_sequence = 2;

    let run = run_design(&request).unwrap();
    assert_eq!(run.attempted, 3);
    assert_eq!(run.succeeded + run.failures.len(), 3);
    assert!(run.succeeded <= run.attempted);

    let rows = read_rows(&run.output_path);
    assert_eq!(rows.len(), run.results_written);
    assert!(rows.len() <= 6);

    let cfg = ConfigBundle::DEFAULT;
    for row in &rows {
        for (tm, gc, len) in [(3, 5, 7), (4, 6, 8)] {
            assert!((cfg.primer_min_tm..=cfg.primer_max_tm).contains(&num(row, tm)));
            assert!((cfg.primer_min_gc..=cfg.primer_max_gc).contains(&num(row, gc)));
            let len = num(row, len) as u32;
            assert!((cfg.primer_min_size..=cfg.primer_max_size).contains(&len));
        }
        let product = num(row, 9) as u32;
        assert!(cfg.product_size_range.contains(product));
        assert!(row[1].bytes().all(|b| b"ACGT".contains(&b)));
    }

    if run.results_written > 0 {
        let stats = run.stats.unwrap();
        assert_eq!(stats.total_primers, run.results_written);
        assert!(stats.tm_statistics.forward.min <= stats.tm_statistics.forward.mean);
    }
}

#[test]
fn parallel_and_sequential_agree() {
    let dir = tempfile::tempdir().unwrap();
    let input = three_templates(dir.path());

    let mut seq = DesignRequest::new(&input);
    seq.schedule = ScheduleMode::Sequential;
    seq.output = Some(dir.path().join("seq.csv"));
    let mut par = DesignRequest::new(&input);
    par.schedule = ScheduleMode::Parallel { workers: Some(3) };
    par.output = Some(dir.path().join("par.csv"));

    let a = run_design(&seq).unwrap();
    let b = run_design(&par).unwrap();
    assert_eq!(a.succeeded, b.succeeded);

    let set = |p: &Path| -> BTreeSet<Vec<String>> {
        read_rows(p)
            .iter()
            .map(|r| r.iter().map(String::from).collect())
            .collect()
    };
    assert_eq!(set(&a.output_path), set(&b.output_path));
}

#[test]
fn streaming_matches_batch_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = three_templates(dir.path());

    let mut batch = DesignRequest::new(&input);
    batch.schedule = ScheduleMode::Sequential;
    batch.output = Some(dir.path().join("batch.csv"));
    let mut stream = batch.clone();
    stream.streaming = true;
    stream.output = Some(dir.path().join("stream.csv"));

    let a = run_design(&batch).unwrap();
    let b = run_design(&stream).unwrap();
    assert_eq!(a.attempted, b.attempted);
    assert_eq!(a.results_written, b.results_written);
    let streamed = fs::read_to_string(&b.output_path).unwrap();
    if b.results_written == 0 {
        assert_eq!(streamed, "");
    } else {
        assert_eq!(fs::read_to_string(&a.output_path).unwrap(), streamed);
    }
}

#[test]
fn json_output_carries_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let mut request = DesignRequest::new(three_templates(dir.path()));
    request.format = OutputFormat::Json;
    request.config = ConfigSource::Preset(Preset::GcPoor);

    let run = run_design(&request).unwrap();
    assert_eq!(run.output_path, dir.path().join("templates.primers.json"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&run.output_path).unwrap()).unwrap();
    let primers = value["primers"].as_array().unwrap();
    assert_eq!(value["metadata"]["total_primers"], primers.len());
    assert_eq!(primers.len(), run.results_written);
    assert_eq!(value["metadata"]["config_summary"]["primer_size_range"], "16-22 bp");
}

#[test]
fn custom_config_file_drives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("custom.json");
    save_config_file(&GC_RICH, &cfg_path, true).unwrap();

    let mut request = DesignRequest::new(three_templates(dir.path()));
    request.config = ConfigSource::File(cfg_path);
    let run = run_design(&request).unwrap();
    assert_eq!(run.config, GC_RICH);
    assert_eq!(run.config_name, "custom (custom.json)");
    assert_eq!(run.attempted, 3);
}

#[test]
fn empty_batch_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BatchOrchestrator::new(WindowScanEngine, ConfigBundle::DEFAULT);
    let batch = orchestrator.run(&[], ScheduleMode::Sequential).unwrap();
    assert_eq!(batch.attempted, 0);
    assert_eq!(batch.success_rate(), 0.0);

    let path = dir.path().join("empty.csv");
    write_results(&batch.results, &path, OutputFormat::Csv, &ConfigBundle::DEFAULT).unwrap();
    assert!(read_rows(&path).is_empty());
    assert_eq!(summarize(&batch.results).unwrap_err(), StatsError::EmptyBatch);
}

#[test]
fn inverted_product_range_is_rejected() {
    let raw = RawConfig {
        product_size_range: vec![200, 100],
        ..RawConfig::default()
    };
    let err = ConfigBundle::validate(&raw).unwrap_err();
    assert!(err.names_field("product_size_range"));
}
