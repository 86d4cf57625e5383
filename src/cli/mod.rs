//! Command-line parsing for the batch primer designer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! design and I/O code. `app` turns these structs into library calls.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Preset;
use crate::domain::OutputFormat;
use crate::io::ingest::DEFAULT_MIN_LENGTH;
use crate::logging::LogLevel;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "primer-designer",
    version,
    about = "Batch PCR primer design for FASTA files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Logging verbosity (RUST_LOG overrides this when set).
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Append log messages to this file instead of stderr.
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Design primer pairs for every sequence in a FASTA file.
    Design(DesignArgs),
    /// Check a FASTA file and report valid/invalid sequences.
    Validate(ValidateArgs),
    /// Show every parameter of a preset.
    ConfigInfo(ConfigInfoArgs),
    /// Write (or print) a JSON configuration template for `--custom-config`.
    ExportTemplate(ExportTemplateArgs),
    /// List the built-in presets.
    ListConfigs,
    /// Write a FASTA file of random sequences for testing.
    GenerateTestData(GenerateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct DesignArgs {
    /// Input FASTA file.
    #[arg(value_name = "FASTA")]
    pub input: PathBuf,

    /// Output path. Defaults to `<input stem>.primers.<format>`.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Parameter preset (ignored with --custom-config).
    #[arg(short = 'c', long = "config", value_enum, default_value_t = Preset::Standard)]
    pub preset: Preset,

    /// JSON configuration file (see `export-template`).
    #[arg(long, value_name = "JSON")]
    pub custom_config: Option<PathBuf>,

    /// Use a worker pool (the default).
    #[arg(long, overrides_with = "no_parallel")]
    pub parallel: bool,

    /// Process sequences one at a time, in input order.
    #[arg(long, overrides_with = "parallel")]
    pub no_parallel: bool,

    /// Worker threads (1-32). Defaults to the number of CPUs.
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub workers: Option<u8>,

    /// Stream sequences one by one; results go straight to the output file.
    #[arg(long)]
    pub memory_efficient: bool,

    /// Primer pairs to keep per sequence (1-5).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub pairs: u8,

    /// Minimum sequence length accepted from the FASTA file.
    #[arg(long, default_value_t = DEFAULT_MIN_LENGTH)]
    pub min_length: usize,

    /// Print Tm / GC / product size statistics.
    #[arg(long)]
    pub stats: bool,

    /// Only validate the FASTA file.
    #[arg(long)]
    pub validate_only: bool,
}

impl DesignArgs {
    pub fn use_parallel(&self) -> bool {
        !self.no_parallel
    }
}

#[derive(Debug, Args, Clone)]
pub struct ValidateArgs {
    /// FASTA file to check.
    #[arg(value_name = "FASTA")]
    pub input: PathBuf,

    /// Minimum sequence length counted as valid.
    #[arg(long, default_value_t = DEFAULT_MIN_LENGTH)]
    pub min_length: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ConfigInfoArgs {
    #[arg(value_enum, default_value_t = Preset::Standard)]
    pub preset: Preset,
}

#[derive(Debug, Args, Clone)]
pub struct ExportTemplateArgs {
    /// Template path. Defaults to `primer_config_template.json`
    /// (`primer_config_documented_template.json` with --documented).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Start from a preset instead of the defaults.
    #[arg(short, long, value_enum)]
    pub preset: Option<Preset>,

    /// Print the template instead of writing it.
    #[arg(long)]
    pub show: bool,

    /// Print parameter bounds and descriptions, then exit.
    #[arg(long)]
    pub show_params: bool,

    /// Include `_parameter_info` in the template.
    #[arg(long)]
    pub documented: bool,
}

impl ExportTemplateArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            if self.documented {
                PathBuf::from("primer_config_documented_template.json")
            } else {
                PathBuf::from("primer_config_template.json")
            }
        })
    }
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Output FASTA path.
    #[arg(short, long, default_value = "test_sequences.fasta")]
    pub output: PathBuf,

    /// Number of sequences.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,

    #[arg(long, default_value_t = 200)]
    pub min_length: usize,

    #[arg(long, default_value_t = 2000)]
    pub max_length: usize,

    /// Lowest GC fraction (0-1).
    #[arg(long, default_value_t = 0.3)]
    pub gc_min: f64,

    /// Highest GC fraction (0-1).
    #[arg(long, default_value_t = 0.7)]
    pub gc_max: f64,

    /// Seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,
}
