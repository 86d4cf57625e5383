//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - dispatches each subcommand to the library
//! - prints reports

use clap::Parser;

use crate::cli::{
    Cli, Command, ConfigInfoArgs, DesignArgs, ExportTemplateArgs, GenerateArgs, ValidateArgs,
};
use crate::config::ConfigBundle;
use crate::data::{TestDataSpec, write_test_fasta};
use crate::domain::ScheduleMode;
use crate::error::AppError;
use crate::io::config_file::{config_to_json, save_config_file};
use crate::report::{
    format_batch_outcome, format_config_detail, format_config_summary, format_failures,
    format_fasta_report, format_parameter_info, format_preset_table, format_stats,
};

use self::pipeline::{ConfigSource, DesignRequest, check_fasta, run_design};

pub mod pipeline;

/// Failure lines printed after a design run.
const FAILURE_LINES: usize = 10;

/// Entry point for the `primer-designer` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::logging::init_logging(cli.log_level, cli.log_file.as_deref())?;

    match cli.command {
        Command::Design(args) => handle_design(args),
        Command::Validate(args) => handle_validate(args),
        Command::ConfigInfo(args) => handle_config_info(args),
        Command::ExportTemplate(args) => handle_export_template(args),
        Command::ListConfigs => handle_list_configs(),
        Command::GenerateTestData(args) => handle_generate(args),
    }
}

fn handle_design(args: DesignArgs) -> Result<(), AppError> {
    if args.validate_only {
        let report = check_fasta(&args.input, args.min_length)?;
        println!("{}", format_fasta_report(&report));
        println!("FASTA file validation completed.");
        return Ok(());
    }

    let request = design_request_from_args(&args);
    let run = run_design(&request)?;

    println!("{}", format_fasta_report(&run.fasta));
    println!("{}", format_config_summary(&run.config_name, &run.config));
    println!(
        "{}",
        format_batch_outcome(
            run.attempted,
            run.succeeded,
            run.results_written,
            &run.failures
        )
    );
    if !run.failures.is_empty() {
        println!("Failures:");
        println!("{}", format_failures(&run.failures, FAILURE_LINES));
    }
    println!("Results written to {}", run.output_path.display());

    if args.stats {
        match &run.stats {
            Some(stats) => println!("\n{}", format_stats(stats)),
            None if request.streaming => {
                println!("\nStatistics are not collected with --memory-efficient.")
            }
            None => println!("\nNo primers designed; no statistics to show."),
        }
    }
    Ok(())
}

pub fn design_request_from_args(args: &DesignArgs) -> DesignRequest {
    let schedule = if args.use_parallel() {
        ScheduleMode::Parallel {
            workers: args.workers.map(usize::from),
        }
    } else {
        ScheduleMode::Sequential
    };
    let config = match &args.custom_config {
        Some(path) => ConfigSource::File(path.clone()),
        None => ConfigSource::Preset(args.preset),
    };

    DesignRequest {
        input: args.input.clone(),
        output: args.output.clone(),
        format: args.format,
        config,
        schedule,
        streaming: args.memory_efficient,
        pairs_per_sequence: usize::from(args.pairs),
        min_length: args.min_length,
    }
}

fn handle_validate(args: ValidateArgs) -> Result<(), AppError> {
    let report = check_fasta(&args.input, args.min_length)?;
    println!("{}", format_fasta_report(&report));
    println!("FASTA file is valid for primer design.");
    Ok(())
}

fn handle_config_info(args: ConfigInfoArgs) -> Result<(), AppError> {
    println!(
        "{}",
        format_config_detail(args.preset.name(), args.preset.bundle())
    );
    Ok(())
}

fn handle_export_template(args: ExportTemplateArgs) -> Result<(), AppError> {
    if args.show_params {
        println!("{}", format_parameter_info());
        return Ok(());
    }

    let config = match args.preset {
        Some(preset) => *preset.bundle(),
        None => ConfigBundle::DEFAULT,
    };

    if args.show {
        let json = config_to_json(&config, args.documented)
            .map_err(|e| AppError::new(4, format!("Failed to render template: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    let path = args.output_path();
    save_config_file(&config, &path, args.documented)?;
    println!("Configuration template exported to {}", path.display());
    if args.documented {
        println!("The template includes parameter documentation and bounds.");
    }
    println!("Edit it and pass it with: --custom-config {}", path.display());
    Ok(())
}

fn handle_list_configs() -> Result<(), AppError> {
    println!("{}", format_preset_table());
    println!("Use `primer-designer config-info <preset>` for every parameter.");
    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let spec = TestDataSpec {
        count: args.count,
        min_length: args.min_length,
        max_length: args.max_length,
        gc_min: args.gc_min,
        gc_max: args.gc_max,
        seed: args.seed,
    };
    let n = write_test_fasta(&args.output, &spec)?;
    println!("Wrote {n} test sequences to {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use crate::domain::OutputFormat;
    use std::path::PathBuf;

    fn design_args(argv: &[&str]) -> DesignArgs {
        let cli = Cli::try_parse_from(
            ["primer-designer", "design", "in.fasta"]
                .into_iter()
                .chain(argv.iter().copied()),
        )
        .unwrap();
        match cli.command {
            Command::Design(args) => args,
            other => panic!("expected design, got {other:?}"),
        }
    }

    #[test]
    fn request_mirrors_flags() {
        let req = design_request_from_args(&design_args(&["-w", "3", "--pairs", "2"]));
        assert_eq!(req.schedule, ScheduleMode::Parallel { workers: Some(3) });
        assert_eq!(req.pairs_per_sequence, 2);
        assert_eq!(req.config, ConfigSource::Preset(Preset::Standard));
        assert_eq!(req.output_path(), PathBuf::from("in.primers.csv"));

        let req = design_request_from_args(&design_args(&[
            "--no-parallel",
            "--custom-config",
            "my.json",
            "-f",
            "json",
            "--memory-efficient",
        ]));
        assert_eq!(req.schedule, ScheduleMode::Sequential);
        assert_eq!(req.config, ConfigSource::File(PathBuf::from("my.json")));
        assert_eq!(req.format, OutputFormat::Json);
        assert!(req.streaming);
        assert_eq!(req.output_path(), PathBuf::from("in.primers.json"));
    }
}
