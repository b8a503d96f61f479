//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs the batch pipeline
//! - prints reports/plots
//! - writes optional exports

use std::io;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, Command, ConvertArgs, FoldArgs, PlotArgs, SimulateArgs};
use crate::domain::{ColumnNames, EpochFitOptions, FoldConfig};
use crate::error::AppError;

pub mod pipeline;

use pipeline::RunMode;

/// Entry point for the `lcfold` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Fold(args) => handle_batch(args, RunMode::Fold),
        Command::Estimate(args) => handle_batch(args, RunMode::EstimateOnly),
        Command::Plot(args) => handle_plot(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::ConvertDates(args) => handle_convert(args),
    }
}

/// Log filter used when `RUST_LOG` is unset.
fn default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbose, quiet)));

    // stdout carries tables and plots only.
    let _ = fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn handle_batch(args: FoldArgs, mode: RunMode) -> Result<(), AppError> {
    let config = fold_config_from_args(&args)?;
    let report = pipeline::run_batch(&config, mode)?;

    match mode {
        RunMode::Fold => println!("{}", crate::report::format_batch_summary(&report)),
        RunMode::EstimateOnly => println!("{}", crate::report::format_epoch_table(&report)),
    }

    if mode == RunMode::Fold && config.plot {
        for (name, processed) in report.processed() {
            if let Some(curve) = &processed.curve {
                println!(
                    "{}",
                    crate::plot::render_output_curve(name, curve, config.plot_width, config.plot_height)
                );
            }
        }
    }

    if let Some(path) = &config.report_path {
        crate::io::export::write_report_json(path, &report)?;
        tracing::info!(path = %path.display(), "report written");
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_csv(&args.curve)?;
    let plot = crate::plot::render_saved_curve(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = crate::data::SynthConfig {
        count: args.count,
        seed: args.seed,
        known_epoch_fraction: args.known_epoch_fraction,
        noise: args.noise,
        ..crate::data::SynthConfig::default()
    };
    let objects = crate::data::generate_objects(&config)?;
    let dataset = crate::data::write_dataset(&args.out, &objects)?;

    println!("Manifest: {}", dataset.manifest.display());
    println!("Curves:   {}", dataset.curves_dir.display());
    println!("  {:<12} {:>10} {:>14} {:>8}", "name", "period", "epoch", "known");
    for obj in &objects {
        println!(
            "  {:<12} {:>10.6} {:>14.6} {:>8}",
            obj.name, obj.eclipses.period, obj.eclipses.epoch, obj.epoch_known
        );
    }
    Ok(())
}

fn handle_convert(args: ConvertArgs) -> Result<(), AppError> {
    let converted = crate::io::dates::convert_directory(&args.input, &args.output)?;
    if converted.is_empty() {
        return Err(AppError::new(
            3,
            format!("No convertible CSV files in '{}'.", args.input.display()),
        ));
    }
    for file in &converted {
        println!(
            "{} -> {} (rows={}, bad rows={})",
            file.input.display(),
            file.output.display(),
            file.rows_written,
            file.row_errors.len()
        );
    }
    Ok(())
}

/// Validate flags and build the run configuration.
pub fn fold_config_from_args(args: &FoldArgs) -> Result<FoldConfig, AppError> {
    if !(args.window_fraction.is_finite() && args.window_fraction > 0.0 && args.window_fraction <= 0.5) {
        return Err(AppError::new(2, "--window-fraction must be within (0, 0.5]."));
    }
    if args.jobs == 0 {
        return Err(AppError::new(2, "--jobs must be >= 1."));
    }
    if !args.epoch_offset.is_finite() {
        return Err(AppError::new(2, "--epoch-offset must be finite."));
    }
    if args.prefix.trim().is_empty() {
        return Err(AppError::new(2, "--prefix must not be empty."));
    }

    Ok(FoldConfig {
        manifest_path: args.manifest.clone(),
        curves_dir: args.curves.clone(),
        out_dir: args.out.clone(),
        columns: ColumnNames {
            period: args.period_column.clone(),
            epoch: args.epoch_column.clone(),
            time: args.time_column.clone(),
            flux: args.flux_column.clone(),
        },
        epoch_offset: args.epoch_offset,
        fit: EpochFitOptions {
            window_fraction: args.window_fraction,
            max_iterations: args.max_iterations,
        },
        jobs: args.jobs,
        write_raw: args.with_raw,
        file_prefix: args.prefix.clone(),
        report_path: args.report.clone(),
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold_args(extra: &[&str]) -> FoldArgs {
        let mut argv = vec!["lcfold", "fold", "--manifest", "m.csv", "--curves", "lc"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Fold(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_carries_flags_through() {
        let config = fold_config_from_args(&fold_args(&[
            "--epoch-column",
            "HJD",
            "--window-fraction",
            "0.1",
            "--max-iter",
            "50",
            "--jobs",
            "4",
            "--with-raw",
        ]))
        .unwrap();
        assert_eq!(config.columns.epoch, "HJD");
        assert_eq!(config.fit.window_fraction, 0.1);
        assert_eq!(config.fit.max_iterations, 50);
        assert_eq!(config.jobs, 4);
        assert!(config.write_raw);
    }

    #[test]
    fn bad_flags_are_input_errors() {
        for extra in [
            &["--window-fraction", "0"][..],
            &["--window-fraction", "0.9"][..],
            &["--jobs", "0"][..],
            &["--prefix", " "][..],
        ] {
            let err = fold_config_from_args(&fold_args(extra)).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{extra:?}");
        }
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_log_level(0, false), "info");
        assert_eq!(default_log_level(1, false), "debug");
        assert_eq!(default_log_level(3, false), "trace");
        assert_eq!(default_log_level(2, true), "error");
    }
}
