//! Command-line parsing for the light-curve folder.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimation/folding code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "lcfold",
    version,
    about = "Eclipse epoch estimation and phase folding for eclipsing binaries"
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate epochs, fold every object and write one curve CSV per object.
    Fold(FoldArgs),
    /// Estimate epochs and print the epoch table only (writes nothing).
    Estimate(FoldArgs),
    /// Plot a previously written curve CSV.
    Plot(PlotArgs),
    /// Generate a synthetic manifest + light curves with known epochs.
    Simulate(SimulateArgs),
    /// Convert `time,flux` tables with calendar timestamps into `jd,flux`.
    ConvertDates(ConvertArgs),
}

/// Options shared by `fold` and `estimate`.
#[derive(Debug, Args, Clone)]
pub struct FoldArgs {
    /// Object manifest CSV (name, period, optional epoch).
    #[arg(long, env = "LCFOLD_MANIFEST", value_name = "CSV")]
    pub manifest: PathBuf,

    /// Directory holding one light-curve CSV per object.
    #[arg(long, env = "LCFOLD_CURVES", value_name = "DIR")]
    pub curves: PathBuf,

    /// Output directory for folded curves.
    #[arg(long, env = "LCFOLD_OUT", value_name = "DIR", default_value = "output")]
    pub out: PathBuf,

    /// Manifest column holding the period (days).
    #[arg(long, default_value = "period")]
    pub period_column: String,

    /// Manifest column holding the external epoch.
    #[arg(long, default_value = "jd_min")]
    pub epoch_column: String,

    /// Subtracted from every external epoch (e.g. 2450000 for reduced JD).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub epoch_offset: f64,

    /// Light-curve time column.
    #[arg(long, default_value = "jd")]
    pub time_column: String,

    /// Light-curve flux column.
    #[arg(long, default_value = "flux")]
    pub flux_column: String,

    /// Fit window half-width as a fraction of the period.
    #[arg(long, default_value_t = 0.2)]
    pub window_fraction: f64,

    /// Iteration budget of the peak fit.
    #[arg(long = "max-iter", default_value_t = 200)]
    pub max_iterations: usize,

    /// Worker threads (1 = sequential).
    #[arg(short = 'j', long, default_value_t = 1)]
    pub jobs: usize,

    /// Also write the raw `time,flux` columns.
    #[arg(long)]
    pub with_raw: bool,

    /// Output file name prefix.
    #[arg(long, default_value = "lc")]
    pub prefix: String,

    /// Write the batch report as JSON.
    #[arg(long, value_name = "JSON")]
    pub report: Option<PathBuf>,

    /// Print an ASCII plot per folded object.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for plotting a saved curve.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Curve CSV written by `lcfold fold`.
    #[arg(long, value_name = "CSV")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for synthetic data generation.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Output directory (manifest + `curves/`).
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Number of objects.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Share of objects whose epoch is written to the manifest.
    #[arg(long, default_value_t = 0.5)]
    pub known_epoch_fraction: f64,

    /// Noise sigma (flux units, baseline 1).
    #[arg(long, default_value_t = 0.002)]
    pub noise: f64,
}

/// Options for calendar → JD conversion.
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Directory of `time,flux` CSV files.
    #[arg(long, value_name = "DIR")]
    pub input: PathBuf,

    /// Directory for the converted `jd,flux` files.
    #[arg(long, value_name = "DIR")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_defaults() {
        let cli = Cli::parse_from(["lcfold", "fold", "--manifest", "m.csv", "--curves", "lc"]);
        let Command::Fold(args) = cli.command else {
            panic!("expected fold");
        };
        assert_eq!(args.period_column, "period");
        assert_eq!(args.epoch_column, "jd_min");
        assert_eq!(args.window_fraction, 0.2);
        assert_eq!(args.max_iterations, 200);
        assert_eq!(args.jobs, 1);
        assert_eq!(args.prefix, "lc");
        assert!(!args.with_raw);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn global_verbosity_after_subcommand() {
        let cli = Cli::parse_from([
            "lcfold", "estimate", "--manifest", "m.csv", "--curves", "lc", "-vv", "--epoch-offset",
            "-2450000",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(args.epoch_offset, -2_450_000.0);
    }

    #[test]
    fn convert_dates_subcommand_name() {
        let cli = Cli::parse_from(["lcfold", "convert-dates", "--input", "a", "--output", "b"]);
        assert!(matches!(cli.command, Command::ConvertDates(_)));
    }
}
