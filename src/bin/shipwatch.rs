//! # shipwatch
//!
//! Command-line driver: loads a reference and a comparison period, runs the detectors
//! and exports the alerts.
//!
//! ```text
//! shipwatch detect --ref data/starships_clean.csv --date-min 2020-01-01 --date-max 2020-10-01
//! shipwatch detect --ref data/snap_1.csv --new data/snap_2.csv --snaps --smooth-snaps 3 -v
//! ```
use std::process::ExitCode;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use shipwatch::constants::Precision;
use shipwatch::display::{OutliersTable, StaticShipsDisplay};
use shipwatch::logging::init_logging;
use shipwatch::settings::{AlertSettings, AlertSettingsBuilder};
use shipwatch::time::{parse_day_strict, ExportStamp};
use shipwatch::{AlertError, Detector, ExportOptions};

#[derive(Parser)]
#[command(name = "shipwatch")]
#[command(about = "Behavioral anomaly alerts over moving-object telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detectors and export the alerts
    Detect(DetectArgs),
}

#[derive(clap::Args)]
struct DetectArgs {
    /// Reference period CSV (also the single input in split mode)
    #[arg(long = "ref")]
    path_ref: Option<Utf8PathBuf>,

    /// Comparison period CSV; without it the reference file is split at --date-min
    #[arg(long = "new")]
    path_new: Option<Utf8PathBuf>,

    /// Export path prefix (a directory must end with '/')
    #[arg(short = 'o', long = "out")]
    path_alerts: Option<String>,

    /// Number of standard deviations tolerated around the mean daily count
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Minimum number of repeated sightings of a static position
    #[arg(long)]
    n_periods_min: Option<usize>,

    /// Decimals kept on positions for the single-window detection ("none" disables)
    #[arg(long, value_parser = parse_smooth)]
    smooth: Option<Smoothing>,

    /// Decimals kept on positions for the two-snapshot detection ("none" disables)
    #[arg(long, value_parser = parse_smooth)]
    smooth_snaps: Option<Smoothing>,

    /// First day of the comparison period (inclusive)
    #[arg(long, value_parser = parse_date)]
    date_min: Option<NaiveDate>,

    /// End of the comparison period (exclusive)
    #[arg(long, value_parser = parse_date)]
    date_max: Option<NaiveDate>,

    /// TOML settings file, overridden by the flags above
    #[arg(short, long, env = "SHIPWATCH_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Use the two-snapshot static detection instead of the single-window one
    #[arg(long)]
    snaps: bool,

    /// Do not export the large-variation outliers
    #[arg(long)]
    no_outliers: bool,

    /// Do not export the static objects
    #[arg(long)]
    no_static: bool,

    /// Export timestamp (YYYYmmdd_HHMMSS), current local time by default
    #[arg(long, value_parser = parse_stamp)]
    stamp: Option<ExportStamp>,

    /// Print the result tables on stdout
    #[arg(short, long)]
    verbose: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

/// Rounding precision given on the command line, `None` when disabled.
#[derive(Debug, Clone, Copy)]
struct Smoothing(Option<Precision>);

fn parse_smooth(value: &str) -> Result<Smoothing, String> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(Smoothing(None));
    }
    value
        .parse::<Precision>()
        .map(|d| Smoothing(Some(d)))
        .map_err(|e| format!("expected a number of decimals or 'none': {e}"))
}

fn parse_stamp(value: &str) -> Result<ExportStamp, String> {
    value.parse().map_err(|e: AlertError| e.to_string())
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_day_strict(value).map_err(|e| e.to_string())
}

impl DetectArgs {
    fn settings(&self) -> Result<AlertSettings, AlertError> {
        let mut builder = match &self.config {
            Some(path) => AlertSettingsBuilder::from_toml_file(path)?,
            None => AlertSettings::builder(),
        };

        if let Some(v) = &self.path_ref {
            builder = builder.path_ref(v.clone());
        }
        if let Some(v) = &self.path_new {
            builder = builder.path_new(v.clone());
        }
        if let Some(v) = &self.path_alerts {
            builder = builder.path_alerts(v.clone());
        }
        if let Some(v) = self.threshold {
            builder = builder.threshold(v);
        }
        if let Some(v) = self.n_periods_min {
            builder = builder.n_periods_min(v);
        }
        if let Some(Smoothing(v)) = self.smooth {
            builder = builder.smooth(v);
        }
        if let Some(Smoothing(v)) = self.smooth_snaps {
            builder = builder.smooth_snaps(v);
        }
        if let Some(v) = self.date_min {
            builder = builder.date_min(v);
        }
        if let Some(v) = self.date_max {
            builder = builder.date_max(v);
        }
        if let Some(v) = &self.log_level {
            builder = builder.log_level(v.clone());
        }
        builder.build()
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            outliers: !self.no_outliers,
            static_ships: !self.no_static,
        }
    }
}

fn detect(args: &DetectArgs) -> Result<(), AlertError> {
    let settings = args.settings()?;
    init_logging(&settings.log_level)?;

    let (data_t0, data_t1) = settings.load_periods()?;
    info!(
        t0 = data_t0.len(),
        t1 = data_t1.len(),
        span_t0 = ?data_t0.date_span(),
        span_t1 = ?data_t1.date_span(),
        "periods loaded"
    );

    let mut detector = Detector::new(data_t0, data_t1);

    let report = detector.detect_large_variations(settings.threshold)?;
    if args.verbose {
        println!("{}", OutliersTable::new(&report.outliers).with_bound(true));
    }

    if args.snaps {
        detector.detect_static_objects_2_snaps(settings.smooth_snaps);
    } else {
        detector.detect_static_objects(settings.n_periods_min, settings.smooth)?;
    }
    if args.verbose {
        if let Some(static_ships) = detector.static_ships() {
            println!("{}", StaticShipsDisplay(static_ships));
        }
    }

    let stamp = args.stamp.unwrap_or_else(ExportStamp::now);
    for path in detector.export(&settings.path_alerts, &stamp, args.export_options())? {
        println!("{path}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Detect(args) => detect(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
