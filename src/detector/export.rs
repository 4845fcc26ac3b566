//! # Export of detection results
//!
//! Writes the results held by a [`Detector`](crate::detector::Detector) as comma-separated
//! files named after a path prefix and an [`ExportStamp`]:
//!
//! ```text
//! {prefix}{YYYYmmdd_HHMMSS}_outliers.csv
//! {prefix}{YYYYmmdd_HHMMSS}_static.csv
//! ```
//!
//! ## Layouts
//! -----------------
//! * **Outliers** – `date,ship_type,count,breach_pct,bound_type`, sorted by date descending,
//!   `breach_pct` rounded to two decimals.
//! * **Static, single window** – `lon,lat,ship_type,count`, in detection order.
//! * **Static, two snapshots** – the position columns followed by the columns of the `t0`
//!   row then the columns of the `t1` row, under the header names they were loaded with.
//!   Column names present on both sides get the `_x` / `_y` suffix.
//!
//! ## Error semantics
//! -----------------
//! Every requested result is checked before anything is written: asking for a result whose
//! detection never ran fails with [`AlertError::ExportBeforeDetect`] and leaves the
//! filesystem untouched. If writing fails midway, the artifacts of the call that were
//! already created are removed before the error is returned.
use std::cmp::Reverse;
use std::fmt;
use std::fs;
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::alert_errors::AlertError;
use crate::constants::{BREACH_PCT_DECIMALS, LAT_COL, LEFT_SUFFIX, LON_COL, RIGHT_SUFFIX, TYPE_COL};
use crate::detector::static_objects::{round_to, SnapshotMatches, StaticShipRecord};
use crate::detector::variation::{BoundType, OutlierRecord};
use crate::detector::StaticShips;
use crate::observations::{ColumnNames, Observation};
use crate::time::ExportStamp;

/// The result categories a detector can export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Outliers,
    Static,
}

impl ResultKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            ResultKind::Outliers => "_outliers",
            ResultKind::Static => "_static",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::Outliers => f.write_str("outliers"),
            ResultKind::Static => f.write_str("static"),
        }
    }
}

/// Which results to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub outliers: bool,
    pub static_ships: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            outliers: true,
            static_ships: true,
        }
    }
}

/// Path of one exported artifact: `{prefix}{stamp}{suffix}.csv`.
pub fn artifact_path(prefix: &str, stamp: &ExportStamp, kind: ResultKind) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{prefix}{stamp}{}.csv", kind.suffix()))
}

#[derive(Serialize)]
struct OutlierRow<'a> {
    date: NaiveDate,
    ship_type: &'a str,
    count: usize,
    breach_pct: f64,
    bound_type: BoundType,
}

#[derive(Serialize)]
struct StaticShipRow<'a> {
    lon: f64,
    lat: f64,
    ship_type: &'a str,
    count: usize,
}

/// Write the requested results
///
/// Arguments
/// -----------------
/// * `prefix`: path prefix, concatenated as-is with the stamp (e.g. `"data/alerts/"`)
/// * `stamp`: timestamp embedded in file names
/// * `options`: which results to write
/// * `outliers`: last large-variation result, if any
/// * `static_ships`: last static-object result, if any
///
/// Return
/// ----------
/// * the paths written, outliers first. On a write error no artifact of this call is
///   left behind.
pub(crate) fn export_results(
    prefix: &str,
    stamp: &ExportStamp,
    options: ExportOptions,
    outliers: Option<&[OutlierRecord]>,
    static_ships: Option<&StaticShips>,
) -> Result<Vec<Utf8PathBuf>, AlertError> {
    let outliers = match (options.outliers, outliers) {
        (true, None) => return Err(AlertError::ExportBeforeDetect(ResultKind::Outliers)),
        (true, Some(records)) => Some(records),
        (false, _) => None,
    };
    let static_ships = match (options.static_ships, static_ships) {
        (true, None) => return Err(AlertError::ExportBeforeDetect(ResultKind::Static)),
        (true, Some(result)) => Some(result),
        (false, _) => None,
    };

    let mut written = Vec::new();
    match write_artifacts(prefix, stamp, outliers, static_ships, &mut written) {
        Ok(()) => Ok(written),
        Err(err) => {
            remove_artifacts(&written);
            Err(err)
        }
    }
}

/// Write each artifact, pushing its path to `written` before the file is created.
fn write_artifacts(
    prefix: &str,
    stamp: &ExportStamp,
    outliers: Option<&[OutlierRecord]>,
    static_ships: Option<&StaticShips>,
    written: &mut Vec<Utf8PathBuf>,
) -> Result<(), AlertError> {
    if let Some(records) = outliers {
        let path = artifact_path(prefix, stamp, ResultKind::Outliers);
        written.push(path.clone());
        write_outliers(&path, records)?;
        info!(path = %path, rows = records.len(), "outliers exported");
    }

    if let Some(result) = static_ships {
        let path = artifact_path(prefix, stamp, ResultKind::Static);
        written.push(path.clone());
        let rows = match result {
            StaticShips::MultiPeriod(records) => {
                write_static_ships(&path, records)?;
                records.len()
            }
            StaticShips::TwoSnapshots(matches) => {
                write_snapshot_matches(&path, matches)?;
                matches.len()
            }
        };
        info!(path = %path, rows, "static objects exported");
    }

    Ok(())
}

fn remove_artifacts(paths: &[Utf8PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => warn!(path = %path, "partial export removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path, error = %err, "cannot remove partial export"),
        }
    }
}

fn create_writer(path: &Utf8Path) -> Result<csv::Writer<fs::File>, AlertError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?)
}

fn finish<W: Write>(mut writer: csv::Writer<W>) -> Result<(), AlertError> {
    writer.flush()?;
    Ok(())
}

fn write_outliers(path: &Utf8Path, records: &[OutlierRecord]) -> Result<(), AlertError> {
    let mut writer = create_writer(path)?;
    writer.write_record(["date", "ship_type", "count", "breach_pct", "bound_type"])?;

    let mut sorted: Vec<&OutlierRecord> = records.iter().collect();
    sorted.sort_by_key(|record| Reverse(record.date));

    for record in sorted {
        writer.serialize(OutlierRow {
            date: record.date,
            ship_type: &record.ship_type,
            count: record.count,
            breach_pct: round_to(record.breach_pct, BREACH_PCT_DECIMALS as u32),
            bound_type: record.bound_type,
        })?;
    }
    finish(writer)
}

fn write_static_ships(path: &Utf8Path, records: &[StaticShipRecord]) -> Result<(), AlertError> {
    let mut writer = create_writer(path)?;
    writer.write_record([LON_COL, LAT_COL, TYPE_COL, "count"])?;
    for record in records {
        writer.serialize(StaticShipRow {
            lon: record.lon,
            lat: record.lat,
            ship_type: &record.ship_type,
            count: record.count,
        })?;
    }
    finish(writer)
}

/// Non-positional columns of one side of the join, in the order of [`side_values`].
fn side_columns(names: &ColumnNames, extra: &[String]) -> Vec<String> {
    [&names.idx, &names.date, &names.ship_type]
        .into_iter()
        .chain(extra)
        .cloned()
        .collect()
}

/// Column names of one side of the join, suffixed where they collide with the other side.
fn side_header(own: &[String], other: &[String], suffix: &str) -> Vec<String> {
    own.iter()
        .map(|name| {
            if other.contains(name) {
                format!("{name}{suffix}")
            } else {
                name.clone()
            }
        })
        .collect()
}

fn side_values(obs: &Observation) -> impl Iterator<Item = String> + '_ {
    [
        obs.object_id.to_string(),
        obs.date.to_string(),
        obs.ship_type.clone(),
    ]
    .into_iter()
    .chain(obs.extra.iter().cloned())
}

fn write_snapshot_matches(path: &Utf8Path, matches: &SnapshotMatches) -> Result<(), AlertError> {
    let mut writer = create_writer(path)?;

    let left = side_columns(&matches.left_names, &matches.left_columns);
    let right = side_columns(&matches.right_names, &matches.right_columns);

    let header: Vec<String> = [matches.left_names.lon.clone(), matches.left_names.lat.clone()]
        .into_iter()
        .chain(side_header(&left, &right, LEFT_SUFFIX))
        .chain(side_header(&right, &left, RIGHT_SUFFIX))
        .collect();
    writer.write_record(&header)?;

    for row in &matches.rows {
        let record: Vec<String> = [row.lon.to_string(), row.lat.to_string()]
            .into_iter()
            .chain(side_values(&row.left))
            .chain(side_values(&row.right))
            .collect();
        writer.write_record(&record)?;
    }
    finish(writer)
}
