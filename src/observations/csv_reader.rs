//! # CSV dataset loader
//!
//! Reads comma-separated telemetry rows from any [`TelemetrySource`] into a [`Dataset`].
//!
//! ## Expected columns
//! -----------------
//! The header must contain (at least) the following columns, whose names are set by
//! [`LoadOptions`]:
//! - identifier (`id` by default),
//! - sampling date (`date` by default), parsed at day granularity with
//!   [`parse_day`](crate::time::parse_day),
//! - `lon`, `lat`: position in **degrees**, parsed as `f64`,
//! - `ship_type`: object category.
//!
//! Any other column is kept verbatim, in header order, as an *extra column* of the dataset.
//!
//! ## Error policy
//! -----------------
//! Loading fails fast: a missing column, an empty required cell, an unparseable date or
//! position, or a row with the wrong number of fields aborts the load with
//! [`AlertError::DataFormat`]. Nothing is silently coerced.
//!
//! ## Date range
//! -----------------
//! When `date_min` and/or `date_max` are set, rows outside `[date_min, date_max)` are
//! dropped after parsing (see [`filter_on_date`]). The whole file is still validated.
use camino::Utf8Path;
use chrono::NaiveDate;
use csv::{ErrorKind, StringRecord};
use tracing::{debug, info};

use crate::alert_errors::{AlertError, DataFormatError};
use crate::constants::{ObjectId, DATE_COL, IDX_COL, LAT_COL, LON_COL, TYPE_COL};
use crate::observations::source::{CsvFile, TelemetrySource};
use crate::observations::{filter_on_date, ColumnNames, Dataset, Observation};
use crate::time::parse_day;

/// Column names and date window used by the [`DatasetLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub idx_col: String,
    pub date_col: String,
    pub lon_col: String,
    pub lat_col: String,
    pub type_col: String,
    /// First day kept (inclusive).
    pub date_min: Option<NaiveDate>,
    /// First day dropped (exclusive).
    pub date_max: Option<NaiveDate>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            idx_col: IDX_COL.to_string(),
            date_col: DATE_COL.to_string(),
            lon_col: LON_COL.to_string(),
            lat_col: LAT_COL.to_string(),
            type_col: TYPE_COL.to_string(),
            date_min: None,
            date_max: None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idx_col(mut self, name: impl Into<String>) -> Self {
        self.idx_col = name.into();
        self
    }

    pub fn date_col(mut self, name: impl Into<String>) -> Self {
        self.date_col = name.into();
        self
    }

    pub fn date_min(mut self, date: Option<NaiveDate>) -> Self {
        self.date_min = date;
        self
    }

    pub fn date_max(mut self, date: Option<NaiveDate>) -> Self {
        self.date_max = date;
        self
    }

    /// Header names of the recognised columns, as carried by the loaded dataset.
    pub fn column_names(&self) -> ColumnNames {
        ColumnNames {
            idx: self.idx_col.clone(),
            date: self.date_col.clone(),
            lon: self.lon_col.clone(),
            lat: self.lat_col.clone(),
            ship_type: self.type_col.clone(),
        }
    }
}

/// Header positions of the recognised columns.
struct ColumnLayout<'a> {
    options: &'a LoadOptions,
    idx: usize,
    date: usize,
    lon: usize,
    lat: usize,
    ship_type: usize,
    extras: Vec<(usize, String)>,
}

impl<'a> ColumnLayout<'a> {
    fn resolve(headers: &StringRecord, options: &'a LoadOptions) -> Result<Self, DataFormatError> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataFormatError::MissingColumn(name.to_string()))
        };

        let idx = position(&options.idx_col)?;
        let date = position(&options.date_col)?;
        let lon = position(&options.lon_col)?;
        let lat = position(&options.lat_col)?;
        let ship_type = position(&options.type_col)?;

        let known = [idx, date, lon, lat, ship_type];
        let extras = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !known.contains(i))
            .map(|(i, name)| (i, name.to_string()))
            .collect();

        Ok(ColumnLayout {
            options,
            idx,
            date,
            lon,
            lat,
            ship_type,
            extras,
        })
    }

    fn extra_names(&self) -> Vec<String> {
        self.extras.iter().map(|(_, name)| name.clone()).collect()
    }

    fn parse(&self, record: &StringRecord) -> Result<Observation, DataFormatError> {
        let line = record.position().map_or(0, |p| p.line());
        let opts = self.options;

        let raw_date = required_field(record, self.date, &opts.date_col, line)?;
        let date = parse_day(raw_date).ok_or_else(|| DataFormatError::InvalidDate {
            column: opts.date_col.clone(),
            value: raw_date.to_string(),
            line,
        })?;

        let extra = self
            .extras
            .iter()
            .map(|(i, _)| record.get(*i).unwrap_or_default().to_string())
            .collect();

        Ok(Observation {
            object_id: ObjectId::from(required_field(record, self.idx, &opts.idx_col, line)?),
            ship_type: required_field(record, self.ship_type, &opts.type_col, line)?.to_string(),
            date,
            lon: float_field(record, self.lon, &opts.lon_col, line)?,
            lat: float_field(record, self.lat, &opts.lat_col, line)?,
            extra,
        })
    }
}

fn required_field<'r>(
    record: &'r StringRecord,
    idx: usize,
    column: &str,
    line: u64,
) -> Result<&'r str, DataFormatError> {
    match record.get(idx) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(DataFormatError::EmptyField {
            column: column.to_string(),
            line,
        }),
    }
}

fn float_field(
    record: &StringRecord,
    idx: usize,
    column: &str,
    line: u64,
) -> Result<f64, DataFormatError> {
    let value = required_field(record, idx, column, line)?;
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DataFormatError::InvalidNumber {
            column: column.to_string(),
            value: value.to_string(),
            line,
        })
}

/// Turns a [`TelemetrySource`] into a [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct DatasetLoader {
    options: LoadOptions,
}

impl DatasetLoader {
    pub fn new(options: LoadOptions) -> Self {
        DatasetLoader { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Read and validate every row of `source`
    ///
    /// Arguments
    /// -----------------
    /// * `source`: where the comma-separated rows come from
    ///
    /// Return
    /// ----------
    /// * the dataset restricted to the configured date window, or
    ///   [`AlertError::DataFormat`] on the first malformed row,
    ///   [`AlertError::IoError`] if the source cannot be opened.
    pub fn load<S: TelemetrySource + ?Sized>(&self, source: &S) -> Result<Dataset, AlertError> {
        let name = source.describe();
        let reader = source.open()?;

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let layout = ColumnLayout::resolve(&headers, &self.options)
            .map_err(|e| AlertError::data_format(&name, e))?;

        let mut observations = Vec::new();
        for result in csv_reader.records() {
            let record = result.map_err(|e| record_error(&name, e))?;
            let observation = layout
                .parse(&record)
                .map_err(|e| AlertError::data_format(&name, e))?;
            observations.push(observation);
        }

        let total = observations.len();
        let dataset = filter_on_date(
            Dataset::with_columns(observations, layout.extra_names())
                .with_column_names(self.options.column_names()),
            self.options.date_min,
            self.options.date_max,
        );

        debug!(
            source = %name,
            extra_columns = ?dataset.extra_columns(),
            "parsed {total} rows"
        );
        info!(
            source = %name,
            kept = dataset.len(),
            dropped = total - dataset.len(),
            "telemetry loaded"
        );

        Ok(dataset)
    }
}

fn record_error(name: &str, err: csv::Error) -> AlertError {
    match err.kind() {
        ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => AlertError::data_format(
            name,
            DataFormatError::RecordLength {
                line: pos.as_ref().map_or(0, |p| p.line()),
                expected: *expected_len,
                found: *len,
            },
        ),
        _ => AlertError::CsvError(err),
    }
}

/// Load a comma-separated telemetry file
///
/// Arguments
/// -----------------
/// * `path`: path to the data file
/// * `options`: column names and optional `[date_min, date_max)` window
///
/// Return
/// ----------
/// * the loaded [`Dataset`] or the first loading error
pub fn load_data(path: impl AsRef<Utf8Path>, options: &LoadOptions) -> Result<Dataset, AlertError> {
    DatasetLoader::new(options.clone()).load(&CsvFile::new(path))
}

#[cfg(test)]
mod csv_reader_test {
    use super::*;
    use crate::observations::source::InMemorySource;

    fn load(content: &str) -> Result<Dataset, AlertError> {
        DatasetLoader::default().load(&InMemorySource::new("test", content))
    }

    #[test]
    fn test_load_with_extra_columns() {
        let dataset = load(
            "id,date,lon,lat,ship_type,speed\n\
             1,2020-01-01,3.1415,8.325,freighter,12.5\n\
             b7,2020-01-02 10:00:00,-1.5,2.0,scout,\n",
        )
        .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.extra_columns(), ["speed".to_string()]);

        let first = &dataset.observations()[0];
        assert_eq!(first.object_id, ObjectId::Int(1));
        assert_eq!(first.ship_type, "freighter");
        assert_eq!(first.lon, 3.1415);
        assert_eq!(first.lat, 8.325);
        assert_eq!(first.extra, vec!["12.5"]);

        let second = &dataset.observations()[1];
        assert_eq!(second.object_id, ObjectId::String("b7".into()));
        assert_eq!(dataset.column_names(), &ColumnNames::default());
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(second.extra, vec![""]);
    }

    #[test]
    fn test_missing_column() {
        let err = load("id,date,lon,ship_type\n1,2020-01-01,3.0,scout\n").unwrap_err();
        match err {
            AlertError::DataFormat { error, .. } => {
                assert_eq!(error, DataFormatError::MissingColumn("lat".into()))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparseable_date() {
        let err = load("id,date,lon,lat,ship_type\n1,not-a-date,3.0,1.0,scout\n").unwrap_err();
        assert!(matches!(
            err,
            AlertError::DataFormat {
                error: DataFormatError::InvalidDate { line: 2, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_unparseable_position() {
        let err = load("id,date,lon,lat,ship_type\n1,2020-01-01,east,1.0,scout\n").unwrap_err();
        assert!(matches!(
            err,
            AlertError::DataFormat {
                error: DataFormatError::InvalidNumber { .. },
                ..
            }
        ));

        let err = load("id,date,lon,lat,ship_type\n1,2020-01-01,NaN,1.0,scout\n").unwrap_err();
        assert!(matches!(err, AlertError::DataFormat { .. }));
    }

    #[test]
    fn test_empty_required_field() {
        let err = load("id,date,lon,lat,ship_type\n1,2020-01-01,1.0,1.0,\n").unwrap_err();
        assert!(matches!(
            err,
            AlertError::DataFormat {
                error: DataFormatError::EmptyField { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_ragged_row() {
        let err = load("id,date,lon,lat,ship_type\n1,2020-01-01,1.0,1.0\n").unwrap_err();
        assert!(matches!(
            err,
            AlertError::DataFormat {
                error: DataFormatError::RecordLength {
                    expected: 5,
                    found: 4,
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn test_custom_columns_and_date_window() {
        let options = LoadOptions::new()
            .idx_col("uid")
            .date_col("day")
            .date_min(NaiveDate::from_ymd_opt(2020, 1, 2))
            .date_max(NaiveDate::from_ymd_opt(2020, 1, 3));
        let source = InMemorySource::new(
            "custom",
            "uid,day,lon,lat,ship_type\n\
             1,2020-01-01,0,0,scout\n\
             2,2020-01-02,0,0,scout\n\
             3,2020-01-03,0,0,scout\n",
        );

        let dataset = DatasetLoader::new(options).load(&source).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.observations()[0].object_id, ObjectId::Int(2));
        assert_eq!(dataset.column_names().idx, "uid");
        assert_eq!(dataset.column_names().date, "day");
        assert_eq!(dataset.column_names().ship_type, "ship_type");
    }
}
