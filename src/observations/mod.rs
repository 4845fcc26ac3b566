//! # Observations: telemetry records and in-memory datasets
//!
//! An [`Observation`] is one telemetry sample of a moving object: identifier, category,
//! sampling day and position. A [`Dataset`] is an unordered collection of observations
//! that share the same set of *extra columns* (the columns of the source file that the
//! detectors do not interpret but must carry through to their results).
//!
//! Modules
//! -----------------
//! * [`csv_reader`](crate::observations::csv_reader) – Dataset loader for comma-separated files.
//! * [`source`](crate::observations::source) – [`TelemetrySource`](crate::observations::source::TelemetrySource)
//!   capability consumed by the loader.
//!
//! Notes
//! -----------------
//! * Observations are immutable once loaded; the detectors only borrow datasets.
//! * An object may appear several times in a dataset (once per sampling date); no
//!   uniqueness of `object_id` is assumed.
use chrono::NaiveDate;

use crate::constants::{
    Degree, ObjectId, ShipType, DATE_COL, IDX_COL, LAT_COL, LON_COL, TYPE_COL,
};

pub mod csv_reader;
pub mod source;

/// One telemetry record
///
/// # Fields
///
/// * `object_id` - Identifier of the tracked object
/// * `ship_type` - Category of the object, used as the grouping key of the baselines
/// * `date` - Sampling day
/// * `lon` - Longitude in degrees
/// * `lat` - Latitude in degrees
/// * `extra` - Values of the extra columns, aligned with [`Dataset::extra_columns`]
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub object_id: ObjectId,
    pub ship_type: ShipType,
    pub date: NaiveDate,
    pub lon: Degree,
    pub lat: Degree,
    pub extra: Vec<String>,
}

impl Observation {
    /// Create an observation without extra columns
    ///
    /// Arguments
    /// ---------
    /// * `object_id`: identifier of the object
    /// * `ship_type`: category of the object
    /// * `date`: sampling day
    /// * `lon`, `lat`: position in degrees
    ///
    /// Return
    /// ------
    /// * a new Observation
    pub fn new(
        object_id: impl Into<ObjectId>,
        ship_type: impl Into<ShipType>,
        date: NaiveDate,
        lon: Degree,
        lat: Degree,
    ) -> Self {
        Observation {
            object_id: object_id.into(),
            ship_type: ship_type.into(),
            date,
            lon,
            lat,
            extra: Vec::new(),
        }
    }

    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }
}

/// Header names under which the recognised columns were read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub idx: String,
    pub date: String,
    pub lon: String,
    pub lat: String,
    pub ship_type: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            idx: IDX_COL.to_string(),
            date: DATE_COL.to_string(),
            lon: LON_COL.to_string(),
            lat: LAT_COL.to_string(),
            ship_type: TYPE_COL.to_string(),
        }
    }
}

/// A collection of observations sharing the same extra columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    observations: Vec<Observation>,
    extra_columns: Vec<String>,
    column_names: ColumnNames,
}

impl Dataset {
    /// Build a dataset without extra columns.
    ///
    /// Any `extra` value carried by the observations is dropped so that every row stays
    /// aligned with the (empty) column list.
    pub fn new(observations: Vec<Observation>) -> Self {
        let observations = observations
            .into_iter()
            .map(|mut obs| {
                obs.extra.clear();
                obs
            })
            .collect();
        Dataset {
            observations,
            extra_columns: Vec::new(),
            column_names: ColumnNames::default(),
        }
    }

    /// Build a dataset whose observations carry values for `extra_columns`.
    ///
    /// Rows shorter than the column list are padded with empty strings and longer rows
    /// are truncated, so every row has exactly one value per extra column.
    pub fn with_columns(mut observations: Vec<Observation>, extra_columns: Vec<String>) -> Self {
        for obs in observations.iter_mut() {
            obs.extra.resize(extra_columns.len(), String::new());
        }
        Dataset {
            observations,
            extra_columns,
            column_names: ColumnNames::default(),
        }
    }

    /// Replace the header names of the recognised columns.
    pub fn with_column_names(mut self, column_names: ColumnNames) -> Self {
        self.column_names = column_names;
        self
    }

    pub fn column_names(&self) -> &ColumnNames {
        &self.column_names
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Earliest and latest sampling day, `None` for an empty dataset.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.observations.first()?.date;
        Some(
            self.observations
                .iter()
                .fold((first, first), |(lo, hi), obs| (lo.min(obs.date), hi.max(obs.date))),
        )
    }

    /// Keep observations sampled in `[date_min, date_max)`; see [`filter_on_date`].
    pub fn filter_on_date(self, date_min: Option<NaiveDate>, date_max: Option<NaiveDate>) -> Self {
        filter_on_date(self, date_min, date_max)
    }

    /// Rows of `self` followed by the rows of `other`.
    ///
    /// Extra columns are kept only when both datasets declare the same list; otherwise
    /// the concatenation carries the five recognised columns only. Column names are
    /// taken from `self`.
    pub fn concat(&self, other: &Dataset) -> Dataset {
        let observations: Vec<Observation> = self
            .observations
            .iter()
            .chain(other.observations.iter())
            .cloned()
            .collect();

        let concatenated = if self.extra_columns == other.extra_columns {
            Dataset::with_columns(observations, self.extra_columns.clone())
        } else {
            Dataset::new(observations)
        };
        concatenated.with_column_names(self.column_names.clone())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

impl FromIterator<Observation> for Dataset {
    fn from_iter<T: IntoIterator<Item = Observation>>(iter: T) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}

/// Extract the observations sampled in the half-open range `[date_min, date_max)`
///
/// Arguments
/// ---------
/// * `data`: the dataset to filter
/// * `date_min`: first day included, no lower bound when `None`
/// * `date_max`: first day excluded, no upper bound when `None`
///
/// Return
/// ------
/// * the filtered dataset, extra columns unchanged
pub fn filter_on_date(
    data: Dataset,
    date_min: Option<NaiveDate>,
    date_max: Option<NaiveDate>,
) -> Dataset {
    let Dataset {
        observations,
        extra_columns,
        column_names,
    } = data;

    let observations = observations
        .into_iter()
        .filter(|obs| date_min.map_or(true, |min| obs.date >= min))
        .filter(|obs| date_max.map_or(true, |max| obs.date < max))
        .collect();

    Dataset {
        observations,
        extra_columns,
        column_names,
    }
}
