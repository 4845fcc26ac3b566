//! # Run settings
//!
//! [`AlertSettings`] gathers every knob of one alert run: where to read the two periods,
//! where to write the alerts, and the sensitivity of each detector.
//!
//! ## Period selection
//! -----------------
//! * **Two files** (`path_new` set): `t0` is read from `path_ref`, `t1` from `path_new`,
//!   both restricted to `[date_min, date_max)` when those are set.
//! * **Split** (`path_new` unset): a single file is cut at `date_min`,
//!   `t0 = [.., date_min)` and `t1 = [date_min, date_max)`. `date_min` is required.
//!
//! ## Sources
//! -----------------
//! Settings are assembled with [`AlertSettingsBuilder`], either from scratch or on top of a
//! TOML file ([`AlertSettingsBuilder::from_toml_file`]):
//!
//! ```toml
//! path_ref = "data/starships_clean.csv"
//! path_alerts = "data/alerts/"
//! threshold = 1.7
//! n_periods_min = 1
//! smooth = 5
//! smooth_snaps = false   # no rounding
//! date_min = "2020-01-01"
//! date_max = "2020-10-01"
//! ```
//!
//! Every value is checked by [`AlertSettingsBuilder::build`].
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::alert_errors::AlertError;
use crate::constants::{
    Precision, DATE_COL, DEFAULT_SMOOTH, DEFAULT_SMOOTH_SNAPS, DEFAULT_THRESHOLD, IDX_COL,
    PATH_ALERTS,
};
use crate::observations::csv_reader::{load_data, LoadOptions};
use crate::observations::Dataset;

/// Validated settings of an alert run.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSettings {
    pub path_ref: Utf8PathBuf,
    pub path_new: Option<Utf8PathBuf>,
    /// Prefix of the exported files.
    pub path_alerts: String,
    pub threshold: f64,
    pub n_periods_min: usize,
    pub smooth: Option<Precision>,
    pub smooth_snaps: Option<Precision>,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub idx_col: String,
    pub date_col: String,
    pub log_level: String,
}

impl AlertSettings {
    pub fn builder() -> AlertSettingsBuilder {
        AlertSettingsBuilder::new()
    }

    /// Loader options shared by both periods (column names only).
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::new()
            .idx_col(&self.idx_col)
            .date_col(&self.date_col)
    }

    /// Load the reference and comparison periods
    ///
    /// Return
    /// ----------
    /// * `(t0, t1)` according to the period selection mode, or the first loading error
    pub fn load_periods(&self) -> Result<(Dataset, Dataset), AlertError> {
        let options = self.load_options();
        match &self.path_new {
            Some(path_new) => {
                let window = options.date_min(self.date_min).date_max(self.date_max);
                let t0 = load_data(&self.path_ref, &window)?;
                let t1 = load_data(path_new, &window)?;
                Ok((t0, t1))
            }
            None => {
                let all = load_data(&self.path_ref, &options)?;
                let t1 = all.clone().filter_on_date(self.date_min, self.date_max);
                let t0 = all.filter_on_date(None, self.date_min);
                debug!(t0 = t0.len(), t1 = t1.len(), cut = ?self.date_min, "split reference file");
                Ok((t0, t1))
            }
        }
    }
}

/// A rounding precision as written in a settings file: a number of digits, or `false`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
enum SmoothSetting {
    Digits(Precision),
    Enabled(bool),
}

impl SmoothSetting {
    fn into_precision(self) -> Result<Option<Precision>, AlertError> {
        match self {
            SmoothSetting::Digits(d) => Ok(Some(d)),
            SmoothSetting::Enabled(false) => Ok(None),
            SmoothSetting::Enabled(true) => Err(AlertError::InvalidParameter(
                "smoothing must be a number of decimals or false".into(),
            )),
        }
    }
}

/// Content of a settings file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    path_ref: Option<Utf8PathBuf>,
    path_new: Option<Utf8PathBuf>,
    path_alerts: Option<String>,
    threshold: Option<f64>,
    n_periods_min: Option<usize>,
    smooth: Option<SmoothSetting>,
    smooth_snaps: Option<SmoothSetting>,
    date_min: Option<NaiveDate>,
    date_max: Option<NaiveDate>,
    idx_col: Option<String>,
    date_col: Option<String>,
    log_level: Option<String>,
}

/// Builder for [`AlertSettings`], with validation.
#[derive(Debug, Clone)]
pub struct AlertSettingsBuilder {
    path_ref: Option<Utf8PathBuf>,
    path_new: Option<Utf8PathBuf>,
    path_alerts: String,
    threshold: f64,
    n_periods_min: usize,
    smooth: Option<Precision>,
    smooth_snaps: Option<Precision>,
    date_min: Option<NaiveDate>,
    date_max: Option<NaiveDate>,
    idx_col: String,
    date_col: String,
    log_level: String,
}

impl Default for AlertSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSettingsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        AlertSettingsBuilder {
            path_ref: None,
            path_new: None,
            path_alerts: PATH_ALERTS.to_string(),
            threshold: DEFAULT_THRESHOLD,
            n_periods_min: 1,
            smooth: Some(DEFAULT_SMOOTH),
            smooth_snaps: Some(DEFAULT_SMOOTH_SNAPS),
            date_min: None,
            date_max: None,
            idx_col: IDX_COL.to_string(),
            date_col: DATE_COL.to_string(),
            log_level: "info".to_string(),
        }
    }

    /// Start from the values of a TOML settings file
    ///
    /// Arguments
    /// -----------------
    /// * `path`: settings file; keys absent from it keep their default value
    ///
    /// Return
    /// ----------
    /// * a builder, or an I/O / parse error. Unknown keys are rejected.
    pub fn from_toml_file(path: impl AsRef<Utf8Path>) -> Result<Self, AlertError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, AlertError> {
        let file: SettingsFile = toml::from_str(content)?;
        Self::new().merge_file(file)
    }

    fn merge_file(mut self, file: SettingsFile) -> Result<Self, AlertError> {
        if let Some(v) = file.path_ref {
            self.path_ref = Some(v);
        }
        if let Some(v) = file.path_new {
            self.path_new = Some(v);
        }
        if let Some(v) = file.path_alerts {
            self.path_alerts = v;
        }
        if let Some(v) = file.threshold {
            self.threshold = v;
        }
        if let Some(v) = file.n_periods_min {
            self.n_periods_min = v;
        }
        if let Some(v) = file.smooth {
            self.smooth = v.into_precision()?;
        }
        if let Some(v) = file.smooth_snaps {
            self.smooth_snaps = v.into_precision()?;
        }
        if let Some(v) = file.date_min {
            self.date_min = Some(v);
        }
        if let Some(v) = file.date_max {
            self.date_max = Some(v);
        }
        if let Some(v) = file.idx_col {
            self.idx_col = v;
        }
        if let Some(v) = file.date_col {
            self.date_col = v;
        }
        if let Some(v) = file.log_level {
            self.log_level = v;
        }
        Ok(self)
    }

    pub fn path_ref(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.path_ref = Some(path.into());
        self
    }
    pub fn path_new(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.path_new = Some(path.into());
        self
    }
    pub fn path_alerts(mut self, prefix: impl Into<String>) -> Self {
        self.path_alerts = prefix.into();
        self
    }
    pub fn threshold(mut self, v: f64) -> Self {
        self.threshold = v;
        self
    }
    pub fn n_periods_min(mut self, v: usize) -> Self {
        self.n_periods_min = v;
        self
    }
    pub fn smooth(mut self, v: Option<Precision>) -> Self {
        self.smooth = v;
        self
    }
    pub fn smooth_snaps(mut self, v: Option<Precision>) -> Self {
        self.smooth_snaps = v;
        self
    }
    pub fn date_min(mut self, v: NaiveDate) -> Self {
        self.date_min = Some(v);
        self
    }
    pub fn date_max(mut self, v: NaiveDate) -> Self {
        self.date_max = Some(v);
        self
    }
    pub fn idx_col(mut self, name: impl Into<String>) -> Self {
        self.idx_col = name.into();
        self
    }
    pub fn date_col(mut self, name: impl Into<String>) -> Self {
        self.date_col = name.into();
        self
    }
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Check every value and produce the settings
    ///
    /// Return
    /// ----------
    /// * the settings, or [`AlertError::InvalidParameter`] naming the first invalid value
    pub fn build(self) -> Result<AlertSettings, AlertError> {
        let invalid = |msg: &str| Err(AlertError::InvalidParameter(msg.to_string()));

        let Some(path_ref) = self.path_ref else {
            return invalid("path_ref is required");
        };
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return invalid("threshold must be a finite number > 0");
        }
        if self.n_periods_min == 0 {
            return invalid("n_periods_min must be >= 1");
        }
        if let (Some(min), Some(max)) = (self.date_min, self.date_max) {
            if min >= max {
                return invalid("date_min must be strictly before date_max");
            }
        }
        if self.path_new.is_none() && self.date_min.is_none() {
            return invalid("date_min is required to split path_ref when path_new is not set");
        }
        if self.idx_col.is_empty() || self.date_col.is_empty() {
            return invalid("column names must not be empty");
        }

        Ok(AlertSettings {
            path_ref,
            path_new: self.path_new,
            path_alerts: self.path_alerts,
            threshold: self.threshold,
            n_periods_min: self.n_periods_min,
            smooth: self.smooth,
            smooth_snaps: self.smooth_snaps,
            date_min: self.date_min,
            date_max: self.date_max,
            idx_col: self.idx_col,
            date_col: self.date_col,
            log_level: self.log_level,
        })
    }
}
