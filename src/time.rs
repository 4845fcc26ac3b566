use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use crate::{alert_errors::AlertError, constants::EXPORT_STAMP_FORMAT};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a date cell at day granularity
///
/// Argument
/// --------
/// * `value`: a date (`YYYY-MM-DD`), a naive datetime (`YYYY-MM-DD HH:MM:SS`, `T` separator
///   accepted, optional fractional seconds) or an RFC 3339 timestamp
///
/// Return
/// ------
/// * the calendar date, the time of day being truncated, or `None` if nothing matched
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    {
        return Some(date);
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(datetime.date());
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Same as [`parse_day`] but failing with [`AlertError::InvalidDate`].
pub fn parse_day_strict(value: &str) -> Result<NaiveDate, AlertError> {
    parse_day(value).ok_or_else(|| AlertError::InvalidDate(value.to_string()))
}

/// Timestamp embedded in exported file names.
///
/// The export never reads the clock by itself: the caller passes an [`ExportStamp`],
/// either [`ExportStamp::now`] or a fixed value for reproducible output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExportStamp(NaiveDateTime);

impl ExportStamp {
    pub fn new(at: NaiveDateTime) -> Self {
        ExportStamp(at)
    }

    /// Current local wall-clock time, second granularity.
    pub fn now() -> Self {
        ExportStamp(Local::now().naive_local())
    }

    pub fn at(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for ExportStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(EXPORT_STAMP_FORMAT))
    }
}

impl FromStr for ExportStamp {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s, EXPORT_STAMP_FORMAT)
            .map(ExportStamp)
            .map_err(|_| AlertError::InvalidDate(s.to_string()))
    }
}
