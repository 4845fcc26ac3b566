//! # Constants and type definitions for shipwatch
//!
//! This module centralizes the **default column names**, **default tuning values**, and
//! **common type definitions** used throughout the crate.
//!
//! ## Overview
//!
//! - Column names recognised by the dataset loader
//! - Default sensitivity and rounding precision of the detectors
//! - Core type aliases used across the crate
//! - The [`ObjectId`] identifier of a tracked object

use std::fmt;

// -------------------------------------------------------------------------------------------------
// Column names
// -------------------------------------------------------------------------------------------------

/// Default identifier column
pub const IDX_COL: &str = "id";

/// Default date column
pub const DATE_COL: &str = "date";

/// Longitude column
pub const LON_COL: &str = "lon";

/// Latitude column
pub const LAT_COL: &str = "lat";

/// Object category column
pub const TYPE_COL: &str = "ship_type";

/// Suffix appended to left-hand columns of a snapshot join
pub const LEFT_SUFFIX: &str = "_x";

/// Suffix appended to right-hand columns of a snapshot join
pub const RIGHT_SUFFIX: &str = "_y";

// -------------------------------------------------------------------------------------------------
// Detector defaults
// -------------------------------------------------------------------------------------------------

/// Number of standard deviations tolerated around the mean daily count
pub const DEFAULT_THRESHOLD: f64 = 1.7;

/// Rounding applied to positions by the single-window static detection
pub const DEFAULT_SMOOTH: u32 = 5;

/// Rounding applied to positions by the two-snapshot static detection
pub const DEFAULT_SMOOTH_SNAPS: u32 = 3;

/// Timestamp layout used in exported file names
pub const EXPORT_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Decimal places kept for the breach percentage in exported files
pub const BREACH_PCT_DECIMALS: usize = 2;

/// Default export prefix
pub const PATH_ALERTS: &str = "data/alerts/";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;

/// Category of an observed object (e.g. `"freighter"`)
pub type ShipType = String;

/// Number of decimal places kept when smoothing positions
pub type Precision = u32;

// -------------------------------------------------------------------------------------------------
// Identifiers
// -------------------------------------------------------------------------------------------------

/// Identifier of a tracked object.
///
/// This can be:
/// - A numeric identifier (e.g. `Int(1234)`)
/// - Any other textual identifier (e.g. `"X-wing-42"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    /// Purely numeric identifier
    Int(u64),
    /// Any other identifier
    String(String),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Int(n) => write!(f, "{n}"),
            ObjectId::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for ObjectId {
    fn from(n: u64) -> Self {
        ObjectId::Int(n)
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        ObjectId::String(s)
    }
}

impl From<&str> for ObjectId {
    /// Canonical decimal numbers become `Int`, everything else is kept verbatim as `String`,
    /// so that `"0042"` or `"+7"` are written back unchanged.
    fn from(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(n) if n.to_string() == s => ObjectId::Int(n),
            _ => ObjectId::String(s.to_string()),
        }
    }
}

#[cfg(test)]
mod constants_test {
    use super::*;

    #[test]
    fn test_object_id_from_str() {
        assert_eq!(ObjectId::from("42"), ObjectId::Int(42));
        assert_eq!(ObjectId::from("K25D50B"), ObjectId::String("K25D50B".into()));
        assert_eq!(ObjectId::from("-1"), ObjectId::String("-1".into()));
        assert_eq!(ObjectId::from("0"), ObjectId::Int(0));
    }

    #[test]
    fn test_object_id_keeps_text() {
        for raw in ["0042", "007", "+7", "00"] {
            let id = ObjectId::from(raw);
            assert_eq!(id, ObjectId::String(raw.into()));
            assert_eq!(id.to_string(), raw);
        }
    }
}
