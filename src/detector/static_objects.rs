//! # Static-object detection
//!
//! Finds objects whose reported position does not change between observations.
//!
//! Two strategies are provided:
//!
//! * [`detect_static_objects`] – **single window**. Both periods are concatenated and every
//!   `(lon, lat, ship_type)` key seen more than once is reported, with the number of
//!   repeated sightings (sightings beyond the first one). Dates are ignored: the result
//!   says that a position recurs, not in which snapshots.
//! * [`detect_static_objects_2_snaps`] – **two snapshots**. Inner join of `t0` and `t1` on
//!   `(lon, lat)`, keeping every column of both rows.
//!
//! ## Smoothing
//! -----------------
//! Both strategies accept an optional precision: positions are rounded to that many
//! decimal places before comparison ([`round_to`]). Coarser rounding merges nearby but
//! distinct objects into one static group. This is a caller-controlled trade-off
//! between missed static objects (fine precision) and false positives (coarse precision).
//!
//! ## Known gap
//! -----------------
//! The two-snapshot join does **not** include `ship_type` in its key: two different
//! categories sitting at the same (rounded) coordinate in both snapshots are reported as
//! one static match.
use std::cmp::Reverse;

use ahash::RandomState;
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use tracing::info;

use crate::alert_errors::AlertError;
use crate::constants::{Degree, Precision, ShipType};
use crate::observations::{ColumnNames, Dataset, Observation};

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;

/// Above this magnitude a scaled coordinate has no fractional part left to round.
const EXACT_INTEGER_LIMIT: f64 = 4_503_599_627_370_496.0; // 2^52

/// Round `value` to `decimals` decimal places, ties to even.
///
/// The operation is idempotent: rounding an already rounded value to the same precision
/// returns it unchanged.
pub fn round_to(value: f64, decimals: Precision) -> f64 {
    let factor = 10f64.powi(decimals.min(i32::MAX as u32) as i32);
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= EXACT_INTEGER_LIMIT {
        return value;
    }
    scaled.round_ties_even() / factor
}

/// Copy of `data` with longitude and latitude rounded to `decimals` places.
pub fn smooth_positions(data: &Dataset, decimals: Precision) -> Dataset {
    let observations = data
        .iter()
        .map(|obs| Observation {
            lon: round_to(obs.lon, decimals),
            lat: round_to(obs.lat, decimals),
            ..obs.clone()
        })
        .collect();
    Dataset::with_columns(observations, data.extra_columns().to_vec())
        .with_column_names(data.column_names().clone())
}

#[inline]
fn smoothed(value: f64, smooth: Option<Precision>) -> f64 {
    match smooth {
        Some(decimals) => round_to(value, decimals),
        None => value,
    }
}

/// Hashable `(lon, lat)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey {
    pub lon: OrderedFloat<Degree>,
    pub lat: OrderedFloat<Degree>,
}

impl PositionKey {
    fn of(obs: &Observation, smooth: Option<Precision>) -> Self {
        PositionKey {
            lon: OrderedFloat(smoothed(obs.lon, smooth)),
            lat: OrderedFloat(smoothed(obs.lat, smooth)),
        }
    }
}

/// A `(position, category)` that was reported more than once.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticShipRecord {
    pub lon: Degree,
    pub lat: Degree,
    pub ship_type: ShipType,
    /// Number of sightings beyond the first one.
    pub count: usize,
}

/// Detect positions that recur across the concatenation of both periods
///
/// Arguments
/// -----------------
/// * `data_t0`, `data_t1`: the two periods, concatenated in this order
/// * `n_periods_min`: minimum number of repeated sightings (`>= 1`). With `1`, every
///   position seen at least twice is reported; with `2`, positions seen at least three times.
/// * `smooth`: optional rounding precision applied to both coordinates
///
/// Return
/// ----------
/// * records ordered by `count` descending, ties broken by `(lon, lat, ship_type)` ascending,
///   or [`AlertError::InvalidParameter`] when `n_periods_min == 0`.
///
/// Note
/// ----
/// * Coarse rounding can merge different objects into a single group and make a position
///   look static across more periods than it really is. Use
///   [`detect_static_objects_2_snaps`] to keep track of dates.
pub fn detect_static_objects(
    data_t0: &Dataset,
    data_t1: &Dataset,
    n_periods_min: usize,
    smooth: Option<Precision>,
) -> Result<Vec<StaticShipRecord>, AlertError> {
    if n_periods_min == 0 {
        return Err(AlertError::InvalidParameter(
            "n_periods_min must be >= 1".into(),
        ));
    }

    let working_set = data_t0.concat(data_t1);
    let mut sightings: FastHashMap<(PositionKey, &str), usize> = FastHashMap::default();
    for obs in working_set.iter() {
        *sightings
            .entry((PositionKey::of(obs, smooth), obs.ship_type.as_str()))
            .or_default() += 1;
    }

    let mut records: Vec<_> = sightings
        .into_iter()
        .filter_map(|(key, seen)| {
            let repeated = seen - 1;
            (repeated >= n_periods_min).then_some((key, repeated))
        })
        .collect();
    records.sort_unstable_by_key(|&((pos, ship_type), repeated)| {
        (Reverse(repeated), pos, ship_type)
    });

    let records: Vec<StaticShipRecord> = records
        .into_iter()
        .map(|((pos, ship_type), count)| StaticShipRecord {
            lon: pos.lon.into_inner(),
            lat: pos.lat.into_inner(),
            ship_type: ship_type.to_string(),
            count,
        })
        .collect();

    info!(
        n_periods_min,
        smooth = ?smooth,
        rows = working_set.len(),
        static_groups = records.len(),
        "static objects detection done"
    );

    Ok(records)
}

/// One row of the two-snapshot join: the shared position and both source rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMatch {
    pub lon: Degree,
    pub lat: Degree,
    /// Row of `t0`, positions smoothed when requested.
    pub left: Observation,
    /// Row of `t1`, positions smoothed when requested.
    pub right: Observation,
}

/// Result of [`detect_static_objects_2_snaps`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotMatches {
    /// Header names of the recognised columns of `t0`.
    pub left_names: ColumnNames,
    /// Header names of the recognised columns of `t1`.
    pub right_names: ColumnNames,
    /// Extra columns of the `t0` rows.
    pub left_columns: Vec<String>,
    /// Extra columns of the `t1` rows.
    pub right_columns: Vec<String>,
    pub rows: Vec<SnapshotMatch>,
}

impl SnapshotMatches {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Inner join of two snapshots on `(lon, lat)`
///
/// Arguments
/// -----------------
/// * `data_t0`, `data_t1`: the two snapshots (left and right side of the join)
/// * `smooth`: optional rounding precision, applied to each side independently
///
/// Return
/// ----------
/// * one [`SnapshotMatch`] per pair of rows sharing a position, in `t0` row order then
///   `t1` row order
///
/// Note
/// ----
/// * The join key does not contain `ship_type`: a `"freighter"` in `t0` and a `"scout"`
///   in `t1` at the same position are reported as a match.
pub fn detect_static_objects_2_snaps(
    data_t0: &Dataset,
    data_t1: &Dataset,
    smooth: Option<Precision>,
) -> SnapshotMatches {
    let mut right_index: FastHashMap<PositionKey, Vec<usize>> = FastHashMap::default();
    for (i, obs) in data_t1.iter().enumerate() {
        right_index
            .entry(PositionKey::of(obs, smooth))
            .or_default()
            .push(i);
    }

    let right_rows = data_t1.observations();
    let mut rows = Vec::new();
    for left in data_t0.iter() {
        let key = PositionKey::of(left, smooth);
        let Some(matches) = right_index.get(&key) else {
            continue;
        };
        for &i in matches {
            let right = &right_rows[i];
            rows.push(SnapshotMatch {
                lon: key.lon.into_inner(),
                lat: key.lat.into_inner(),
                left: Observation {
                    lon: key.lon.into_inner(),
                    lat: key.lat.into_inner(),
                    ..left.clone()
                },
                right: Observation {
                    lon: key.lon.into_inner(),
                    lat: key.lat.into_inner(),
                    ..right.clone()
                },
            });
        }
    }

    info!(
        smooth = ?smooth,
        left_rows = data_t0.len(),
        right_rows = data_t1.len(),
        matches = rows.len(),
        "two-snapshot static detection done"
    );

    SnapshotMatches {
        left_names: data_t0.column_names().clone(),
        right_names: data_t1.column_names().clone(),
        left_columns: data_t0.extra_columns().to_vec(),
        right_columns: data_t1.extra_columns().to_vec(),
        rows,
    }
}

#[cfg(test)]
mod static_objects_test {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn obs(id: u64, ship_type: &str, d: u32, lon: f64, lat: f64) -> Observation {
        Observation::new(id, ship_type, day(d), lon, lat)
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(3.14159, 3), 3.142);
        assert_eq!(round_to(-8.32549, 2), -8.33);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(1e300, 10), 1e300);
        assert_eq!(round_to(12.0, 400), 12.0);
    }

    #[test]
    fn test_round_to_idempotent() {
        for value in [3.1415926535, -179.99999, 0.000049, 45.125, 8.325] {
            for decimals in 0..10 {
                let once = round_to(value, decimals);
                assert_eq!(round_to(once, decimals), once);
            }
        }
    }

    #[test]
    fn test_smooth_positions_keeps_columns() {
        let data = Dataset::with_columns(
            vec![obs(1, "scout", 1, 1.23456, 6.54321).with_extra(vec!["fast".into()])],
            vec!["speed".into()],
        );
        let data = data.with_column_names(ColumnNames {
            idx: "uid".into(),
            ..ColumnNames::default()
        });
        let smooth = smooth_positions(&data, 2);
        assert_eq!(smooth.extra_columns(), data.extra_columns());
        assert_eq!(smooth.column_names().idx, "uid");
        assert_eq!(smooth.observations()[0].lon, 1.23);
        assert_eq!(smooth.observations()[0].lat, 6.54);
        assert_eq!(smooth.observations()[0].extra, vec!["fast"]);
    }

    #[test]
    fn test_zero_periods_rejected() {
        let data = Dataset::default();
        assert!(matches!(
            detect_static_objects(&data, &data, 0, None),
            Err(AlertError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_static_ordering() {
        let t0 = Dataset::new(vec![
            obs(1, "scout", 1, 5.0, 5.0),
            obs(2, "freighter", 1, 1.0, 1.0),
            obs(3, "cruiser", 1, 9.0, 9.0),
        ]);
        let t1 = Dataset::new(vec![
            obs(1, "scout", 2, 5.0, 5.0),
            obs(1, "scout", 3, 5.0, 5.0),
            obs(2, "freighter", 2, 1.0, 1.0),
            obs(3, "cruiser", 2, 9.0, 9.0),
            obs(4, "cruiser", 2, 9.0, 9.5),
        ]);

        let records = detect_static_objects(&t0, &t1, 1, None).unwrap();
        let keys: Vec<_> = records
            .iter()
            .map(|r| (r.lon, r.ship_type.as_str(), r.count))
            .collect();
        assert_eq!(
            keys,
            vec![(5.0, "scout", 2), (1.0, "freighter", 1), (9.0, "cruiser", 1)]
        );

        let records = detect_static_objects(&t0, &t1, 2, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ship_type, "scout");
    }

    #[test]
    fn test_same_position_different_types_are_distinct() {
        let t0 = Dataset::new(vec![obs(1, "scout", 1, 5.0, 5.0)]);
        let t1 = Dataset::new(vec![obs(2, "freighter", 2, 5.0, 5.0)]);
        assert!(detect_static_objects(&t0, &t1, 1, None).unwrap().is_empty());
    }

    #[test]
    fn test_smoothing_merges_nearby_positions() {
        let t0 = Dataset::new(vec![obs(1, "scout", 1, 5.00001, 5.00002)]);
        let t1 = Dataset::new(vec![obs(1, "scout", 2, 5.00003, 4.99999)]);

        assert!(detect_static_objects(&t0, &t1, 1, None).unwrap().is_empty());
        let records = detect_static_objects(&t0, &t1, 1, Some(3)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].lon, records[0].lat), (5.0, 5.0));
    }

    #[test]
    fn test_two_snaps_join() {
        let t0 = Dataset::with_columns(
            vec![
                obs(1, "scout", 1, 1.0, 2.0).with_extra(vec!["a".into()]),
                obs(2, "freighter", 1, 3.0, 4.0).with_extra(vec!["b".into()]),
            ],
            vec!["name".into()],
        );
        let t1 = Dataset::new(vec![
            obs(7, "scout", 2, 1.0, 2.0),
            obs(8, "droid", 2, 1.0, 2.0),
            obs(9, "freighter", 2, 3.0001, 4.0),
        ]);

        let joined = detect_static_objects_2_snaps(&t0, &t1, None);
        assert_eq!(joined.left_columns, vec!["name"]);
        assert!(joined.right_columns.is_empty());
        let pairs: Vec<_> = joined
            .rows
            .iter()
            .map(|m| (m.left.object_id.to_string(), m.right.object_id.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![("1".to_string(), "7".to_string()), ("1".into(), "8".into())]
        );
        assert_eq!(joined.rows[0].left.extra, vec!["a"]);

        let joined = detect_static_objects_2_snaps(&t0, &t1, Some(3));
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.rows[2].right.lon, 3.0);
    }
}
