#![allow(dead_code)]

use approx::assert_relative_eq;
use camino::Utf8PathBuf;
use chrono::NaiveDate;
use shipwatch::detector::variation::{breach_pct, OutlierRecord};
use shipwatch::{Dataset, Observation};

pub fn data_path(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `counts[i]` observations of `ship_type` on `first + i days`, each at its own position.
pub fn daily_series(ship_type: &str, first: NaiveDate, counts: &[usize]) -> Vec<Observation> {
    let mut id = 0u64;
    counts
        .iter()
        .enumerate()
        .flat_map(|(i, &n)| {
            let date = first + chrono::Days::new(i as u64);
            (0..n)
                .map(|_| {
                    id += 1;
                    Observation::new(id, ship_type, date, id as f64 * 0.01, -(id as f64) * 0.01)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn dataset(parts: Vec<Vec<Observation>>) -> Dataset {
    Dataset::new(parts.into_iter().flatten().collect())
}

pub fn at(id: u64, ship_type: &str, date: NaiveDate, lon: f64, lat: f64) -> Observation {
    Observation::new(id, ship_type, date, lon, lat)
}

/// The stored percentage must be reproducible from the count and the crossed bound.
pub fn assert_breach_consistent(record: &OutlierRecord) {
    assert_relative_eq!(
        record.breach_pct,
        breach_pct(record.count, record.bound),
        max_relative = 1e-12
    );
    assert_relative_eq!(
        record.breach_pct,
        100.0 * (record.count as f64 - record.bound) / record.bound,
        max_relative = 1e-12
    );
}
