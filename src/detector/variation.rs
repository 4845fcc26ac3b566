//! # Large-variation detection
//!
//! Flags days on which the number of observed objects of a category leaves the band
//! `[mean - k·std, mean + k·std]` learnt on the reference period.
//!
//! ## Pipeline
//! -----------------
//! 1. **Daily counts** – both datasets are grouped by `(ship_type, date)` and counted
//!    ([`daily_counts`]).
//! 2. **Baseline** – for every category of the reference period, the mean and the
//!    **sample** standard deviation (Bessel's correction, `n - 1`) of its daily counts are
//!    turned into a [`CategoryStats`] ([`Baseline::compute`]).
//! 3. **Breaches** – every comparison-period count of a baselined category is checked
//!    against both bounds; a breach yields an [`OutlierRecord`] whose percentage is
//!    relative to the breached bound:
//!
//!    ```text
//!    breach_pct = 100 · (count - bound) / bound
//!    ```
//!
//! ## Degenerate baselines
//! -----------------
//! * A category observed on a single reference day has no standard deviation: both bounds
//!   are `NaN` and no breach is ever reported for it.
//! * A bound equal to zero cannot be used as a percentage base: the check for that
//!   direction is suppressed.
//!
//! Neither case raises; both are reported through `tracing` at `warn` level.
//!
//! ## Categories without baseline
//! -----------------
//! Categories present only in the comparison period are skipped, and each one is listed
//! in [`VariationReport::unbaselined`] as a [`NoBaselineForType`] diagnostic.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::alert_errors::AlertError;
use crate::constants::ShipType;
use crate::observations::Dataset;

/// Number of observations per category and per day, both keys sorted.
pub type DailyCounts = BTreeMap<ShipType, BTreeMap<NaiveDate, usize>>;

/// Which side of the tolerance band was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BoundType {
    #[serde(rename = "bound_min")]
    Min,
    #[serde(rename = "bound_max")]
    Max,
}

impl BoundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundType::Min => "bound_min",
            BoundType::Max => "bound_max",
        }
    }
}

impl fmt::Display for BoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundType {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bound_min" | "min" => Ok(BoundType::Min),
            "bound_max" | "max" => Ok(BoundType::Max),
            other => Err(AlertError::InvalidBoundType(other.to_string())),
        }
    }
}

/// Statistics of the daily counts of one category over the reference period.
///
/// `std` is the sample standard deviation; it is `NaN` when the category was seen on a
/// single day, and so are both bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryStats {
    pub n_days: usize,
    pub mean: f64,
    pub std: f64,
    pub bound_min: f64,
    pub bound_max: f64,
}

impl CategoryStats {
    /// Compute the statistics of a daily-count series
    ///
    /// Arguments
    /// -----------------
    /// * `counts`: number of observations per reference day
    /// * `threshold`: number of standard deviations tolerated around the mean
    ///
    /// Return
    /// ----------
    /// * `None` for an empty series, the statistics otherwise
    pub fn from_daily_counts(counts: &[usize], threshold: f64) -> Option<Self> {
        if counts.is_empty() {
            return None;
        }

        let n = counts.len() as f64;
        let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n;
        let std = if counts.len() < 2 {
            f64::NAN
        } else {
            let var = counts
                .iter()
                .map(|&c| (c as f64 - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            var.sqrt()
        };

        Some(CategoryStats {
            n_days: counts.len(),
            mean,
            std,
            bound_min: mean - threshold * std,
            bound_max: mean + threshold * std,
        })
    }

    pub fn bound(&self, bound_type: BoundType) -> f64 {
        match bound_type {
            BoundType::Min => self.bound_min,
            BoundType::Max => self.bound_max,
        }
    }

    /// The bound, if it can take part in a breach check (finite and non-zero).
    pub fn usable_bound(&self, bound_type: BoundType) -> Option<f64> {
        let bound = self.bound(bound_type);
        (bound.is_finite() && bound != 0.0).then_some(bound)
    }

    /// Side crossed by `count`, with the crossed bound.
    ///
    /// A count equal to a bound is inside the band. Since `bound_min <= bound_max`, at most
    /// one side can be crossed.
    pub fn breach(&self, count: usize) -> Option<(BoundType, f64)> {
        let count = count as f64;
        if let Some(bound) = self.usable_bound(BoundType::Min) {
            if count < bound {
                return Some((BoundType::Min, bound));
            }
        }
        if let Some(bound) = self.usable_bound(BoundType::Max) {
            if count > bound {
                return Some((BoundType::Max, bound));
            }
        }
        None
    }
}

/// Percentage by which `count` exceeds (positive) or falls short of (negative) `bound`.
#[inline]
pub fn breach_pct(count: usize, bound: f64) -> f64 {
    (count as f64 - bound) / bound * 100.0
}

/// Count observations per `(ship_type, date)`.
pub fn daily_counts(data: &Dataset) -> DailyCounts {
    let mut counts = DailyCounts::new();
    for ((ship_type, date), n) in data
        .iter()
        .map(|obs| (obs.ship_type.as_str(), obs.date))
        .counts()
    {
        counts
            .entry(ship_type.to_string())
            .or_default()
            .insert(date, n);
    }
    counts
}

/// Per-category statistics learnt on the reference period.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    threshold: f64,
    stats: BTreeMap<ShipType, CategoryStats>,
}

impl Baseline {
    /// Learn the per-category bands of a reference dataset
    ///
    /// Arguments
    /// -----------------
    /// * `reference`: the reference period (`t0`)
    /// * `threshold`: sensitivity `k`, strictly positive and finite
    ///
    /// Return
    /// ----------
    /// * the baseline, or [`AlertError::InvalidParameter`] for an invalid threshold
    pub fn compute(reference: &Dataset, threshold: f64) -> Result<Self, AlertError> {
        validate_threshold(threshold)?;
        Ok(Self::from_counts(&daily_counts(reference), threshold))
    }

    fn from_counts(counts: &DailyCounts, threshold: f64) -> Self {
        let stats = counts
            .iter()
            .filter_map(|(ship_type, per_day)| {
                let series: Vec<usize> = per_day.values().copied().collect();
                CategoryStats::from_daily_counts(&series, threshold)
                    .map(|stats| (ship_type.clone(), stats))
            })
            .collect();
        Baseline { threshold, stats }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn get(&self, ship_type: &str) -> Option<&CategoryStats> {
        self.stats.get(ship_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ShipType, &CategoryStats)> {
        self.stats.iter()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

fn validate_threshold(threshold: f64) -> Result<(), AlertError> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(())
    } else {
        Err(AlertError::InvalidParameter(format!(
            "threshold must be a finite number > 0, got {threshold}"
        )))
    }
}

/// One day on which a category left its tolerance band.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierRecord {
    pub date: NaiveDate,
    pub ship_type: ShipType,
    pub count: usize,
    pub bound_type: BoundType,
    /// Value of the crossed bound.
    pub bound: f64,
    /// `100 · (count - bound) / bound`, unrounded.
    pub breach_pct: f64,
}

/// A comparison-period category for which the reference period holds no baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoBaselineForType {
    pub ship_type: ShipType,
    /// Number of comparison days on which the category was seen.
    pub dates: usize,
}

/// Outcome of one large-variation detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationReport {
    pub baseline: Baseline,
    /// Ordered by category, then by date.
    pub outliers: Vec<OutlierRecord>,
    pub unbaselined: Vec<NoBaselineForType>,
}

impl VariationReport {
    pub fn len(&self) -> usize {
        self.outliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outliers.is_empty()
    }
}

/// Detect the days of the comparison period whose per-category counts leave the band
/// learnt on the reference period
///
/// Arguments
/// -----------------
/// * `reference`: the reference period (`t0`)
/// * `comparison`: the period under evaluation (`t1`)
/// * `threshold`: sensitivity `k`, number of standard deviations tolerated
///
/// Return
/// ----------
/// * a [`VariationReport`] with outliers ordered by category then date, or
///   [`AlertError::InvalidParameter`] when `threshold` is not a finite positive number.
///
/// See also
/// ------------
/// * [`CategoryStats::breach`] – The per-count decision.
/// * [`Detector::detect_large_variations`](crate::detector::Detector::detect_large_variations) – Stateful wrapper.
pub fn detect_large_variations(
    reference: &Dataset,
    comparison: &Dataset,
    threshold: f64,
) -> Result<VariationReport, AlertError> {
    let baseline = Baseline::compute(reference, threshold)?;
    let counts_new = daily_counts(comparison);

    for (ship_type, stats) in baseline.iter() {
        debug!(
            ship_type = %ship_type,
            n_days = stats.n_days,
            mean = stats.mean,
            std = stats.std,
            bound_min = stats.bound_min,
            bound_max = stats.bound_max,
            "baseline"
        );
        if stats.usable_bound(BoundType::Min).is_none()
            || stats.usable_bound(BoundType::Max).is_none()
        {
            warn!(
                ship_type = %ship_type,
                n_days = stats.n_days,
                "degenerate baseline, breach checks suppressed for unusable bounds"
            );
        }
    }

    let mut outliers = Vec::new();
    let mut unbaselined = Vec::new();

    for (ship_type, per_day) in &counts_new {
        let Some(stats) = baseline.get(ship_type) else {
            warn!(ship_type = %ship_type, dates = per_day.len(), "no baseline for type");
            unbaselined.push(NoBaselineForType {
                ship_type: ship_type.clone(),
                dates: per_day.len(),
            });
            continue;
        };

        outliers.extend(per_day.iter().filter_map(|(&date, &count)| {
            stats.breach(count).map(|(bound_type, bound)| OutlierRecord {
                date,
                ship_type: ship_type.clone(),
                count,
                bound_type,
                bound,
                breach_pct: breach_pct(count, bound),
            })
        }));
    }

    info!(
        threshold,
        types = baseline.len(),
        outliers = outliers.len(),
        unbaselined = unbaselined.len(),
        "large variation detection done"
    );

    Ok(VariationReport {
        baseline,
        outliers,
        unbaselined,
    })
}
