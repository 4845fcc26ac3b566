//! # Detector
//!
//! The [`Detector`] owns a reference period (`t0`) and a comparison period (`t1`) and runs
//! the behavioral analyses over them. Each analysis is a pure function of the two datasets
//! living in its own submodule; the detector keeps the last result of each category so
//! that [`Detector::export`] can persist them.
//!
//! Modules
//! -----------------
//! * [`variation`] – Large-variation detection on daily counts per category.
//! * [`static_objects`] – Static-object detection, single window and two snapshots.
//! * [`export`] – CSV export of the held results.
//!
//! Result state
//! -----------------
//! * `outliers` is replaced by every call to [`Detector::detect_large_variations`].
//! * Both static detections write the same slot ([`StaticShips`]); the last call wins.
//! * Exporting a category whose detection never ran fails with
//!   [`AlertError::ExportBeforeDetect`](crate::alert_errors::AlertError::ExportBeforeDetect).
//!
//! Example
//! -----------------
//! ```rust, no_run
//! use shipwatch::detector::{export::ExportOptions, Detector};
//! use shipwatch::observations::csv_reader::{load_data, LoadOptions};
//! use shipwatch::time::ExportStamp;
//!
//! let options = LoadOptions::default();
//! let t0 = load_data("data/ships_t0.csv", &options)?;
//! let t1 = load_data("data/ships_t1.csv", &options)?;
//!
//! let mut detector = Detector::new(t0, t1);
//! detector.detect_large_variations(1.7)?;
//! detector.detect_static_objects(1, Some(5))?;
//! let written = detector.export("data/alerts/", &ExportStamp::now(), ExportOptions::default())?;
//! # Ok::<(), shipwatch::alert_errors::AlertError>(())
//! ```
use camino::Utf8PathBuf;

use crate::alert_errors::AlertError;
use crate::constants::Precision;
use crate::observations::Dataset;
use crate::time::ExportStamp;

use export::ExportOptions;
use static_objects::{SnapshotMatches, StaticShipRecord};
use variation::{OutlierRecord, VariationReport};

pub mod export;
pub mod static_objects;
pub mod variation;

/// Last static-object result held by a [`Detector`].
#[derive(Debug, Clone, PartialEq)]
pub enum StaticShips {
    /// Output of [`Detector::detect_static_objects`].
    MultiPeriod(Vec<StaticShipRecord>),
    /// Output of [`Detector::detect_static_objects_2_snaps`].
    TwoSnapshots(SnapshotMatches),
}

impl StaticShips {
    pub fn len(&self) -> usize {
        match self {
            StaticShips::MultiPeriod(records) => records.len(),
            StaticShips::TwoSnapshots(matches) => matches.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct Detector {
    data_t0: Dataset,
    data_t1: Dataset,
    count_outliers: Option<VariationReport>,
    static_ships: Option<StaticShips>,
}

impl Detector {
    /// Create a detector over a reference and a comparison period
    ///
    /// Arguments
    /// -----------------
    /// * `data_t0`: reference period, source of the baselines
    /// * `data_t1`: comparison period, evaluated against the baselines
    ///
    /// Return
    /// ----------
    /// * a detector with no result yet
    pub fn new(data_t0: Dataset, data_t1: Dataset) -> Self {
        Detector {
            data_t0,
            data_t1,
            count_outliers: None,
            static_ships: None,
        }
    }

    pub fn reference(&self) -> &Dataset {
        &self.data_t0
    }

    pub fn comparison(&self) -> &Dataset {
        &self.data_t1
    }

    /// Run the large-variation detection and keep its result
    ///
    /// Arguments
    /// -----------------
    /// * `threshold`: sensitivity `k`, strictly positive
    ///
    /// Return
    /// ----------
    /// * the new report; the previous one is discarded
    ///
    /// See also
    /// ------------
    /// * [`variation::detect_large_variations`] – The underlying pure function.
    pub fn detect_large_variations(
        &mut self,
        threshold: f64,
    ) -> Result<&VariationReport, AlertError> {
        let report = variation::detect_large_variations(&self.data_t0, &self.data_t1, threshold)?;
        Ok(self.count_outliers.insert(report))
    }

    /// Run the single-window static-object detection over `t0 ∪ t1` and keep its result
    ///
    /// Arguments
    /// -----------------
    /// * `n_periods_min`: minimum number of repeated sightings, `>= 1`
    /// * `smooth`: optional rounding precision of the positions
    ///
    /// Return
    /// ----------
    /// * the held slot, [`StaticShips::MultiPeriod`] with the static groups most repeated first
    ///
    /// See also
    /// ------------
    /// * [`static_objects::detect_static_objects`] – The underlying pure function.
    pub fn detect_static_objects(
        &mut self,
        n_periods_min: usize,
        smooth: Option<Precision>,
    ) -> Result<&StaticShips, AlertError> {
        let records = static_objects::detect_static_objects(
            &self.data_t0,
            &self.data_t1,
            n_periods_min,
            smooth,
        )?;
        Ok(self.static_ships.insert(StaticShips::MultiPeriod(records)))
    }

    /// Join `t0` and `t1` on position and keep the matched rows
    ///
    /// Return
    /// ----------
    /// * the held slot, [`StaticShips::TwoSnapshots`]
    ///
    /// See also
    /// ------------
    /// * [`static_objects::detect_static_objects_2_snaps`] – The underlying pure function,
    ///   including the note on the type-blind join key.
    pub fn detect_static_objects_2_snaps(&mut self, smooth: Option<Precision>) -> &StaticShips {
        let matches =
            static_objects::detect_static_objects_2_snaps(&self.data_t0, &self.data_t1, smooth);
        self.static_ships.insert(StaticShips::TwoSnapshots(matches))
    }

    /// Rare-object detection. Not available.
    pub fn detect_rare_objects(&mut self, _threshold: f64) -> Result<(), AlertError> {
        Err(AlertError::NotImplemented("rare object detection"))
    }

    /// Detection of new activity areas. Not available.
    pub fn detect_area_change(&mut self) -> Result<(), AlertError> {
        Err(AlertError::NotImplemented("area change detection"))
    }

    /// Last large-variation report, if the detection ran.
    pub fn variation_report(&self) -> Option<&VariationReport> {
        self.count_outliers.as_ref()
    }

    /// Outliers of the last large-variation run, if any.
    pub fn outliers(&self) -> Option<&[OutlierRecord]> {
        self.count_outliers
            .as_ref()
            .map(|report| report.outliers.as_slice())
    }

    pub fn static_ships(&self) -> Option<&StaticShips> {
        self.static_ships.as_ref()
    }

    /// Write the held results as CSV files
    ///
    /// Arguments
    /// -----------------
    /// * `prefix`: path prefix of the artifacts (a directory must end with `/`)
    /// * `stamp`: timestamp embedded in the file names
    /// * `options`: which results to write
    ///
    /// Return
    /// ----------
    /// * the written paths, or [`AlertError::ExportBeforeDetect`] if a requested result was
    ///   never computed (nothing is written in that case)
    ///
    /// See also
    /// ------------
    /// * [`export`] – File layouts.
    pub fn export(
        &self,
        prefix: &str,
        stamp: &ExportStamp,
        options: ExportOptions,
    ) -> Result<Vec<Utf8PathBuf>, AlertError> {
        export::export_results(
            prefix,
            stamp,
            options,
            self.outliers(),
            self.static_ships.as_ref(),
        )
    }
}

#[cfg(test)]
mod detector_test {
    use super::*;
    use crate::detector::export::ResultKind;
    use crate::observations::Observation;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    fn detector() -> Detector {
        let t0 = Dataset::new(vec![
            Observation::new(1u64, "freighter", day(1), 3.1415, 8.325),
            Observation::new(2u64, "freighter", day(2), 3.1415, 8.325),
            Observation::new(3u64, "scout", day(1), 1.0, 1.0),
        ]);
        let t1 = Dataset::new(vec![Observation::new(4u64, "freighter", day(3), 3.1415, 8.325)]);
        Detector::new(t0, t1)
    }

    #[test]
    fn test_fresh_detector_has_no_results() {
        let detector = detector();
        assert!(detector.outliers().is_none());
        assert!(detector.static_ships().is_none());
        assert_eq!(detector.reference().len(), 3);
        assert_eq!(detector.comparison().len(), 1);
    }

    #[test]
    fn test_last_static_detection_wins() {
        let mut detector = detector();
        let held = detector.detect_static_objects(1, None).unwrap();
        assert!(matches!(held, StaticShips::MultiPeriod(r) if r.len() == 1));
        assert!(matches!(
            detector.static_ships(),
            Some(StaticShips::MultiPeriod(_))
        ));

        let held = detector.detect_static_objects_2_snaps(None);
        assert!(matches!(held, StaticShips::TwoSnapshots(_)));
        assert_eq!(held.len(), 2);
        assert!(matches!(
            detector.static_ships(),
            Some(StaticShips::TwoSnapshots(m)) if m.len() == 2
        ));
    }

    #[test]
    fn test_variation_result_is_replaced() {
        let mut detector = detector();
        detector.detect_large_variations(1.7).unwrap();
        let first = detector.outliers().unwrap().to_vec();
        let report = detector.detect_large_variations(1.7).unwrap();
        assert_eq!(report.outliers, first);
        assert_eq!(report.baseline.len(), 2);

        assert!(matches!(
            detector.detect_large_variations(0.0),
            Err(AlertError::InvalidParameter(_))
        ));
        // a failed run leaves the previous result in place
        assert_eq!(detector.variation_report().unwrap().baseline.threshold(), 1.7);
    }

    #[test]
    fn test_export_before_detect() {
        let detector = detector();
        let stamp = ExportStamp::new(day(5).and_hms_opt(12, 0, 0).unwrap());
        let err = detector
            .export("unused/", &stamp, ExportOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AlertError::ExportBeforeDetect(ResultKind::Outliers)
        ));
    }

    #[test]
    fn test_extension_points_are_not_implemented() {
        let mut detector = detector();
        assert!(matches!(
            detector.detect_rare_objects(2.0),
            Err(AlertError::NotImplemented(_))
        ));
        assert!(matches!(
            detector.detect_area_change(),
            Err(AlertError::NotImplemented(_))
        ));
    }
}
