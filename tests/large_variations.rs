mod common;

use approx::assert_relative_eq;
use common::{assert_breach_consistent, daily_series, data_path, dataset, day};
use shipwatch::detector::variation::{
    detect_large_variations, Baseline, BoundType, CategoryStats,
};
use shipwatch::observations::csv_reader::{load_data, LoadOptions};
use shipwatch::{AlertError, Detector};

#[test]
fn test_freighter_count_above_band() {
    let reference = dataset(vec![daily_series(
        "freighter",
        day(2020, 1, 1),
        &[10, 12, 11, 9, 10],
    )]);
    let comparison = dataset(vec![daily_series("freighter", day(2020, 2, 1), &[14])]);

    let report = detect_large_variations(&reference, &comparison, 1.7).unwrap();

    let stats = report.baseline.get("freighter").unwrap();
    assert_relative_eq!(stats.mean, 10.4, epsilon = 1e-12);
    assert_relative_eq!(stats.std, 1.3f64.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(stats.bound_max, 12.3383, epsilon = 1e-4);
    assert_relative_eq!(stats.bound_min, 8.4617, epsilon = 1e-4);

    assert_eq!(report.outliers.len(), 1);
    let outlier = &report.outliers[0];
    assert_eq!(outlier.date, day(2020, 2, 1));
    assert_eq!(outlier.ship_type, "freighter");
    assert_eq!(outlier.count, 14);
    assert_eq!(outlier.bound_type, BoundType::Max);
    assert_relative_eq!(outlier.breach_pct, 13.468, epsilon = 1e-3);
    assert_breach_consistent(outlier);
}

#[test]
fn test_single_reference_day_never_breaches() {
    let reference = dataset(vec![daily_series("scout", day(2020, 1, 1), &[5])]);
    let comparison = dataset(vec![daily_series(
        "scout",
        day(2020, 2, 1),
        &[0, 1, 5, 50, 500],
    )]);

    let report = detect_large_variations(&reference, &comparison, 1.7).unwrap();
    assert!(report.baseline.get("scout").unwrap().std.is_nan());
    assert!(report.is_empty());
}

#[test]
fn test_bounds_bracket_the_mean() {
    let reference = dataset(vec![
        daily_series("cruiser", day(2020, 1, 1), &[3, 3, 4, 3, 3]),
        daily_series("freighter", day(2020, 1, 1), &[10, 12, 11, 9, 10]),
        daily_series("tanker", day(2020, 1, 1), &[1, 40, 2, 7]),
        daily_series("tug", day(2020, 1, 1), &[6, 6]),
    ]);

    for threshold in [0.1, 1.0, 1.7, 3.0, 10.0] {
        let baseline = Baseline::compute(&reference, threshold).unwrap();
        assert_eq!(baseline.len(), 4);
        for (ship_type, stats) in baseline.iter() {
            assert!(stats.bound_min.is_finite(), "{ship_type}");
            assert!(stats.bound_max.is_finite(), "{ship_type}");
            assert!(stats.bound_min <= stats.mean && stats.mean <= stats.bound_max);
        }
    }
}

#[test]
fn test_flagged_iff_outside_band() {
    let stats = CategoryStats::from_daily_counts(&[2, 4, 6, 8], 1.0).unwrap();
    for count in 0..20 {
        let c = count as f64;
        let expected = c < stats.bound_min || c > stats.bound_max;
        match stats.breach(count) {
            Some((BoundType::Min, bound)) => {
                assert!(expected && c < bound);
                assert_eq!(bound, stats.bound_min);
            }
            Some((BoundType::Max, bound)) => {
                assert!(expected && c > bound);
                assert_eq!(bound, stats.bound_max);
            }
            None => assert!(!expected, "count {count} should be flagged"),
        }
    }
}

#[test]
fn test_count_equal_to_bound_is_not_flagged() {
    // mean 4, sample std 2 -> band [2, 6] for k = 1
    let stats = CategoryStats::from_daily_counts(&[2, 4, 6], 1.0).unwrap();
    assert_relative_eq!(stats.bound_min, 2.0, epsilon = 1e-12);
    assert_relative_eq!(stats.bound_max, 6.0, epsilon = 1e-12);
    assert!(stats.breach(2).is_none());
    assert!(stats.breach(6).is_none());
    assert!(matches!(stats.breach(1), Some((BoundType::Min, _))));
    assert!(matches!(stats.breach(7), Some((BoundType::Max, _))));
}

#[test]
fn test_zero_bound_suppresses_percentage() {
    // mean 4, sample std 2 -> bound_min 0 for k = 2
    let reference = dataset(vec![daily_series("tug", day(2020, 1, 1), &[2, 4, 6])]);
    let comparison = dataset(vec![daily_series("tug", day(2020, 2, 1), &[1, 9])]);

    let report = detect_large_variations(&reference, &comparison, 2.0).unwrap();
    let stats = report.baseline.get("tug").unwrap();
    assert_eq!(stats.bound_min, 0.0);
    assert!(stats.usable_bound(BoundType::Min).is_none());

    assert_eq!(report.outliers.len(), 1);
    assert_eq!(report.outliers[0].bound_type, BoundType::Max);
    assert!(report.outliers.iter().all(|o| o.breach_pct.is_finite()));
}

#[test]
fn test_fixture_periods() {
    let t0 = load_data(data_path("starships_ref.csv"), &LoadOptions::default()).unwrap();
    let t1 = load_data(data_path("starships_new.csv"), &LoadOptions::default()).unwrap();

    let mut detector = Detector::new(t0, t1);
    let report = detector.detect_large_variations(1.7).unwrap();

    let summary: Vec<_> = report
        .outliers
        .iter()
        .map(|o| (o.ship_type.as_str(), o.date, o.count, o.bound_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("cruiser", day(2020, 2, 3), 1, BoundType::Min),
            ("freighter", day(2020, 2, 1), 14, BoundType::Max),
            ("freighter", day(2020, 2, 3), 8, BoundType::Min),
        ]
    );
    for outlier in &report.outliers {
        assert_breach_consistent(outlier);
    }
    assert!(report.outliers[0].breach_pct < 0.0);
    assert!(report.outliers[1].breach_pct > 0.0);

    assert_eq!(report.unbaselined.len(), 1);
    assert_eq!(report.unbaselined[0].ship_type, "droid");
    assert_eq!(report.unbaselined[0].dates, 1);
}

#[test]
fn test_invalid_threshold() {
    let data = dataset(vec![daily_series("tug", day(2020, 1, 1), &[1, 2])]);
    for threshold in [0.0, -1.7, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            detect_large_variations(&data, &data, threshold),
            Err(AlertError::InvalidParameter(_))
        ));
    }
}
