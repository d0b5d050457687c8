mod common;

use approx::assert_abs_diff_eq;
use chrono::Duration;
use common::{date, start};
use demand_forecast::config::PreprocessConfig;
use demand_forecast::data::{RawObservation, RawSeries};
use demand_forecast::preprocess::preprocess;
use demand_forecast::ForecastError;

fn rows_from(values: &[f64]) -> Vec<RawObservation> {
    values
        .iter()
        .enumerate()
        .map(|(t, v)| RawObservation::new(start() + Duration::days(t as i64), *v))
        .collect()
}

#[test]
fn test_spike_is_clipped_to_bound() {
    let mut values: Vec<f64> = (1..=100).map(f64::from).collect();
    values.push(10_000.0);
    let raw = RawSeries::new("spiky", rows_from(&values));

    let out = preprocess(&raw, &PreprocessConfig::default()).unwrap();

    // p99 of 101 values sits exactly on 100
    assert_abs_diff_eq!(out.clip_bound, 120.0, epsilon = 1e-9);
    assert_eq!(out.clipped_rows, 1);

    let cleaned = out.series.values();
    assert_abs_diff_eq!(cleaned[100], 120.0, epsilon = 1e-9);
    // Everything under the bound is untouched
    assert_eq!(&cleaned[..100], &values[..100]);
    assert!(cleaned.iter().all(|v| *v <= out.clip_bound));
}

#[test]
fn test_missing_and_negative_rows_dropped() {
    let mut rows = rows_from(&[5.0, -1.0, 7.0, 6.0]);
    rows.push(RawObservation {
        date: None,
        value: Some(4.0),
        covariate: None,
    });
    rows.push(RawObservation {
        date: Some(date(2022, 2, 1)),
        value: None,
        covariate: None,
    });
    rows.push(RawObservation::new(date(2022, 2, 2), f64::NAN));
    let raw = RawSeries::new("dirty", rows);

    let out = preprocess(&raw, &PreprocessConfig::default()).unwrap();

    assert_eq!(out.dropped_rows, 4);
    assert_eq!(out.series.len(), 3);
    assert!(out.series.values().iter().all(|v| *v >= 0.0));
}

#[test]
fn test_rows_are_sorted_by_date() {
    let raw = RawSeries::new(
        "shuffled",
        vec![
            RawObservation::new(date(2022, 1, 3), 3.0),
            RawObservation::new(date(2022, 1, 1), 1.0),
            RawObservation::new(date(2022, 1, 2), 2.0),
        ],
    );

    let out = preprocess(&raw, &PreprocessConfig::default()).unwrap();
    assert_eq!(out.series.first_date(), date(2022, 1, 1));
    assert_eq!(out.series.values(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_duplicate_dates_rejected() {
    let raw = RawSeries::new(
        "dupes",
        vec![
            RawObservation::new(date(2022, 1, 1), 1.0),
            RawObservation::new(date(2022, 1, 1), 2.0),
        ],
    );

    let err = preprocess(&raw, &PreprocessConfig::default()).unwrap_err();
    assert!(matches!(err, ForecastError::DataError(_)));
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn test_no_usable_rows_is_error() {
    let raw = RawSeries::new("negative", rows_from(&[-1.0, -2.0]));
    assert!(preprocess(&raw, &PreprocessConfig::default()).is_err());
}

#[test]
fn test_bound_is_per_series() {
    let small = RawSeries::new("small", rows_from(&[1.0; 50]));
    let large = RawSeries::new("large", rows_from(&[1000.0; 50]));
    let config = PreprocessConfig::default();

    let small_out = preprocess(&small, &config).unwrap();
    let large_out = preprocess(&large, &config).unwrap();

    assert_abs_diff_eq!(small_out.clip_bound, 1.2, epsilon = 1e-9);
    assert_abs_diff_eq!(large_out.clip_bound, 1200.0, epsilon = 1e-9);
    assert_eq!(small_out.clipped_rows, 0);
    assert_eq!(large_out.clipped_rows, 0);
}

#[test]
fn test_covariate_survives_cleaning() {
    let rows = vec![
        RawObservation::new(date(2022, 1, 1), 1.0).with_covariate(0.0),
        RawObservation::new(date(2022, 1, 2), 2.0).with_covariate(1.0),
    ];
    let out = preprocess(&RawSeries::new("promo", rows), &PreprocessConfig::default()).unwrap();

    assert!(out.series.covariate_is_informative());
    assert_eq!(out.series.last_covariate(), Some(1.0));
}
