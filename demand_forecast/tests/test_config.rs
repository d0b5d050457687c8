use demand_forecast::config::{OracleKind, RunConfig};
use demand_forecast::ForecastError;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = RunConfig::default();

    assert_eq!(config.eligibility.min_span_days, 730);
    assert_eq!(config.eligibility.min_total_volume, 500.0);
    assert_eq!(config.eligibility.min_distinct_days, 700);
    assert_eq!(config.backtest.holdout_days, 30);
    assert_eq!(config.backtest.min_holdout_points, 10);
    assert_eq!(config.backtest.horizon_days, 90);
    assert_eq!(config.replenishment.lead_time_days, 14);
    assert_eq!(config.replenishment.variability_window_days, 30);
    assert_eq!(config.replenishment.service_level_z, 1.28);
    assert_eq!(config.calendar.events.len(), 5);
    assert_eq!(config.oracle, OracleKind::Decomposition);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_fills_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "backtest": {{ "horizon_days": 60 }},
            "replenishment": {{ "lead_time_days": 7, "service_level_z": 1.65 }},
            "oracle": "seasonal_naive",
            "parallelism": 2
        }}"#
    )
    .unwrap();

    let config = RunConfig::from_json_file(file.path()).unwrap();

    assert_eq!(config.backtest.horizon_days, 60);
    assert_eq!(config.backtest.holdout_days, 30);
    assert_eq!(config.replenishment.lead_time_days, 7);
    assert_eq!(config.replenishment.variability_window_days, 30);
    assert_eq!(config.oracle, OracleKind::SeasonalNaive);
    assert_eq!(config.parallelism, Some(2));
    assert_eq!(config.output.forecasts_latest, "v_forecast_daily_latest");
}

#[test]
fn test_invalid_json_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "backtest": {{ "interval_width": 1.5 }} }}"#).unwrap();
    assert!(matches!(
        RunConfig::from_json_file(file.path()),
        Err(ForecastError::InvalidParameter(_))
    ));

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    assert!(matches!(
        RunConfig::from_json_file(file.path()),
        Err(ForecastError::JsonError(_))
    ));
}

#[test]
fn test_validation() {
    let mut config = RunConfig::default();
    config.replenishment.lead_time_days = 120;
    assert!(config.validate().is_err());

    let mut config = RunConfig::default();
    config.parallelism = Some(0);
    assert!(config.validate().is_err());

    let mut config = RunConfig::default();
    config.calendar.first_year = 2030;
    assert!(config.validate().is_err());

    let mut config = RunConfig::default();
    config.preprocess.clip_headroom = 0.5;
    assert!(config.validate().is_err());

    let mut config = RunConfig::default();
    config.replenishment.service_level = Some(1.0);
    assert!(config.validate().is_err());
    config.replenishment.service_level = Some(0.9);
    assert!(config.validate().is_ok());
}
