mod common;

use approx::assert_abs_diff_eq;
use common::{daily_series, flagship_value, start, ExactOracle};
use demand_forecast::config::RunConfig;
use demand_forecast::data::{History, OnHandInventory, RunId};
use demand_forecast::report::render_markdown;
use demand_forecast::sink::MANIFEST_FILE;
use demand_forecast::utils::{synthetic_history, SyntheticProfile};
use demand_forecast::{
    run_pipeline, ConfidenceTier, CsvDirectorySink, ForecastError, MemorySink, QualityTier,
    ReferenceOracle,
};
use tempfile::tempdir;

fn flagship_history() -> History {
    vec![
        daily_series("Flagship Growth", 900, flagship_value),
        // Far too short to be eligible
        daily_series("Tiny", 100, |_| 1.0),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_flagship_growth_end_to_end() {
    let history = flagship_history();
    let config = RunConfig::default();
    let mut sink = MemorySink::new();
    let run_id = RunId::new("e2e").unwrap();

    let report = run_pipeline(
        &history,
        &OnHandInventory::new(),
        &ExactOracle::new(flagship_value),
        &config,
        &mut sink,
        run_id.clone(),
    )
    .unwrap();

    assert_eq!(report.summary.eligible, 1);
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.quality, Some(QualityTier::Excellent));

    let metrics = &report.metrics[0];
    assert_eq!(metrics.series_key, "Flagship Growth");
    assert_eq!(metrics.holdout_count, 30);
    assert_eq!(metrics.training_count, 870);
    assert_abs_diff_eq!(metrics.mean_absolute_percentage_error, 0.0);
    assert_abs_diff_eq!(metrics.interval_coverage_pct, 100.0);

    let rec = &report.recommendations[0];
    assert_eq!(rec.confidence_tier, ConfidenceTier::High);
    assert_abs_diff_eq!(rec.lead_time_demand, 700.0, epsilon = 1e-6);
    assert!(rec.safety_stock > 0.0 && rec.safety_stock < 50.0);
    assert!(rec.purchase_quantity > 700.0 && rec.purchase_quantity < 750.0);

    // Stable names resolve to this run's tables
    assert_eq!(sink.latest_run(), Some(&run_id));
    assert_eq!(sink.latest("v_forecast_daily_latest").unwrap().len(), 900 + 90);
    assert_eq!(sink.latest("v_forecast_sku_metrics_latest").unwrap().len(), 1);
    assert_eq!(sink.latest("v_replenishment_latest").unwrap().len(), 1);
    assert!(sink.table("demand_forecasts_e2e").is_some());

    let first_row = &sink.latest("v_forecast_daily_latest").unwrap()[0];
    assert_eq!(first_row["record_type"], "actual");
    assert_eq!(first_row["run_id"], "e2e");
    assert_eq!(first_row["date"], start().to_string());

    let markdown = render_markdown(&report);
    assert!(markdown.contains("Flagship Growth"));
    assert!(markdown.contains("EXCELLENT"));
    assert!(markdown.contains("HIGH"));
    assert!(markdown.contains("Holdout: 30 days, horizon: 90 days, interval: 80%"));
    assert!(markdown.contains("meets the 80% target"));
}

#[test]
fn test_on_hand_reduces_purchase() {
    let history = flagship_history();
    let config = RunConfig::default();
    let oracle = ExactOracle::new(flagship_value);
    let run = |inventory: OnHandInventory| {
        run_pipeline(
            &history,
            &inventory,
            &oracle,
            &config,
            &mut MemorySink::new(),
            RunId::new("inv").unwrap(),
        )
        .unwrap()
        .recommendations[0]
            .purchase_quantity
    };

    let empty = run(OnHandInventory::new());
    let stocked = run(vec![("Flagship Growth", 300.0)].into_iter().collect());
    let overstocked = run(vec![("Flagship Growth", 5000.0)].into_iter().collect());

    assert_abs_diff_eq!(empty - stocked, 300.0, epsilon = 1e-6);
    assert_eq!(overstocked, 0.0);
}

#[test]
fn test_nothing_eligible_fails_run_without_writing() {
    let history: History = vec![daily_series("Tiny", 100, |_| 1.0)].into_iter().collect();
    let mut sink = MemorySink::new();

    let err = run_pipeline(
        &history,
        &OnHandInventory::new(),
        &ExactOracle::new(|_| 1.0),
        &RunConfig::default(),
        &mut sink,
        RunId::new("none").unwrap(),
    )
    .unwrap_err();

    assert!(matches!(err, ForecastError::NoSuccessfulSeries { .. }));
    assert_eq!(sink.table_names().count(), 0);
    assert!(sink.latest_run().is_none());
}

#[test]
fn test_reference_oracle_run_to_csv() {
    let profiles = vec![
        SyntheticProfile {
            weekly_amplitude: 6.0,
            noise_std: 2.0,
            ..SyntheticProfile::new("steady", 40.0)
        },
        SyntheticProfile {
            daily_growth: 0.03,
            weekly_amplitude: 8.0,
            noise_std: 3.0,
            promo_rate: 0.1,
            promo_lift: 1.5,
            ..SyntheticProfile::new("growing", 60.0)
        },
        SyntheticProfile::new("sparse", 0.2),
    ];
    let history = synthetic_history(&profiles, start(), 900, 11).unwrap();
    let config = RunConfig::default();
    let dir = tempdir().unwrap();
    let mut sink = CsvDirectorySink::new(dir.path()).unwrap();

    let report = run_pipeline(
        &history,
        &OnHandInventory::new(),
        &ReferenceOracle::from_kind(config.oracle),
        &config,
        &mut sink,
        RunId::new("csv_run").unwrap(),
    )
    .unwrap();

    assert_eq!(report.summary.eligible, 2);
    assert_eq!(report.summary.succeeded, 2);
    assert!(report
        .metrics
        .iter()
        .all(|m| m.mean_absolute_percentage_error < 25.0));
    assert!(
        report.recommendations[0].purchase_quantity >= report.recommendations[1].purchase_quantity
    );

    for name in [
        "demand_forecasts_csv_run",
        "v_forecast_daily_latest",
        "v_forecast_sku_metrics_latest",
        "v_replenishment_latest",
    ] {
        assert!(sink.table_path(name).exists(), "missing {}", name);
    }
    assert!(dir.path().join(MANIFEST_FILE).exists());
    assert_eq!(report.forecast_rows, 2 * (900 + 90));
}

#[test]
fn test_synthetic_history_is_reproducible() {
    let profiles = vec![SyntheticProfile {
        noise_std: 5.0,
        promo_rate: 0.3,
        promo_lift: 2.0,
        ..SyntheticProfile::new("p", 30.0)
    }];

    let a = synthetic_history(&profiles, start(), 50, 3).unwrap();
    let b = synthetic_history(&profiles, start(), 50, 3).unwrap();
    assert_eq!(a.get("p").unwrap(), b.get("p").unwrap());
    assert!(a
        .get("p")
        .unwrap()
        .rows
        .iter()
        .all(|r| r.value.unwrap() >= 0.0));
}

#[test]
fn test_synthetic_launch_and_intermittency() {
    let profiles = vec![
        SyntheticProfile {
            launch_day: 40,
            ..SyntheticProfile::new("late", 30.0)
        },
        SyntheticProfile {
            intermittency: 1.0,
            ..SyntheticProfile::new("idle", 30.0)
        },
    ];
    let history = synthetic_history(&profiles, start(), 100, 5).unwrap();

    let late = history.get("late").unwrap();
    assert_eq!(late.rows.len(), 60);
    assert_eq!(late.rows[0].date, Some(start() + chrono::Duration::days(40)));

    let idle = history.get("idle").unwrap();
    assert_eq!(idle.rows.len(), 100);
    assert!(idle.rows.iter().all(|r| r.value == Some(0.0)));
}
