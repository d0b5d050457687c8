//! One complete pipeline run

use crate::calendar::EventCalendar;
use crate::config::{OutputConfig, RunConfig};
use crate::data::{ForecastPoint, History, OnHandInventory, RunId};
use crate::eligibility::eligible_keys;
use crate::error::{ForecastError, Result};
use crate::fanout::fan_out;
use crate::metrics::{BatchSummary, SeriesMetrics};
use crate::models::ForecastOracle;
use crate::orchestrator::SeriesFailure;
use crate::replenishment::{recommend_all, ReplenishmentRecommendation};
use crate::sink::{Publication, ResultSink};
use tracing::{debug, info};

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub summary: BatchSummary,
    pub metrics: Vec<SeriesMetrics>,
    pub recommendations: Vec<ReplenishmentRecommendation>,
    pub failures: Vec<SeriesFailure>,
    pub forecast_rows: usize,
    pub publications: Vec<Publication>,
    pub holdout_days: i64,
    pub horizon_days: usize,
    /// Nominal coverage of the prediction intervals
    pub interval_width: f64,
}

/// Versioned table names of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub forecasts: String,
    pub metrics: String,
    pub recommendations: String,
}

impl TableNames {
    pub fn for_run(output: &OutputConfig, run_id: &RunId) -> Self {
        let name = |base: &str| {
            if output.versioned {
                format!("{}_{}", base, run_id)
            } else {
                base.to_string()
            }
        };

        Self {
            forecasts: name(&output.forecasts_table),
            metrics: name(&output.metrics_table),
            recommendations: name(&output.recommendations_table),
        }
    }

    fn publications(&self, output: &OutputConfig) -> Vec<Publication> {
        vec![
            Publication::new(&output.forecasts_latest, &self.forecasts),
            Publication::new(&output.metrics_latest, &self.metrics),
            Publication::new(&output.recommendations_latest, &self.recommendations),
        ]
    }
}

/// Run eligibility, fan-out, replenishment and persistence.
///
/// Fails when no series succeeds or when the sink fails; the stable names are
/// only published after every table of the run has been written.
pub fn run_pipeline<O, S>(
    history: &History,
    inventory: &OnHandInventory,
    oracle: &O,
    config: &RunConfig,
    sink: &mut S,
    run_id: RunId,
) -> Result<RunReport>
where
    O: ForecastOracle,
    S: ResultSink,
{
    config.validate()?;

    let keys = eligible_keys(history, &config.eligibility);
    info!(
        run_id = %run_id,
        products = history.len(),
        rows = history.row_count(),
        eligible = keys.len(),
        "starting forecast run"
    );

    let calendar = EventCalendar::build(
        &config.calendar.events,
        config.calendar.first_year..=config.calendar.last_year,
    );
    info!(events = calendar.len(), "event calendar built");

    let batch = fan_out(history, &keys, oracle, &calendar, config, &run_id)?;

    let recommendations = recommend_all(&batch.successes, inventory, &config.replenishment)?;
    let metrics: Vec<SeriesMetrics> = batch.successes.iter().map(|s| s.metrics.clone()).collect();
    let forecasts: Vec<&ForecastPoint> = batch.successes.iter().flat_map(|s| &s.points).collect();

    let expected_forecast_rows = batch.successes.len() * config.backtest.horizon_days;
    let forecast_rows = forecasts.iter().filter(|p| p.is_forecast()).count();
    if forecast_rows != expected_forecast_rows {
        return Err(ForecastError::ValidationError(format!(
            "Expected {} forecast rows, assembled {}",
            expected_forecast_rows, forecast_rows
        )));
    }

    let tables = TableNames::for_run(&config.output, &run_id);
    sink.replace_table(&tables.forecasts, &forecasts)?;
    sink.replace_table(&tables.metrics, &metrics)?;
    sink.replace_table(&tables.recommendations, &recommendations)?;

    let publications = tables.publications(&config.output);
    sink.publish_latest(&run_id, &publications)?;

    for (table, rows) in [
        (&tables.forecasts, forecasts.len()),
        (&tables.metrics, metrics.len()),
        (&tables.recommendations, recommendations.len()),
    ] {
        info!(table = %table, rows, "table written");
    }
    if let Some(last) = forecasts.iter().map(|p| p.date).max() {
        info!(last_forecast_date = %last, "forecast horizon end");
    }
    for rec in &recommendations {
        if rec.purchase_quantity > 0.0 {
            info!(
                series = %rec.series_key,
                purchase = rec.purchase_quantity,
                reorder_point = rec.reorder_point,
                "REORDER NOW"
            );
        } else {
            debug!(series = %rec.series_key, on_hand = rec.on_hand_quantity, "stock ok");
        }
    }

    let failure_lines: Vec<String> = batch.failures.iter().map(|f| f.to_string()).collect();
    let summary = BatchSummary::new(keys.len(), failure_lines, &metrics);
    info!(
        run_id = %run_id,
        rows = forecasts.len(),
        series = metrics.len(),
        recommendations = recommendations.len(),
        median_mape = ?summary.median_mape,
        quality = ?summary.quality,
        "forecast run complete"
    );

    Ok(RunReport {
        run_id,
        summary,
        metrics,
        recommendations,
        failures: batch.failures,
        forecast_rows: forecasts.len(),
        publications,
        holdout_days: config.backtest.holdout_days,
        horizon_days: config.backtest.horizon_days,
        interval_width: config.backtest.interval_width,
    })
}
