//! Temporal holdout evaluation and the production refit

use crate::calendar::EventCalendar;
use crate::config::BacktestConfig;
use crate::data::{ForecastPoint, Observation, RecordType, RunId, Series};
use crate::error::{ForecastError, Result};
use crate::metrics::SeriesMetrics;
use crate::models::{FitRequest, FittedOracle, ForecastOracle, PredictedPoint, PredictionTarget};
use crate::utils::future_dates;
use chrono::{Duration, NaiveDate};

/// A series split at `last_date - holdout_days`
#[derive(Debug, Clone, Copy)]
pub struct HoldoutSplit<'a> {
    pub cutoff: NaiveDate,
    /// Rows dated on or before the cutoff
    pub training: &'a [Observation],
    /// Rows dated strictly after the cutoff
    pub holdout: &'a [Observation],
}

/// Split a series into training and holdout slices
pub fn split_holdout(series: &Series, holdout_days: i64) -> HoldoutSplit<'_> {
    let cutoff = series.last_date() - Duration::days(holdout_days);
    let observations = series.observations();
    let at = observations.partition_point(|o| o.date <= cutoff);
    let (training, holdout) = observations.split_at(at);

    HoldoutSplit {
        cutoff,
        training,
        holdout,
    }
}

/// Fit on the training slice and score predictions over the holdout dates
pub fn evaluate_holdout<O: ForecastOracle>(
    oracle: &O,
    split: &HoldoutSplit<'_>,
    calendar: &EventCalendar,
    use_covariate: bool,
    config: &BacktestConfig,
    series_key: &str,
    run_id: &RunId,
) -> Result<SeriesMetrics> {
    let fitted = oracle.fit(&FitRequest {
        observations: split.training,
        calendar,
        use_covariate,
        interval_width: config.interval_width,
    })?;

    let targets: Vec<PredictionTarget> = split
        .holdout
        .iter()
        .map(|o| PredictionTarget::with_covariate(o.date, o.covariate.filter(|_| use_covariate)))
        .collect();
    let predicted = fitted.predict(&targets)?;
    check_predictions(&predicted, targets.len(), series_key)?;

    let actual: Vec<f64> = split.holdout.iter().map(|o| o.value).collect();
    let point: Vec<f64> = predicted.iter().map(|p| p.point).collect();
    let lower: Vec<f64> = predicted.iter().map(|p| p.lower).collect();
    let upper: Vec<f64> = predicted.iter().map(|p| p.upper).collect();

    SeriesMetrics::evaluate(
        series_key,
        run_id,
        split.training.len(),
        &actual,
        &point,
        &lower,
        &upper,
    )
}

/// Refit on the whole series and forecast `horizon_days` past its last date.
///
/// Returns the actual rows followed by the forecast rows. A used covariate is
/// carried forward at its last observed value.
pub fn production_forecast<O: ForecastOracle>(
    oracle: &O,
    series: &Series,
    calendar: &EventCalendar,
    use_covariate: bool,
    config: &BacktestConfig,
    run_id: &RunId,
) -> Result<Vec<ForecastPoint>> {
    let fitted = oracle.fit(&FitRequest {
        observations: series.observations(),
        calendar,
        use_covariate,
        interval_width: config.interval_width,
    })?;

    let covariate = if use_covariate {
        series.last_covariate()
    } else {
        None
    };
    let targets: Vec<PredictionTarget> = future_dates(series.last_date(), config.horizon_days)
        .into_iter()
        .map(|date| PredictionTarget::with_covariate(date, covariate))
        .collect();
    let key = series.key();
    let predicted = fitted.predict(&targets)?;
    check_predictions(&predicted, targets.len(), key)?;

    let mut points: Vec<ForecastPoint> = series
        .observations()
        .iter()
        .map(|o| ForecastPoint::actual(o, key, run_id))
        .collect();
    points.reserve(predicted.len());

    for p in predicted {
        points.push(ForecastPoint {
            date: p.date,
            point_estimate: p.point,
            lower_bound: p.lower,
            upper_bound: p.upper,
            series_key: key.to_string(),
            run_id: run_id.clone(),
            record_type: RecordType::Forecast,
        });
    }

    Ok(points)
}

/// One finite prediction per requested date
fn check_predictions(predicted: &[PredictedPoint], expected: usize, key: &str) -> Result<()> {
    if predicted.len() != expected {
        return Err(ForecastError::OracleError(format!(
            "Oracle returned {} predictions for {} dates",
            predicted.len(),
            expected
        )));
    }
    if let Some(p) = predicted
        .iter()
        .find(|p| !(p.point.is_finite() && p.lower.is_finite() && p.upper.is_finite()))
    {
        return Err(ForecastError::OracleError(format!(
            "Non-finite prediction for {} on {}",
            key, p.date
        )));
    }
    Ok(())
}
