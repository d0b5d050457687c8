//! Parallel fan-out of the per-series pipeline over a bounded worker pool

use crate::calendar::EventCalendar;
use crate::config::RunConfig;
use crate::data::{History, RunId};
use crate::error::{ForecastError, Result};
use crate::models::ForecastOracle;
use crate::orchestrator::{
    forecast_series, FailureReason, SeriesFailure, SeriesForecast, SeriesOutcome,
};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{info, warn};

/// Number of failures written to the log per batch
pub const LOGGED_FAILURES: usize = 5;

/// Partitioned outcomes of one batch
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub eligible: usize,
    /// Sorted by key
    pub successes: Vec<SeriesForecast>,
    /// Sorted by key
    pub failures: Vec<SeriesFailure>,
}

impl BatchOutcome {
    /// Split outcomes into successes and failures
    pub fn from_outcomes(outcomes: Vec<SeriesOutcome>) -> Self {
        let eligible = outcomes.len();
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                SeriesOutcome::Success(s) => successes.push(s),
                SeriesOutcome::Failure(f) => failures.push(f),
            }
        }
        successes.sort_by(|a, b| a.key.cmp(&b.key));
        failures.sort_by(|a, b| a.key.cmp(&b.key));

        Self {
            eligible,
            successes,
            failures,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Process one key, converting a missing history or a panic into a failure
fn isolated<O: ForecastOracle>(
    key: &str,
    history: &History,
    oracle: &O,
    calendar: &EventCalendar,
    config: &RunConfig,
    run_id: &RunId,
) -> SeriesOutcome {
    let Some(raw) = history.get(key) else {
        return SeriesOutcome::Failure(SeriesFailure {
            key: key.to_string(),
            reason: FailureReason::Preprocessing("no history for key".to_string()),
        });
    };

    catch_unwind(AssertUnwindSafe(|| {
        forecast_series(raw, oracle, calendar, config, run_id)
    }))
    .unwrap_or_else(|payload| {
        SeriesOutcome::Failure(SeriesFailure {
            key: key.to_string(),
            reason: FailureReason::Panicked(panic_message(payload)),
        })
    })
}

/// Forecast every key concurrently.
///
/// Series are independent; the pool size comes from `config.parallelism`, or
/// every available core when unset. A batch without any success is an error.
pub fn fan_out<O: ForecastOracle>(
    history: &History,
    keys: &[String],
    oracle: &O,
    calendar: &EventCalendar,
    config: &RunConfig,
    run_id: &RunId,
) -> Result<BatchOutcome> {
    let mut builder = ThreadPoolBuilder::new();
    if let Some(workers) = config.parallelism {
        builder = builder.num_threads(workers);
    }
    let pool = builder
        .build()
        .map_err(|e| ForecastError::InvalidParameter(format!("Cannot build worker pool: {}", e)))?;

    info!(
        series = keys.len(),
        workers = pool.current_num_threads(),
        oracle = oracle.name(),
        "forecasting eligible series"
    );

    let outcomes: Vec<SeriesOutcome> = pool.install(|| {
        keys.par_iter()
            .map(|key| isolated(key, history, oracle, calendar, config, run_id))
            .collect()
    });

    let batch = BatchOutcome::from_outcomes(outcomes);

    for failure in batch.failures.iter().take(LOGGED_FAILURES) {
        warn!(key = %failure.key, reason = %failure.reason, "series failed");
    }
    if batch.failures.len() > LOGGED_FAILURES {
        warn!(
            omitted = batch.failures.len() - LOGGED_FAILURES,
            "further series failures not logged"
        );
    }

    info!(
        eligible = batch.eligible,
        succeeded = batch.successes.len(),
        failed = batch.failures.len(),
        "fan-out complete"
    );

    if batch.successes.is_empty() {
        return Err(ForecastError::NoSuccessfulSeries {
            eligible: batch.eligible,
            failed: batch.failures.len(),
        });
    }

    Ok(batch)
}
