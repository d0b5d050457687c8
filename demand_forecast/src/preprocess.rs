//! Per-series cleaning and upper-tail clipping

use crate::config::PreprocessConfig;
use crate::data::{Observation, RawSeries, Series};
use crate::error::{ForecastError, Result};
use demand_math::percentile;
use tracing::debug;

/// Outcome of cleaning one series
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    pub series: Series,
    /// Upper bound applied to the values
    pub clip_bound: f64,
    pub dropped_rows: usize,
    pub clipped_rows: usize,
}

/// Clean one raw series.
///
/// Rows without a date or value and rows with a negative value are dropped,
/// then every value above `clip_headroom * quantile(clip_quantile)` of the
/// remaining values is lowered to that bound. The quantile is computed from
/// this series alone.
pub fn preprocess(raw: &RawSeries, config: &PreprocessConfig) -> Result<Preprocessed> {
    let mut observations: Vec<Observation> = raw.rows.iter().filter_map(|r| r.usable()).collect();
    let dropped_rows = raw.rows.len() - observations.len();

    if observations.is_empty() {
        return Err(ForecastError::DataError(format!(
            "Series '{}' has no usable rows",
            raw.key
        )));
    }

    observations.sort_by_key(|o| o.date);
    if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(ForecastError::DataError(format!(
            "Series '{}' has duplicate rows for {}",
            raw.key, pair[0].date
        )));
    }

    let values: Vec<f64> = observations.iter().map(|o| o.value).collect();
    let clip_bound = config.clip_headroom * percentile(&values, config.clip_quantile)?;

    let mut clipped_rows = 0;
    for obs in observations.iter_mut() {
        if obs.value > clip_bound {
            obs.value = clip_bound;
            clipped_rows += 1;
        }
    }

    if dropped_rows > 0 || clipped_rows > 0 {
        debug!(
            key = %raw.key,
            dropped_rows,
            clipped_rows,
            clip_bound,
            "preprocessed series"
        );
    }

    Ok(Preprocessed {
        series: Series::new(raw.key.clone(), observations)?,
        clip_bound,
        dropped_rows,
        clipped_rows,
    })
}
