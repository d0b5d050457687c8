//! Seasonal naive baseline: repeat the value observed one season earlier

use crate::error::{ForecastError, Result};
use crate::models::{
    bounded_point, FitRequest, FittedOracle, ForecastOracle, PredictedPoint, PredictionTarget,
};
use chrono::{Duration, NaiveDate};
use demand_math::{mean, sample_std_dev, two_sided_z};
use std::collections::BTreeMap;
use tracing::debug;

/// Seasonal naive oracle with a period in days
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    name: String,
    period: i64,
}

impl Default for SeasonalNaive {
    fn default() -> Self {
        Self {
            name: "Seasonal Naive (period=7)".to_string(),
            period: 7,
        }
    }
}

impl SeasonalNaive {
    pub fn new(period: i64) -> Result<Self> {
        if period <= 0 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Seasonal Naive (period={})", period),
            period,
        })
    }
}

/// Fitted seasonal naive model
#[derive(Debug, Clone)]
pub struct FittedSeasonalNaive {
    period: i64,
    values: BTreeMap<NaiveDate, f64>,
    last_date: NaiveDate,
    fallback: f64,
    /// Standard deviation of one-season differences
    sigma: f64,
    z: f64,
}

impl ForecastOracle for SeasonalNaive {
    type Fitted = FittedSeasonalNaive;

    fn fit(&self, request: &FitRequest<'_>) -> Result<Self::Fitted> {
        request.require_observations(1)?;
        let values: BTreeMap<NaiveDate, f64> = request
            .observations
            .iter()
            .map(|o| (o.date, o.value))
            .collect();

        let lag = Duration::days(self.period);
        let diffs: Vec<f64> = values
            .iter()
            .filter_map(|(date, v)| values.get(&(*date - lag)).map(|prev| v - prev))
            .collect();
        let sigma = if diffs.len() >= 2 {
            sample_std_dev(&diffs)?
        } else {
            0.0
        };

        let all: Vec<f64> = values.values().copied().collect();
        let fallback = mean(&all)?;
        let last_date = request.observations[request.observations.len() - 1].date;

        debug!(period = self.period, sigma, "fitted seasonal naive");

        Ok(FittedSeasonalNaive {
            period: self.period,
            values,
            last_date,
            fallback,
            sigma,
            z: two_sided_z(request.interval_width)?,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedSeasonalNaive {
    /// Value from the latest observed date in the same seasonal phase, and how
    /// many seasons back it lies
    fn seasonal_value(&self, date: NaiveDate) -> (f64, f64) {
        let gap = (date - self.last_date).num_days();
        let mut seasons = if gap > 0 {
            (gap + self.period - 1) / self.period
        } else {
            1
        };

        let first = self.values.keys().next().copied().unwrap_or(self.last_date);
        loop {
            let candidate = date - Duration::days(seasons * self.period);
            if candidate < first {
                return (self.fallback, seasons as f64);
            }
            if let Some(v) = self.values.get(&candidate) {
                return (*v, seasons as f64);
            }
            seasons += 1;
        }
    }
}

impl FittedOracle for FittedSeasonalNaive {
    fn predict(&self, targets: &[PredictionTarget]) -> Result<Vec<PredictedPoint>> {
        Ok(targets
            .iter()
            .map(|t| {
                let (point, seasons) = self.seasonal_value(t.date);
                bounded_point(t.date, point, self.z * self.sigma * seasons.sqrt())
            })
            .collect())
    }
}
