//! Utility functions for the demand_forecast crate

use crate::data::{History, RawObservation, RawSeries};
use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// The `horizon` consecutive days after `last`
pub fn future_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|offset| last + Duration::days(offset))
        .collect()
}

/// Shape of one synthetic demand series
#[derive(Debug, Clone)]
pub struct SyntheticProfile {
    pub key: String,
    pub base_level: f64,
    /// Units added per day
    pub daily_growth: f64,
    /// Amplitude of the weekly cycle
    pub weekly_amplitude: f64,
    pub noise_std: f64,
    /// Probability that a day runs a promotion
    pub promo_rate: f64,
    /// Multiplier applied on promotion days
    pub promo_lift: f64,
    /// Days before the first sale; no rows exist before launch
    pub launch_day: usize,
    /// Probability that a day sells nothing
    pub intermittency: f64,
}

impl SyntheticProfile {
    pub fn new(key: impl Into<String>, base_level: f64) -> Self {
        Self {
            key: key.into(),
            base_level,
            daily_growth: 0.0,
            weekly_amplitude: 0.0,
            noise_std: 0.0,
            promo_rate: 0.0,
            promo_lift: 1.0,
            launch_day: 0,
            intermittency: 0.0,
        }
    }
}

/// Generate a reproducible daily history for each profile
pub fn synthetic_history(
    profiles: &[SyntheticProfile],
    start: NaiveDate,
    days: usize,
    seed: u64,
) -> Result<History> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut history = History::new();

    for profile in profiles {
        let noise = Normal::new(0.0, profile.noise_std.max(0.0))
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;

        let rows = (profile.launch_day.min(days)..days)
            .map(|t| {
                let date = start + Duration::days(t as i64);
                let promo = rng.gen_bool(profile.promo_rate.clamp(0.0, 1.0));
                let idle = rng.gen_bool(profile.intermittency.clamp(0.0, 1.0));
                let mut value = profile.base_level
                    + profile.daily_growth * t as f64
                    + profile.weekly_amplitude * (2.0 * PI * t as f64 / 7.0).sin();
                if promo {
                    value *= profile.promo_lift;
                }
                value += noise.sample(&mut rng);
                if idle {
                    value = 0.0;
                }

                RawObservation::new(date, value.max(0.0).round())
                    .with_covariate(if promo { 1.0 } else { 0.0 })
            })
            .collect();

        history.insert(RawSeries::new(profile.key.clone(), rows));
    }

    Ok(history)
}
