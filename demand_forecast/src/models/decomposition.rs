//! Additive trend, weekday and event decomposition

use crate::calendar::EventCalendar;
use crate::error::{ForecastError, Result};
use crate::models::{
    bounded_point, day_index, FitRequest, FittedOracle, ForecastOracle, PredictedPoint,
    PredictionTarget,
};
use chrono::{Datelike, NaiveDate};
use demand_math::{linear_fit, mean, sample_std_dev, two_sided_z, LineFit};
use tracing::debug;

/// Decomposition oracle
///
/// Fits `y = trend(t) + weekday(t) + events(t) + covariate(t) + e`, each
/// component estimated on the residual of the previous ones. The interval is
/// `point ± z * std(e)`.
#[derive(Debug, Clone)]
pub struct Decomposition {
    name: String,
    /// Minimum covered training days before an event effect is estimated
    min_event_days: usize,
}

impl Default for Decomposition {
    fn default() -> Self {
        Self {
            name: "Decomposition".to_string(),
            min_event_days: 3,
        }
    }
}

impl Decomposition {
    pub fn new(min_event_days: usize) -> Result<Self> {
        if min_event_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_event_days must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Decomposition (min_event_days={})", min_event_days),
            min_event_days,
        })
    }
}

/// Fitted decomposition
#[derive(Debug, Clone)]
pub struct FittedDecomposition {
    origin: NaiveDate,
    trend: LineFit,
    /// Effect per weekday, Monday first
    weekday: [f64; 7],
    calendar: EventCalendar,
    /// Effect per event name
    events: Vec<(String, f64)>,
    covariate: Option<LineFit>,
    covariate_fill: Option<f64>,
    half_width: f64,
}

impl ForecastOracle for Decomposition {
    type Fitted = FittedDecomposition;

    fn fit(&self, request: &FitRequest<'_>) -> Result<Self::Fitted> {
        request.require_observations(2)?;
        let obs = request.observations;
        let origin = obs[0].date;

        let xs: Vec<f64> = obs.iter().map(|o| day_index(origin, o.date)).collect();
        let ys: Vec<f64> = obs.iter().map(|o| o.value).collect();
        let trend = linear_fit(&xs, &ys)?;

        let mut residual: Vec<f64> = xs.iter().zip(&ys).map(|(x, y)| y - trend.at(*x)).collect();

        // Weekday effects, centred so they average to zero
        let mut sums = [0.0; 7];
        let mut counts = [0usize; 7];
        for (o, r) in obs.iter().zip(&residual) {
            let wd = o.date.weekday().num_days_from_monday() as usize;
            sums[wd] += r;
            counts[wd] += 1;
        }
        let mut weekday = [0.0; 7];
        for wd in 0..7 {
            if counts[wd] > 0 {
                weekday[wd] = sums[wd] / counts[wd] as f64;
            }
        }
        let seen: Vec<f64> = (0..7).filter(|&wd| counts[wd] > 0).map(|wd| weekday[wd]).collect();
        let centre = mean(&seen)?;
        for wd in 0..7 {
            if counts[wd] > 0 {
                weekday[wd] -= centre;
            }
        }
        for (o, r) in obs.iter().zip(residual.iter_mut()) {
            *r -= weekday[o.date.weekday().num_days_from_monday() as usize];
        }

        let mut events = Vec::new();
        for name in request.calendar.event_names() {
            let covered: Vec<usize> = obs
                .iter()
                .enumerate()
                .filter(|(_, o)| {
                    request
                        .calendar
                        .events_covering(o.date)
                        .any(|e| e.name == name)
                })
                .map(|(i, _)| i)
                .collect();
            if covered.len() < self.min_event_days {
                continue;
            }

            let effect = covered.iter().map(|&i| residual[i]).sum::<f64>() / covered.len() as f64;
            for &i in &covered {
                residual[i] -= effect;
            }
            events.push((name.to_string(), effect));
        }

        let mut covariate = None;
        if request.use_covariate {
            let (cx, cy): (Vec<f64>, Vec<f64>) = obs
                .iter()
                .zip(&residual)
                .filter_map(|(o, r)| o.covariate.map(|c| (c, *r)))
                .unzip();
            if !cx.is_empty() {
                let fit = linear_fit(&cx, &cy)?;
                for (o, r) in obs.iter().zip(residual.iter_mut()) {
                    if let Some(c) = o.covariate {
                        *r -= fit.at(c);
                    }
                }
                covariate = Some(fit);
            }
        }

        let sigma = if residual.len() >= 2 {
            sample_std_dev(&residual)?
        } else {
            0.0
        };
        let half_width = two_sided_z(request.interval_width)? * sigma;

        debug!(
            observations = obs.len(),
            slope = trend.slope,
            events = events.len(),
            sigma,
            "fitted decomposition"
        );

        Ok(FittedDecomposition {
            origin,
            trend,
            weekday,
            calendar: request.calendar.clone(),
            events,
            covariate,
            covariate_fill: obs.iter().rev().find_map(|o| o.covariate),
            half_width,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedDecomposition {
    fn point_at(&self, target: &PredictionTarget) -> f64 {
        let date = target.date;
        let mut point = self.trend.at(day_index(self.origin, date))
            + self.weekday[date.weekday().num_days_from_monday() as usize];

        for (name, effect) in &self.events {
            if self.calendar.events_covering(date).any(|e| &e.name == name) {
                point += effect;
            }
        }

        if let (Some(fit), Some(c)) = (&self.covariate, target.covariate.or(self.covariate_fill)) {
            point += fit.at(c);
        }

        point
    }
}

impl FittedOracle for FittedDecomposition {
    fn predict(&self, targets: &[PredictionTarget]) -> Result<Vec<PredictedPoint>> {
        Ok(targets
            .iter()
            .map(|t| bounded_point(t.date, self.point_at(t), self.half_width))
            .collect())
    }
}
