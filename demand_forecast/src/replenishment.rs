//! Reorder point and purchase quantity from a demand forecast

use crate::config::ReplenishmentPolicy;
use crate::data::{OnHandInventory, RunId};
use crate::error::Result;
use crate::orchestrator::SeriesForecast;
use demand_math::sample_std_dev;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Trust level of a recommendation, from holdout MAPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_mape(mape: f64) -> Self {
        if mape < 15.0 {
            Self::High
        } else if mape < 25.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentRecommendation {
    pub series_key: String,
    pub run_id: RunId,
    pub on_hand_quantity: f64,
    pub lead_time_demand: f64,
    pub forecast_std: f64,
    pub safety_stock: f64,
    pub reorder_point: f64,
    pub purchase_quantity: f64,
    pub mape: f64,
    pub confidence_tier: ConfidenceTier,
}

/// Compute one recommendation.
///
/// `forecast` holds point estimates of the future days, nearest first. Demand
/// over the lead time is the sum of the first `lead_time_days` points;
/// variability is the sample standard deviation of the first
/// `variability_window_days` points, zero when fewer than two are available.
pub fn recommend(
    series_key: &str,
    run_id: &RunId,
    forecast: &[f64],
    mape: f64,
    on_hand_quantity: f64,
    policy: &ReplenishmentPolicy,
) -> Result<ReplenishmentRecommendation> {
    let lead_window = &forecast[..policy.lead_time_days.min(forecast.len())];
    let lead_time_demand: f64 = lead_window.iter().sum();

    let variability_window = &forecast[..policy.variability_window_days.min(forecast.len())];
    let forecast_std = if variability_window.len() >= 2 {
        sample_std_dev(variability_window)?
    } else {
        0.0
    };

    let safety_stock = policy.z()? * forecast_std * (policy.lead_time_days as f64).sqrt();
    let reorder_point = lead_time_demand + safety_stock;
    let purchase_quantity = (reorder_point - on_hand_quantity).max(0.0);

    Ok(ReplenishmentRecommendation {
        series_key: series_key.to_string(),
        run_id: run_id.clone(),
        on_hand_quantity,
        lead_time_demand,
        forecast_std,
        safety_stock,
        reorder_point,
        purchase_quantity,
        mape,
        confidence_tier: ConfidenceTier::from_mape(mape),
    })
}

/// Recommendations for every successful series, largest purchase first
pub fn recommend_all(
    forecasts: &[SeriesForecast],
    inventory: &OnHandInventory,
    policy: &ReplenishmentPolicy,
) -> Result<Vec<ReplenishmentRecommendation>> {
    let mut recommendations = forecasts
        .iter()
        .map(|f| {
            let points: Vec<f64> = f.forecast_points().map(|p| p.point_estimate).collect();
            recommend(
                &f.key,
                &f.metrics.run_id,
                &points,
                f.metrics.mean_absolute_percentage_error,
                inventory.get(&f.key),
                policy,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    sort_for_triage(&mut recommendations);
    Ok(recommendations)
}

/// Purchase quantity descending, ties by key
pub fn sort_for_triage(recommendations: &mut [ReplenishmentRecommendation]) {
    recommendations.sort_by(|a, b| {
        b.purchase_quantity
            .partial_cmp(&a.purchase_quantity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.series_key.cmp(&b.series_key))
    });
}
