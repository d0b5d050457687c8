//! Run-scoped configuration
//!
//! Every component receives the part of [`RunConfig`] it needs, so several runs
//! with different parameters can coexist in one process.

use crate::calendar::EventSpec;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Thresholds a series must meet, all at once, to be forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityCriteria {
    /// Inclusive minimum days between first and last observation
    pub min_span_days: i64,
    /// Total observed units must be strictly greater than this
    pub min_total_volume: f64,
    /// Inclusive minimum number of distinct observed days
    pub min_distinct_days: usize,
}

impl Default for EligibilityCriteria {
    fn default() -> Self {
        Self {
            min_span_days: 730,
            min_total_volume: 500.0,
            min_distinct_days: 700,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Quantile used as the clipping reference
    pub clip_quantile: f64,
    /// Values above `clip_headroom * quantile` are clipped
    pub clip_headroom: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            clip_quantile: 0.99,
            clip_headroom: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub holdout_days: i64,
    pub min_holdout_points: usize,
    pub horizon_days: usize,
    /// Central prediction interval width requested from the oracle
    pub interval_width: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            holdout_days: 30,
            min_holdout_points: 10,
            horizon_days: 90,
            interval_width: 0.80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub events: Vec<EventSpec>,
    pub first_year: i32,
    pub last_year: i32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            events: EventSpec::retail_defaults(),
            first_year: 2018,
            last_year: 2026,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplenishmentPolicy {
    pub lead_time_days: usize,
    /// Forecast days used to estimate demand variability
    pub variability_window_days: usize,
    pub service_level_z: f64,
    /// Target probability of not stocking out; overrides `service_level_z`
    pub service_level: Option<f64>,
}

impl Default for ReplenishmentPolicy {
    fn default() -> Self {
        Self {
            lead_time_days: 14,
            variability_window_days: 30,
            service_level_z: 1.28,
            service_level: None,
        }
    }
}

impl ReplenishmentPolicy {
    /// Safety-stock multiplier
    pub fn z(&self) -> Result<f64> {
        match self.service_level {
            Some(level) => Ok(demand_math::z_for_service_level(level)?),
            None => Ok(self.service_level_z),
        }
    }
}

/// Result table names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub forecasts_table: String,
    pub metrics_table: String,
    pub recommendations_table: String,
    pub forecasts_latest: String,
    pub metrics_latest: String,
    pub recommendations_latest: String,
    /// Suffix table names with the run id
    pub versioned: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            forecasts_table: "demand_forecasts".to_string(),
            metrics_table: "demand_forecast_metrics".to_string(),
            recommendations_table: "replenishment_recommendations".to_string(),
            forecasts_latest: "v_forecast_daily_latest".to_string(),
            metrics_latest: "v_forecast_sku_metrics_latest".to_string(),
            recommendations_latest: "v_replenishment_latest".to_string(),
            versioned: true,
        }
    }
}

/// Column names in the history CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryColumns {
    pub date: String,
    pub product: String,
    pub value: String,
    pub covariate: Option<String>,
}

impl Default for HistoryColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            product: "product".to_string(),
            value: "units_sold".to_string(),
            covariate: Some("promo_flag".to_string()),
        }
    }
}

/// Which reference oracle to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleKind {
    #[default]
    Decomposition,
    HoltLinear,
    SeasonalNaive,
}

/// Complete configuration of one pipeline run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub eligibility: EligibilityCriteria,
    pub preprocess: PreprocessConfig,
    pub backtest: BacktestConfig,
    pub calendar: CalendarConfig,
    pub replenishment: ReplenishmentPolicy,
    pub output: OutputConfig,
    pub columns: HistoryColumns,
    pub oracle: OracleKind,
    /// Worker count; `None` uses every available core
    pub parallelism: Option<usize>,
}

impl RunConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency of all parameters
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ForecastError::InvalidParameter(msg));

        if self.eligibility.min_span_days < 0 {
            return fail("min_span_days must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.preprocess.clip_quantile) {
            return fail(format!(
                "clip_quantile must be within [0, 1], got {}",
                self.preprocess.clip_quantile
            ));
        }
        if self.preprocess.clip_headroom < 1.0 {
            return fail(format!(
                "clip_headroom must be at least 1.0, got {}",
                self.preprocess.clip_headroom
            ));
        }
        if self.backtest.holdout_days <= 0 {
            return fail("holdout_days must be positive".to_string());
        }
        if self.backtest.horizon_days == 0 {
            return fail("horizon_days must be positive".to_string());
        }
        if self.backtest.interval_width <= 0.0 || self.backtest.interval_width >= 1.0 {
            return fail(format!(
                "interval_width must be strictly between 0 and 1, got {}",
                self.backtest.interval_width
            ));
        }
        if self.calendar.first_year > self.calendar.last_year {
            return fail(format!(
                "calendar first_year {} is after last_year {}",
                self.calendar.first_year, self.calendar.last_year
            ));
        }
        if self.replenishment.lead_time_days == 0 {
            return fail("lead_time_days must be positive".to_string());
        }
        if self.replenishment.variability_window_days == 0 {
            return fail("variability_window_days must be positive".to_string());
        }
        if self.replenishment.service_level_z < 0.0 {
            return fail("service_level_z must not be negative".to_string());
        }
        if let Some(level) = self.replenishment.service_level {
            if !(0.5..1.0).contains(&level) {
                return fail(format!("service_level must be in [0.5, 1), got {}", level));
            }
        }
        if self.parallelism == Some(0) {
            return fail("parallelism must be at least 1".to_string());
        }
        // Lead-time demand is summed over forecast days, so the horizon has to cover it.
        if self.replenishment.lead_time_days > self.backtest.horizon_days {
            return fail(format!(
                "lead_time_days ({}) exceeds horizon_days ({})",
                self.replenishment.lead_time_days, self.backtest.horizon_days
            ));
        }

        Ok(())
    }
}
