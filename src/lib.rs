//! # Restock
//!
//! Workspace facade for the demand forecasting and replenishment engine.
//!
//! - [`math`]: descriptive statistics, line fitting and normal quantiles
//! - [`forecast`]: eligibility, backtesting, fan-out and replenishment
//!
//! ## Example
//!
//! ```
//! use restock_workspace::forecast::replenishment::{recommend, ConfidenceTier};
//! use restock_workspace::forecast::config::ReplenishmentPolicy;
//! use restock_workspace::forecast::RunId;
//!
//! let run_id = RunId::new("doc").unwrap();
//! let policy = ReplenishmentPolicy::default();
//! let rec = recommend("sku", &run_id, &[10.0; 30], 8.0, 40.0, &policy).unwrap();
//! assert_eq!(rec.purchase_quantity, 100.0);
//! assert_eq!(rec.confidence_tier, ConfidenceTier::High);
//! ```

pub use demand_forecast as forecast;
pub use demand_math as math;
