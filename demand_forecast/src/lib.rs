//! # Demand Forecast
//!
//! Per-product demand forecasting and inventory replenishment.
//!
//! ## Features
//!
//! - Eligibility filtering of product series by span, volume and density
//! - A recurring event calendar shared by every series fit
//! - Per-series cleaning with upper-tail clipping
//! - Pluggable forecasting oracles behind [`ForecastOracle`]
//! - Temporal holdout backtesting with MAE, RMSE, MAPE, bias and interval coverage
//! - Parallel fan-out with per-series failure isolation
//! - Reorder point and purchase quantity under a service level
//! - Versioned result tables with stable "latest" names
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use demand_forecast::{
//!     run_pipeline, CsvDirectorySink, DataLoader, OnHandInventory, ReferenceOracle, RunConfig,
//!     RunId,
//! };
//!
//! # fn main() -> demand_forecast::error::Result<()> {
//! let config = RunConfig::default();
//! let history = DataLoader::from_csv("sales.csv", &config.columns)?;
//! let inventory = OnHandInventory::from_csv("on_hand.csv")?;
//! let oracle = ReferenceOracle::from_kind(config.oracle);
//! let mut sink = CsvDirectorySink::new("output")?;
//!
//! let report = run_pipeline(&history, &inventory, &oracle, &config, &mut sink, RunId::now())?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

pub mod backtest;
pub mod calendar;
pub mod config;
pub mod data;
pub mod eligibility;
pub mod error;
pub mod fanout;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod preprocess;
pub mod replenishment;
pub mod report;
pub mod run;
pub mod sink;
pub mod utils;

// Re-export commonly used types
pub use crate::calendar::{CalendarEvent, EventCalendar, EventSpec};
pub use crate::config::{OracleKind, RunConfig};
pub use crate::data::{
    DataLoader, ForecastPoint, History, OnHandInventory, RawObservation, RawSeries, RecordType,
    RunId, Series,
};
pub use crate::error::ForecastError;
pub use crate::metrics::{BatchSummary, QualityTier, SeriesMetrics};
pub use crate::models::{FittedOracle, ForecastOracle, ReferenceOracle};
pub use crate::orchestrator::{FailureReason, SeriesOutcome};
pub use crate::replenishment::{ConfidenceTier, ReplenishmentRecommendation};
pub use crate::run::{run_pipeline, RunReport};
pub use crate::sink::{CsvDirectorySink, MemorySink, ResultSink};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
