//! # Demand Math
//!
//! Numeric building blocks shared by the demand forecasting engine.
//! This crate provides descriptive statistics, percentile estimation,
//! least-squares line fitting and standard normal quantiles.

use thiserror::Error;

pub mod descriptive;
pub mod distribution;
pub mod regression;

pub use descriptive::{mean, median, percentile, sample_std_dev};
pub use distribution::{two_sided_z, z_for_service_level};
pub use regression::{linear_fit, LineFit};

/// Errors that can occur in demand-related calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for demand math operations
pub type Result<T> = std::result::Result<T, MathError>;
