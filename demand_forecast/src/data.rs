//! Demand history, inventory input and forecast output records

use crate::config::HistoryColumns;
use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, Utc};
use polars::prelude::{CsvReader, DataFrame, DataType, SerReader};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// One uncleaned history row; any field may be missing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawObservation {
    pub date: Option<NaiveDate>,
    pub value: Option<f64>,
    pub covariate: Option<f64>,
}

impl RawObservation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date: Some(date),
            value: Some(value),
            covariate: None,
        }
    }

    pub fn with_covariate(mut self, covariate: f64) -> Self {
        self.covariate = Some(covariate);
        self
    }

    /// The row as a clean observation, if it has a date and a finite, non-negative value
    pub fn usable(&self) -> Option<Observation> {
        match (self.date, self.value) {
            (Some(date), Some(value)) if value.is_finite() && value >= 0.0 => Some(Observation {
                date,
                value,
                covariate: self.covariate.filter(|c| c.is_finite()),
            }),
            _ => None,
        }
    }
}

/// All history rows of one product, as delivered by the history source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSeries {
    pub key: String,
    pub rows: Vec<RawObservation>,
}

impl RawSeries {
    pub fn new(key: impl Into<String>, rows: Vec<RawObservation>) -> Self {
        Self {
            key: key.into(),
            rows,
        }
    }
}

/// A cleaned daily observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
    pub covariate: Option<f64>,
}

/// A cleaned product series: dates strictly increasing, values finite and non-negative
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    key: String,
    observations: Vec<Observation>,
}

impl Series {
    /// Create a series, validating ordering and values
    pub fn new(key: impl Into<String>, observations: Vec<Observation>) -> Result<Self> {
        let key = key.into();
        if observations.is_empty() {
            return Err(ForecastError::DataError(format!(
                "Series '{}' has no observations",
                key
            )));
        }

        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ForecastError::DataError(format!(
                    "Series '{}' dates are not strictly increasing at {}",
                    key, pair[1].date
                )));
            }
        }

        if let Some(bad) = observations
            .iter()
            .find(|o| !o.value.is_finite() || o.value < 0.0)
        {
            return Err(ForecastError::DataError(format!(
                "Series '{}' has invalid value {} on {}",
                key, bad.value, bad.date
            )));
        }

        Ok(Self { key, observations })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.observations[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].date
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// Last observed covariate value, if any row carries one
    pub fn last_covariate(&self) -> Option<f64> {
        self.observations.iter().rev().find_map(|o| o.covariate)
    }

    /// True when the covariate takes at least two distinct values.
    ///
    /// A constant covariate carries no information for the oracle.
    pub fn covariate_is_informative(&self) -> bool {
        let distinct: HashSet<u64> = self
            .observations
            .iter()
            .filter_map(|o| o.covariate)
            .map(f64::to_bits)
            .collect();
        distinct.len() >= 2
    }
}

/// Raw history for every product, keyed by product
#[derive(Debug, Clone, Default)]
pub struct History {
    series: BTreeMap<String, RawSeries>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `(product_key, row)` pairs into per-product series
    pub fn from_rows<I, K>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, RawObservation)>,
        K: Into<String>,
    {
        let mut history = Self::new();
        for (key, row) in rows {
            history.push(key, row);
        }
        history
    }

    pub fn push(&mut self, key: impl Into<String>, row: RawObservation) {
        let key = key.into();
        self.series
            .entry(key.clone())
            .or_insert_with(|| RawSeries::new(key, Vec::new()))
            .rows
            .push(row);
    }

    pub fn insert(&mut self, series: RawSeries) {
        self.series.insert(series.key.clone(), series);
    }

    pub fn get(&self, key: &str) -> Option<&RawSeries> {
        self.series.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawSeries> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total number of rows across all products
    pub fn row_count(&self) -> usize {
        self.series.values().map(|s| s.rows.len()).sum()
    }
}

impl FromIterator<RawSeries> for History {
    fn from_iter<T: IntoIterator<Item = RawSeries>>(iter: T) -> Self {
        let mut history = Self::new();
        for series in iter {
            history.insert(series);
        }
        history
    }
}

/// Data loader for demand history files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load demand history from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, columns: &HistoryColumns) -> Result<History> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df, columns)
    }

    /// Build history from an existing DataFrame
    pub fn from_dataframe(df: &DataFrame, columns: &HistoryColumns) -> Result<History> {
        let keys = Self::text_column(df, &columns.product)?;
        let dates = Self::text_column(df, &columns.date)?;
        let values = Self::numeric_column(df, &columns.value)?;

        let covariates = match &columns.covariate {
            Some(name) if df.get_column_names().contains(&name.as_str()) => {
                Self::numeric_column(df, name)?
            }
            _ => vec![None; df.height()],
        };

        let mut history = History::new();
        let mut skipped = 0usize;
        for (((key, date), value), covariate) in keys
            .into_iter()
            .zip(dates)
            .zip(values)
            .zip(covariates)
        {
            let Some(key) = key.filter(|k| !k.is_empty()) else {
                skipped += 1;
                continue;
            };

            history.push(
                key,
                RawObservation {
                    date: date.as_deref().and_then(parse_date),
                    value,
                    covariate,
                },
            );
        }

        if skipped > 0 {
            debug!(skipped, "dropped history rows without a product key");
        }

        Ok(history)
    }

    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let column = df.column(name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
        })?;
        let text = column.cast(&DataType::Utf8)?;

        let values = text
            .utf8()?
            .into_iter()
            .map(|v| v.map(|s| s.trim().to_string()))
            .collect();
        Ok(values)
    }

    fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let column = df.column(name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
        })?;
        let numbers = column.cast(&DataType::Float64)?;

        let values = numbers.f64()?.into_iter().collect();
        Ok(values)
    }
}

/// Parse `YYYY-MM-DD`, tolerating a trailing time component
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| text.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// Current on-hand quantity per product; unknown products hold zero
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnHandInventory {
    quantities: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct OnHandRow {
    product: String,
    on_hand: f64,
}

impl OnHandInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `product,on_hand` rows from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut inventory = Self::new();

        for row in reader.deserialize() {
            let row: OnHandRow = row?;
            if !row.on_hand.is_finite() {
                return Err(ForecastError::DataError(format!(
                    "On-hand quantity for '{}' is not a number",
                    row.product
                )));
            }
            inventory.set(row.product, row.on_hand);
        }

        Ok(inventory)
    }

    pub fn set(&mut self, product: impl Into<String>, quantity: f64) {
        self.quantities.insert(product.into(), quantity);
    }

    pub fn get(&self, product: &str) -> f64 {
        self.quantities.get(product).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for OnHandInventory {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut inventory = Self::new();
        for (product, quantity) in iter {
            inventory.set(product, quantity);
        }
        inventory
    }
}

/// Token identifying one pipeline run; later runs sort after earlier ones
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// A run id from the current UTC time, `YYYYMMDD_HHMMSS`
    pub fn now() -> Self {
        Self(Utc::now().format("%Y%m%d_%H%M%S").to_string())
    }

    /// Use an explicit run id; restricted to characters safe in file and table names
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ForecastError::InvalidParameter(format!(
                "Run id '{}' must be non-empty and contain only [A-Za-z0-9_-]",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a forecast row is observed history or a modelled value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Actual,
    Forecast,
}

/// One row of forecast output
///
/// `Actual` rows replicate the observed value into all three estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub series_key: String,
    pub run_id: RunId,
    pub record_type: RecordType,
}

impl ForecastPoint {
    pub fn actual(observation: &Observation, series_key: &str, run_id: &RunId) -> Self {
        Self {
            date: observation.date,
            point_estimate: observation.value,
            lower_bound: observation.value,
            upper_bound: observation.value,
            series_key: series_key.to_string(),
            run_id: run_id.clone(),
            record_type: RecordType::Actual,
        }
    }

    pub fn is_forecast(&self) -> bool {
        self.record_type == RecordType::Forecast
    }
}
