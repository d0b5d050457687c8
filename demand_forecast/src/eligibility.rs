//! Selection of series with enough history to model

use crate::config::EligibilityCriteria;
use crate::data::{History, RawSeries};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Summary statistics of one raw series, computed over usable rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub span_days: i64,
    pub total_volume: f64,
    pub distinct_days: usize,
}

impl SeriesStats {
    /// Compute the statistics; `None` when the series has no usable rows
    pub fn compute(series: &RawSeries) -> Option<Self> {
        let mut days = BTreeSet::new();
        let mut total_volume = 0.0;

        for obs in series.rows.iter().filter_map(|r| r.usable()) {
            days.insert(obs.date);
            total_volume += obs.value;
        }

        let first_date = *days.iter().next()?;
        let last_date = *days.iter().next_back()?;

        Some(Self {
            first_date,
            last_date,
            span_days: (last_date - first_date).num_days(),
            total_volume,
            distinct_days: days.len(),
        })
    }
}

impl EligibilityCriteria {
    /// True only when every threshold is met
    pub fn admits(&self, stats: &SeriesStats) -> bool {
        stats.span_days >= self.min_span_days
            && stats.total_volume > self.min_total_volume
            && stats.distinct_days >= self.min_distinct_days
    }
}

/// Keys of all series meeting the criteria, in ascending key order
pub fn eligible_keys(history: &History, criteria: &EligibilityCriteria) -> Vec<String> {
    let mut keys = Vec::new();

    for series in history.iter() {
        match SeriesStats::compute(series) {
            Some(stats) if criteria.admits(&stats) => keys.push(series.key.clone()),
            Some(stats) => debug!(
                key = %series.key,
                span_days = stats.span_days,
                total_volume = stats.total_volume,
                distinct_days = stats.distinct_days,
                "series excluded by eligibility criteria"
            ),
            None => debug!(key = %series.key, "series has no usable rows"),
        }
    }

    keys
}
