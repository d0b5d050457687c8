//! Recurring demand-shifting events
//!
//! The calendar is built once per run from a list of [`EventSpec`]s and a year
//! range, then shared read-only by every series fit.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

/// A named annual event anchored on a month and day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    pub name: String,
    /// Anchor day of the year as `MM-DD`
    pub month_day: String,
    pub days_before: u32,
    pub days_after: u32,
}

impl EventSpec {
    pub fn new(
        name: impl Into<String>,
        month_day: impl Into<String>,
        days_before: u32,
        days_after: u32,
    ) -> Self {
        Self {
            name: name.into(),
            month_day: month_day.into(),
            days_before,
            days_after,
        }
    }

    /// An event whose influence extends equally on both sides of the anchor
    pub fn symmetric(
        name: impl Into<String>,
        month_day: impl Into<String>,
        half_width: u32,
    ) -> Self {
        Self::new(name, month_day, half_width, half_width)
    }

    /// Peak retail events of the calendar year
    pub fn retail_defaults() -> Vec<Self> {
        vec![
            Self::symmetric("black_friday", "11-29", 7),
            Self::symmetric("christmas", "12-25", 10),
            Self::symmetric("new_year", "01-01", 7),
            Self::symmetric("cyber_monday", "12-02", 5),
            Self::symmetric("thanksgiving", "11-28", 5),
        ]
    }

    /// Anchor date of this event in `year`, if the month-day is valid that year
    pub fn anchor_in(&self, year: i32) -> Option<NaiveDate> {
        let (month, day) = self.month_day.trim().split_once('-')?;
        let month: u32 = month.parse().ok()?;
        let day: u32 = day.parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// One occurrence of an event in a specific year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub name: String,
    pub anchor: NaiveDate,
    /// Offset of the first influenced day; zero or negative
    pub lower_window_days: i64,
    /// Offset of the last influenced day; zero or positive
    pub upper_window_days: i64,
}

impl CalendarEvent {
    pub fn window_start(&self) -> NaiveDate {
        self.anchor + Duration::days(self.lower_window_days)
    }

    pub fn window_end(&self) -> NaiveDate {
        self.anchor + Duration::days(self.upper_window_days)
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.window_start() && date <= self.window_end()
    }
}

/// All event occurrences of one run, ordered by spec then year
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventCalendar {
    events: Vec<CalendarEvent>,
}

impl EventCalendar {
    /// Expand every `(spec, year)` pair; occurrences that cannot be dated are skipped
    pub fn build(specs: &[EventSpec], years: RangeInclusive<i32>) -> Self {
        let mut events = Vec::with_capacity(specs.len() * years.clone().count());

        for spec in specs {
            for year in years.clone() {
                match spec.anchor_in(year) {
                    Some(anchor) => events.push(CalendarEvent {
                        name: spec.name.clone(),
                        anchor,
                        lower_window_days: -i64::from(spec.days_before),
                        upper_window_days: i64::from(spec.days_after),
                    }),
                    None => debug!(
                        event = %spec.name,
                        month_day = %spec.month_day,
                        year,
                        "skipping event occurrence that cannot be dated"
                    ),
                }
            }
        }

        Self { events }
    }

    /// Default retail calendar over a year range
    pub fn retail(years: RangeInclusive<i32>) -> Self {
        Self::build(&EventSpec::retail_defaults(), years)
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events whose influence window contains `date`
    pub fn events_covering(&self, date: NaiveDate) -> impl Iterator<Item = &CalendarEvent> {
        self.events.iter().filter(move |e| e.covers(date))
    }

    /// Distinct event names, in first-seen order
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for event in &self.events {
            if !names.contains(&event.name.as_str()) {
                names.push(&event.name);
            }
        }
        names
    }
}
