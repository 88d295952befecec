//! Agenda configuration: the explicit clock (pivot) and view options.

use jiff::civil::Date;
#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::error::AgendaError;
use crate::index::Mode;
use crate::rule::Weekday;

/// Sections per upcoming batch: two weeks of days in dense mode.
pub const DEFAULT_UPCOMING_BATCH: usize = 14;
/// Sections per past batch: one week of days in dense mode.
pub const DEFAULT_PAST_BATCH: usize = 7;

/// Everything an [`Agenda`](crate::Agenda) needs besides the events.
///
/// From JSON, only `pivot` is required:
///
/// ```json
/// { "pivot": "2024-03-01", "week_start": "SU", "mode": "dense", "upcoming_batch": 30 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct AgendaConfig {
    /// The "today" of this agenda; both generators start here.
    #[cfg_attr(feature = "serde", serde(with = "civil_date"))]
    pub pivot: Date,
    /// Default week start for rules without their own `WKST`.
    #[cfg_attr(feature = "serde", serde(default = "default_week_start"))]
    pub week_start: Weekday,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: Mode,
    /// Surface the pivot day even when it has no events (skip-empty mode).
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub show_empty_pivot: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_upcoming_batch"))]
    pub upcoming_batch: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_past_batch"))]
    pub past_batch: usize,
}

impl AgendaConfig {
    pub fn new(pivot: Date) -> Self {
        Self {
            pivot,
            week_start: default_week_start(),
            mode: Mode::default(),
            show_empty_pivot: true,
            upcoming_batch: DEFAULT_UPCOMING_BATCH,
            past_batch: DEFAULT_PAST_BATCH,
        }
    }

    pub fn with_pivot(mut self, pivot: Date) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_empty_pivot(mut self, show: bool) -> Self {
        self.show_empty_pivot = show;
        self
    }

    pub fn with_upcoming_batch(mut self, n: usize) -> Self {
        self.upcoming_batch = n;
        self
    }

    pub fn with_past_batch(mut self, n: usize) -> Self {
        self.past_batch = n;
        self
    }

    pub fn validate(&self) -> Result<(), AgendaError> {
        if self.upcoming_batch == 0 {
            return Err(AgendaError::config("upcoming_batch must be at least 1"));
        }
        if self.past_batch == 0 {
            return Err(AgendaError::config("past_batch must be at least 1"));
        }
        Ok(())
    }
}

fn default_week_start() -> Weekday {
    Weekday::Monday
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

#[cfg(feature = "serde")]
fn default_upcoming_batch() -> usize {
    DEFAULT_UPCOMING_BATCH
}

#[cfg(feature = "serde")]
fn default_past_batch() -> usize {
    DEFAULT_PAST_BATCH
}

#[cfg(feature = "serde")]
mod civil_date {
    use jiff::civil::Date;
    use serde::{Deserialize, Deserializer};

    use crate::date::parse_date;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_date(&s).map_err(serde::de::Error::custom)
    }
}
