//! agenda — lazy, bidirectional day-section generation for calendar events.
//!
//! Events are one-off or recur under an RFC 5545 `RRULE` (date granularity).
//! From a pivot date, two generators walk forward and backward through the
//! days on which something occurs (or through every day, in dense mode),
//! yielding one [`DaySection`] per date. An [`Agenda`] pulls them in batches
//! and keeps the loaded sections in calendar order.
//!
//! # Examples
//!
//! ```
//! use agenda::{Agenda, AgendaConfig, Event, Recurrence};
//! use jiff::civil::date;
//!
//! let rule: Recurrence = "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH".parse().unwrap();
//! let events = vec![
//!     Event::new("1", "Sync", "2024-01-02").with_start_time("10:00").with_recurrence(rule),
//!     Event::new("2", "Dentist", "2024-01-04").with_start_time("08:30"),
//! ];
//!
//! let mut agenda = Agenda::new(events, AgendaConfig::new(date(2024, 1, 1))).unwrap();
//! agenda.load_initial();
//!
//! let titles: Vec<String> = agenda.sections().iter().take(3).map(|s| s.title()).collect();
//! assert_eq!(titles, ["2024-01-01", "2024-01-02", "2024-01-04"]);
//! assert_eq!(agenda.sections()[2].events[0].id, "2");
//! ```

pub mod batch;
pub mod config;
pub mod date;
pub mod display;
pub mod error;
pub mod eval;
pub mod event;
pub mod generator;
pub mod index;
pub mod parser;
pub mod resolver;
pub mod rule;

pub use batch::{pull, Agenda, Batch};
pub use config::AgendaConfig;
pub use error::{AgendaError, Span};
pub use eval::{CompiledRule, Occurrences, ScheduledEvent};
pub use event::{DaySection, Event, TimeOfDay};
pub use generator::SectionGenerator;
pub use index::{DateRuleIndex, Direction, MergeCursor, Mode};
pub use rule::{Frequency, Recurrence, Weekday, WeekdayNum};

use jiff::civil::Date;
use std::str::FromStr;

// --- Recurrence convenience methods ---

impl Recurrence {
    /// Parse RRULE text such as `FREQ=MONTHLY;BYDAY=-1FR`.
    pub fn parse(input: &str) -> Result<Self, AgendaError> {
        parser::parse(input)
    }

    /// Anchor this rule at `start`.
    pub fn compile(&self, start: Date, week_start: Weekday) -> Result<CompiledRule, AgendaError> {
        CompiledRule::new(self, start, week_start)
    }

    /// The first `n` occurrences from `start` (which is always the first).
    pub fn first_n(
        &self,
        start: Date,
        week_start: Weekday,
        n: usize,
    ) -> Result<Vec<Date>, AgendaError> {
        let compiled = self.compile(start, week_start)?;
        Ok(compiled.occurrences(start).take(n).collect())
    }
}

impl FromStr for Recurrence {
    type Err = AgendaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether `event` occurs on `date`.
pub fn occurs_on(event: &Event, date: Date, week_start: Weekday) -> Result<bool, AgendaError> {
    eval::occurs_on(event, date, week_start)
}

/// Events from `events` occurring on `date`, in display order.
///
/// Validates every event first. To query many dates, build a
/// [`DateRuleIndex`] once and use [`DateRuleIndex::events_on`].
pub fn events_on(
    events: &[Event],
    date: Date,
    week_start: Weekday,
) -> Result<Vec<Event>, AgendaError> {
    let index = DateRuleIndex::new(events.iter().cloned(), week_start)?;
    Ok(index.events_on(date))
}
