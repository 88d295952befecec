//! Batch loading and the two-direction agenda view built on it.

use std::sync::Arc;

use jiff::civil::Date;

use crate::config::AgendaConfig;
use crate::date::format_date;
use crate::error::AgendaError;
use crate::event::{DaySection, Event};
use crate::generator::SectionGenerator;
use crate::index::DateRuleIndex;

/// Result of one [`pull`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Sections in generator order (descending dates for a past generator).
    pub sections: Vec<DaySection>,
    /// The generator ended during this pull.
    pub exhausted: bool,
}

/// Take up to `max` sections from `sections`.
///
/// `exhausted` is set only when the generator actually ended; a full batch
/// whose last section happens to be the final one is not yet known to be
/// exhausted.
pub fn pull<I>(sections: &mut I, max: usize) -> Batch
where
    I: Iterator<Item = DaySection> + ?Sized,
{
    let mut batch = Batch {
        sections: Vec::with_capacity(max),
        exhausted: false,
    };
    while batch.sections.len() < max {
        match sections.next() {
            Some(section) => batch.sections.push(section),
            None => {
                batch.exhausted = true;
                break;
            }
        }
    }
    tracing::debug!(
        requested = max,
        pulled = batch.sections.len(),
        exhausted = batch.exhausted,
        "pulled batch"
    );
    batch
}

/// A scrollable agenda: sections loaded so far, in calendar order, growing
/// at either end on demand.
///
/// ```
/// use agenda::{Agenda, AgendaConfig, Event, Recurrence};
/// use jiff::civil::date;
///
/// let events = vec![
///     Event::new("1", "Standup", "2024-01-01").with_recurrence(Recurrence::weekly()),
/// ];
/// let mut agenda = Agenda::new(events, AgendaConfig::new(date(2024, 1, 10))).unwrap();
/// agenda.load_initial();
/// assert_eq!(agenda.sections()[0].title(), "2024-01-01");
/// assert!(!agenda.has_more_past());
/// ```
#[derive(Debug, Clone)]
pub struct Agenda {
    config: AgendaConfig,
    index: Arc<DateRuleIndex>,
    upcoming: SectionGenerator,
    past: SectionGenerator,
    sections: Vec<DaySection>,
    has_more_upcoming: bool,
    has_more_past: bool,
}

impl Agenda {
    /// Validate `config` and every event, then set up both generators.
    pub fn new(
        events: impl IntoIterator<Item = Event>,
        config: AgendaConfig,
    ) -> Result<Self, AgendaError> {
        config.validate()?;
        let index = Arc::new(DateRuleIndex::new(events, config.week_start)?);
        let upcoming = SectionGenerator::upcoming(Arc::clone(&index), config.pivot)
            .with_mode(config.mode)
            .with_empty_pivot(config.show_empty_pivot);
        let past = SectionGenerator::past(Arc::clone(&index), config.pivot).with_mode(config.mode);
        Ok(Self {
            config,
            index,
            upcoming,
            past,
            sections: Vec::new(),
            has_more_upcoming: true,
            has_more_past: true,
        })
    }

    pub fn config(&self) -> &AgendaConfig {
        &self.config
    }

    pub fn index(&self) -> &DateRuleIndex {
        &self.index
    }

    pub fn pivot(&self) -> Date {
        self.config.pivot
    }

    /// Loaded sections, oldest first.
    pub fn sections(&self) -> &[DaySection] {
        &self.sections
    }

    pub fn has_more_upcoming(&self) -> bool {
        self.has_more_upcoming
    }

    pub fn has_more_past(&self) -> bool {
        self.has_more_past
    }

    pub fn upcoming(&self) -> &SectionGenerator {
        &self.upcoming
    }

    pub fn past(&self) -> &SectionGenerator {
        &self.past
    }

    /// Load the first past batch and the first upcoming batch. Returns the
    /// number of sections added.
    pub fn load_initial(&mut self) -> usize {
        self.load_more_past() + self.load_more_upcoming()
    }

    /// Append the next upcoming batch. Returns the number of sections added.
    pub fn load_more_upcoming(&mut self) -> usize {
        if !self.has_more_upcoming {
            return 0;
        }
        let batch = pull(&mut self.upcoming, self.config.upcoming_batch);
        self.has_more_upcoming = !batch.exhausted;
        let added = batch.sections.len();
        self.sections.extend(batch.sections);
        added
    }

    /// Prepend the next past batch, reversed into calendar order. Returns
    /// the number of sections added.
    pub fn load_more_past(&mut self) -> usize {
        if !self.has_more_past {
            return 0;
        }
        let batch = pull(&mut self.past, self.config.past_batch);
        self.has_more_past = !batch.exhausted;
        let added = batch.sections.len();
        self.sections
            .splice(0..0, batch.sections.into_iter().rev());
        added
    }

    /// Position of the section titled exactly `title` (`YYYY-MM-DD`).
    pub fn position_of(&self, title: &str) -> Option<usize> {
        // Titles sort like their dates.
        self.sections
            .binary_search_by(|s| format_date(s.date).as_str().cmp(title))
            .ok()
    }

    /// Position of the pivot section, or of the first section after it.
    pub fn pivot_position(&self) -> Option<usize> {
        let i = self.sections.partition_point(|s| s.date < self.config.pivot);
        (i < self.sections.len()).then_some(i)
    }
}
