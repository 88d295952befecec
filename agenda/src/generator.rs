//! Section Generator: a resumable, one-directional walk over day sections.

use std::iter::FusedIterator;
use std::sync::Arc;

use jiff::civil::Date;

use crate::event::DaySection;
use crate::index::{DateRuleIndex, Direction, MergeCursor, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing emitted yet.
    Ready,
    /// At least one section emitted.
    Active,
    /// Terminal.
    Exhausted,
}

/// Lazily yields [`DaySection`]s from a pivot date, strictly increasing
/// ([`Direction::Forward`]) or strictly decreasing ([`Direction::Backward`]).
///
/// Ending is the only exhaustion signal: an empty section (dense mode, or the
/// pivot with `show_empty_pivot`) is a normal item. Once `next` returns
/// `None` it always will.
///
/// ```
/// use std::sync::Arc;
/// use agenda::{DateRuleIndex, Event, SectionGenerator, Weekday};
/// use jiff::civil::date;
///
/// let index = DateRuleIndex::new(
///     vec![Event::new("a", "Dentist", "2024-03-01")],
///     Weekday::Monday,
/// )
/// .unwrap();
/// let titles: Vec<String> = SectionGenerator::upcoming(Arc::new(index), date(2024, 1, 1))
///     .map(|s| s.title())
///     .collect();
/// assert_eq!(titles, vec!["2024-03-01"]);
/// ```
#[derive(Debug, Clone)]
pub struct SectionGenerator {
    index: Arc<DateRuleIndex>,
    direction: Direction,
    mode: Mode,
    pivot: Date,
    include_pivot: bool,
    show_empty_pivot: bool,
    state: State,
    cursor: Option<MergeCursor>,
    /// Occupied date pulled from the cursor but held back behind an empty pivot.
    pending: Option<Date>,
    first: Option<Date>,
    last: Option<Date>,
    pivot_emitted: bool,
}

impl SectionGenerator {
    pub fn new(index: Arc<DateRuleIndex>, pivot: Date, direction: Direction) -> Self {
        let include_pivot = direction == Direction::Forward;
        Self {
            index,
            direction,
            mode: Mode::SkipEmpty,
            pivot,
            include_pivot,
            show_empty_pivot: false,
            state: State::Ready,
            cursor: None,
            pending: None,
            first: None,
            last: None,
            pivot_emitted: false,
        }
    }

    /// Forward walk starting at the pivot (inclusive).
    pub fn upcoming(index: Arc<DateRuleIndex>, pivot: Date) -> Self {
        Self::new(index, pivot, Direction::Forward)
    }

    /// Backward walk starting the day before the pivot.
    pub fn past(index: Arc<DateRuleIndex>, pivot: Date) -> Self {
        Self::new(index, pivot, Direction::Backward)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether the pivot itself may be emitted.
    pub fn with_pivot_included(mut self, include: bool) -> Self {
        self.include_pivot = include;
        self
    }

    /// In skip-empty mode, emit the pivot even when it has no events.
    /// Only meaningful when the pivot is included.
    pub fn with_empty_pivot(mut self, show: bool) -> Self {
        self.show_empty_pivot = show;
        self
    }

    pub fn pivot(&self) -> Date {
        self.pivot
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn first_emitted(&self) -> Option<Date> {
        self.first
    }

    pub fn last_emitted(&self) -> Option<Date> {
        self.last
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    /// Whether this generator has emitted a section for exactly `date`.
    ///
    /// Answered from the emitted range and the index, without keeping the
    /// sections themselves.
    pub fn contains(&self, date: Date) -> bool {
        let (Some(first), Some(last)) = (self.first, self.last) else {
            return false;
        };
        let (lo, hi) = match self.direction {
            Direction::Forward => (first, last),
            Direction::Backward => (last, first),
        };
        if date < lo || date > hi {
            return false;
        }
        self.mode == Mode::Dense
            || (self.pivot_emitted && date == self.pivot)
            || self.index.is_occupied(date)
    }

    fn first_date(&mut self) -> Option<Date> {
        if self.index.is_empty() {
            return None;
        }
        let start = if self.include_pivot {
            self.pivot
        } else {
            self.direction.step(self.pivot)?
        };
        match self.mode {
            Mode::Dense => Some(start),
            Mode::SkipEmpty => {
                let mut cursor = MergeCursor::new(&self.index, start, self.direction);
                let occupied = cursor.next(&self.index);
                self.cursor = Some(cursor);
                if self.include_pivot && self.show_empty_pivot {
                    // The cursor already yielded the pivot if it is occupied;
                    // otherwise hold that date back for the following call.
                    return match occupied {
                        Some(date) if date == self.pivot => Some(date),
                        other => {
                            self.pending = other;
                            Some(self.pivot)
                        }
                    };
                }
                occupied
            }
        }
    }

    fn following_date(&mut self, last: Date) -> Option<Date> {
        match self.mode {
            Mode::Dense => self.direction.step(last),
            Mode::SkipEmpty => {
                if let Some(date) = self.pending.take() {
                    return Some(date);
                }
                let cursor = self.cursor.as_mut()?;
                loop {
                    let date = cursor.next(&self.index)?;
                    if self.direction.is_beyond(date, last) {
                        return Some(date);
                    }
                }
            }
        }
    }

    fn exhaust(&mut self) {
        self.state = State::Exhausted;
        self.cursor = None;
        self.pending = None;
        tracing::debug!(
            direction = ?self.direction,
            pivot = %self.pivot,
            last = ?self.last,
            "section generator exhausted"
        );
    }
}

impl Iterator for SectionGenerator {
    type Item = DaySection;

    fn next(&mut self) -> Option<DaySection> {
        let date = match (self.state, self.last) {
            (State::Exhausted, _) => return None,
            (State::Active, Some(last)) => self.following_date(last),
            _ => self.first_date(),
        };
        let Some(date) = date else {
            self.exhaust();
            return None;
        };

        if self.first.is_none() {
            self.first = Some(date);
        }
        if date == self.pivot {
            self.pivot_emitted = true;
        }
        self.last = Some(date);
        self.state = State::Active;

        let events = self.index.events_on(date);
        tracing::trace!(date = %date, events = events.len(), "emitting section");
        Some(DaySection::new(date, events))
    }
}

impl FusedIterator for SectionGenerator {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::rule::{Recurrence, Weekday};

    fn d(y: i16, m: i8, day: i8) -> Date {
        Date::new(y, m, day).unwrap()
    }

    fn index(events: Vec<Event>) -> Arc<DateRuleIndex> {
        Arc::new(DateRuleIndex::new(events, Weekday::Monday).unwrap())
    }

    #[test]
    fn empty_pivot_is_held_in_front_of_first_occupied_day() {
        let idx = index(vec![Event::new("a", "A", "2024-01-05")]);
        let titles: Vec<String> = SectionGenerator::upcoming(idx, d(2024, 1, 1))
            .with_empty_pivot(true)
            .map(|s| s.title())
            .collect();
        assert_eq!(titles, vec!["2024-01-01", "2024-01-05"]);
    }

    #[test]
    fn occupied_pivot_is_not_duplicated() {
        let idx = index(vec![
            Event::new("a", "A", "2024-01-01").with_recurrence(Recurrence::daily().with_count(2)),
        ]);
        let titles: Vec<String> = SectionGenerator::upcoming(idx, d(2024, 1, 1))
            .with_empty_pivot(true)
            .map(|s| s.title())
            .collect();
        assert_eq!(titles, vec!["2024-01-01", "2024-01-02"]);
    }

    #[test]
    fn contains_tracks_emitted_range() {
        let idx = index(vec![
            Event::new("a", "A", "2024-01-03"),
            Event::new("b", "B", "2024-01-07"),
            Event::new("c", "C", "2024-01-09"),
        ]);
        let mut gen = SectionGenerator::upcoming(idx, d(2024, 1, 1)).with_empty_pivot(true);
        assert!(!gen.contains(d(2024, 1, 1)));
        gen.next();
        gen.next();
        gen.next();
        assert!(gen.contains(d(2024, 1, 1)));
        assert!(gen.contains(d(2024, 1, 3)));
        assert!(gen.contains(d(2024, 1, 7)));
        assert!(!gen.contains(d(2024, 1, 4)));
        assert!(!gen.contains(d(2024, 1, 9)));
    }

    #[test]
    fn past_excludes_pivot() {
        let idx = index(vec![
            Event::new("a", "A", "2024-01-01").with_recurrence(Recurrence::daily()),
        ]);
        let mut past = SectionGenerator::past(idx, d(2024, 1, 3));
        assert_eq!(past.next().map(|s| s.date), Some(d(2024, 1, 2)));
        assert_eq!(past.next().map(|s| s.date), Some(d(2024, 1, 1)));
        assert_eq!(past.next(), None);
        assert!(past.is_exhausted());
        assert!(past.contains(d(2024, 1, 2)));
    }
}
