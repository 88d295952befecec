//! Date Rule Index: the union of every event's occurrence stream, answering
//! "nearest occupied date" queries without walking empty days.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use jiff::civil::Date;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::AgendaError;
use crate::eval::ScheduledEvent;
use crate::event::Event;
use crate::resolver;
use crate::rule::Weekday;

/// Walking direction of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// The adjacent day in this direction.
    pub fn step(self, date: Date) -> Option<Date> {
        match self {
            Direction::Forward => date.tomorrow().ok(),
            Direction::Backward => date.yesterday().ok(),
        }
    }

    /// Whether `a` comes strictly after `b` when walking this way.
    pub fn is_beyond(self, a: Date, b: Date) -> bool {
        match self {
            Direction::Forward => a > b,
            Direction::Backward => a < b,
        }
    }
}

/// Which days a generator surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Mode {
    /// Only days with at least one occurrence.
    #[default]
    SkipEmpty,
    /// Every consecutive calendar day, empty or not.
    Dense,
}

/// Read-only index over a validated event set.
///
/// Built once and shared (behind an `Arc`) by the forward and backward
/// generators of one agenda.
#[derive(Debug, Clone)]
pub struct DateRuleIndex {
    events: Vec<ScheduledEvent>,
    week_start: Weekday,
}

impl DateRuleIndex {
    /// Validate and compile every event. Fails on the first invalid event,
    /// with its id attached to the error.
    pub fn new(
        events: impl IntoIterator<Item = Event>,
        week_start: Weekday,
    ) -> Result<Self, AgendaError> {
        let events = events
            .into_iter()
            .map(|event| ScheduledEvent::new(event, week_start))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            events = events.len(),
            recurring = events.iter().filter(|e| e.rule().is_some()).count(),
            %week_start,
            "built date rule index"
        );
        Ok(Self { events, week_start })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    /// Earliest date at or after `from` (strictly after unless `inclusive`)
    /// on which any event occurs.
    pub fn next_occupied_date(&self, from: Date, inclusive: bool) -> Option<Date> {
        let from = if inclusive { from } else { from.tomorrow().ok()? };
        self.events
            .iter()
            .filter_map(|ev| ev.next_on_or_after(from))
            .min()
    }

    /// Latest date at or before `from` (strictly before unless `inclusive`)
    /// on which any event occurs.
    pub fn previous_occupied_date(&self, from: Date, inclusive: bool) -> Option<Date> {
        let from = if inclusive { from } else { from.yesterday().ok()? };
        self.events
            .iter()
            .filter_map(|ev| ev.previous_on_or_before(from))
            .max()
    }

    pub fn is_occupied(&self, date: Date) -> bool {
        self.events.iter().any(|ev| ev.occurs_on(date))
    }

    /// Events on `date`, in display order.
    pub fn events_on(&self, date: Date) -> Vec<Event> {
        resolver::events_on(&self.events, date)
    }

    /// The date following `from` in `direction`: the next occupied date in
    /// skip-empty mode, the adjacent calendar day in dense mode.
    pub fn step(&self, from: Date, direction: Direction, mode: Mode) -> Option<Date> {
        match (mode, direction) {
            (Mode::Dense, _) => direction.step(from),
            (Mode::SkipEmpty, Direction::Forward) => self.next_occupied_date(from, false),
            (Mode::SkipEmpty, Direction::Backward) => self.previous_occupied_date(from, false),
        }
    }

    /// Occupied dates from `from` (inclusive) walking `direction`.
    pub fn occupied_dates(&self, from: Date, direction: Direction) -> OccupiedDates<'_> {
        OccupiedDates {
            cursor: MergeCursor::new(self, from, direction),
            index: self,
        }
    }
}

/// Priority queue of per-event heads, ordered for the walking direction.
#[derive(Debug, Clone)]
enum Heads {
    Forward(BinaryHeap<Reverse<(Date, usize)>>),
    Backward(BinaryHeap<(Date, usize)>),
}

impl Heads {
    fn peek(&self) -> Option<Date> {
        match self {
            Heads::Forward(heap) => heap.peek().map(|Reverse((date, _))| *date),
            Heads::Backward(heap) => heap.peek().map(|(date, _)| *date),
        }
    }

    fn pop(&mut self) -> Option<usize> {
        match self {
            Heads::Forward(heap) => heap.pop().map(|Reverse((_, slot))| slot),
            Heads::Backward(heap) => heap.pop().map(|(_, slot)| slot),
        }
    }

    fn push(&mut self, date: Date, slot: usize) {
        match self {
            Heads::Forward(heap) => heap.push(Reverse((date, slot))),
            Heads::Backward(heap) => heap.push((date, slot)),
        }
    }
}

/// Lazy k-way merge of every event's occurrence stream.
///
/// Holds one pending occurrence per event; each step pops the nearest date,
/// advances every event that produced it, and never yields a date twice.
/// The cursor does not borrow the index, so an owner can keep both side by
/// side; it must always be driven with the index it was created from.
#[derive(Debug, Clone)]
pub struct MergeCursor {
    direction: Direction,
    heads: Heads,
}

impl MergeCursor {
    /// Seed a cursor yielding occupied dates from `from` (inclusive).
    pub fn new(index: &DateRuleIndex, from: Date, direction: Direction) -> Self {
        let mut heads = match direction {
            Direction::Forward => Heads::Forward(BinaryHeap::with_capacity(index.len())),
            Direction::Backward => Heads::Backward(BinaryHeap::with_capacity(index.len())),
        };
        for (slot, ev) in index.events.iter().enumerate() {
            if let Some(date) = Self::head(ev, from, direction) {
                heads.push(date, slot);
            }
        }
        Self { direction, heads }
    }

    fn head(ev: &ScheduledEvent, from: Date, direction: Direction) -> Option<Date> {
        match direction {
            Direction::Forward => ev.next_on_or_after(from),
            Direction::Backward => ev.previous_on_or_before(from),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The date the next call to [`MergeCursor::next`] will yield.
    pub fn peek(&self) -> Option<Date> {
        self.heads.peek()
    }

    /// Yield the nearest pending occupied date and advance past it.
    pub fn next(&mut self, index: &DateRuleIndex) -> Option<Date> {
        let date = self.heads.peek()?;
        let after = self.direction.step(date);
        while self.heads.peek() == Some(date) {
            let Some(slot) = self.heads.pop() else {
                break;
            };
            let Some(ev) = index.events.get(slot) else {
                continue;
            };
            if let Some(next) = after.and_then(|from| Self::head(ev, from, self.direction)) {
                self.heads.push(next, slot);
            }
        }
        Some(date)
    }
}

/// Iterator over occupied dates; see [`DateRuleIndex::occupied_dates`].
pub struct OccupiedDates<'a> {
    index: &'a DateRuleIndex,
    cursor: MergeCursor,
}

impl Iterator for OccupiedDates<'_> {
    type Item = Date;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next(self.index)
    }
}

impl std::iter::FusedIterator for OccupiedDates<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Recurrence;

    fn d(y: i16, m: i8, day: i8) -> Date {
        Date::new(y, m, day).unwrap()
    }

    fn index(events: Vec<Event>) -> DateRuleIndex {
        DateRuleIndex::new(events, Weekday::Monday).unwrap()
    }

    fn sample() -> DateRuleIndex {
        index(vec![
            Event::new("once", "Dentist", "2024-03-01"),
            Event::new("bday", "Birthday", "2023-06-01").with_recurrence(Recurrence::yearly()),
            Event::new("sync", "Sync", "2024-01-03")
                .with_recurrence(Recurrence::weekly().with_count(3)),
        ])
    }

    #[test]
    fn next_and_previous_occupied() {
        let idx = sample();
        assert_eq!(idx.next_occupied_date(d(2024, 1, 1), true), Some(d(2024, 1, 3)));
        assert_eq!(idx.next_occupied_date(d(2024, 1, 3), true), Some(d(2024, 1, 3)));
        assert_eq!(idx.next_occupied_date(d(2024, 1, 3), false), Some(d(2024, 1, 10)));
        assert_eq!(idx.next_occupied_date(d(2024, 1, 18), false), Some(d(2024, 3, 1)));
        assert_eq!(idx.next_occupied_date(d(2024, 3, 1), false), Some(d(2024, 6, 1)));
        assert_eq!(idx.previous_occupied_date(d(2024, 6, 1), false), Some(d(2024, 3, 1)));
        assert_eq!(idx.previous_occupied_date(d(2023, 6, 1), false), None);
        assert_eq!(idx.previous_occupied_date(d(2023, 6, 1), true), Some(d(2023, 6, 1)));
    }

    #[test]
    fn yearly_event_found_directly_backward() {
        let idx = index(vec![
            Event::new("y", "Anniversary", "2023-06-01").with_recurrence(Recurrence::yearly()),
        ]);
        assert_eq!(idx.previous_occupied_date(d(2024, 6, 1), false), Some(d(2023, 6, 1)));
    }

    #[test]
    fn merge_cursor_yields_each_date_once() {
        let idx = index(vec![
            Event::new("a", "Daily", "2024-01-01").with_recurrence(Recurrence::daily()),
            Event::new("b", "Weekly", "2024-01-01").with_recurrence(Recurrence::weekly()),
            Event::new("c", "Once", "2024-01-03"),
        ]);
        let dates: Vec<Date> = idx.occupied_dates(d(2024, 1, 1), Direction::Forward).take(5).collect();
        assert_eq!(
            dates,
            vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4), d(2024, 1, 5)]
        );
    }

    #[test]
    fn merge_cursor_backward_ends_at_earliest_start() {
        let idx = sample();
        let dates: Vec<Date> = idx.occupied_dates(d(2024, 6, 30), Direction::Backward).collect();
        assert_eq!(
            dates,
            vec![
                d(2024, 6, 1),
                d(2024, 3, 1),
                d(2024, 1, 17),
                d(2024, 1, 10),
                d(2024, 1, 3),
                d(2023, 6, 1)
            ]
        );
    }

    #[test]
    fn merge_cursor_agrees_with_point_queries() {
        let idx = sample();
        let mut cursor = MergeCursor::new(&idx, d(2023, 1, 1), Direction::Forward);
        let mut from = d(2023, 1, 1);
        for _ in 0..8 {
            let expected = idx.next_occupied_date(from, true);
            assert_eq!(cursor.next(&idx), expected);
            match expected.and_then(|e| e.tomorrow().ok()) {
                Some(next) => from = next,
                None => break,
            }
        }
    }

    #[test]
    fn dense_step_is_date_arithmetic() {
        let idx = sample();
        assert_eq!(
            idx.step(d(2024, 2, 28), Direction::Forward, Mode::Dense),
            Some(d(2024, 2, 29))
        );
        assert_eq!(
            idx.step(d(2024, 3, 1), Direction::Backward, Mode::Dense),
            Some(d(2024, 2, 29))
        );
        assert_eq!(
            idx.step(d(2024, 1, 3), Direction::Forward, Mode::SkipEmpty),
            Some(d(2024, 1, 10))
        );
    }

    #[test]
    fn invalid_event_fails_construction() {
        let err = DateRuleIndex::new(
            vec![
                Event::new("ok", "Fine", "2024-01-01"),
                Event::new("bad", "Broken", "01/02/2024"),
            ],
            Weekday::Monday,
        )
        .unwrap_err();
        assert_eq!(err.event_id(), Some("bad"));
    }

    #[test]
    fn empty_index_has_no_dates() {
        let idx = index(vec![]);
        assert!(idx.is_empty());
        assert_eq!(idx.next_occupied_date(d(2024, 1, 1), true), None);
        assert_eq!(idx.occupied_dates(d(2024, 1, 1), Direction::Backward).next(), None);
    }
}
