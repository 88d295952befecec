//! Day resolution: which events fall on one civil date, in display order.

use jiff::civil::Date;

use crate::eval::ScheduledEvent;
use crate::event::{compare_start_times, Event};

/// Events occurring on `date`, untimed first, then by start time.
///
/// The sort is stable, so events sharing a start time keep input order.
pub fn events_on(events: &[ScheduledEvent], date: Date) -> Vec<Event> {
    let mut found: Vec<Event> = events
        .iter()
        .filter(|ev| ev.occurs_on(date))
        .map(|ev| ev.event().clone())
        .collect();
    found.sort_by(|a, b| compare_start_times(a.start_time.as_deref(), b.start_time.as_deref()));
    found
}
