//! Input events and output day sections.

use std::cmp::Ordering;

use jiff::civil::Date;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize, Serializer};

use crate::date::format_date;
use crate::rule::Recurrence;

/// An agenda entry. Immutable for the lifetime of any index built from it.
///
/// `start_date` is kept as text and validated when the date rule index is
/// built, so a malformed date is reported against this event's id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "camelCase", try_from = "raw::RawEvent")
)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start_date: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub start_time: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub end_time: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "recurring", skip_serializing_if = "Option::is_none")
    )]
    pub recurrence: Option<Recurrence>,
}

impl Event {
    pub fn new(id: impl Into<String>, title: impl Into<String>, start_date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start_date: start_date.into(),
            start_time: None,
            end_time: None,
            recurrence: None,
        }
    }

    pub fn with_start_time(mut self, time: impl Into<String>) -> Self {
        self.start_time = Some(time.into());
        self
    }

    pub fn with_end_time(mut self, time: impl Into<String>) -> Self {
        self.end_time = Some(time.into());
        self
    }

    pub fn with_recurrence(mut self, rule: Recurrence) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

/// Time of day parsed from `H:MM`, `HH:MM` or `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hour: u8 = parts.next()?.parse().ok()?;
        let minute = parts.next()?;
        let second = parts.next();
        if parts.next().is_some() || minute.len() != 2 {
            return None;
        }
        let minute: u8 = minute.parse().ok()?;
        let second: u8 = match second {
            Some(s) if s.len() == 2 => s.parse().ok()?,
            Some(_) => return None,
            None => 0,
        };
        (hour < 24 && minute < 60 && second < 60).then_some(Self {
            hour,
            minute,
            second,
        })
    }
}

/// Order two optional start times: untimed entries first, then times that
/// parse as times of day in ascending order, then anything unparseable by
/// its text.
pub fn compare_start_times(a: Option<&str>, b: Option<&str>) -> Ordering {
    start_time_key(a).cmp(&start_time_key(b))
}

fn start_time_key(time: Option<&str>) -> (u8, Option<TimeOfDay>, &str) {
    match time {
        None => (0, None, ""),
        Some(raw) => match TimeOfDay::parse(raw) {
            Some(parsed) => (1, Some(parsed), ""),
            None => (2, None, raw),
        },
    }
}

/// All events occurring on one civil date, in display order.
///
/// An empty `events` list is a valid section (dense mode); "no more
/// sections" is only ever signalled by the generator ending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySection {
    pub date: Date,
    pub events: Vec<Event>,
}

impl DaySection {
    pub fn new(date: Date, events: Vec<Event>) -> Self {
        Self { date, events }
    }

    /// The `YYYY-MM-DD` key of this section.
    pub fn title(&self) -> String {
        format_date(self.date)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(feature = "serde")]
impl Serialize for DaySection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("title", &self.title())?;
        map.serialize_entry("data", &self.events)?;
        map.end()
    }
}

#[cfg(feature = "serde")]
mod raw {
    use serde::Deserialize;

    use super::Event;
    use crate::error::AgendaError;
    use crate::rule::Recurrence;

    /// Wire shape of an event. The rule stays untyped until the id is known,
    /// so rule errors name the event they belong to.
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct RawEvent {
        id: String,
        #[serde(default)]
        title: String,
        start_date: String,
        #[serde(default)]
        start_time: Option<String>,
        #[serde(default)]
        end_time: Option<String>,
        #[serde(default, alias = "recurrence", alias = "rrule")]
        recurring: Option<serde_json::Value>,
    }

    impl TryFrom<RawEvent> for Event {
        type Error = AgendaError;

        fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
            let recurrence = match raw.recurring {
                None | Some(serde_json::Value::Null) => None,
                Some(value) => Some(
                    serde_json::from_value::<Recurrence>(value)
                        .map_err(|e| AgendaError::invalid_rule(e.to_string()).for_event(&raw.id))?,
                ),
            };
            Ok(Event {
                id: raw.id,
                title: raw.title,
                start_date: raw.start_date,
                start_time: raw.start_time,
                end_time: raw.end_time,
                recurrence,
            })
        }
    }
}
