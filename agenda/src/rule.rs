//! Recurrence rule model: the RFC 5545 `RRULE` subset that events are
//! authored against, at date granularity.

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AgendaError;

/// Recurrence frequency. Sub-daily frequencies are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Map the numeric frequency used by rrule.js item payloads
    /// (`YEARLY = 0` .. `DAILY = 3`).
    pub fn from_index(n: u64) -> Option<Self> {
        match n {
            0 => Some(Self::Yearly),
            1 => Some(Self::Monthly),
            2 => Some(Self::Weekly),
            3 => Some(Self::Daily),
            _ => None,
        }
    }
}

/// Parse a frequency name (case-insensitive). Sub-daily frequencies yield
/// `None`; callers report them as unsupported.
pub fn parse_frequency(s: &str) -> Option<Frequency> {
    match s.to_ascii_uppercase().as_str() {
        "DAILY" => Some(Frequency::Daily),
        "WEEKLY" => Some(Frequency::Weekly),
        "MONTHLY" => Some(Frequency::Monthly),
        "YEARLY" => Some(Frequency::Yearly),
        _ => None,
    }
}

#[cfg(feature = "serde")]
impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str().to_ascii_lowercase())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Index(u64),
            Name(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Index(n) => Frequency::from_index(n)
                .ok_or_else(|| serde::de::Error::custom(format!("unsupported frequency: {n}"))),
            Repr::Name(s) => parse_frequency(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("unsupported frequency: {s}"))),
        }
    }
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// RFC 5545 two-letter code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    pub fn to_jiff(self) -> jiff::civil::Weekday {
        match self {
            Self::Monday => jiff::civil::Weekday::Monday,
            Self::Tuesday => jiff::civil::Weekday::Tuesday,
            Self::Wednesday => jiff::civil::Weekday::Wednesday,
            Self::Thursday => jiff::civil::Weekday::Thursday,
            Self::Friday => jiff::civil::Weekday::Friday,
            Self::Saturday => jiff::civil::Weekday::Saturday,
            Self::Sunday => jiff::civil::Weekday::Sunday,
        }
    }

    pub fn from_jiff(wd: jiff::civil::Weekday) -> Self {
        match wd {
            jiff::civil::Weekday::Monday => Self::Monday,
            jiff::civil::Weekday::Tuesday => Self::Tuesday,
            jiff::civil::Weekday::Wednesday => Self::Wednesday,
            jiff::civil::Weekday::Thursday => Self::Thursday,
            jiff::civil::Weekday::Friday => Self::Friday,
            jiff::civil::Weekday::Saturday => Self::Saturday,
            jiff::civil::Weekday::Sunday => Self::Sunday,
        }
    }

    /// rrule.js weekday index: Monday=0, Sunday=6.
    pub fn from_index(n: u64) -> Option<Self> {
        match n {
            0 => Some(Self::Monday),
            1 => Some(Self::Tuesday),
            2 => Some(Self::Wednesday),
            3 => Some(Self::Thursday),
            4 => Some(Self::Friday),
            5 => Some(Self::Saturday),
            6 => Some(Self::Sunday),
            _ => None,
        }
    }
}

/// Parse a weekday from its RFC 5545 code, full name, or three-letter name.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "mo" | "mon" | "monday" => Some(Weekday::Monday),
        "tu" | "tue" | "tuesday" => Some(Weekday::Tuesday),
        "we" | "wed" | "wednesday" => Some(Weekday::Wednesday),
        "th" | "thu" | "thursday" => Some(Weekday::Thursday),
        "fr" | "fri" | "friday" => Some(Weekday::Friday),
        "sa" | "sat" | "saturday" => Some(Weekday::Saturday),
        "su" | "sun" | "sunday" => Some(Weekday::Sunday),
        _ => None,
    }
}

#[cfg(feature = "serde")]
impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Index(u64),
            Name(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Index(n) => Weekday::from_index(n)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown weekday: {n}"))),
            Repr::Name(s) => parse_weekday(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown weekday: {s}"))),
        }
    }
}

/// A `BYDAY` entry: a weekday, optionally pinned to its nth occurrence in the
/// month or year (`2TU`, `-1FR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    pub ordinal: Option<i8>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    pub fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    pub fn nth(ordinal: i8, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

/// Parse a `BYDAY` entry such as `MO`, `+2TU` or `-1FR`.
pub fn parse_weekday_num(s: &str) -> Result<WeekdayNum, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| format!("expected a weekday code, got '{s}'"))?;
    let (num, code) = s.split_at(split);
    if code.len() != 2 {
        return Err(format!("expected a two-letter weekday code, got '{code}'"));
    }
    let weekday = parse_weekday(code).ok_or_else(|| format!("unknown weekday '{code}'"))?;
    if num.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }
    let ordinal: i8 = num
        .parse()
        .map_err(|_| format!("invalid weekday ordinal '{num}'"))?;
    if ordinal == 0 || !(-53..=53).contains(&ordinal) {
        return Err(format!("weekday ordinal must be 1..=53 or -53..=-1, got {ordinal}"));
    }
    Ok(WeekdayNum::nth(ordinal, weekday))
}

#[cfg(feature = "serde")]
impl Serialize for WeekdayNum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for WeekdayNum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Index(u64),
            Code(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Index(n) => Weekday::from_index(n)
                .map(WeekdayNum::every)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown weekday: {n}"))),
            Repr::Code(s) => parse_weekday_num(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// A recurrence rule, anchored at the event's start date when evaluated.
///
/// `until` keeps its source text; it is resolved (and validated) when the
/// rule is compiled against its event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub freq: Frequency,
    pub interval: u32,
    pub until: Option<String>,
    pub count: Option<u32>,
    pub by_day: Vec<WeekdayNum>,
    pub by_month: Vec<i8>,
    pub by_month_day: Vec<i8>,
    pub by_year_day: Vec<i16>,
    pub by_week_no: Vec<i8>,
    pub by_set_pos: Vec<i16>,
    pub week_start: Option<Weekday>,
}

impl Recurrence {
    /// A rule repeating every period of `freq`, with no other constraints.
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: 1,
            until: None,
            count: None,
            by_day: Vec::new(),
            by_month: Vec::new(),
            by_month_day: Vec::new(),
            by_year_day: Vec::new(),
            by_week_no: Vec::new(),
            by_set_pos: Vec::new(),
            week_start: None,
        }
    }

    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    pub fn weekly() -> Self {
        Self::new(Frequency::Weekly)
    }

    pub fn monthly() -> Self {
        Self::new(Frequency::Monthly)
    }

    pub fn yearly() -> Self {
        Self::new(Frequency::Yearly)
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_until(mut self, until: impl Into<String>) -> Self {
        self.until = Some(until.into());
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_by_day(mut self, days: impl IntoIterator<Item = WeekdayNum>) -> Self {
        self.by_day = days.into_iter().collect();
        self
    }

    pub fn with_by_month(mut self, months: impl IntoIterator<Item = i8>) -> Self {
        self.by_month = months.into_iter().collect();
        self
    }

    pub fn with_by_month_day(mut self, days: impl IntoIterator<Item = i8>) -> Self {
        self.by_month_day = days.into_iter().collect();
        self
    }

    pub fn with_by_year_day(mut self, days: impl IntoIterator<Item = i16>) -> Self {
        self.by_year_day = days.into_iter().collect();
        self
    }

    pub fn with_by_week_no(mut self, weeks: impl IntoIterator<Item = i8>) -> Self {
        self.by_week_no = weeks.into_iter().collect();
        self
    }

    pub fn with_by_set_pos(mut self, positions: impl IntoIterator<Item = i16>) -> Self {
        self.by_set_pos = positions.into_iter().collect();
        self
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = Some(week_start);
        self
    }

    /// True when no `BYxxx` part constrains the rule.
    pub fn is_unconstrained(&self) -> bool {
        self.by_day.is_empty()
            && self.by_month.is_empty()
            && self.by_month_day.is_empty()
            && self.by_year_day.is_empty()
            && self.by_week_no.is_empty()
    }

    /// Check value ranges and part combinations against RFC 5545.
    pub fn validate(&self) -> Result<(), AgendaError> {
        if self.interval == 0 {
            return Err(AgendaError::invalid_rule("INTERVAL must be at least 1"));
        }
        if self.count == Some(0) {
            return Err(AgendaError::invalid_rule("COUNT must be at least 1"));
        }
        if self.count.is_some() && self.until.is_some() {
            return Err(AgendaError::invalid_rule(
                "COUNT and UNTIL cannot both be set",
            ));
        }
        if let Some(m) = self.by_month.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(AgendaError::invalid_rule(format!(
                "BYMONTH value {m} is out of range 1..=12"
            )));
        }
        if let Some(d) = self.by_month_day.iter().find(|d| !valid_signed(**d as i64, 31)) {
            return Err(AgendaError::invalid_rule(format!(
                "BYMONTHDAY value {d} is out of range"
            )));
        }
        if let Some(d) = self.by_year_day.iter().find(|d| !valid_signed(**d as i64, 366)) {
            return Err(AgendaError::invalid_rule(format!(
                "BYYEARDAY value {d} is out of range"
            )));
        }
        if let Some(w) = self.by_week_no.iter().find(|w| !valid_signed(**w as i64, 53)) {
            return Err(AgendaError::invalid_rule(format!(
                "BYWEEKNO value {w} is out of range"
            )));
        }
        if let Some(p) = self.by_set_pos.iter().find(|p| !valid_signed(**p as i64, 366)) {
            return Err(AgendaError::invalid_rule(format!(
                "BYSETPOS value {p} is out of range"
            )));
        }
        if let Some(n) = self
            .by_day
            .iter()
            .filter_map(|wd| wd.ordinal)
            .find(|n| !valid_signed(*n as i64, 53))
        {
            return Err(AgendaError::invalid_rule(format!(
                "BYDAY ordinal {n} is out of range"
            )));
        }

        let has_ordinal = self.by_day.iter().any(|wd| wd.ordinal.is_some());
        match self.freq {
            Frequency::Daily | Frequency::Weekly if has_ordinal => {
                return Err(AgendaError::invalid_rule(format!(
                    "BYDAY ordinals are not allowed with FREQ={}",
                    self.freq.as_str()
                )));
            }
            Frequency::Monthly
                if self
                    .by_day
                    .iter()
                    .any(|wd| wd.ordinal.is_some_and(|n| n.unsigned_abs() > 5)) =>
            {
                return Err(AgendaError::invalid_rule(
                    "BYDAY ordinal cannot exceed 5 with FREQ=MONTHLY",
                ));
            }
            Frequency::Yearly if has_ordinal && !self.by_week_no.is_empty() => {
                return Err(AgendaError::invalid_rule(
                    "BYDAY ordinals cannot be combined with BYWEEKNO",
                ));
            }
            _ => {}
        }
        if self.freq == Frequency::Weekly && !self.by_month_day.is_empty() {
            return Err(AgendaError::invalid_rule(
                "BYMONTHDAY is not allowed with FREQ=WEEKLY",
            ));
        }
        if matches!(self.freq, Frequency::Weekly | Frequency::Monthly)
            && !self.by_year_day.is_empty()
        {
            return Err(AgendaError::invalid_rule(format!(
                "BYYEARDAY is not allowed with FREQ={}",
                self.freq.as_str()
            )));
        }
        if self.freq != Frequency::Yearly && !self.by_week_no.is_empty() {
            return Err(AgendaError::invalid_rule(
                "BYWEEKNO is only allowed with FREQ=YEARLY",
            ));
        }
        if !self.by_set_pos.is_empty() && self.is_unconstrained() {
            return Err(AgendaError::invalid_rule(
                "BYSETPOS requires another BYxxx rule part",
            ));
        }
        Ok(())
    }
}

fn valid_signed(value: i64, max: i64) -> bool {
    value != 0 && (-max..=max).contains(&value)
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;

    /// A scalar or a list, as rrule.js options accept both.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    impl<T> OneOrMany<T> {
        fn into_vec(self) -> Vec<T> {
            match self {
                OneOrMany::One(v) => vec![v],
                OneOrMany::Many(v) => v,
            }
        }
    }

    fn list<T>(v: Option<OneOrMany<T>>) -> Vec<T> {
        v.map(OneOrMany::into_vec).unwrap_or_default()
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    struct Fields {
        freq: Frequency,
        #[serde(default)]
        interval: Option<u32>,
        #[serde(default)]
        until: Option<String>,
        #[serde(default)]
        count: Option<u32>,
        #[serde(default, alias = "byDay")]
        by_weekday: Option<OneOrMany<WeekdayNum>>,
        #[serde(default)]
        by_month: Option<OneOrMany<i8>>,
        #[serde(default)]
        by_month_day: Option<OneOrMany<i8>>,
        #[serde(default)]
        by_year_day: Option<OneOrMany<i16>>,
        #[serde(default, alias = "byWeekNo")]
        by_week_number: Option<OneOrMany<i8>>,
        #[serde(default)]
        by_set_pos: Option<OneOrMany<i16>>,
        #[serde(default, alias = "weekStart")]
        wkst: Option<Weekday>,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Fields(Fields),
    }

    impl<'de> Deserialize<'de> for Recurrence {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            match Repr::deserialize(deserializer)? {
                Repr::Text(s) => crate::parser::parse(&s).map_err(serde::de::Error::custom),
                Repr::Fields(f) => Ok(Recurrence {
                    freq: f.freq,
                    interval: f.interval.unwrap_or(1),
                    until: f.until,
                    count: f.count,
                    by_day: list(f.by_weekday),
                    by_month: list(f.by_month),
                    by_month_day: list(f.by_month_day),
                    by_year_day: list(f.by_year_day),
                    by_week_no: list(f.by_week_number),
                    by_set_pos: list(f.by_set_pos),
                    week_start: f.wkst,
                }),
            }
        }
    }

    impl Serialize for Recurrence {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }
}
