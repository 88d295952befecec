//! Recurrence matching: compile a rule against its anchor date, then answer
//! "does it occur on D" and "nearest occurrence at-or-after / at-or-before D".
//!
//! Queries jump straight to the period (day, week, month or year) holding
//! the query date and scan outward from there, so their cost depends on how
//! sparse the rule is, not on how far the query date is from the start.
//! `COUNT` rules are the exception: their occurrences are resolved in order,
//! on demand, up to the furthest date queried so far.

use std::sync::{Mutex, MutexGuard, PoisonError};

use jiff::civil::Date;

use crate::date::{
    add_days, add_months, days_between, months_between, parse_date, parse_until_date,
    week_number, week_start_of,
};
use crate::error::AgendaError;
use crate::event::Event;
use crate::rule::{Frequency, Recurrence, Weekday, WeekdayNum};

/// Number of periods in one 400-year Gregorian cycle, per frequency. A rule
/// with no candidate in a whole cycle never produces one again.
fn cycle_periods(freq: Frequency) -> usize {
    match freq {
        Frequency::Daily => 146_097,
        Frequency::Weekly => 20_871,
        Frequency::Monthly => 4_800,
        Frequency::Yearly => 400,
    }
}

/// Outcome of one scan, with the number of periods it had to examine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scan {
    found: Option<Date>,
    periods: usize,
}

/// Occurrences of a `COUNT` rule resolved so far.
#[derive(Debug, Clone)]
struct Resolved {
    dates: Vec<Date>,
    complete: bool,
}

#[derive(Debug)]
struct CountedDates {
    limit: usize,
    resolved: Mutex<Resolved>,
}

impl CountedDates {
    fn new(limit: usize, start: Date) -> Self {
        Self {
            limit,
            resolved: Mutex::new(Resolved {
                dates: vec![start],
                complete: limit <= 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Resolved> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for CountedDates {
    fn clone(&self) -> Self {
        Self {
            limit: self.limit,
            resolved: Mutex::new(self.lock().clone()),
        }
    }
}

/// A recurrence rule resolved against its start date.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    start: Date,
    freq: Frequency,
    interval: i64,
    until: Option<Date>,
    by_day: Vec<WeekdayNum>,
    by_month: Vec<i8>,
    by_month_day: Vec<i8>,
    by_year_day: Vec<i16>,
    by_week_no: Vec<i8>,
    by_set_pos: Vec<i16>,
    week_start: Weekday,
    counted: Option<CountedDates>,
}

impl CompiledRule {
    /// Validate `rule` and anchor it at `start`.
    ///
    /// `default_week_start` applies when the rule has no `WKST` of its own.
    pub fn new(
        rule: &Recurrence,
        start: Date,
        default_week_start: Weekday,
    ) -> Result<Self, AgendaError> {
        rule.validate()?;

        let until = rule.until.as_deref().map(parse_until_date).transpose()?;
        if let Some(until) = until {
            if until < start {
                return Err(AgendaError::invalid_rule(format!(
                    "UNTIL {until} is before the start date {start}"
                )));
            }
        }

        let mut compiled = CompiledRule {
            start,
            freq: rule.freq,
            interval: rule.interval as i64,
            until,
            by_day: rule.by_day.clone(),
            by_month: rule.by_month.clone(),
            by_month_day: rule.by_month_day.clone(),
            by_year_day: rule.by_year_day.clone(),
            by_week_no: rule.by_week_no.clone(),
            by_set_pos: rule.by_set_pos.clone(),
            week_start: rule.week_start.unwrap_or(default_week_start),
            counted: None,
        };
        compiled.apply_start_defaults();

        if let Some(count) = rule.count {
            compiled.counted = Some(CountedDates::new(count as usize, start));
        }
        Ok(compiled)
    }

    /// Pin the unconstrained fields to the start date (RFC 5545 §3.3.10).
    fn apply_start_defaults(&mut self) {
        let start_weekday = Weekday::from_jiff(self.start.weekday());
        match self.freq {
            Frequency::Daily => {}
            Frequency::Weekly => {
                if self.by_day.is_empty() {
                    self.by_day.push(WeekdayNum::every(start_weekday));
                }
            }
            Frequency::Monthly => {
                if self.by_day.is_empty() && self.by_month_day.is_empty() {
                    self.by_month_day.push(self.start.day());
                }
            }
            Frequency::Yearly => {
                let no_day_parts = self.by_day.is_empty()
                    && self.by_month_day.is_empty()
                    && self.by_year_day.is_empty();
                if no_day_parts && self.by_week_no.is_empty() {
                    if self.by_month.is_empty() {
                        self.by_month.push(self.start.month());
                    }
                    self.by_month_day.push(self.start.day());
                } else if no_day_parts {
                    self.by_day.push(WeekdayNum::every(start_weekday));
                }
            }
        }
    }

    pub fn start(&self) -> Date {
        self.start
    }

    /// Last date the rule may occur on, if bounded by `UNTIL` or `COUNT`.
    ///
    /// For a `COUNT` rule this resolves every remaining occurrence.
    pub fn last(&self) -> Option<Date> {
        match &self.counted {
            Some(counted) => self.resolve_past(counted, Date::MAX).dates.last().copied(),
            None => self.until,
        }
    }

    /// Whether `date` is an occurrence.
    pub fn occurs_on(&self, date: Date) -> bool {
        self.next_on_or_after(date) == Some(date)
    }

    /// First occurrence on or after `from`.
    pub fn next_on_or_after(&self, from: Date) -> Option<Date> {
        if let Some(counted) = &self.counted {
            let resolved = self.resolve_past(counted, from);
            let i = resolved.dates.partition_point(|d| *d < from);
            return resolved.dates.get(i).copied();
        }
        self.scan_forward(from).found
    }

    /// Last occurrence on or before `from`.
    pub fn previous_on_or_before(&self, from: Date) -> Option<Date> {
        if let Some(counted) = &self.counted {
            let resolved = self.resolve_past(counted, from);
            let i = resolved.dates.partition_point(|d| *d <= from);
            return i.checked_sub(1).map(|i| resolved.dates[i]);
        }
        self.scan_backward(from).found
    }

    /// Lazy iterator over occurrences on or after `from`.
    pub fn occurrences(&self, from: Date) -> Occurrences<'_> {
        Occurrences::new(self, from)
    }

    /// Resolve `COUNT` occurrences, a period at a time, until one lies
    /// after `target` or the count runs out.
    fn resolve_past<'c>(
        &self,
        counted: &'c CountedDates,
        target: Date,
    ) -> MutexGuard<'c, Resolved> {
        let mut resolved = counted.lock();
        while !resolved.complete {
            let next = match resolved.dates.last() {
                Some(last) if *last > target => break,
                Some(last) => last.tomorrow().ok(),
                None => None,
            };
            let batch = next.map(|d| self.period_from(d).0).unwrap_or_default();
            let room = counted.limit.saturating_sub(resolved.dates.len());
            resolved.complete = batch.len() >= room || batch.is_empty();
            resolved.dates.extend(batch.into_iter().take(room));
        }
        resolved
    }

    fn scan_forward(&self, from: Date) -> Scan {
        let (dates, periods) = self.period_from(from);
        Scan {
            found: dates.first().copied(),
            periods,
        }
    }

    /// Occurrences on or after `from` within the first period that has any,
    /// with the number of periods examined.
    fn period_from(&self, from: Date) -> (Vec<Date>, usize) {
        if from <= self.start {
            return (vec![self.start], 0);
        }
        if self.until.is_some_and(|until| from > until) {
            return (Vec::new(), 0);
        }

        let limit = cycle_periods(self.freq);
        let mut period = self.period_units(from).div_euclid(self.interval);
        let mut periods = 0;
        while periods < limit {
            let Some((first, last)) = self.period_bounds(period) else {
                break;
            };
            if self.until.is_some_and(|until| first > until) {
                break;
            }
            periods += 1;
            if last >= from {
                let dates: Vec<Date> = self
                    .candidates(first, last)
                    .into_iter()
                    .filter(|d| *d >= from && self.until.map_or(true, |until| *d <= until))
                    .collect();
                if !dates.is_empty() {
                    return (dates, periods);
                }
            }
            period += 1;
        }
        (Vec::new(), periods)
    }

    fn scan_backward(&self, from: Date) -> Scan {
        if from < self.start {
            return Scan {
                found: None,
                periods: 0,
            };
        }
        let from = match self.until {
            Some(until) if from > until => until,
            _ => from,
        };

        let limit = cycle_periods(self.freq);
        let mut period = self.period_units(from).div_euclid(self.interval);
        let mut periods = 0;
        while period >= 0 && periods < limit {
            let Some((first, last)) = self.period_bounds(period) else {
                break;
            };
            periods += 1;
            let hit = self
                .candidates(first, last)
                .into_iter()
                .rev()
                .find(|d| *d <= from && *d > self.start);
            if let Some(d) = hit {
                return Scan {
                    found: Some(d),
                    periods,
                };
            }
            period -= 1;
        }
        Scan {
            found: Some(self.start),
            periods,
        }
    }

    /// Frequency units (days, weeks, months, years) from the start period to
    /// the period holding `date`.
    fn period_units(&self, date: Date) -> i64 {
        match self.freq {
            Frequency::Daily => days_between(self.start, date),
            Frequency::Weekly => match week_start_of(self.start, self.week_start.to_jiff()) {
                Some(anchor) => days_between(anchor, date).div_euclid(7),
                None => 0,
            },
            Frequency::Monthly => months_between(self.start, date),
            Frequency::Yearly => date.year() as i64 - self.start.year() as i64,
        }
    }

    /// First and last day of the `period`-th interval step.
    fn period_bounds(&self, period: i64) -> Option<(Date, Date)> {
        let units = period.checked_mul(self.interval)?;
        match self.freq {
            Frequency::Daily => {
                let day = add_days(self.start, units)?;
                Some((day, day))
            }
            Frequency::Weekly => {
                let anchor = week_start_of(self.start, self.week_start.to_jiff())?;
                let first = add_days(anchor, units.checked_mul(7)?)?;
                let last = add_days(first, 6).unwrap_or_else(|| first.last_of_year());
                Some((first, last))
            }
            Frequency::Monthly => {
                let first = add_months(self.start, units)?;
                Some((first, first.last_of_month()))
            }
            Frequency::Yearly => {
                let year = i16::try_from(self.start.year() as i64 + units).ok()?;
                let first = Date::new(year, 1, 1).ok()?;
                Some((first, first.last_of_year()))
            }
        }
    }

    /// Days of one period that satisfy every `BYxxx` filter, after `BYSETPOS`.
    fn candidates(&self, first: Date, last: Date) -> Vec<Date> {
        let mut set = Vec::new();
        let mut day = first;
        loop {
            if self.matches_filters(day) {
                set.push(day);
            }
            if day >= last {
                break;
            }
            match day.tomorrow() {
                Ok(next) => day = next,
                Err(_) => break,
            }
        }
        self.apply_set_pos(set)
    }

    fn matches_filters(&self, date: Date) -> bool {
        if !self.by_month.is_empty() && !self.by_month.contains(&date.month()) {
            return false;
        }
        if !self.by_week_no.is_empty() && !self.matches_week_no(date) {
            return false;
        }
        if !self.by_year_day.is_empty() && !self.matches_year_day(date) {
            return false;
        }
        if !self.by_month_day.is_empty() && !self.matches_month_day(date) {
            return false;
        }
        if !self.by_day.is_empty() && !self.matches_by_day(date) {
            return false;
        }
        true
    }

    fn matches_week_no(&self, date: Date) -> bool {
        let Some((number, weeks)) = week_number(date, self.week_start.to_jiff()) else {
            return false;
        };
        self.by_week_no
            .iter()
            .any(|&n| signed_position(n as i64, weeks) == Some(number))
    }

    fn matches_year_day(&self, date: Date) -> bool {
        let day = date.day_of_year() as i64;
        let len = date.days_in_year() as i64;
        self.by_year_day
            .iter()
            .any(|&n| signed_position(n as i64, len) == Some(day))
    }

    fn matches_month_day(&self, date: Date) -> bool {
        let day = date.day() as i64;
        let len = date.days_in_month() as i64;
        self.by_month_day
            .iter()
            .any(|&n| signed_position(n as i64, len) == Some(day))
    }

    fn matches_by_day(&self, date: Date) -> bool {
        let weekday = date.weekday();
        self.by_day.iter().any(|wd| {
            if wd.weekday.to_jiff() != weekday {
                return false;
            }
            let Some(n) = wd.ordinal else {
                return true;
            };
            // Ordinals count within the month for MONTHLY (or YEARLY with
            // BYMONTH), otherwise within the year.
            let (index, len) = if self.freq == Frequency::Monthly || !self.by_month.is_empty() {
                (date.day() as i64, date.days_in_month() as i64)
            } else {
                (date.day_of_year() as i64, date.days_in_year() as i64)
            };
            if n > 0 {
                (index - 1) / 7 + 1 == n as i64
            } else {
                (len - index) / 7 + 1 == -(n as i64)
            }
        })
    }

    fn apply_set_pos(&self, set: Vec<Date>) -> Vec<Date> {
        if self.by_set_pos.is_empty() {
            return set;
        }
        let len = set.len() as i64;
        let mut picked: Vec<Date> = self
            .by_set_pos
            .iter()
            .filter_map(|&n| {
                let index = if n > 0 { n as i64 - 1 } else { len + n as i64 };
                (0..len).contains(&index).then(|| set[index as usize])
            })
            .collect();
        picked.sort();
        picked.dedup();
        picked
    }
}

/// Resolve a 1-based (or negative, counted from the end) position within a
/// sequence of `len` items.
fn signed_position(n: i64, len: i64) -> Option<i64> {
    let pos = if n > 0 { n } else { len + n + 1 };
    (1..=len).contains(&pos).then_some(pos)
}

/// Lazy iterator over the occurrences of one rule, ascending.
pub struct Occurrences<'a> {
    rule: &'a CompiledRule,
    cursor: Option<Date>,
}

impl<'a> Occurrences<'a> {
    pub fn new(rule: &'a CompiledRule, from: Date) -> Self {
        Self {
            rule,
            cursor: Some(from),
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Date;

    fn next(&mut self) -> Option<Self::Item> {
        let found = self.rule.next_on_or_after(self.cursor?);
        // Step past the occurrence so it is never returned twice.
        self.cursor = found.and_then(|d| d.tomorrow().ok());
        found
    }
}

impl std::iter::FusedIterator for Occurrences<'_> {}

/// An event whose start date and rule have been validated and compiled.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    event: Event,
    start: Date,
    rule: Option<CompiledRule>,
}

impl ScheduledEvent {
    /// Validate `event`; errors carry the event id.
    pub fn new(event: Event, default_week_start: Weekday) -> Result<Self, AgendaError> {
        let start = parse_date(&event.start_date).map_err(|e| e.for_event(&event.id))?;
        let rule = event
            .recurrence
            .as_ref()
            .map(|rule| CompiledRule::new(rule, start, default_week_start))
            .transpose()
            .map_err(|e| e.for_event(&event.id))?;
        Ok(Self { event, start, rule })
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn rule(&self) -> Option<&CompiledRule> {
        self.rule.as_ref()
    }

    pub fn occurs_on(&self, date: Date) -> bool {
        match &self.rule {
            Some(rule) => rule.occurs_on(date),
            None => date == self.start,
        }
    }

    pub fn next_on_or_after(&self, from: Date) -> Option<Date> {
        match &self.rule {
            Some(rule) => rule.next_on_or_after(from),
            None => (from <= self.start).then_some(self.start),
        }
    }

    pub fn previous_on_or_before(&self, from: Date) -> Option<Date> {
        match &self.rule {
            Some(rule) => rule.previous_on_or_before(from),
            None => (from >= self.start).then_some(self.start),
        }
    }
}

/// Whether `event` occurs on `date`.
///
/// Compiles the event on every call; hold a [`ScheduledEvent`] (or a
/// [`DateRuleIndex`](crate::DateRuleIndex)) to query repeatedly.
pub fn occurs_on(event: &Event, date: Date, week_start: Weekday) -> Result<bool, AgendaError> {
    Ok(ScheduledEvent::new(event.clone(), week_start)?.occurs_on(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn d(y: i16, m: i8, day: i8) -> Date {
        Date::new(y, m, day).unwrap()
    }

    fn compile(rule: &str, start: Date) -> CompiledRule {
        CompiledRule::new(&parse(rule).unwrap(), start, Weekday::Monday).unwrap()
    }

    fn first_n(rule: &CompiledRule, n: usize) -> Vec<Date> {
        rule.occurrences(rule.start()).take(n).collect()
    }

    #[test]
    fn one_off_event_only_on_start() {
        let event = Event::new("a", "Dentist", "2024-03-01");
        let ev = ScheduledEvent::new(event, Weekday::Monday).unwrap();
        assert!(ev.occurs_on(d(2024, 3, 1)));
        assert!(!ev.occurs_on(d(2024, 2, 29)));
        assert!(!ev.occurs_on(d(2024, 3, 2)));
        assert!(!ev.occurs_on(d(2025, 3, 1)));
        assert_eq!(ev.next_on_or_after(d(2024, 1, 1)), Some(d(2024, 3, 1)));
        assert_eq!(ev.next_on_or_after(d(2024, 3, 2)), None);
        assert_eq!(ev.previous_on_or_before(d(2024, 2, 1)), None);
    }

    #[test]
    fn daily_without_until_covers_every_later_day() {
        let rule = compile("FREQ=DAILY", d(2024, 1, 30));
        assert!(!rule.occurs_on(d(2024, 1, 29)));
        let mut day = d(2024, 1, 30);
        for _ in 0..400 {
            assert!(rule.occurs_on(day), "{day}");
            day = day.tomorrow().unwrap();
        }
    }

    #[test]
    fn biweekly_monday() {
        // 2024-01-01 is a Monday.
        let rule = compile("FREQ=WEEKLY;INTERVAL=2", d(2024, 1, 1));
        let mondays = first_n(&rule, 5);
        assert_eq!(
            mondays,
            vec![
                d(2024, 1, 1),
                d(2024, 1, 15),
                d(2024, 1, 29),
                d(2024, 2, 12),
                d(2024, 2, 26)
            ]
        );
        assert!(!rule.occurs_on(d(2024, 1, 8)));
        assert!(!rule.occurs_on(d(2024, 1, 22)));
        assert!(!rule.occurs_on(d(2024, 1, 16)));
    }

    #[test]
    fn biweekly_tue_thu() {
        let rule = compile("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH", d(2026, 1, 6));
        assert_eq!(
            first_n(&rule, 6),
            vec![
                d(2026, 1, 6),
                d(2026, 1, 8),
                d(2026, 1, 20),
                d(2026, 1, 22),
                d(2026, 2, 3),
                d(2026, 2, 5)
            ]
        );
    }

    #[test]
    fn week_start_changes_biweekly_alignment() {
        // RFC 5545 §3.3.10 WKST example, starting Tue 1997-08-05.
        let mo = compile("FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=MO", d(1997, 8, 5));
        assert_eq!(
            first_n(&mo, 10),
            vec![d(1997, 8, 5), d(1997, 8, 10), d(1997, 8, 19), d(1997, 8, 24)]
        );
        let su = compile("FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU", d(1997, 8, 5));
        assert_eq!(
            first_n(&su, 10),
            vec![d(1997, 8, 5), d(1997, 8, 17), d(1997, 8, 19), d(1997, 8, 31)]
        );
    }

    #[test]
    fn monthly_on_31st_skips_short_months() {
        let rule = compile("FREQ=MONTHLY", d(2024, 1, 31));
        assert_eq!(
            first_n(&rule, 4),
            vec![d(2024, 1, 31), d(2024, 3, 31), d(2024, 5, 31), d(2024, 7, 31)]
        );
    }

    #[test]
    fn monthly_last_weekday_with_setpos() {
        let rule = compile("FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1", d(2024, 1, 31));
        assert_eq!(
            first_n(&rule, 4),
            vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 29), d(2024, 4, 30)]
        );
    }

    #[test]
    fn yearly_thanksgiving() {
        let rule = compile("FREQ=YEARLY;BYMONTH=11;BYDAY=4TH", d(2023, 11, 23));
        assert_eq!(
            first_n(&rule, 3),
            vec![d(2023, 11, 23), d(2024, 11, 28), d(2025, 11, 27)]
        );
    }

    #[test]
    fn yearly_leap_day_skips_common_years() {
        let rule = compile("FREQ=YEARLY", d(2024, 2, 29));
        assert_eq!(
            first_n(&rule, 3),
            vec![d(2024, 2, 29), d(2028, 2, 29), d(2032, 2, 29)]
        );
    }

    #[test]
    fn until_is_inclusive_of_its_day() {
        let rule = compile("FREQ=DAILY;UNTIL=20240105T000000Z", d(2024, 1, 1));
        assert!(rule.occurs_on(d(2024, 1, 5)));
        assert!(!rule.occurs_on(d(2024, 1, 6)));
        assert_eq!(rule.previous_on_or_before(d(2030, 1, 1)), Some(d(2024, 1, 5)));
        assert_eq!(rule.last(), Some(d(2024, 1, 5)));
    }

    #[test]
    fn count_includes_start() {
        let rule = compile("FREQ=WEEKLY;COUNT=3;BYDAY=WE", d(2024, 1, 1));
        // Start (a Monday) is the first occurrence even though BYDAY says WE.
        assert_eq!(
            first_n(&rule, 10),
            vec![d(2024, 1, 1), d(2024, 1, 3), d(2024, 1, 10)]
        );
        assert_eq!(rule.next_on_or_after(d(2024, 1, 11)), None);
        assert_eq!(rule.previous_on_or_before(d(2024, 1, 9)), Some(d(2024, 1, 3)));
    }

    #[test]
    fn huge_count_resolves_only_what_is_queried() {
        let started = std::time::Instant::now();
        let rule = compile(
            "FREQ=YEARLY;COUNT=4000000000;BYDAY=MO,TU,WE,TH,FR,SA,SU",
            d(2024, 1, 1),
        );
        assert_eq!(rule.next_on_or_after(d(2024, 1, 2)), Some(d(2024, 1, 2)));
        assert!(rule.occurs_on(d(2031, 7, 15)));
        assert_eq!(rule.previous_on_or_before(d(2026, 3, 1)), Some(d(2026, 3, 1)));
        let resolved = rule.counted.as_ref().unwrap().lock().dates.len();
        assert!(resolved < 4000, "resolved {resolved} dates");
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn count_stops_inside_a_period() {
        // Three weekdays of the first week, start included.
        let rule = compile("FREQ=WEEKLY;COUNT=3;BYDAY=MO,WE,FR", d(2024, 1, 1));
        assert_eq!(rule.next_on_or_after(d(2024, 1, 6)), None);
        assert_eq!(rule.last(), Some(d(2024, 1, 5)));
        assert_eq!(
            first_n(&rule.clone(), 5),
            vec![d(2024, 1, 1), d(2024, 1, 3), d(2024, 1, 5)]
        );
    }

    #[test]
    fn never_before_start() {
        let rule = compile("FREQ=MONTHLY;BYMONTHDAY=1,15", d(2024, 3, 10));
        assert_eq!(rule.previous_on_or_before(d(2024, 3, 9)), None);
        assert_eq!(rule.previous_on_or_before(d(2024, 3, 14)), Some(d(2024, 3, 10)));
        assert_eq!(rule.next_on_or_after(d(2024, 3, 11)), Some(d(2024, 3, 15)));
        assert!(!rule.occurs_on(d(2024, 3, 1)));
    }

    #[test]
    fn yearly_by_week_no() {
        // Monday of ISO week 20.
        let rule = compile("FREQ=YEARLY;BYWEEKNO=20;BYDAY=MO", d(1997, 5, 12));
        assert_eq!(
            first_n(&rule, 3),
            vec![d(1997, 5, 12), d(1998, 5, 11), d(1999, 5, 17)]
        );
    }

    #[test]
    fn yearly_by_year_day() {
        let rule = compile("FREQ=YEARLY;BYYEARDAY=1,-1", d(2024, 1, 1));
        assert_eq!(
            first_n(&rule, 4),
            vec![d(2024, 1, 1), d(2024, 12, 31), d(2025, 1, 1), d(2025, 12, 31)]
        );
    }

    #[test]
    fn backward_lookup_does_not_walk_days() {
        let rule = compile("FREQ=YEARLY", d(2023, 6, 1));
        let scan = rule.scan_backward(d(2024, 5, 31));
        assert_eq!(scan.found, Some(d(2023, 6, 1)));
        assert!(scan.periods <= 2, "examined {} periods", scan.periods);

        let far = rule.scan_forward(d(9000, 6, 2));
        assert_eq!(far.found, Some(d(9001, 6, 1)));
        assert!(far.periods <= 2);
    }

    #[test]
    fn rule_that_never_repeats_terminates() {
        let rule = compile("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=30", d(2024, 1, 1));
        assert_eq!(rule.next_on_or_after(d(2024, 1, 2)), None);
        assert!(rule.occurs_on(d(2024, 1, 1)));
    }

    #[test]
    fn until_before_start_is_rejected() {
        let rule = parse("FREQ=DAILY;UNTIL=20231231").unwrap();
        assert!(CompiledRule::new(&rule, d(2024, 1, 1), Weekday::Monday).is_err());
    }

    #[test]
    fn bad_start_date_names_event() {
        let event = Event::new("x1", "Broken", "2024-02-30");
        let err = ScheduledEvent::new(event, Weekday::Monday).unwrap_err();
        assert_eq!(err.event_id(), Some("x1"));
    }

    #[test]
    fn malformed_until_names_event() {
        let event = Event::new("x2", "Broken", "2024-02-01")
            .with_recurrence(Recurrence::daily().with_until("someday"));
        let err = ScheduledEvent::new(event, Weekday::Monday).unwrap_err();
        assert_eq!(err.event_id(), Some("x2"));
    }
}
