//! Civil-date helpers.
//!
//! Every date the crate handles is a `jiff::civil::Date`: no time of day and
//! no offset, so occurrence tests are immune to DST and UTC-offset drift. The
//! wire format is the lexicographically sortable `YYYY-MM-DD`.

use jiff::civil::{Date, Weekday};
use jiff::tz::TimeZone;
use jiff::Span;

use crate::error::AgendaError;

/// Seconds in a civil day; civil dates have no DST.
const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a strict `YYYY-MM-DD` civil date.
pub fn parse_date(input: &str) -> Result<Date, AgendaError> {
    let bytes = input.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(AgendaError::date(input, "expected YYYY-MM-DD"));
    }
    let year: i16 = input[0..4]
        .parse()
        .map_err(|_| AgendaError::date(input, "invalid year"))?;
    let month: i8 = input[5..7]
        .parse()
        .map_err(|_| AgendaError::date(input, "invalid month"))?;
    let day: i8 = input[8..10]
        .parse()
        .map_err(|_| AgendaError::date(input, "invalid day"))?;
    Date::new(year, month, day).map_err(|e| AgendaError::date(input, e.to_string()))
}

/// Format a civil date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.to_string()
}

/// Parse an RRULE `UNTIL` value down to the civil date it ends on.
///
/// Accepts `YYYY-MM-DD`, basic `YYYYMMDD[THHMMSS[Z]]`, and extended ISO 8601
/// date-times. Date-times carrying an offset are normalized to UTC first.
pub fn parse_until_date(input: &str) -> Result<Date, AgendaError> {
    let s = input.trim();
    if s.len() == 10 {
        return parse_date(s);
    }
    if s.contains('-') {
        if let Ok(ts) = s.parse::<jiff::Timestamp>() {
            return Ok(ts.to_zoned(TimeZone::UTC).date());
        }
        return s
            .parse::<jiff::civil::DateTime>()
            .map(|dt| dt.date())
            .map_err(|e| AgendaError::date(input, e.to_string()));
    }

    let (date_part, time_part) = match s.split_once(['T', 't']) {
        Some((d, t)) => (d, Some(t)),
        None => (s, None),
    };
    if date_part.len() != 8 || !date_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AgendaError::date(
            input,
            "expected YYYYMMDD or YYYYMMDDTHHMMSS[Z]",
        ));
    }
    if let Some(time) = time_part {
        let time = time.strip_suffix(['Z', 'z']).unwrap_or(time);
        if time.len() != 6 || !time.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AgendaError::date(input, "expected HHMMSS after 'T'"));
        }
    }
    let dashed = format!("{}-{}-{}", &date_part[0..4], &date_part[4..6], &date_part[6..8]);
    parse_date(&dashed).map_err(|e| match e {
        AgendaError::Date { message, .. } => AgendaError::date(input, message),
        other => other,
    })
}

/// Count days between two dates (signed).
pub fn days_between(a: Date, b: Date) -> i64 {
    a.duration_until(b).as_secs() / SECONDS_PER_DAY
}

/// Count months between two dates (year*12+month arithmetic).
pub fn months_between(a: Date, b: Date) -> i64 {
    (b.year() as i64 * 12 + b.month() as i64) - (a.year() as i64 * 12 + a.month() as i64)
}

/// Shift a date by a signed number of days. `None` past the supported range.
pub fn add_days(date: Date, days: i64) -> Option<Date> {
    let span = Span::new().try_days(days).ok()?;
    date.checked_add(span).ok()
}

/// First day of the month `months` away from `date`'s month.
pub fn add_months(date: Date, months: i64) -> Option<Date> {
    let total = date.year() as i64 * 12 + (date.month() as i64 - 1) + months;
    let year = i16::try_from(total.div_euclid(12)).ok()?;
    let month = (total.rem_euclid(12) + 1) as i8;
    Date::new(year, month, 1).ok()
}

/// The most recent `week_start` on or before `date`.
pub fn week_start_of(date: Date, week_start: Weekday) -> Option<Date> {
    let offset = (date.weekday().to_monday_zero_offset() - week_start.to_monday_zero_offset())
        .rem_euclid(7);
    add_days(date, -(offset as i64))
}

/// Start of week 1 of `year`: the first week holding at least four days of
/// the year, with weeks beginning on `week_start`.
pub fn week_one_start(year: i16, week_start: Weekday) -> Option<Date> {
    let jan1 = Date::new(year, 1, 1).ok()?;
    let offset = (jan1.weekday().to_monday_zero_offset() - week_start.to_monday_zero_offset())
        .rem_euclid(7) as i64;
    if offset <= 3 {
        add_days(jan1, -offset)
    } else {
        add_days(jan1, 7 - offset)
    }
}

/// Week number of `date` and the number of weeks in its week-numbering year.
pub fn week_number(date: Date, week_start: Weekday) -> Option<(i64, i64)> {
    let year = date.year();
    let this_year = week_one_start(year, week_start)?;
    let next_year = week_one_start(year.checked_add(1)?, week_start)?;

    let (base, following) = if date >= next_year {
        (next_year, week_one_start(year.checked_add(2)?, week_start)?)
    } else if date < this_year {
        (week_one_start(year.checked_sub(1)?, week_start)?, this_year)
    } else {
        (this_year, next_year)
    };

    let number = days_between(base, date) / 7 + 1;
    let weeks = days_between(base, following) / 7;
    Some((number, weeks))
}
