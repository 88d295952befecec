// Hand-rolled parser for RFC 5545 RRULE values (date-granularity subset).
// Grammar: ["RRULE:"] part *(";" part), part = name "=" value.

use crate::date::parse_until_date;
use crate::error::{AgendaError, Span};
use crate::rule::*;

/// A `NAME=VALUE` rule part with the byte spans of both halves.
struct Part<'a> {
    name: &'a str,
    name_span: Span,
    value: &'a str,
    value_span: Span,
}

/// Parser state over one RRULE string.
struct Parser<'a> {
    input: &'a str,
    seen: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            seen: Vec::new(),
        }
    }

    fn error(&self, message: impl Into<String>, span: Span) -> AgendaError {
        AgendaError::rule(message, span, self.input)
    }

    /// Split the input into rule parts, skipping an optional `RRULE:` prefix.
    fn parts(&self) -> Result<Vec<Part<'a>>, AgendaError> {
        let body = self.input.trim_end();
        let mut offset = body.len() - body.trim_start().len();
        if body[offset..]
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("RRULE:"))
        {
            offset += 6;
        }

        let mut parts = Vec::new();
        for raw in body[offset..].split(';') {
            let start = offset;
            offset += raw.len() + 1;
            if raw.trim().is_empty() {
                // Tolerate a trailing separator only.
                if offset > body.len() {
                    continue;
                }
                return Err(self.error("empty rule part", Span::new(start, start)));
            }
            let Some(eq) = raw.find('=') else {
                return Err(self.error(
                    format!("expected NAME=VALUE, got '{raw}'"),
                    Span::new(start, start + raw.len()),
                ));
            };
            parts.push(Part {
                name: raw[..eq].trim(),
                name_span: Span::new(start, start + eq),
                value: raw[eq + 1..].trim(),
                value_span: Span::new(start + eq + 1, start + raw.len()),
            });
        }
        Ok(parts)
    }

    fn parse(mut self) -> Result<Recurrence, AgendaError> {
        let parts = self.parts()?;
        let Some(freq_part) = parts
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case("FREQ"))
        else {
            let end = self.input.len();
            return Err(self.error("missing FREQ rule part", Span::new(end, end)));
        };
        let freq = self.frequency(freq_part)?;
        let mut rule = Recurrence::new(freq);

        for part in &parts {
            let name = part.name.to_ascii_uppercase();
            if self.seen.contains(&name) {
                return Err(self.error(
                    format!("duplicate rule part '{name}'"),
                    part.name_span,
                ));
            }
            self.seen.push(name.clone());

            match name.as_str() {
                "FREQ" => {}
                "INTERVAL" => rule.interval = self.positive(part)?,
                "COUNT" => rule.count = Some(self.positive(part)?),
                "UNTIL" => {
                    parse_until_date(part.value)
                        .map_err(|e| self.error(e.to_string(), part.value_span))?;
                    rule.until = Some(part.value.to_string());
                }
                "BYDAY" => rule.by_day = self.list(part, parse_weekday_num)?,
                "BYMONTH" => rule.by_month = self.list(part, |s| bounded(s, 1, 12, false))?,
                "BYMONTHDAY" => rule.by_month_day = self.list(part, |s| bounded(s, 1, 31, true))?,
                "BYYEARDAY" => rule.by_year_day = self.list(part, |s| bounded(s, 1, 366, true))?,
                "BYWEEKNO" => rule.by_week_no = self.list(part, |s| bounded(s, 1, 53, true))?,
                "BYSETPOS" => rule.by_set_pos = self.list(part, |s| bounded(s, 1, 366, true))?,
                "WKST" => {
                    let wd = parse_weekday(part.value)
                        .filter(|_| part.value.len() == 2)
                        .ok_or_else(|| {
                            self.error(
                                format!("unknown weekday '{}'", part.value),
                                part.value_span,
                            )
                        })?;
                    rule.week_start = Some(wd);
                }
                "BYHOUR" | "BYMINUTE" | "BYSECOND" => {
                    return Err(self.error(
                        format!("'{name}' is not supported; occurrences are whole days"),
                        part.name_span,
                    ));
                }
                _ => {
                    return Err(self.error(
                        format!("unknown rule part '{}'", part.name),
                        part.name_span,
                    ));
                }
            }
        }

        let whole = Span::new(0, self.input.len());
        rule.validate().map_err(|e| self.error(e.to_string(), whole))?;
        Ok(rule)
    }

    fn frequency(&self, part: &Part<'_>) -> Result<Frequency, AgendaError> {
        parse_frequency(part.value).ok_or_else(|| {
            let upper = part.value.to_ascii_uppercase();
            let message = match upper.as_str() {
                "HOURLY" | "MINUTELY" | "SECONDLY" => format!(
                    "unsupported frequency '{upper}'; expected DAILY, WEEKLY, MONTHLY or YEARLY"
                ),
                _ => format!("unknown frequency '{}'", part.value),
            };
            self.error(message, part.value_span)
        })
    }

    fn positive(&self, part: &Part<'_>) -> Result<u32, AgendaError> {
        match part.value.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.error(
                format!(
                    "{} must be a positive integer, got '{}'",
                    part.name.to_ascii_uppercase(),
                    part.value
                ),
                part.value_span,
            )),
        }
    }

    /// Parse a comma-separated value list, reporting the span of the bad item.
    fn list<T>(
        &self,
        part: &Part<'_>,
        item: impl Fn(&str) -> Result<T, String>,
    ) -> Result<Vec<T>, AgendaError> {
        let raw = &self.input[part.value_span.start..part.value_span.end];
        let mut offset = part.value_span.start;
        let mut out = Vec::new();
        for piece in raw.split(',') {
            let span = Span::new(offset, offset + piece.len());
            offset += piece.len() + 1;
            if piece.trim().is_empty() {
                return Err(self.error("empty list item", span));
            }
            out.push(item(piece.trim()).map_err(|m| self.error(m, span))?);
        }
        Ok(out)
    }
}

/// Parse an integer in `min..=max`, or also `-max..=-min` when `signed`.
fn bounded<T: TryFrom<i64>>(s: &str, min: i64, max: i64, signed: bool) -> Result<T, String> {
    let n: i64 = s
        .parse()
        .map_err(|_| format!("expected an integer, got '{s}'"))?;
    let ok = (min..=max).contains(&n) || (signed && (-max..=-min).contains(&n));
    if !ok {
        let range = if signed {
            format!("{min}..={max} or -{max}..=-{min}")
        } else {
            format!("{min}..={max}")
        };
        return Err(format!("{n} is out of range {range}"));
    }
    T::try_from(n).map_err(|_| format!("{n} is out of range"))
}

/// Parse an RRULE value such as `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO`.
pub fn parse(input: &str) -> Result<Recurrence, AgendaError> {
    Parser::new(input).parse()
}
