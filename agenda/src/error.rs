use std::fmt;

/// Byte range within the input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// All errors produced by agenda.
///
/// Exhaustion of a generator is never an error; it is signalled by the
/// iterator returning `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AgendaError {
    /// RRULE text could not be parsed.
    #[error("{message}")]
    Rule {
        message: String,
        span: Span,
        input: String,
    },

    /// A civil date string is not a valid `YYYY-MM-DD` date.
    #[error("invalid date '{input}': {message}")]
    Date { input: String, message: String },

    /// A rule parsed fine but its parts contradict each other or RFC 5545.
    #[error("{message}")]
    InvalidRule { message: String },

    /// An event failed validation while the date rule index was built.
    #[error("event '{event_id}': {source}")]
    Event {
        event_id: String,
        #[source]
        source: Box<AgendaError>,
    },

    #[error("{message}")]
    Config { message: String },
}

impl AgendaError {
    pub fn rule(message: impl Into<String>, span: Span, input: impl Into<String>) -> Self {
        Self::Rule {
            message: message.into(),
            span,
            input: input.into(),
        }
    }

    pub fn date(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Date {
            input: input.into(),
            message: message.into(),
        }
    }

    pub fn invalid_rule(message: impl Into<String>) -> Self {
        Self::InvalidRule {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Attach the id of the event that caused this error.
    pub fn for_event(self, event_id: impl Into<String>) -> Self {
        Self::Event {
            event_id: event_id.into(),
            source: Box::new(self),
        }
    }

    /// The id of the offending event, if this error came from index construction.
    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::Event { event_id, .. } => Some(event_id),
            _ => None,
        }
    }

    /// Format a rich error with underline for RRULE text errors.
    pub fn display_rich(&self) -> String {
        match self {
            Self::Rule {
                message,
                span,
                input,
            } => format_span_error("error", message, span, input),
            Self::Event { event_id, source } => match source.as_ref() {
                Self::Rule {
                    message,
                    span,
                    input,
                } => format_span_error(
                    "error",
                    &format!("event '{event_id}': {message}"),
                    span,
                    input,
                ),
                other => format!("error: event '{event_id}': {other}"),
            },
            other => format!("error: {other}"),
        }
    }
}

fn format_span_error(prefix: &str, message: &str, span: &Span, input: &str) -> String {
    let mut out = format!("{prefix}: {message}\n");
    out.push_str(&format!("  {input}\n"));
    let padding = " ".repeat(span.start + 2);
    let underline = "^".repeat(span.end.saturating_sub(span.start).max(1));
    out.push_str(&padding);
    out.push_str(&underline);
    out
}
