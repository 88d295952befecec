use std::io::Read;
use std::path::PathBuf;
use std::process;

use agenda::rule::parse_weekday;
use agenda::{Agenda, AgendaConfig, AgendaError, DateRuleIndex, Event, Mode, Recurrence, Weekday};
use clap::Parser;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "agenda",
    about = "Day-by-day agenda sections for one-off and recurring events",
    version
)]
struct Cli {
    /// Events JSON file (an array of events), or `-` for stdin
    events: Option<String>,

    /// JSON config file; flags and environment variables override it
    #[arg(long, env = "AGENDA_CONFIG")]
    config: Option<PathBuf>,

    /// Pivot date (YYYY-MM-DD). Defaults to today in UTC.
    #[arg(long, env = "AGENDA_PIVOT", value_parser = parse_date_arg)]
    pivot: Option<Date>,

    /// Default week start for rules without WKST (e.g. MO, SU, sunday)
    #[arg(long, env = "AGENDA_WEEK_START", value_parser = parse_weekday_arg)]
    week_start: Option<Weekday>,

    /// Show every day, including days without events
    #[arg(long)]
    dense: bool,

    /// Do not show the pivot day when it has no events
    #[arg(long)]
    hide_empty_pivot: bool,

    /// Number of sections to load from the pivot onward
    #[arg(long, env = "AGENDA_UPCOMING")]
    upcoming: Option<usize>,

    /// Number of sections to load before the pivot
    #[arg(long, env = "AGENDA_PAST")]
    past: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Validate events without generating sections
    #[arg(long)]
    check: bool,

    /// Print occurrences of a single RRULE instead of an agenda
    #[arg(long, requires = "start")]
    rrule: Option<String>,

    /// Start date of --rrule
    #[arg(long, requires = "rrule", value_parser = parse_date_arg)]
    start: Option<Date>,

    /// Number of --rrule occurrences to show
    #[arg(short, long, default_value = "10")]
    n: usize,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_date_arg(s: &str) -> Result<Date, String> {
    agenda::date::parse_date(s).map_err(|e| e.to_string())
}

fn parse_weekday_arg(s: &str) -> Result<Weekday, String> {
    parse_weekday(s).ok_or_else(|| format!("unknown weekday '{s}'"))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn today() -> Date {
    Timestamp::now().to_zoned(TimeZone::UTC).date()
}

fn fail(e: &AgendaError) -> ! {
    eprintln!("{}", e.display_rich());
    process::exit(1);
}

/// Defaults, then the config file, then flags and environment.
fn load_config(cli: &Cli) -> Result<AgendaConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
            let mut value: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| format!("invalid config {}: {e}", path.display()))?;
            if let Some(map) = value.as_object_mut() {
                map.entry("pivot")
                    .or_insert_with(|| serde_json::Value::String(today().to_string()));
            }
            serde_json::from_value::<AgendaConfig>(value)
                .map_err(|e| format!("invalid config {}: {e}", path.display()))?
        }
        None => AgendaConfig::new(today()),
    };

    if let Some(pivot) = cli.pivot {
        config = config.with_pivot(pivot);
    }
    if let Some(week_start) = cli.week_start {
        config = config.with_week_start(week_start);
    }
    if cli.dense {
        config = config.with_mode(Mode::Dense);
    }
    if cli.hide_empty_pivot {
        config = config.with_empty_pivot(false);
    }
    if let Some(n) = cli.upcoming {
        config = config.with_upcoming_batch(n);
    }
    if let Some(n) = cli.past {
        config = config.with_past_batch(n);
    }
    config.validate().map_err(|e| e.to_string())?;
    tracing::debug!(pivot = %config.pivot, mode = ?config.mode, "resolved config");
    Ok(config)
}

fn read_events(source: &str) -> Result<Vec<Event>, String> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("cannot read stdin: {e}"))?;
        buf
    } else {
        std::fs::read_to_string(source).map_err(|e| format!("cannot read {source}: {e}"))?
    };
    serde_json::from_str(&text).map_err(|e| format!("invalid events: {e}"))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // Handle --rrule/--start occurrence listing
    if let (Some(rrule), Some(start)) = (&cli.rrule, cli.start) {
        let rule = Recurrence::parse(rrule).unwrap_or_else(|e| fail(&e));
        let dates = rule
            .first_n(start, config.week_start, cli.n.min(1000))
            .unwrap_or_else(|e| fail(&e));
        if cli.json {
            let strings: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
            println!("{}", serde_json::json!(strings));
        } else {
            for d in &dates {
                println!("{d}");
            }
        }
        process::exit(0);
    }

    let source = match cli.events {
        Some(ref s) => s.as_str(),
        None => {
            eprintln!("error: no events file provided (use - for stdin)");
            process::exit(2);
        }
    };

    let events = match read_events(source) {
        Ok(events) => {
            tracing::debug!(source, count = events.len(), "loaded events");
            events
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if cli.check {
        let index = DateRuleIndex::new(events, config.week_start).unwrap_or_else(|e| fail(&e));
        println!("\u{2713} {} events valid", index.len());
        process::exit(0);
    }

    let mut agenda = Agenda::new(events, config).unwrap_or_else(|e| fail(&e));
    agenda.load_initial();

    if cli.json {
        let out = serde_json::json!({
            "pivot": agenda.pivot().to_string(),
            "sections": agenda.sections(),
            "hasMorePast": agenda.has_more_past(),
            "hasMoreUpcoming": agenda.has_more_upcoming(),
        });
        match serde_json::to_string_pretty(&out) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if agenda.sections().is_empty() {
        eprintln!("no events");
        return;
    }
    let pivot = agenda.pivot_position();
    for (i, section) in agenda.sections().iter().enumerate() {
        let marker = if Some(i) == pivot { ">" } else { " " };
        println!("{marker} {}", section.title());
        for event in &section.events {
            let time = match (&event.start_time, &event.end_time) {
                (Some(start), Some(end)) => format!("{start}-{end}"),
                (Some(start), None) => start.clone(),
                _ => "all day".to_string(),
            };
            println!("    {time:<11} {}", event.title);
        }
    }
}
