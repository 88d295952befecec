use assert_cmd::Command;
use predicates::prelude::*;

fn agenda() -> Command {
    let mut cmd = Command::cargo_bin("agenda").unwrap();
    for var in ["AGENDA_CONFIG", "AGENDA_PIVOT", "AGENDA_WEEK_START", "AGENDA_UPCOMING", "AGENDA_PAST"] {
        cmd.env_remove(var);
    }
    cmd
}

const EVENTS: &str = r#"[
  {"id": "standup", "title": "Standup", "startDate": "2024-01-01", "startTime": "09:30",
   "endTime": "09:45", "recurring": "FREQ=WEEKLY;BYDAY=MO,WE,FR"},
  {"id": "review", "title": "Review", "startDate": "2024-01-05", "startTime": "15:00",
   "recurring": {"freq": "monthly", "byWeekday": "1FR"}},
  {"id": "offsite", "title": "Offsite", "startDate": "2024-01-17"}
]"#;

// ============================================================
// Agenda output
// ============================================================

#[test]
fn test_text_agenda_from_stdin() {
    agenda()
        .args(["-", "--pivot", "2024-01-14", "--past", "2", "--upcoming", "3"])
        .write_stdin(EVENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("  2024-01-10"))
        .stdout(predicate::str::contains("> 2024-01-14"))
        .stdout(predicate::str::contains("09:30-09:45 Standup"))
        .stdout(predicate::str::contains("all day     Offsite"))
        .stdout(predicate::str::contains("2024-01-19").not());
}

#[test]
fn test_json_agenda() {
    agenda()
        .args(["-", "--pivot", "2024-01-14", "--past", "1", "--upcoming", "2", "--json"])
        .write_stdin(EVENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title": "2024-01-12""#))
        .stdout(predicate::str::contains(r#""title": "2024-01-15""#))
        .stdout(predicate::str::contains(r#""hasMoreUpcoming": true"#));
}

#[test]
fn test_hide_empty_pivot() {
    agenda()
        .args(["-", "--pivot", "2024-01-14", "--hide-empty-pivot", "--upcoming", "1", "--past", "1"])
        .write_stdin(EVENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-14").not())
        .stdout(predicate::str::contains("> 2024-01-15"));
}

#[test]
fn test_dense_mode() {
    agenda()
        .args(["-", "--pivot", "2024-01-14", "--dense", "--past", "1", "--upcoming", "3"])
        .write_stdin(EVENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-13"))
        .stdout(predicate::str::contains("2024-01-16"));
}

#[test]
fn test_env_overrides_defaults() {
    agenda()
        .arg("-")
        .env("AGENDA_PIVOT", "2024-01-14")
        .env("AGENDA_UPCOMING", "1")
        .env("AGENDA_PAST", "1")
        .write_stdin(EVENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("> 2024-01-14"))
        .stdout(predicate::str::contains("2024-01-15").not());
}

#[test]
fn test_config_file() {
    let dir = std::env::temp_dir().join(format!("agenda-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{"pivot": "2024-01-14", "mode": "dense", "upcoming_batch": 2, "past_batch": 1}"#)
        .unwrap();
    agenda()
        .arg("-")
        .arg("--config")
        .arg(&path)
        .write_stdin(EVENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-13"))
        .stdout(predicate::str::contains("2024-01-15"))
        .stdout(predicate::str::contains("2024-01-16").not());
}

// ============================================================
// Validation
// ============================================================

#[test]
fn test_check_valid() {
    agenda()
        .args(["-", "--check"])
        .write_stdin(EVENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 events valid"));
}

#[test]
fn test_check_invalid_rule_names_event() {
    agenda()
        .args(["-", "--check"])
        .write_stdin(r#"[{"id": "gym", "startDate": "2024-01-01", "recurring": "FREQ=HOURLY"}]"#)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("event 'gym'"));
}

#[test]
fn test_invalid_start_date() {
    agenda()
        .args(["-", "--check"])
        .write_stdin(r#"[{"id": "bad", "startDate": "2024-02-30"}]"#)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("event 'bad'"));
}

#[test]
fn test_zero_batch_rejected() {
    agenda()
        .args(["-", "--upcoming", "0"])
        .write_stdin(EVENTS)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("upcoming_batch"));
}

#[test]
fn test_no_events_is_usage_error() {
    agenda().assert().code(2);
}

#[test]
fn test_bad_pivot_is_usage_error() {
    agenda().args(["-", "--pivot", "tomorrow"]).assert().code(2);
}

// ============================================================
// Single rule
// ============================================================

#[test]
fn test_rrule_occurrences() {
    agenda()
        .args(["--rrule", "FREQ=YEARLY", "--start", "2024-02-29", "-n", "3"])
        .assert()
        .success()
        .stdout("2024-02-29\n2028-02-29\n2032-02-29\n");
}

#[test]
fn test_rrule_json() {
    agenda()
        .args(["--rrule", "FREQ=WEEKLY;COUNT=2", "--start", "2024-01-01", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"["2024-01-01","2024-01-08"]"#));
}

#[test]
fn test_rrule_error_is_underlined() {
    agenda()
        .args(["--rrule", "FREQ=HOURLY", "--start", "2024-01-01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsupported frequency"))
        .stderr(predicate::str::contains("^^^^^^"));
}

#[test]
fn test_rrule_requires_start() {
    agenda().args(["--rrule", "FREQ=DAILY"]).assert().code(2);
}
