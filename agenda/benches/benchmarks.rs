use std::sync::Arc;

use agenda::{pull, Agenda, AgendaConfig, DateRuleIndex, Event, Mode, Recurrence, SectionGenerator, Weekday};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jiff::civil::{date, Date};

fn pivot() -> Date {
    date(2026, 2, 6)
}

fn calendar() -> Vec<Event> {
    let rules = [
        "FREQ=DAILY;INTERVAL=3",
        "FREQ=WEEKLY;BYDAY=MO,WE,FR",
        "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH",
        "FREQ=MONTHLY;BYDAY=1FR",
        "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1",
        "FREQ=YEARLY;BYMONTH=11;BYDAY=4TH",
        "FREQ=YEARLY",
    ];
    let mut events: Vec<Event> = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            Event::new(format!("r{i}"), format!("Rule {i}"), "2020-01-02")
                .with_start_time(format!("{:02}:00", 8 + i))
                .with_recurrence(rule.parse().unwrap())
        })
        .collect();
    events.extend((0..50).map(|i| {
        let day = date(2025, 1, 1).checked_add(jiff::Span::new().days(i * 17)).unwrap();
        Event::new(format!("o{i}"), format!("One-off {i}"), day.to_string())
    }));
    events
}

// ---------------------------------------------------------------------------
// Parse benchmarks
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("simple", |b| {
        b.iter(|| Recurrence::parse(black_box("FREQ=DAILY")).unwrap());
    });

    group.bench_function("complex", |b| {
        b.iter(|| {
            Recurrence::parse(black_box(
                "RRULE:FREQ=YEARLY;INTERVAL=4;BYMONTH=11;BYDAY=TU;BYMONTHDAY=2,3,4,5,6,7,8;WKST=SU",
            ))
            .unwrap()
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Matcher benchmarks
// ---------------------------------------------------------------------------

fn bench_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher");
    let start = date(2020, 1, 2);

    for (name, rule) in [
        ("weekly", "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH"),
        ("monthly_setpos", "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1"),
        ("yearly", "FREQ=YEARLY;BYMONTH=11;BYDAY=4TH"),
    ] {
        let compiled = Recurrence::parse(rule)
            .unwrap()
            .compile(start, Weekday::Monday)
            .unwrap();
        group.bench_function(format!("{name}_next"), |b| {
            b.iter(|| compiled.next_on_or_after(black_box(pivot())));
        });
        group.bench_function(format!("{name}_previous"), |b| {
            b.iter(|| compiled.previous_on_or_before(black_box(pivot())));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Index and generator benchmarks
// ---------------------------------------------------------------------------

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");
    let index = Arc::new(DateRuleIndex::new(calendar(), Weekday::Monday).unwrap());

    group.bench_function("build", |b| {
        b.iter(|| DateRuleIndex::new(black_box(calendar()), Weekday::Monday).unwrap());
    });

    group.bench_function("next_occupied", |b| {
        b.iter(|| index.next_occupied_date(black_box(pivot()), false));
    });

    group.bench_function("pull_30_upcoming", |b| {
        b.iter(|| {
            let mut gen = SectionGenerator::upcoming(Arc::clone(&index), pivot());
            pull(&mut gen, black_box(30))
        });
    });

    group.bench_function("pull_30_past_dense", |b| {
        b.iter(|| {
            let mut gen = SectionGenerator::past(Arc::clone(&index), pivot()).with_mode(Mode::Dense);
            pull(&mut gen, black_box(30))
        });
    });

    group.bench_function("agenda_initial_load", |b| {
        b.iter(|| {
            let mut agenda = Agenda::new(calendar(), AgendaConfig::new(pivot())).unwrap();
            agenda.load_initial()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_matcher, bench_index);
criterion_main!(benches);
