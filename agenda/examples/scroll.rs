//! An agenda scrolled in both directions from a pivot date.

use agenda::{Agenda, AgendaConfig, Event, Mode};
use jiff::civil::date;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let events = vec![
        Event::new("standup", "Standup", "2024-01-01")
            .with_start_time("09:30")
            .with_end_time("09:45")
            .with_recurrence("FREQ=WEEKLY;BYDAY=MO,WE,FR".parse()?),
        Event::new("review", "Monthly review", "2024-01-05")
            .with_start_time("15:00")
            .with_recurrence("FREQ=MONTHLY;BYDAY=1FR".parse()?),
        Event::new("holiday", "Company holiday", "2024-01-19"),
    ];

    let config = AgendaConfig::new(date(2024, 1, 14))
        .with_past_batch(3)
        .with_upcoming_batch(5);
    let mut agenda = Agenda::new(events.clone(), config.clone())?;
    agenda.load_initial();
    print(&agenda);

    println!("\n-- scrolled further into the past --");
    agenda.load_more_past();
    print(&agenda);

    println!("\n-- dense mode --");
    let mut dense = Agenda::new(events, config.with_mode(Mode::Dense))?;
    dense.load_initial();
    print(&dense);

    Ok(())
}

fn print(agenda: &Agenda) {
    let pivot = agenda.pivot_position();
    for (i, section) in agenda.sections().iter().enumerate() {
        let marker = if Some(i) == pivot { ">" } else { " " };
        println!("{marker} {section}");
        for event in &section.events {
            let time = event.start_time.as_deref().unwrap_or("all day");
            println!("      {time:>7}  {}", event.title);
        }
    }
    println!(
        "  more past: {}, more upcoming: {}",
        agenda.has_more_past(),
        agenda.has_more_upcoming()
    );
}
