//! Basic agenda API walkthrough: parse a rule, query it, display it.

use agenda::{Recurrence, Weekday};
use jiff::civil::date;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse an RRULE
    let rule: Recurrence = "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1".parse()?;
    println!("Parsed: {rule}");

    // Anchor it at a start date
    let start = date(2024, 1, 31);
    let compiled = rule.compile(start, Weekday::Monday)?;

    println!("\nFirst 6 occurrences:");
    for d in compiled.occurrences(start).take(6) {
        println!("  {d}");
    }

    // Nearest occurrences around a date
    let from = date(2024, 4, 15);
    println!("\nAround {from}:");
    println!("  previous: {:?}", compiled.previous_on_or_before(from));
    println!("  next:     {:?}", compiled.next_on_or_after(from));
    println!("  matches {from}: {}", compiled.occurs_on(from));

    // Errors point at the offending part
    if let Err(e) = Recurrence::parse("FREQ=WEEKLY;BYDAY=MO,XX") {
        println!("\n{}", e.display_rich());
    }

    // Display roundtrips through parsing
    let roundtripped: Recurrence = rule.to_string().parse()?;
    assert_eq!(rule, roundtripped);
    println!("\nRoundtrip: {roundtripped}");

    Ok(())
}
