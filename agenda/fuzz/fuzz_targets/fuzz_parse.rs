#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parsing never panics; valid rules must also compile and evaluate.
        if let Ok(rule) = agenda::Recurrence::parse(s) {
            let start = jiff::civil::date(2024, 1, 31);
            if let Ok(compiled) = rule.compile(start, agenda::Weekday::Monday) {
                let _ = compiled.occurrences(start).take(4).count();
                let _ = compiled.previous_on_or_before(jiff::civil::date(2030, 6, 15));
            }
        }
    }
});
