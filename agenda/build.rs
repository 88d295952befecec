/// Build script: generates individual `#[test]` functions from
/// tests/data/recurrence.json so each vector appears separately in
/// `cargo test` output.
use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

const SECTIONS: [(&str, &str); 4] = [
    ("occurrences", "run_occurrences"),
    ("previous", "run_previous"),
    ("parse", "run_parse_roundtrip"),
    ("parse_errors", "run_parse_error"),
];

fn main() {
    let data_path = Path::new("tests/data/recurrence.json");
    println!("cargo:rerun-if-changed={}", data_path.display());

    let data_str =
        fs::read_to_string(data_path).expect("failed to read tests/data/recurrence.json");
    let data: serde_json::Value =
        serde_json::from_str(&data_str).expect("invalid JSON in recurrence vectors");

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest = Path::new(&out_dir).join("recurrence_tests.rs");
    let mut f = fs::File::create(&dest).unwrap();

    for (section, runner) in SECTIONS {
        for (i, case) in iter_tests(&data[section]).enumerate() {
            let name = test_name(case, i);
            emit(&mut f, &format!("{section}_{name}"), runner, i);
        }
    }
}

fn iter_tests(section: &serde_json::Value) -> impl Iterator<Item = &serde_json::Value> {
    section["tests"]
        .as_array()
        .expect("section missing 'tests' array")
        .iter()
}

fn test_name(case: &serde_json::Value, index: usize) -> String {
    let raw = case["name"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| format!("case_{index}"));
    sanitize(&raw)
}

fn sanitize(name: &str) -> String {
    let mut result = String::new();
    let mut prev_underscore = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            prev_underscore = false;
        } else if !prev_underscore {
            result.push('_');
            prev_underscore = true;
        }
    }
    result.trim_matches('_').to_string()
}

fn emit(f: &mut fs::File, fn_name: &str, runner: &str, index: usize) {
    writeln!(f, "#[test]").unwrap();
    writeln!(f, "fn {fn_name}() {{ {runner}({index}); }}").unwrap();
}
