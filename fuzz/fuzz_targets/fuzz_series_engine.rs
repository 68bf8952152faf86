#![no_main]

use fuzzcov_adapters_json::parse_record;
use fuzzcov_domain::build_series;
use fuzzcov_types::Mode;
use libfuzzer_sys::fuzz_target;

// Inputs are split on NUL bytes into separate record documents.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let runs: Vec<_> = text
        .split('\0')
        .enumerate()
        .filter_map(|(i, doc)| parse_record(doc, &format!("run{i}.json")).ok())
        .collect();
    if runs.is_empty() {
        return;
    }

    let averaged = build_series(&runs, Mode::Average).expect("valid runs always average");
    assert_eq!(averaged.len(), 1);
    let series = &averaged[0].series;
    assert!(series.values().iter().all(|v| (0.0..=100.0).contains(v)));
    assert!(series.times().windows(2).all(|w| w[0] < w[1]));

    let per_run = build_series(&runs, Mode::PerRun).expect("valid runs always extract");
    assert_eq!(per_run.len(), runs.len());
});
