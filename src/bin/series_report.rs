use chainview::data::{analyze_series, parse_ndjson, payload_sha256};
use serde_json::json;
use std::env;
use std::fs;

fn main() {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "data/series/btc_usd.jsonl".to_string());

    let payload = match fs::read_to_string(&path) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("failed to read {}: {}", path, err);
            std::process::exit(1);
        }
    };

    let points = match parse_ndjson(&path, &payload) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    let report = analyze_series(&path, &points, &payload_sha256(&payload));
    let out = json!({ "report": report });
    match serde_json::to_string_pretty(&out) {
        Ok(text) => println!("{}", text),
        Err(err) => {
            eprintln!("failed to encode report: {}", err);
            std::process::exit(1);
        }
    }

    if points.is_empty() {
        std::process::exit(2);
    }
}
