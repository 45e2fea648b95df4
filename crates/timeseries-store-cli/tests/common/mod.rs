use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

const CATALOG: &str = r#"{
  "series": {
    "temp": { "partition": "site-a", "key": "t1", "unit": "DegreeCelsius" },
    "temp-clean": { "partition": "site-a", "key": "t1", "variant": "clean", "unit": "DegreeCelsius" },
    "a": { "partition": "site-a", "key": "a" },
    "b": { "partition": "site-b", "key": "b" }
  }
}"#;

/// Writes `service.json` and `catalog.json` into `tmp`; the store lives in `tmp/data`.
pub fn write_config(tmp: &TempDir) -> TestResult<PathBuf> {
    std::fs::write(tmp.path().join("catalog.json"), CATALOG)?;
    let config = tmp.path().join("service.json");
    std::fs::write(
        &config,
        r#"{ "storage": { "root": "data" }, "catalog": "catalog.json" }"#,
    )?;
    Ok(config)
}

pub fn write_records(path: &Path, records: &[(&str, f64)]) -> TestResult {
    let json: Vec<_> = records
        .iter()
        .map(|(ts, value)| serde_json::json!({ "timestamp": ts, "value": value, "quality": 1.0 }))
        .collect();
    std::fs::write(path, serde_json::to_vec(&json)?)?;
    Ok(())
}

pub fn hourly(day: &str, values: &[f64]) -> Vec<(String, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(h, v)| (format!("{day}T{h:02}:00:00"), *v))
        .collect()
}

pub fn as_refs(records: &[(String, f64)]) -> Vec<(&str, f64)> {
    records.iter().map(|(ts, v)| (ts.as_str(), *v)).collect()
}
