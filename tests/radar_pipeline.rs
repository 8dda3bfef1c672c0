use crash_radar_lib::analysis::audit::Freshness;
use crash_radar_lib::core::history::CompositeHistory;
use crash_radar_lib::core::periods::PeriodWindow;
use crash_radar_lib::{open_radar, BootstrapConfig, Catalog};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn observations(start_year: i32, values: &[f64]) -> serde_json::Value {
    let obs: Vec<_> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "date": format!("{}-{:02}-01", start_year + (i / 12) as i32, i % 12 + 1),
                "value": format!("{:.2}", v),
            })
        })
        .collect();
    json!({ "last_updated": chrono::Utc::now().to_rfc3339(), "observations": obs })
}

fn write_json(value: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(value.to_string().as_bytes()).expect("write");
    file
}

fn cache_json() -> serde_json::Value {
    let m2: Vec<f64> = (0..25).map(|i| 100.0 - i as f64 * 0.2).collect();
    let claims: Vec<f64> = (0..8).map(|i| 220_000.0 + i as f64 * 10_000.0).collect();
    json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "series": {
            "T10Y3M": observations(2022, &[1.0, 0.6, 0.1, -0.3, -0.8]),
            "BAMLH0A0HYM2": observations(2022, &[3.5, 4.2, 5.1, 6.0]),
            "M2SL": observations(2022, &m2),
            "ICSA": observations(2024, &claims),
            "SAHMREALTIME": {
                "observations": [
                    {"date": "2024-01-01", "value": "0.30"},
                    {"date": "2024-02-01", "value": "."}
                ]
            }
        }
    })
}

#[tokio::test]
async fn scores_from_cache_and_manual_files() {
    let cache = write_json(&cache_json());
    let manual = write_json(&json!({ "LEI": -5.0, "BUFFETT": 195.0, "SHILLER_PE": null }));

    let catalog = Arc::new(Catalog::builtin());
    let radar = open_radar(catalog, cache.path(), Some(manual.path())).await.unwrap();

    let (macro_values, valuation_values) = radar.current_values();
    assert_eq!(macro_values.get("YIELD_CURVE"), Some(&-0.8));
    // 4-week average of the last four weeks, in thousands
    assert!((macro_values["INITIAL_CLAIMS"] - 275.0).abs() < 1e-9);
    // "." tail dropped, the last real reading stands
    assert_eq!(macro_values.get("SAHM_RULE"), Some(&0.3));
    assert!(macro_values["M2_GROWTH"] < 0.0);
    assert_eq!(valuation_values.len(), 1);

    let snap = radar.snapshot(Some(BootstrapConfig { rounds: 64, seed: 11 }));
    let score = snap.composite.score.unwrap();
    assert!((0.0..=100.0).contains(&score));
    let total: f64 = snap.contributions.iter().map(|c| c.points).sum();
    assert!((total - score).abs() < 1e-6);

    assert_eq!(snap.audit.freshness, Freshness::Fresh);
    assert!(!snap.alert.stale_cache);
    assert!(snap.audit.missing.valuation.contains(&"SHILLER_PE".to_string()));
    assert!(snap.labor_stress.is_some());

    let band = snap.bootstrap.unwrap();
    assert!(band.p5 <= band.p95);

    let encoded = serde_json::to_value(&snap).unwrap();
    assert!(encoded["composite"]["score"].is_number());
}

#[tokio::test]
async fn history_for_every_provider_indicator() {
    let cache = write_json(&cache_json());
    let radar = Arc::new(open_radar(Arc::new(Catalog::builtin()), cache.path(), None).await.unwrap());

    let mut handles = Vec::new();
    for key in radar.history_keys() {
        let radar = Arc::clone(&radar);
        handles.push(tokio::task::spawn_blocking(move || radar.indicator_history(&key, PeriodWindow::TwelveMonths)));
    }
    let mut histories = Vec::new();
    for handle in handles {
        histories.extend(handle.await.unwrap());
    }
    assert_eq!(histories.len(), 9);

    let m2 = histories.iter().find(|h| h.key == "M2_GROWTH").unwrap();
    // 25 monthly points yield 13 YoY readings, the last 12 months keep 13
    assert_eq!(m2.series.len(), 13);
    assert!(m2.stats.is_some());

    let permits = histories.iter().find(|h| h.key == "BUILDING_PERMITS").unwrap();
    assert!(permits.series.is_empty());
    assert!(permits.stats.is_none());
}

#[tokio::test]
async fn missing_cache_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let err = open_radar(Arc::new(Catalog::builtin()), &missing, None).await.unwrap_err();
    assert!(err.to_string().contains("failed to read provider cache"));
}

#[test]
fn composite_history_feeds_stats() {
    let mut history = CompositeHistory::new();
    let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    for month in 0..13u32 {
        let date = start.checked_add_months(chrono::Months::new(month)).unwrap();
        history.record(date, 40.0 + month as f64);
    }
    let series = history.to_series();
    let stats = crash_radar_lib::analysis::compute_stats(&series).unwrap();
    assert_eq!(stats.current, 52.0);
    assert!((stats.change_pct.m12.unwrap() - 30.0).abs() < 1e-9);
}
