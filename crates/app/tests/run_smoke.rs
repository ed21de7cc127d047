use std::fs;

use flow_app::{AppConfig, AppError, AppState, CatalogSource, OutputFormat, ReportOptions};
use ingest::{IngestError, IngestOptions};
use tempfile::tempdir;

const FLOW_LOG: &str = r#"
[276] 16/09/24 08:19:31 ../../src/cyber/flow/flow.c:1800:combine_and_send() <debug>   service id to send: {"ref_ts":1726489171,"bucket_size":60,"buckets":{"0":{"devices":{"192.168.1.166":{"services":{"37":{"rx":1459,"tx":1956}}}}}}}
[276] 16/09/24 08:19:40 ../../src/cyber/flow/flow.c:1650:flow_tick() <debug>   idle
[276] 16/09/24 08:20:31 ../../src/cyber/flow/flow.c:1800:combine_and_send() <debug>   service id to send: {"ref_ts":1726489231,"bucket_size":60,"buckets":{"0":{"devices":{"192.168.1.166":{"services":{"37":{"rx":41,"tx":44}},"categories":{"1025":{"rx":10,"tx":20}}}}}}}
"#;

const CATALOG: &str = r#"{"services":[{"id":37,"display_name":"Netflix"}]}"#;

fn state(dir: &std::path::Path, format: OutputFormat) -> AppState {
    let log_file_path = dir.join("flow.logs");
    let catalog_path = dir.join("classification_defs_ext.json");
    fs::write(&log_file_path, FLOW_LOG.trim()).expect("write log");
    fs::write(&catalog_path, CATALOG).expect("write catalog");
    AppState::new(AppConfig {
        log_file_path,
        catalog: CatalogSource::Local(catalog_path),
        ingest: IngestOptions::default(),
        report: ReportOptions {
            format,
            ..ReportOptions::default()
        },
    })
}

#[test]
fn run_writes_json_report() {
    let dir = tempdir().expect("temp dir");
    let app_state = state(dir.path(), OutputFormat::Json);
    let mut out = Vec::new();
    let stats = app_state.run(&mut out).expect("run");
    assert_eq!(stats.buckets_applied, 2);
    assert_eq!(stats.lines_read, 3);

    let value: serde_json::Value = serde_json::from_slice(&out).expect("json report");
    let device = &value["192.168.1.166"];
    assert_eq!(device["services"][0]["display_name"], "Netflix");
    assert_eq!(device["services"][0]["rx"], 1500);
    assert_eq!(device["services"][0]["tx"], 2000);
    assert_eq!(device["services"][0]["usage_minutes"], 2);
    assert_eq!(
        device["categories"][0]["display_name"],
        serde_json::json!(["media streaming", "general"])
    );
}

#[test]
fn run_writes_tables_and_charts() {
    let dir = tempdir().expect("temp dir");
    let app_state = state(dir.path(), OutputFormat::Table);
    let mut out = Vec::new();
    app_state.run(&mut out).expect("run");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("Device: 192.168.1.166"));
    assert!(text.contains("| 37 | Netflix "));
    assert!(text.contains("Services - 192.168.1.166"));
    assert!(text.contains("Categories - 192.168.1.166"));
}

#[test]
fn missing_log_file_is_fatal() {
    let dir = tempdir().expect("temp dir");
    let mut app_state = state(dir.path(), OutputFormat::Json);
    app_state.config.log_file_path = dir.path().join("absent.logs");
    let err = app_state.run(&mut Vec::new()).expect_err("missing file");
    assert!(matches!(err, AppError::Ingest(IngestError::Io(_))));
}
