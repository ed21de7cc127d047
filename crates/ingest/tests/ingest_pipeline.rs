use std::collections::HashMap;
use std::fs;

use flow_core::{DisplayName, EmptyCatalog};
use ingest::{
    IngestError, IngestOptions, SlotPolicy, UsageStore, aggregate_file, aggregate_lines,
    aggregate_reader,
};
use tempfile::tempdir;

const FLOW_LOG: &str = r#"
[276] 16/09/24 08:19:30 ../../src/cyber/flow/flow.c:1650:flow_tick() <debug>   tick
[276] 16/09/24 08:19:31 ../../src/cyber/flow/flow.c:1800:combine_and_send() <debug>   service id to send: {"ref_ts":1726489171,"bucket_size":60,"buckets":{"0":{"devices":{"192.168.1.185":{"services":{"215":{"rx":208,"tx":356},"91":{"rx":140008,"tx":345765}},"categories":{"1":{"rx":440238,"tx":549737}}}}}}}
[276] 16/09/24 08:20:01 ../../src/cyber/flow/flow.c:1650:flow_tick() <debug>   {"ref_ts":0}
[276] 16/09/24 08:20:31 ../../src/cyber/flow/flow.c:1800:combine_and_send() <debug>   service id to send: {"ref_ts":1726489231,"bucket_size":60,"buckets":{"0":{"devices":{"192.168.1.159":{"categories":{"1":{"rx":1843,"tx":554}}},"192.168.1.166":{"services":{"37":{"rx":1459,"tx":1956}}},"192.168.1.185":{"services":{"91":{"rx":10,"tx":5}},"categories":{"17":{"rx":100,"tx":200}}}}}}}
"#;

fn catalog() -> HashMap<u32, String> {
    HashMap::from([
        (37, "Netflix".to_string()),
        (91, "YouTube".to_string()),
    ])
}

#[test]
fn aggregates_flow_log_file() {
    let dir = tempdir().expect("temp dir");
    let log_path = dir.path().join("flow.logs");
    fs::write(&log_path, FLOW_LOG.trim()).expect("write log");

    let aggregation =
        aggregate_file(&log_path, &IngestOptions::default(), catalog()).expect("aggregate");
    let stats = &aggregation.stats;
    assert_eq!(stats.lines_read, 4);
    assert_eq!(stats.telemetry_lines, 2);
    assert_eq!(stats.buckets_applied, 2);
    assert_eq!(stats.slots_ignored, 0);
    assert_eq!(stats.first_ref_ts.as_deref(), Some("2024-09-16T12:19:31Z"));
    assert_eq!(stats.last_ref_ts.as_deref(), Some("2024-09-16T12:20:31Z"));

    let store = &aggregation.store;
    let ips: Vec<&str> = store.devices().iter().map(|d| d.ip.as_str()).collect();
    assert_eq!(
        ips,
        vec!["192.168.1.185", "192.168.1.159", "192.168.1.166"]
    );

    let device = store.get_device("192.168.1.185").expect("device");
    let youtube = device.get_service(91).expect("youtube");
    assert_eq!((youtube.tx(), youtube.rx()), (345765 + 5, 140008 + 10));
    assert_eq!(youtube.usage_minutes(), 2);
    assert_eq!(
        youtube.display_name(),
        &DisplayName::Service("YouTube".to_string())
    );
    let unknown = device.get_service(215).expect("unknown service");
    assert_eq!(unknown.display_name().to_string(), "Unknown service 215");
    assert_eq!(unknown.usage_minutes(), 1);
    let mixed = device.get_category(17).expect("category 17");
    assert_eq!(
        mixed.display_name(),
        &DisplayName::Categories(vec!["gambling".to_string(), "general".to_string()])
    );

    let netflix = store
        .get_device("192.168.1.166")
        .and_then(|device| device.get_service(37))
        .expect("netflix");
    assert_eq!((netflix.rx(), netflix.tx(), netflix.usage_minutes()), (1459, 1956, 1));
}

#[test]
fn malformed_payload_aborts_run() {
    let input = format!(
        "{}\n[276] flow.c:1800:combine_and_send() <debug> service id to send: {{\"ref_ts\":",
        FLOW_LOG.trim()
    );
    let mut store = UsageStore::new(EmptyCatalog);
    let err = aggregate_lines(&mut store, input.lines(), "combine_and_send")
        .expect_err("decode error");
    assert!(matches!(err, IngestError::Decode { line: 5, .. }));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().expect("temp dir");
    let result = aggregate_file(
        &dir.path().join("absent.log"),
        &IngestOptions::default(),
        EmptyCatalog,
    );
    assert!(matches!(result, Err(IngestError::Io(_))));
}

#[test]
fn custom_marker_and_all_slots() {
    let input = r#"
agent send_bucket {"ref_ts":10,"buckets":{"0":{"devices":{"10.0.0.1":{"services":{"1":{"rx":1,"tx":1}}}}},"1":{"devices":{"10.0.0.1":{"services":{"1":{"rx":4,"tx":4}}}}}}}
agent combine_and_send {"not":"used"}
"#;
    let options = IngestOptions {
        marker: "send_bucket".to_string(),
        slot_policy: SlotPolicy::All,
    };
    let aggregation =
        aggregate_reader(input.trim().as_bytes(), &options, EmptyCatalog).expect("aggregate");
    assert_eq!(aggregation.stats.telemetry_lines, 1);
    let service = aggregation
        .store
        .get_device("10.0.0.1")
        .and_then(|device| device.get_service(1))
        .expect("service");
    assert_eq!((service.tx(), service.rx(), service.usage_minutes()), (5, 5, 2));
}

#[test]
fn primary_slot_counts_ignored_slots() {
    let input = r#"combine_and_send {"buckets":{"0":{"devices":{}},"1":{"devices":{"10.0.0.1":{}}}}}"#;
    let aggregation = aggregate_reader(input.as_bytes(), &IngestOptions::default(), EmptyCatalog)
        .expect("aggregate");
    assert_eq!(aggregation.stats.slots_ignored, 1);
    assert!(aggregation.store.devices().is_empty());
}
