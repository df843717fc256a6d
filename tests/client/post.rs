//! Posting and round trips through queries.

use crate::common::*;
use esmeta::{
    ClientConfig, EngineKind, MetadataClient, PostOptions, QueryBuilder, TIME_RECORDED_FIELD,
};
use serde_json::json;

#[test]
fn test_post_then_fetch_round_trip() {
    let t = TestClient::new("job_metadata");
    let original = record(json!({
        "job_id": 20,
        "host_id": 1,
        "time_start": 100000,
        "dut": "chromeos1-row1-rack1-host1",
    }));
    assert!(t.client.post("job_time_breakdown", &original, &PostOptions::new()));

    let result = t
        .client
        .query(QueryBuilder::new().equal("job_id", 20))
        .unwrap()
        .unwrap();
    assert_eq!(result.total, 1);

    let mut fetched = result.hits[0].clone();
    let stamped = fetched
        .remove(TIME_RECORDED_FIELD)
        .and_then(|v| v.as_f64())
        .unwrap();
    assert!(stamped > 0.0);
    assert_eq!(fetched, original);

    let typed = t
        .client
        .query(QueryBuilder::new().equal("_type", "job_time_breakdown"))
        .unwrap()
        .unwrap();
    assert_eq!(typed.total, 1);
}

#[test]
fn test_type_field_in_record_wins() {
    let t = TestClient::new("m");
    let input = record(json!({"_type": "host_history", "hostname": "h1"}));
    assert!(t.client.post("ignored", &input, &PostOptions::new()));

    assert_eq!(t.engine.doc_types("m"), vec!["host_history"]);
    assert!(!t.engine.documents("m")[0].contains_key("_type"));
    // the caller's record is untouched
    assert_eq!(input["_type"], json!("host_history"));
}

#[test]
fn test_empty_inputs_do_not_touch_the_engine() {
    let t = TestClient::new("m");
    assert!(t.client.post("job", &record(json!({})), &PostOptions::new()));
    assert!(t.client.bulk_post(&[], &PostOptions::new()));
    assert_eq!(t.engine.calls(), esmeta::CallCounts::default());
}

#[test]
fn test_bulk_post_round_trip() {
    let t = TestClient::new("m");
    let records: Vec<_> = (0..25)
        .map(|i| record(json!({"job_id": i, "suite": "bvt"})))
        .collect();
    assert!(t
        .client
        .bulk_post(&records, &PostOptions::new().field("builder", "eve-release")));
    assert_eq!(t.engine.calls().bulk, 1);

    let result = t
        .client
        .query(QueryBuilder::new().equal("builder", "eve-release").batch("job_id", [3, 4, 99]))
        .unwrap()
        .unwrap();
    assert_eq!(result.total, 2);
    assert!(result
        .hits
        .iter()
        .all(|h| h.contains_key(TIME_RECORDED_FIELD) && h["suite"] == json!("bvt")));
}

#[test]
fn test_failures_are_reported_as_false() {
    let t = TestClient::new("m");
    t.engine.fail_with(Some("engine unavailable"));
    assert!(!t.client.post("job", &record(json!({"a": 1})), &PostOptions::new()));
    assert!(!t.client.bulk_post(&[record(json!({"a": 1}))], &PostOptions::new()));
}

#[test]
fn test_noop_engine_from_config() {
    let client = MetadataClient::connect(ClientConfig::default().with_engine(EngineKind::Noop));
    assert!(client.post("job", &record(json!({"a": 1})), &PostOptions::new()));
    assert!(client.bulk_post(&[record(json!({"a": 1}))], &PostOptions::new()));
    assert!(client
        .query(QueryBuilder::new().equal("a", 1))
        .unwrap()
        .is_none());
}
