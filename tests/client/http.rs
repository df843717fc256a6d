//! The HTTP engine against a mock engine server.

use crate::common::*;
use esmeta::{
    BulkAction, EngineError, Error, HttpEngine, PostOptions, QueryBuilder, SearchEngine,
    SortOrder, TIME_RECORDED_FIELD,
};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(total: u64, sources: &[Value], scroll_id: Option<&str>) -> Value {
    let hits: Vec<Value> = sources
        .iter()
        .map(|s| json!({"_index": "m", "_type": "job", "_source": s}))
        .collect();
    let mut reply = json!({"hits": {"total": total, "hits": hits}});
    if let Some(id) = scroll_id {
        reply["_scroll_id"] = json!(id);
    }
    reply
}

async fn mount_index(server: &MockServer, index: &str) {
    Mock::given(method("HEAD"))
        .and(path(format!("/{}", index)))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_index_exists_maps_status() {
    let server = MockServer::start().await;
    mount_index(&server, "present").await;

    // unmatched requests get wiremock's 404
    let engine = HttpEngine::new(&server.uri(), Duration::from_secs(5));
    let (present, absent) =
        blocking(move || (engine.index_exists("present"), engine.index_exists("absent"))).await;

    assert!(present.unwrap());
    assert!(!absent.unwrap());
    assert_eq!(
        request_lines(&server).await,
        vec!["HEAD /present", "HEAD /absent"]
    );
}

#[tokio::test]
async fn test_missing_index_over_http_returns_none() {
    let server = MockServer::start().await;
    let client = http_client(&server, "m");

    let result = blocking(move || client.query(QueryBuilder::new().equal("job_id", 1))).await;
    assert!(result.unwrap().is_none());
    assert_eq!(request_lines(&server).await, vec!["HEAD /m"]);
}

#[tokio::test]
async fn test_index_removed_before_search_returns_none() {
    let server = MockServer::start().await;
    mount_index(&server, "m").await;
    Mock::given(method("POST"))
        .and(path("/m/_search"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "index_not_found_exception", "index": "m"},
            "status": 404
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = http_client(&server, "m");

    let result = blocking(move || client.query(QueryBuilder::new().equal("job_id", 1))).await;
    assert!(result.unwrap().is_none());
}

#[tokio::test]
async fn test_truncated_search_falls_back_to_scroll() {
    let server = MockServer::start().await;
    mount_index(&server, "m").await;
    Mock::given(method("POST"))
        .and(path("/m/_search"))
        .and(query_param("scroll", "1m"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(3, &[json!({"t": 2}), json!({"t": 3})], Some("s1"))),
        )
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    // first page and the size-1 recount both report 3 matches
    Mock::given(method("POST"))
        .and(path("/m/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(3, &[json!({"t": 9})], None)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(3, &[json!({"t": 1})], Some("s1"))),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(3, &[], Some("s1"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/_search/scroll/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"succeeded": true})))
        .expect(1)
        .mount(&server)
        .await;
    let client = http_client(&server, "m");

    let result = blocking(move || {
        client.query(QueryBuilder::new().at_least("t", 0).sort("t", SortOrder::Asc))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(result.total, 3);
    let ts: Vec<Value> = result.hits.iter().map(|h| h["t"].clone()).collect();
    assert_eq!(ts, vec![json!(1), json!(2), json!(3)]);

    assert_eq!(
        request_lines(&server).await,
        vec![
            "HEAD /m",
            "POST /m/_search",
            "POST /m/_search",
            "POST /m/_search?scroll=1m",
            "POST /_search/scroll",
            "POST /_search/scroll",
            "DELETE /_search/scroll/s1",
        ]
    );

    let bodies: Vec<Value> = requests(&server)
        .await
        .iter()
        .skip(1)
        .take(4)
        .map(|r| r.body_json().unwrap())
        .collect();
    assert_eq!(bodies[0]["size"], json!(10_000));
    assert_eq!(bodies[1]["size"], json!(1));
    assert_eq!(bodies[2]["size"], json!(50_000));
    assert_eq!(bodies[2]["sort"], json!(["_doc"]));
    assert_eq!(bodies[3], json!({"scroll": "1m", "scroll_id": "s1"}));
}

#[tokio::test]
async fn test_server_error_surfaces_as_status() {
    let server = MockServer::start().await;
    mount_index(&server, "m").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("{\"error\":\"boom\"}"))
        .mount(&server)
        .await;
    let client = http_client(&server, "m");

    let err = blocking(move || client.query(QueryBuilder::new().equal("job_id", 1)))
        .await
        .unwrap_err();
    match err {
        Error::Engine(EngineError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_post_goes_to_index_and_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/m/job"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"result": "created"})))
        .expect(1)
        .mount(&server)
        .await;
    let client = http_client(&server, "m");

    let posted = blocking(move || {
        client.post("job", &record(json!({"job_id": 7})), &PostOptions::new())
    })
    .await;
    assert!(posted);

    let body: Value = requests(&server).await[0].body_json().unwrap();
    assert_eq!(body["job_id"], json!(7));
    assert!(body[TIME_RECORDED_FIELD].is_number());
}

#[tokio::test]
async fn test_post_encodes_type_in_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"result": "created"})))
        .mount(&server)
        .await;
    let client = http_client(&server, "m");

    let posted = blocking(move || {
        client.post("host history/v2", &record(json!({"a": 1})), &PostOptions::new())
    })
    .await;
    assert!(posted);
    assert_eq!(
        request_lines(&server).await,
        vec!["POST /m/host%20history%2Fv2"]
    );
}

#[tokio::test]
async fn test_post_failure_status_is_false() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "mapping"})))
        .mount(&server)
        .await;
    let client = http_client(&server, "m");

    let posted = blocking(move || {
        client.post("job", &record(json!({"job_id": 7})), &PostOptions::new())
    })
    .await;
    assert!(!posted);
}

#[tokio::test]
async fn test_bulk_request_is_ndjson() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": false, "items": []})))
        .expect(1)
        .mount(&server)
        .await;
    let client = http_client(&server, "m");

    let records = vec![
        record(json!({"job_id": 1, "_type": "job"})),
        record(json!({"job_id": 2, "_id": "fixed"})),
    ];
    let posted =
        blocking(move || client.bulk_post(&records, &PostOptions::new().without_timestamp())).await;
    assert!(posted);

    let received = requests(&server).await;
    let body = String::from_utf8(received[0].body.clone()).unwrap();
    let lines: Vec<Value> = body
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            json!({"index": {"_index": "m", "_type": "job"}}),
            json!({"job_id": 1}),
            json!({"index": {"_index": "m", "_type": "metadata", "_id": "fixed"}}),
            json!({"job_id": 2}),
        ]
    );
}

#[tokio::test]
async fn test_bulk_item_errors_are_false() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": true,
            "items": [{"index": {"status": 400, "error": {"reason": "bad"}}}]
        })))
        .mount(&server)
        .await;
    let client = http_client(&server, "m");
    let engine = HttpEngine::new(&server.uri(), Duration::from_secs(5));

    let (posted, direct) = blocking(move || {
        let posted = client.bulk_post(&[record(json!({"a": 1}))], &PostOptions::new());
        let action = BulkAction::from_record(record(json!({"a": 1})), "m");
        (posted, engine.bulk(&[action]))
    })
    .await;
    assert!(!posted);
    assert!(matches!(direct, Err(EngineError::Bulk(_))));
}
