//! Query composition through the public API.

use esmeta::{Constraint, Error, QueryBuilder, SortOrder, DEFAULT_RESULT_SIZE};
use serde_json::{json, Value};

fn must(body: &Value) -> &Vec<Value> {
    body["query"]["bool"]["must"].as_array().unwrap()
}

#[test]
fn test_equality_plus_range_with_size() {
    let doc = QueryBuilder::new()
        .equal("host_id", 5)
        .between("time_recorded", 100, 200)
        .size(20)
        .compose()
        .unwrap();
    let body = doc.to_json();

    assert_eq!(must(&body).len(), 2);
    assert_eq!(body["size"], json!(20));
    assert!(body.get("sort").is_none());
}

#[test]
fn test_full_document_shape() {
    let doc = QueryBuilder::new()
        .equal("_type", "host_history")
        .equal("hostname", "172.22.169.106")
        .between("time_recorded", 1405628341.904379, 1405700341.904379)
        .fields(["time_recorded", "hostname", "status", "dbg_str"])
        .sort("time_recorded", SortOrder::Asc)
        .size(20)
        .compose()
        .unwrap();

    assert_eq!(
        doc.to_json(),
        json!({
            "fields": ["time_recorded", "hostname", "status", "dbg_str"],
            "query": {
                "bool": {
                    "must": [
                        {"term": {"_type": "host_history"}},
                        {"term": {"hostname": "172.22.169.106"}},
                        {"range": {"time_recorded": {
                            "gte": 1405628341.904379,
                            "lte": 1405700341.904379
                        }}}
                    ]
                }
            },
            "size": 20,
            "sort": [{"time_recorded": "asc"}]
        })
    );
}

#[test]
fn test_batch_and_regex_clauses() {
    let doc = QueryBuilder::new()
        .equal("board", "eve")
        .batch("job_id", [10, 11, 12, 13])
        .regex("hostname", ".*row1.*")
        .compose()
        .unwrap();
    let body = doc.to_json();
    let clauses = must(&body);
    assert_eq!(clauses.len(), 3);
    assert_eq!(clauses[1], json!({"terms": {"job_id": [10, 11, 12, 13]}}));
    assert_eq!(clauses[2], json!({"regexp": {"hostname": ".*row1.*"}}));
    assert_eq!(body["size"], json!(DEFAULT_RESULT_SIZE));
}

#[test]
fn test_regex_and_batch_alone_fail_validation() {
    let result = QueryBuilder::new()
        .constraint(Constraint::Regex("hostname".into(), ".*".into()))
        .constraint(Constraint::Batch("job_id".into(), vec![json!(1)]))
        .compose();
    assert!(matches!(result, Err(Error::InvalidQuery(_))));
}

#[test]
fn test_both_bounds_absent_contributes_nothing() {
    let doc = QueryBuilder::new()
        .equal("host_id", 1)
        .constraint(Constraint::Range("time_recorded".into(), None, None))
        .compose()
        .unwrap();
    assert_eq!(must(&doc.to_json()).len(), 1);
}

#[test]
fn test_sort_order_is_preserved() {
    let doc = QueryBuilder::new()
        .equal("host_id", 1)
        .sort("hostname", SortOrder::Asc)
        .sort("time_recorded", SortOrder::Desc)
        .sort("job_id", SortOrder::Asc)
        .compose()
        .unwrap();
    assert_eq!(
        doc.to_json()["sort"],
        json!([{"hostname": "asc"}, {"time_recorded": "desc"}, {"job_id": "asc"}])
    );
}
