//! Tests for decoder module

use super::*;
use crate::error::Error;
use crate::streams;
use serde_json::{json, Value};

// ============================================================================
// Body Parsing Tests
// ============================================================================

#[test]
fn test_parse_body() {
    let value = parse_body(r#"{"surveys": [], "next": null}"#).unwrap();
    assert!(value["surveys"].is_array());
}

#[test]
fn test_parse_body_not_json() {
    let err = parse_body("<html>502 Bad Gateway</html>").unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

// ============================================================================
// RecordExtractor Tests
// ============================================================================

#[test]
fn test_extract_in_order() {
    let extractor = RecordExtractor::new("$.answers[*]").unwrap();
    let body = json!({"answers": [{"id": 1}, {"id": 2}], "next": null});

    let records = extractor.extract(&body).unwrap();
    assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
}

#[test]
fn test_extract_empty_array() {
    let extractor = RecordExtractor::new("$.surveys[*]").unwrap();
    let records = extractor.extract(&json!({"surveys": []})).unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_extract_missing_container() {
    let extractor = RecordExtractor::new("$.surveys[*]").unwrap();
    let err = extractor
        .extract(&json!({"detail": "Not found."}))
        .unwrap_err();
    assert!(matches!(err, Error::RecordExtraction { ref path, .. } if path == "$.surveys[*]"));
    assert!(err.to_string().contains("no 'surveys' field"));
}

#[test]
fn test_extract_container_not_array() {
    let extractor = RecordExtractor::new("$.surveys[*]").unwrap();
    let err = extractor.extract(&json!({"surveys": null})).unwrap_err();
    assert!(err.to_string().contains("found null"));
}

#[test]
fn test_extract_nested_path() {
    let extractor = RecordExtractor::new("$.data.items[*]").unwrap();
    let body = json!({"data": {"items": [{"id": "a"}, {"id": "b"}, {"id": "c"}]}});

    let records = extractor.extract(&body).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2]["id"], "c");
}

#[test]
fn test_extract_every_resource_path() {
    for resource in streams::all() {
        let extractor = RecordExtractor::new(resource.records_path).unwrap();
        let mut body = serde_json::Map::new();
        body.insert(resource.name.to_string(), json!([{"id": 7}]));
        let body = Value::Object(body);
        let records = extractor.extract(&body).unwrap();
        assert_eq!(records, vec![json!({"id": 7})], "{}", resource.name);
    }
}

#[test]
fn test_extractor_invalid_path() {
    assert!(RecordExtractor::new("$.answers[").is_err());
}

// ============================================================================
// PostProcess Tests
// ============================================================================

#[test]
fn test_identity() {
    let record = json!({"id": 1, "anything": true});
    assert_eq!(Identity.process(record.clone()), Some(record));
}

#[test]
fn test_closure_post_process() {
    let drop_odd = |record: Value| {
        if record["id"].as_i64()? % 2 == 1 {
            None
        } else {
            Some(record)
        }
    };

    assert!(drop_odd.process(json!({"id": 1})).is_none());
    assert_eq!(drop_odd.process(json!({"id": 2})), Some(json!({"id": 2})));
}

#[test]
fn test_conform_to_schema() {
    let conform = ConformToSchema::new("surveys", streams::SURVEY_FIELDS, &["id"]);

    let record = conform
        .process(json!({"id": 1, "name": "CSAT", "metric": "csat", "brand": "x"}))
        .unwrap();
    assert_eq!(record, json!({"id": 1, "name": "CSAT", "metric": "csat"}));
}

#[test]
fn test_conform_skips_missing_key() {
    let conform = ConformToSchema::new("surveys", streams::SURVEY_FIELDS, &["id"]);

    assert!(conform.process(json!({"name": "no id"})).is_none());
    assert!(conform.process(json!({"id": null, "name": "null id"})).is_none());
    assert!(conform.process(json!("not an object")).is_none());
}
