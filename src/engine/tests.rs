//! Tests for engine module

use super::*;
use crate::http::HttpClientConfig;
use crate::streams::{ANSWERS, QUESTIONS, RESPONSES, SURVEYS};
use crate::types::BackoffType;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(server: &MockServer, config: TapConfig) -> SyncEngine {
    let http = HttpClientConfig::builder()
        .max_retries(1)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(5),
            Duration::from_millis(20),
        )
        .no_rate_limit()
        .build();
    SyncEngine::new(HttpClient::with_config(http).unwrap(), server.uri(), config)
}

async fn drain(mut rx: mpsc::Receiver<Message>) -> Vec<Message> {
    let mut messages = Vec::new();
    while let Some(message) = rx.recv().await {
        messages.push(message);
    }
    messages
}

fn records(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { record, .. } => Some(record.clone()),
            Message::Schema { .. } => None,
        })
        .collect()
}

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_schema_wire_shape() {
    let msg = Message::schema("surveys", json!({"type": "object"}), &["id"]);
    assert!(msg.is_schema());
    assert_eq!(msg.stream(), "surveys");
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({
            "type": "SCHEMA",
            "stream": "surveys",
            "schema": {"type": "object"},
            "key_properties": ["id"]
        })
    );
}

#[test]
fn test_message_record_wire_shape() {
    let extracted = chrono::DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let msg = Message::record("answers", json!({"id": 3}), extracted);
    assert!(msg.is_record());

    let line = msg.to_json_line().unwrap();
    assert!(!line.contains('\n'));
    let value: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["type"], "RECORD");
    assert_eq!(value["stream"], "answers");
    assert_eq!(value["record"], json!({"id": 3}));
    assert_eq!(value["time_extracted"], "2024-05-01T12:00:00Z");
}

// ============================================================================
// SyncConfig / SyncReport Tests
// ============================================================================

#[test]
fn test_sync_config_default() {
    let config = SyncConfig::default();
    assert_eq!(config.concurrency, 1);
    assert_eq!(config.max_pages, None);
    assert_eq!(SyncConfig::new().with_concurrency(0).concurrency, 1);
    assert_eq!(config.channel_capacity, 1024);
}

#[test]
fn test_sync_report_into_result() {
    let ok = StreamOutcome::finished("surveys", SyncStats::default(), 1, &Ok(()));
    let failed = StreamOutcome::finished(
        "answers",
        SyncStats::default(),
        1,
        &Err(Error::http_status(500, "boom")),
    );
    let cancelled = StreamOutcome::finished(
        "responses",
        SyncStats::default(),
        1,
        &Err(Error::Cancelled {
            stream: "responses".into(),
        }),
    );
    assert_eq!(cancelled.status, StreamStatus::Cancelled);

    let report = SyncReport {
        outcomes: vec![failed, ok.clone(), cancelled],
        duration_ms: 3,
    };
    assert!(!report.is_success());
    assert_eq!(report.failed_streams(), vec!["answers", "responses"]);
    assert!(report.summary_table().contains("FAILED"));

    let err = report.into_result().unwrap_err();
    assert_eq!(err.to_string(), "Sync failed for streams: answers, responses");

    let report = SyncReport {
        outcomes: vec![ok],
        duration_ms: 1,
    };
    assert!(report.into_result().is_ok());
}

// ============================================================================
// Single Stream Tests
// ============================================================================

#[tokio::test]
async fn test_sync_stream_single_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "surveys": [
                {"id": 1, "name": "CSAT", "metric": "csat", "brand_name": "Acme"},
                {"id": 2, "name": "NPS", "metric": "nps"}
            ],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok"));
    let (tx, rx) = mpsc::channel(16);
    let stats = engine.sync_stream(&SURVEYS, &tx).await.unwrap();
    drop(tx);
    let messages = drain(rx).await;

    assert_eq!(stats.records, 2);
    assert_eq!(stats.pages, 1);
    assert!(messages[0].is_schema());
    assert_eq!(
        records(&messages),
        vec![
            json!({"id": 1, "name": "CSAT", "metric": "csat"}),
            json!({"id": 2, "name": "NPS", "metric": "nps"})
        ]
    );
}

#[tokio::test]
async fn test_sync_stream_follows_next_in_order() {
    let server = MockServer::start().await;
    let next = format!("{}/questions?page=2&page_size=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "questions": [{"id": 3}],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("page_size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "questions": [{"id": 1}, {"id": 2}],
            "next": next
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok").with_page_size(2));
    let (tx, rx) = mpsc::channel(16);
    let stats = engine.sync_stream(&QUESTIONS, &tx).await.unwrap();
    drop(tx);

    let ids: Vec<Value> = records(&drain(rx).await)
        .into_iter()
        .map(|r| r["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    assert_eq!(stats.pages, 2);
}

#[tokio::test]
async fn test_sync_stream_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/answers/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answers": [], "next": null})))
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok"));
    let (tx, rx) = mpsc::channel(16);
    let stats = engine.sync_stream(&ANSWERS, &tx).await.unwrap();
    drop(tx);

    let messages = drain(rx).await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_schema());
    assert_eq!(stats.records, 0);
}

#[tokio::test]
async fn test_sync_stream_skips_records_without_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "surveys": [{"id": 1}, {"name": "orphan"}, {"id": null}, {"id": 4}]
        })))
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok"));
    let (tx, rx) = mpsc::channel(16);
    let stats = engine.sync_stream(&SURVEYS, &tx).await.unwrap();
    drop(tx);

    assert_eq!(stats.records, 2);
    assert_eq!(stats.skipped, 2);
    assert_eq!(records(&drain(rx).await).len(), 2);
}

#[tokio::test]
async fn test_sync_stream_custom_post_process() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "surveys": [{"id": 1}, {"id": 2}, {"id": 3}]
        })))
        .mount(&server)
        .await;

    let only_odd = |record: Value| (record["id"].as_i64()? % 2 == 1).then_some(record);
    let engine = engine(&server, TapConfig::new("tok")).with_post_process(Arc::new(only_odd));
    let (tx, rx) = mpsc::channel(16);
    let stats = engine.sync_stream(&SURVEYS, &tx).await.unwrap();
    drop(tx);

    assert_eq!(stats.skipped, 1);
    assert_eq!(records(&drain(rx).await), vec![json!({"id": 1}), json!({"id": 3})]);
}

#[tokio::test]
async fn test_sync_stream_page_cap() {
    let server = MockServer::start().await;
    let next = format!("{}/surveys?page=2", server.uri());

    // Endless chain: every page points at another one
    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "surveys": [{"id": 1}],
            "next": next
        })))
        .expect(3)
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok"))
        .with_sync_config(SyncConfig::new().with_max_pages(Some(3)));
    let (tx, _rx) = mpsc::channel(16);
    let err = engine.sync_stream(&SURVEYS, &tx).await.unwrap_err();

    assert!(matches!(err, Error::PageLimitExceeded { max_pages: 3, .. }));
}

#[tokio::test]
async fn test_sync_stream_cancelled_before_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"surveys": []})))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok"));
    engine.cancellation_token().cancel();

    let (tx, _rx) = mpsc::channel(16);
    let err = engine.sync_stream(&SURVEYS, &tx).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_sync_stream_cancelled_between_pages() {
    let server = MockServer::start().await;
    let next = format!("{}/surveys?page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "surveys": [{"id": 1}],
            "next": next
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let cancel_on_record = {
        let token = token.clone();
        move |record: Value| {
            token.cancel();
            Some(record)
        }
    };
    let engine = engine(&server, TapConfig::new("tok"))
        .with_cancellation(token)
        .with_post_process(Arc::new(cancel_on_record));

    let (tx, rx) = mpsc::channel(16);
    let err = engine.sync_stream(&SURVEYS, &tx).await.unwrap_err();
    drop(tx);

    assert!(err.is_cancelled());
    assert_eq!(records(&drain(rx).await).len(), 1);
}

#[tokio::test]
async fn test_sync_stream_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "oops"})))
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok"));
    let (tx, _rx) = mpsc::channel(16);
    let err = engine.sync_stream(&SURVEYS, &tx).await.unwrap_err();
    assert!(matches!(err, Error::RecordExtraction { .. }));
}

#[tokio::test]
async fn test_sync_stream_follows_relative_next() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/answers/search"))
        .and(query_param("cursor", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answers": [{"id": 2}],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/answers/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answers": [{"id": 1}],
            "next": "?cursor=abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok"));
    let (tx, rx) = mpsc::channel(16);
    let stats = engine.sync_stream(&ANSWERS, &tx).await.unwrap();
    drop(tx);

    assert_eq!(stats.pages, 2);
    assert_eq!(records(&drain(rx).await), vec![json!({"id": 1}), json!({"id": 2})]);
}

#[tokio::test]
async fn test_sync_stream_bad_next_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "surveys": [{"id": 1}],
            "next": "http://[::1/surveys?page=2"
        })))
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok"));
    let (tx, _rx) = mpsc::channel(16);
    let err = engine.sync_stream(&SURVEYS, &tx).await.unwrap_err();
    assert!(matches!(err, Error::InvalidCursor { .. }));
}

// ============================================================================
// Multi-Stream Tests
// ============================================================================

#[tokio::test]
async fn test_sync_all_failure_isolated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses/search"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"surveys": [{"id": 9}]})))
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("tok"))
        .with_sync_config(SyncConfig::new().with_concurrency(2));
    let (tx, rx) = mpsc::channel(16);
    let report = engine.sync_all(&[&RESPONSES, &SURVEYS], tx).await;
    let messages = drain(rx).await;

    assert_eq!(report.outcomes[0].stream, "responses");
    assert_eq!(report.outcomes[0].status, StreamStatus::Failed);
    assert_eq!(report.outcomes[1].status, StreamStatus::Succeeded);
    assert_eq!(report.failed_streams(), vec!["responses"]);
    assert_eq!(records(&messages), vec![json!({"id": 9})]);
}

#[tokio::test]
async fn test_sync_all_auth_failure_cancels_run() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/answers/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"surveys": []})))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine(&server, TapConfig::new("bad"));
    let (tx, _rx) = mpsc::channel(16);
    let report = engine.sync_all(&[&ANSWERS, &SURVEYS], tx).await;

    assert!(engine.cancellation_token().is_cancelled());
    assert_eq!(report.outcome("answers").unwrap().status, StreamStatus::Failed);
    assert_eq!(report.outcome("surveys").unwrap().status, StreamStatus::Cancelled);
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_sync_all_closed_channel_fails_streams() {
    let server = MockServer::start().await;

    let engine = engine(&server, TapConfig::new("tok"));
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let report = engine.sync_all(&[&SURVEYS], tx).await;

    assert_eq!(report.outcomes[0].status, StreamStatus::Failed);
    assert!(report.outcomes[0]
        .error
        .as_deref()
        .unwrap()
        .contains("channel closed"));
}
