//! Tests for the HTTP summary store.

use counsel::bridge::{HttpSummaryStore, SaveOutcome, SummaryKey, SummaryStore};
use counsel::util::RetryPolicy;
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn key() -> SummaryKey {
    SummaryKey::new("clerk-7", "project-3", "financial_projection")
}

fn store(server: &MockServer) -> HttpSummaryStore {
    HttpSummaryStore::new(&format!("{}/api/v1/chats", server.uri()))
        .unwrap()
        .with_retry(RetryPolicy::none())
}

#[tokio::test]
async fn fetch_reads_content_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/chats/clerk-7/project-3/financial_projection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "Needs $80k seed funding."
        })))
        .mount(&server)
        .await;

    assert_eq!(
        store(&server).fetch(&key()).await.as_deref(),
        Some("Needs $80k seed funding.")
    );
}

#[tokio::test]
async fn fetch_failure_means_no_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    assert_eq!(store(&server).fetch(&key()).await, None);
}

#[tokio::test]
async fn fetch_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "content": "ok" })))
        .mount(&server)
        .await;

    let store = HttpSummaryStore::new(&server.uri()).unwrap().with_retry(RetryPolicy {
        max_attempts: 2,
        initial_backoff: std::time::Duration::from_millis(1),
        ..RetryPolicy::default()
    });
    assert_eq!(store.fetch(&key()).await.as_deref(), Some("ok"));
}

#[tokio::test]
async fn push_puts_content_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/chats/save-type-summary/clerk-7/project-3/financial_projection"))
        .and(body_json(serde_json::json!({ "content": "Break-even in 18 months." })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = store(&server).push(&key(), "Break-even in 18 months.").await;
    assert_eq!(outcome, SaveOutcome::Saved);
}

#[tokio::test]
async fn push_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&server)
        .await;

    match store(&server).push(&key(), "x").await {
        SaveOutcome::Failed { reason } => assert!(reason.contains("db down")),
        SaveOutcome::Saved => panic!("push should fail"),
    }
}

#[tokio::test]
async fn round_trip_is_byte_identical() {
    let server = MockServer::start().await;
    let text = "Café owner; targets \"remote workers\"\nwith 3 locations.";

    Mock::given(method("PUT"))
        .respond_with(|request: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            ResponseTemplate::new(200).set_body_json(body)
        })
        .mount(&server)
        .await;

    let store = store(&server);
    assert!(store.push(&key(), text).await.is_saved());

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let stored = body["content"].as_str().unwrap().to_string();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "content": stored })))
        .mount(&server)
        .await;
    assert_eq!(store.fetch(&key()).await.as_deref(), Some(text));
}
