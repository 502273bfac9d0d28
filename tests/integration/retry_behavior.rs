//! Retry, backoff and timeout behavior through the full client stack

use super::test_utils::{client_with, ok, status, MockTransport};
use serde_json::json;
use sitequery::{QueryError, RetryPolicy};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_find_recovers_after_two_unavailable_responses() {
    let base = Duration::from_millis(100);
    let max = Duration::from_millis(150);
    let delays = Arc::new(Mutex::new(Vec::new()));
    let recorded = delays.clone();
    let policy = RetryPolicy::new(3, base, max).with_on_retry(move |err, attempt, delay| {
        assert_eq!(err.status(), Some(503));
        recorded.lock().unwrap().push((attempt, delay));
    });

    let mock = MockTransport::new(vec![
        status(503),
        status(503),
        ok(r#"{"status":"success","result":{"items":[{"a":1}],"pagination":{"total_items":1,"total_pages":1,"per_page":50,"current_page":0,"has_next_page":false,"has_prev_page":false}}}"#),
    ]);
    let found = client_with(mock.clone())
        .with_retry_policy(policy)
        .query("Posts")
        .unwrap()
        .find()
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(found.items, vec![json!({"a": 1})]);
    assert_eq!(
        *delays.lock().unwrap(),
        vec![(1, base), (2, std::cmp::min(base * 2, max))]
    );

    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[1].at - requests[0].at >= base);
    assert!(requests[2].at - requests[1].at >= max);
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhausted_surfaces_last_error() {
    let mock = MockTransport::new(vec![
        status(502),
        status(503),
        Err(QueryError::Network("connection refused".to_string())),
    ]);
    let err = client_with(mock.clone())
        .query("Posts")
        .unwrap()
        .find()
        .await
        .unwrap_err();

    assert_eq!(mock.call_count(), 3);
    assert!(matches!(err, QueryError::Network(msg) if msg == "connection refused"));
}

#[tokio::test(start_paused = true)]
async fn test_client_error_status_not_retried() {
    let mock = MockTransport::new(vec![status(400), status(400)]);
    let err = client_with(mock.clone())
        .query("Posts")
        .unwrap()
        .find()
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_and_request_timeout_are_retried() {
    let mock = MockTransport::new(vec![status(429), status(408)]);
    let result = client_with(mock.clone())
        .query("Posts")
        .unwrap()
        .find()
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy_per_query() {
    let mock = MockTransport::new(vec![status(503)]);
    let err = client_with(mock.clone())
        .query("Posts")
        .unwrap()
        .with_retry_policy(RetryPolicy::no_retry())
        .find()
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(mock.call_count(), 1);
}

struct SlowTransport;

#[async_trait::async_trait]
impl sitequery::HttpTransport for SlowTransport {
    async fn post_json(
        &self,
        _url: &str,
        _body: &serde_json::Value,
    ) -> Result<sitequery::HttpResponse, QueryError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(sitequery::HttpResponse::new(200, "{}"))
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_applies_per_attempt() {
    let err = sitequery::SiteClient::new("acme", "shop", "t1")
        .unwrap()
        .with_transport(Arc::new(SlowTransport))
        .with_retry_policy(RetryPolicy::new(2, Duration::from_millis(10), Duration::from_millis(10)))
        .query("Posts")
        .unwrap()
        .with_timeout(Duration::from_secs(2))
        .find()
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Timeout(d) if d == Duration::from_secs(2)));
}

struct HangingTransport;

#[async_trait::async_trait]
impl sitequery::HttpTransport for HangingTransport {
    async fn post_json(
        &self,
        _url: &str,
        _body: &serde_json::Value,
    ) -> Result<sitequery::HttpResponse, QueryError> {
        futures::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_attempts_always_end_at_client_deadline() {
    let query = sitequery::SiteClient::new("acme", "shop", "t1")
        .unwrap()
        .with_transport(Arc::new(HangingTransport))
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(10)))
        .with_timeout(Duration::from_secs(5))
        .query("Posts")
        .unwrap();

    let year = Duration::from_secs(365 * 24 * 3600);
    let outcome = tokio::time::timeout(year, query.find()).await;

    let err = outcome.expect("find should finish well within a year").unwrap_err();
    assert!(matches!(err, QueryError::Timeout(d) if d == Duration::from_secs(5)));
}
