//! Integration tests for upstream failures and health checks.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use tokio::net::TcpListener;
use url::Url;

use sellapp_integration_tests::{FakeApi, TestContext};

/// A URL on a local port nothing is listening on.
async fn closed_port_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No address");
    drop(listener);
    Url::parse(&format!("http://{addr}/")).expect("Invalid URL")
}

#[tokio::test]
async fn test_unreachable_api_is_bad_gateway_with_friendly_text() {
    let ctx = TestContext::with_api_url(FakeApi::default(), closed_port_url().await).await;

    let (status, body) = ctx.get_json("/api/customers").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"],
        "Unable to reach the server. Check your connection and try again."
    );
}

#[tokio::test]
async fn test_readiness_follows_the_api() {
    let up = TestContext::new().await;
    let response = up
        .client
        .get(up.url("/health/ready"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);

    let down = TestContext::with_api_url(FakeApi::default(), closed_port_url().await).await;
    let response = down
        .client
        .get(down.url("/health/ready"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 503);
}

#[tokio::test]
async fn test_missing_upstream_record_is_not_found() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get_json("/api/customers/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "The requested record was not found.");
}

#[tokio::test]
async fn test_unknown_export_type_is_rejected_before_the_api() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get_json("/api/analytics/export/docx").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported export type 'docx'");
    assert!(ctx.api.authorizations_for("/api/analytics/export/docx").is_empty());
}
