//! Integration tests for which token reaches the upstream API.
//!
//! The service token belongs to background feeds and readiness checks;
//! user requests carry only the user's own token.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use sellapp_integration_tests::TestContext;

const SERVICE_TOKEN: &str = "svc_Q8r3Zt6mW1xN";

#[tokio::test]
async fn test_anonymous_request_goes_upstream_without_token() {
    let ctx = TestContext::with_service_token(SERVICE_TOKEN).await;

    let (status, _) = ctx.get_json("/api/customers").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.api.authorizations_for("/api/customers"), vec![None]);
}

#[tokio::test]
async fn test_session_token_is_forwarded() {
    let ctx = TestContext::with_service_token(SERVICE_TOKEN).await;

    let (status, _) = ctx
        .post_json("/session/token", &json!({"token": "staff_tok_41"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    ctx.get_json("/api/customers").await;

    assert_eq!(
        ctx.api.authorizations_for("/api/customers"),
        vec![Some("Bearer staff_tok_41".to_string())]
    );
}

#[tokio::test]
async fn test_header_token_wins_over_session() {
    let ctx = TestContext::with_service_token(SERVICE_TOKEN).await;
    ctx.post_json("/session/token", &json!({"token": "staff_tok_41"}))
        .await;

    ctx.client
        .get(ctx.url("/api/customers"))
        .bearer_auth("header_tok_7")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(
        ctx.api.authorizations_for("/api/customers"),
        vec![Some("Bearer header_tok_7".to_string())]
    );
}

#[tokio::test]
async fn test_anonymous_quick_stats_are_fetched_with_no_token() {
    let ctx = TestContext::with_service_token(SERVICE_TOKEN).await;

    let (status, _) = ctx.get_json("/api/pos/quick-stats").await;
    assert_eq!(status, StatusCode::OK);

    let seen = ctx.api.authorizations_for("/api/pos/quick-stats");
    assert!(seen.contains(&None), "quick-stats calls: {seen:?}");
    assert!(
        seen.iter()
            .flatten()
            .all(|auth| auth == &format!("Bearer {SERVICE_TOKEN}")),
        "only the feed may use the service token: {seen:?}"
    );
}

#[tokio::test]
async fn test_anonymous_sale_is_not_sent_with_service_token() {
    let ctx = TestContext::with_service_token(SERVICE_TOKEN).await;

    ctx.post_json("/pos/cart/add", &json!({"product_id": 3}))
        .await;
    ctx.post_json("/api/pos", &json!({})).await;

    assert_eq!(ctx.api.authorizations_for("/api/pos"), vec![None]);
    assert!(
        ctx.api
            .authorizations_for("/api/pos/products")
            .iter()
            .all(Option::is_none)
    );
}

#[tokio::test]
async fn test_readiness_uses_service_token() {
    let ctx = TestContext::with_service_token(SERVICE_TOKEN).await;

    let response = ctx
        .client
        .get(ctx.url("/health/ready"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(
        ctx.api.authorizations_for("/api/pos/products"),
        vec![Some(format!("Bearer {SERVICE_TOKEN}"))]
    );
}
