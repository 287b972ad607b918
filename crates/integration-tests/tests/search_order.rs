//! Integration tests for stale search responses.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::Value;

use sellapp_integration_tests::TestContext;

async fn search(ctx: &TestContext, seq: u64, page: &str) -> Value {
    let (status, body) = ctx
        .get_json(&format!("/api/customers/search?q=a&seq={seq}&page={page}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_older_number_on_the_same_page_is_superseded() {
    let ctx = TestContext::new().await;

    search(&ctx, 3, "page-one").await;
    let stale = search(&ctx, 2, "page-one").await;

    assert_eq!(stale["superseded"], true);
    assert!(stale["data"].is_null());
}

#[tokio::test]
async fn test_reloaded_page_starts_a_fresh_sequence() {
    let ctx = TestContext::new().await;

    for seq in 1..=5 {
        search(&ctx, seq, "page-before-reload").await;
    }
    let after_reload = search(&ctx, 1, "page-after-reload").await;

    assert!(after_reload.get("superseded").is_none(), "body: {after_reload}");
    assert!(after_reload["data"].is_array());
}

#[tokio::test]
async fn test_huge_sequence_number_does_not_break_later_searches() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .get_json("/api/pos/products?seq=18446744073709551615")
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.get_json("/api/pos/products").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["products"].is_array(), "body: {body}");
}
