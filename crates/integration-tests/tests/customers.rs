//! Integration tests for customer management.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use sellapp_integration_tests::TestContext;

#[tokio::test]
async fn test_list_returns_api_customers() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get_json("/api/customers").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_passes_query_through() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get_json("/api/customers/search?q=ama").await;

    assert_eq!(status, StatusCode::OK);
    let found = body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Ama Mensah");
}

#[tokio::test]
async fn test_create_validates_before_calling_api() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post_json("/api/customers", &json!({"name": "  ", "phone": "0200000000"}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(ctx.api.lock().customers.len(), 3);
}

#[tokio::test]
async fn test_create_then_delete() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post_json(
            "/api/customers",
            &json!({"name": "Yaw Darko", "phone": "0277000000"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(ctx.api.lock().customers.len(), 4);

    let response = ctx
        .client
        .delete(ctx.url(&format!("/api/customers/{id}")))
        .send()
        .await
        .expect("Request failed");
    assert!(response.status().is_success());
    assert_eq!(ctx.api.lock().customers.len(), 3);
}

#[tokio::test]
async fn test_duplicates_match_normalized_phones() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post_json(
            "/api/customers/duplicates",
            &json!({"rows": [
                {"id": "11", "phone": "+233 (20) 123-4567"},
                {"id": "12", "phone": "233201234567"},
                {"id": "13", "phone": "0244000000"},
                {"id": "14"}
            ]}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let marks = body["data"].as_array().unwrap();
    assert_eq!(marks.len(), 4);
    assert_eq!(marks[0]["duplicate"], true);
    assert_eq!(marks[0]["occurrences"], 2);
    assert_eq!(marks[1]["duplicate"], true);
    assert_eq!(marks[2]["duplicate"], false);
    assert_eq!(marks[3]["duplicate"], false);
}

#[tokio::test]
async fn test_customer_page_flags_duplicates() {
    let ctx = TestContext::new().await;

    let html = ctx
        .client
        .get(ctx.url("/dashboard/customers"))
        .send()
        .await
        .expect("Request failed")
        .text()
        .await
        .expect("Failed to read body");

    assert!(html.contains("Ama Mensah"));
    assert!(html.contains("duplicate-badge\">Duplicate"));
    assert!(html.contains("class=\"customer-row duplicate\""));
    assert!(html.contains("id=\"duplicate-summary\">"));
}

#[tokio::test]
async fn test_duplicate_summary_is_present_but_hidden_without_duplicates() {
    let ctx = TestContext::new().await;
    ctx.api.lock().customers.retain(|c| c["id"] != 12);

    let html = ctx
        .client
        .get(ctx.url("/dashboard/customers"))
        .send()
        .await
        .expect("Request failed")
        .text()
        .await
        .expect("Failed to read body");

    assert!(html.contains("id=\"duplicate-summary\" hidden>"));
    assert!(!html.contains("customer-row duplicate"));
}
