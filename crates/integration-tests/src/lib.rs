//! Integration test harness for SellApp.
//!
//! Each test starts two servers on ephemeral ports:
//!
//! - a fake POS API ([`FakeApi`]) that keeps its records in memory and
//!   answers with the same `{success, data|error}` envelopes as the real one
//! - the real application router pointed at it
//!
//! and drives the application with a cookie-keeping `reqwest` client, so
//! the session cart survives between requests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sellapp-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use reqwest::Client;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use sellapp_web::config::WebConfig;
use sellapp_web::state::AppState;

/// Records held by the fake API.
#[derive(Debug, Default)]
pub struct FakeData {
    pub products: Vec<Value>,
    pub customers: Vec<Value>,
    pub sales: Vec<Value>,
    pub swaps: Vec<Value>,
    /// When set, `POST /api/pos` answers `{success: false, error}`.
    pub sale_error: Option<String>,
    /// `(path, Authorization header)` of every request received.
    pub authorizations: Vec<(String, Option<String>)>,
    next_id: i64,
}

impl FakeData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        1000 + self.next_id
    }
}

/// Shared handle to the fake API's records.
#[derive(Debug, Clone, Default)]
pub struct FakeApi {
    data: Arc<Mutex<FakeData>>,
}

impl FakeApi {
    /// A fake API stocked with a few phones and customers.
    #[must_use]
    pub fn seeded() -> Self {
        let api = Self::default();
        {
            let mut data = api.lock();
            data.products = vec![
                json!({"id": 1, "name": "Galaxy A15", "brand": "Samsung", "category": "Phones", "price": "1800.00", "stock": 5}),
                json!({"id": 2, "name": "iPhone 13", "brand": "Apple", "category": "Phones", "price": "5200.00", "stock": 2}),
                json!({"id": 3, "name": "USB-C Charger", "brand": "Anker", "category": "Accessories", "price": "120.50", "stock": 40}),
            ];
            data.customers = vec![
                json!({"id": 11, "name": "Ama Mensah", "phone": "+233 (20) 123-4567"}),
                json!({"id": 12, "name": "Kwame Boateng", "phone": "233201234567"}),
                json!({"id": 13, "name": "Efua Owusu", "phone": "0244000000"}),
            ];
        }
        api
    }

    /// Authorization headers received on `path`, in arrival order.
    #[must_use]
    pub fn authorizations_for(&self, path: &str) -> Vec<Option<String>> {
        self.lock()
            .authorizations
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, auth)| auth.clone())
            .collect()
    }

    /// Lock the records for inspection or setup.
    pub fn lock(&self) -> MutexGuard<'_, FakeData> {
        self.data.lock().expect("fake API lock poisoned")
    }

    /// The fake API's routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/pos/products", get(fake_products))
            .route("/api/pos/quick-stats", get(fake_quick_stats))
            .route("/api/pos", post(fake_complete_sale))
            .route("/api/pos/sales/{id}", get(fake_get_sale))
            .route("/api/customers", get(fake_customers).post(fake_create_customer))
            .route("/api/customers/search", get(fake_search_customers))
            .route(
                "/api/customers/{id}",
                get(fake_get_customer).delete(fake_delete_customer),
            )
            .route("/api/swaps", post(fake_create_swap))
            .layer(middleware::from_fn_with_state(self.clone(), record_authorization))
            .with_state(self.clone())
    }
}

async fn record_authorization(State(api): State<FakeApi>, request: Request, next: Next) -> Response {
    let auth = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    api.lock()
        .authorizations
        .push((request.uri().path().to_string(), auth));
    next.run(request).await
}

async fn fake_products(State(api): State<FakeApi>) -> Json<Value> {
    Json(json!({"success": true, "products": api.lock().products.clone()}))
}

async fn fake_quick_stats(State(api): State<FakeApi>) -> Json<Value> {
    let data = api.lock();
    Json(json!({
        "success": true,
        "data": {
            "today_sales_count": data.sales.len(),
            "today_revenue": "0.00",
            "low_stock_count": 0,
            "pending_repairs": 0
        }
    }))
}

async fn fake_complete_sale(State(api): State<FakeApi>, Json(sale): Json<Value>) -> Json<Value> {
    let mut data = api.lock();
    if let Some(error) = data.sale_error.clone() {
        return Json(json!({"success": false, "error": error}));
    }

    for line in sale["items"].as_array().cloned().unwrap_or_default() {
        let sold = line["quantity"].as_i64().unwrap_or(0);
        if let Some(product) = data
            .products
            .iter_mut()
            .find(|p| p["id"] == line["product_id"])
        {
            let stock = product["stock"].as_i64().unwrap_or(0);
            product["stock"] = json!(stock - sold);
        }
    }

    let id = data.next_id();
    let mut record = sale;
    record["id"] = json!(id);
    data.sales.push(record.clone());
    Json(json!({"success": true, "data": record}))
}

async fn fake_get_sale(State(api): State<FakeApi>, Path(id): Path<i64>) -> Response {
    let data = api.lock();
    match data.sales.iter().find(|s| s["id"] == json!(id)) {
        Some(sale) => Json(json!({"success": true, "sale": sale})).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"success": false, "error": "Sale not found"})))
            .into_response(),
    }
}

async fn fake_customers(State(api): State<FakeApi>) -> Json<Value> {
    Json(json!({"success": true, "data": api.lock().customers.clone()}))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn fake_search_customers(
    State(api): State<FakeApi>,
    Query(params): Query<SearchParams>,
) -> Json<Value> {
    let needle = params.q.to_lowercase();
    let found: Vec<Value> = api
        .lock()
        .customers
        .iter()
        .filter(|c| {
            c["name"]
                .as_str()
                .is_some_and(|n| n.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();
    Json(json!({"success": true, "customers": found}))
}

async fn fake_create_customer(State(api): State<FakeApi>, Json(input): Json<Value>) -> Json<Value> {
    let mut data = api.lock();
    let id = data.next_id();
    let mut customer = input;
    customer["id"] = json!(id);
    data.customers.push(customer.clone());
    Json(json!({"success": true, "customer": customer}))
}

async fn fake_get_customer(State(api): State<FakeApi>, Path(id): Path<i64>) -> Response {
    let data = api.lock();
    match data.customers.iter().find(|c| c["id"] == json!(id)) {
        Some(customer) => Json(json!({"success": true, "customer": customer})).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn fake_delete_customer(State(api): State<FakeApi>, Path(id): Path<i64>) -> Json<Value> {
    api.lock().customers.retain(|c| c["id"] != json!(id));
    Json(json!({"success": true}))
}

async fn fake_create_swap(State(api): State<FakeApi>, Json(swap): Json<Value>) -> Json<Value> {
    let mut data = api.lock();
    let id = data.next_id();
    let mut record = swap;
    record["id"] = json!(id);
    data.swaps.push(record.clone());
    Json(json!({"success": true, "data": record}))
}

/// Serve a router on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}

/// A running application wired to a fake API.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub api: FakeApi,
    pub state: AppState,
}

impl TestContext {
    /// Start a seeded fake API and the application in front of it.
    pub async fn new() -> Self {
        let api = FakeApi::seeded();
        let api_addr = serve(api.router()).await;
        let api_url = Url::parse(&format!("http://{api_addr}/")).expect("Invalid fake API URL");
        Self::with_api_url(api, api_url).await
    }

    /// Start a seeded fake API and an application configured with a
    /// service token.
    pub async fn with_service_token(token: &str) -> Self {
        let api = FakeApi::seeded();
        let api_addr = serve(api.router()).await;
        let api_url = Url::parse(&format!("http://{api_addr}/")).expect("Invalid fake API URL");
        let mut config = WebConfig::local(api_url);
        config.api.service_token = Some(SecretString::from(token.to_string()));
        Self::with_config(api, config).await
    }

    /// Start the application against an arbitrary API URL.
    pub async fn with_api_url(api: FakeApi, api_url: Url) -> Self {
        Self::with_config(api, WebConfig::local(api_url)).await
    }

    async fn with_config(api: FakeApi, config: WebConfig) -> Self {
        let state = AppState::new(config).expect("Failed to create application state");
        let app_addr = serve(sellapp_web::app(state.clone())).await;

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{app_addr}"),
            api,
            state,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a JSON endpoint, returning status and body.
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed");
        let status = StatusCode::from_u16(response.status().as_u16()).expect("Invalid status");
        (status, response.json().await.expect("Response is not JSON"))
    }

    /// POST a JSON body, returning status and body.
    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed");
        let status = StatusCode::from_u16(response.status().as_u16()).expect("Invalid status");
        (status, response.json().await.expect("Response is not JSON"))
    }
}
