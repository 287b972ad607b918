//! Point-of-sale page, product search, quick stats, sale completion and
//! receipts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use sellapp_core::catalog::{Facets, ListQuery, SortOrder};
use sellapp_core::envelope::Envelope;
use sellapp_core::models::{PaymentMethod, Product, QuickStats, SaleRequest};
use sellapp_core::{CustomerId, Money, ProductId, SaleId};

use crate::error::AppError;
use crate::feeds::Snapshot;
use crate::filters;
use crate::middleware::ApiCredentials;
use crate::routes::cart::{CartView, load_cart, save_cart};
use crate::routes::{
    LenientMoney, PageContext, SearchOrder, Sequenced, feed_or_fetch, ok, sequenced,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/pos", get(pos_page))
        .route("/pos/receipt/{id}", get(receipt_page))
        .route("/api/pos", post(complete_sale))
        .route("/api/pos/products", get(products))
        .route("/api/pos/quick-stats", get(quick_stats))
}

// =============================================================================
// View Types
// =============================================================================

/// Product card data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: Money,
    pub price_display: String,
    pub stock: u32,
    pub in_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone().unwrap_or_default(),
            category: product.category.clone().unwrap_or_default(),
            price: product.price,
            price_display: product.price.display(),
            stock: product.stock,
            in_stock: product.in_stock(),
        }
    }
}

/// Header numbers.
#[derive(Debug, Clone)]
pub struct QuickStatsView {
    pub sales_count: u64,
    pub revenue: String,
    pub low_stock_count: u64,
    pub pending_repairs: u64,
}

impl From<&QuickStats> for QuickStatsView {
    fn from(stats: &QuickStats) -> Self {
        Self {
            sales_count: stats.today_sales_count,
            revenue: stats.today_revenue.display(),
            low_stock_count: stats.low_stock_count,
            pending_repairs: stats.pending_repairs,
        }
    }
}

/// A `<select>` option.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    fn sort_options(current: SortOrder) -> Vec<Self> {
        SortOrder::ALL
            .into_iter()
            .map(|order| Self {
                value: order.as_str().to_string(),
                label: order.label().to_string(),
                selected: order == current,
            })
            .collect()
    }

    /// "All" followed by each facet value.
    pub(crate) fn facet_options(values: &[String], current: Option<&str>) -> Vec<Self> {
        std::iter::once(Self {
            value: String::new(),
            label: "All".to_string(),
            selected: current.is_none(),
        })
        .chain(values.iter().map(|v| Self {
            value: v.clone(),
            label: v.clone(),
            selected: current.is_some_and(|c| c.eq_ignore_ascii_case(v)),
        }))
        .collect()
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "pos/index.html")]
pub struct PosTemplate {
    pub page: PageContext,
    pub products: Vec<ProductView>,
    pub search: String,
    pub categories: Vec<SelectOption>,
    pub brands: Vec<SelectOption>,
    pub sort_options: Vec<SelectOption>,
    pub cart: CartView,
    pub stats: Option<QuickStatsView>,
    pub quick_stats_poll_secs: u64,
}

/// One line on a receipt.
#[derive(Debug, Clone)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: u64,
    pub price: String,
    pub total: String,
}

/// Receipt data read leniently from the API's sale record.
#[derive(Debug, Clone, Default)]
pub struct ReceiptView {
    pub sale_id: String,
    pub created_at: String,
    pub customer_name: String,
    pub payment_method: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: String,
    pub discount: String,
    pub total: String,
    pub amount_paid: Option<String>,
    pub change_due: Option<String>,
}

fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn money(value: &Value, key: &str) -> Option<Money> {
    text(value, key).map(|raw| Money::parse_lenient(&raw))
}

impl ReceiptView {
    /// Build from a sale record. Missing fields render as blanks; totals
    /// fall back to the sum of the lines.
    #[must_use]
    pub fn from_sale(sale_id: SaleId, sale: &Value) -> Self {
        let items = sale
            .get("items")
            .or_else(|| sale.get("lines"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut line_sum = Money::ZERO;
        let lines = items
            .iter()
            .map(|item| {
                let quantity = item.get("quantity").and_then(Value::as_u64).unwrap_or(1);
                let price = money(item, "price").unwrap_or_default();
                let total = money(item, "total")
                    .unwrap_or_else(|| price * u32::try_from(quantity).unwrap_or(u32::MAX));
                line_sum += total;
                ReceiptLine {
                    name: text(item, "name")
                        .or_else(|| text(item, "product_name"))
                        .unwrap_or_else(|| "Item".to_string()),
                    quantity,
                    price: price.display(),
                    total: total.display(),
                }
            })
            .collect();

        let subtotal = money(sale, "subtotal").unwrap_or(line_sum);
        let discount = money(sale, "discount").unwrap_or_default();
        let total = money(sale, "total").unwrap_or_else(|| (subtotal - discount).non_negative());
        let amount_paid = money(sale, "amount_paid");

        Self {
            sale_id: text(sale, "id").unwrap_or_else(|| sale_id.to_string()),
            created_at: text(sale, "created_at").unwrap_or_default(),
            customer_name: text(sale, "customer_name")
                .or_else(|| sale.get("customer").and_then(|c| text(c, "name")))
                .unwrap_or_else(|| "Walk-in customer".to_string()),
            payment_method: text(sale, "payment_method")
                .unwrap_or_default()
                .replace('_', " "),
            lines,
            subtotal: subtotal.display(),
            discount: discount.display(),
            total: total.display(),
            amount_paid: amount_paid.map(|m| m.display()),
            change_due: amount_paid.map(|paid| (paid - total).non_negative().display()),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "pos/receipt.html")]
pub struct ReceiptTemplate {
    pub page: PageContext,
    pub receipt: Option<ReceiptView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Filter parameters for the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductParams {
    #[serde(default, alias = "search")]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    /// Client sequence number for stale-response detection.
    #[serde(default)]
    pub seq: Option<u64>,
    /// Page load the sequence number belongs to.
    #[serde(default)]
    pub page: Option<String>,
}

impl ProductParams {
    fn order(&self) -> SearchOrder<'_> {
        SearchOrder {
            seq: self.seq,
            page: self.page.as_deref(),
        }
    }

    fn list_query(&self) -> ListQuery {
        ListQuery::from_params(
            self.q.as_deref(),
            self.category.as_deref(),
            self.brand.as_deref(),
            self.sort.as_deref(),
        )
    }
}

/// Filtered products with the facets of the unfiltered list.
#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<ProductView>,
    pub facets: Facets,
    pub total: usize,
}

fn filter_products(all: &[Product], query: &ListQuery) -> ProductList {
    let products: Vec<ProductView> = query.apply(all).iter().map(ProductView::from).collect();
    ProductList {
        total: products.len(),
        products,
        facets: Facets::from_items(all),
    }
}

/// Display the POS page.
#[instrument(skip(state, session, credentials))]
async fn pos_page(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Query<ProductParams>,
) -> impl IntoResponse {
    let mut page = PageContext::load(&state, &session, "/dashboard/pos").await;
    let query = params.list_query();

    let list = match state.products(&credentials).await {
        Ok(all) => filter_products(&all, &query),
        Err(e) => {
            page = page.with_error(e.user_message());
            filter_products(&[], &query)
        }
    };

    let cart = match load_cart(&session).await {
        Ok(cart) => CartView::from(&cart),
        Err(e) => {
            warn!(error = %e, "Failed to load cart");
            CartView::from(&sellapp_core::cart::Cart::default())
        }
    };

    let stats = feed_or_fetch(&state.feeds().quick_stats, &credentials, || {
        state.api().quick_stats(&credentials)
    })
    .await
    .ok()
    .map(|snapshot| QuickStatsView::from(&snapshot.data));

    PosTemplate {
        page,
        search: query.search.clone().unwrap_or_default(),
        categories: SelectOption::facet_options(&list.facets.categories, query.category.as_deref()),
        brands: SelectOption::facet_options(&list.facets.brands, query.brand.as_deref()),
        sort_options: SelectOption::sort_options(query.sort),
        products: list.products,
        cart,
        stats,
        quick_stats_poll_secs: state.config().poll.quick_stats.as_secs(),
    }
}

/// Filtered product list for live search.
#[instrument(skip(state, session, credentials))]
async fn products(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Query<ProductParams>,
) -> Result<Sequenced<ProductList>, AppError> {
    let query = params.list_query();
    sequenced(&state, &session, "pos_products", params.order(), async {
        let all = state.products(&credentials).await?;
        Ok::<_, AppError>(filter_products(&all, &query))
    })
    .await
}

/// Today's numbers, from the live feed when it has a snapshot.
#[instrument(skip(state, credentials))]
async fn quick_stats(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
) -> Result<Json<Envelope<Snapshot<QuickStats>>>, AppError> {
    let snapshot = feed_or_fetch(&state.feeds().quick_stats, &credentials, || {
        state.api().quick_stats(&credentials)
    })
    .await?;
    Ok(ok(snapshot))
}

/// Body of `POST /api/pos`.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub discount: LenientMoney,
    #[serde(default)]
    pub amount_paid: Option<LenientMoney>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Result of a completed sale.
#[derive(Debug, Serialize)]
pub struct SaleCompleted {
    pub sale: Value,
    pub sale_id: Option<String>,
    pub total: Money,
    pub change_due: Money,
    pub receipt_url: Option<String>,
}

/// Complete a sale from the session cart.
///
/// The cart is only cleared once the API has recorded the sale; any
/// failure (e.g. "Insufficient stock") leaves it exactly as it was.
#[instrument(skip(state, session, credentials, form))]
async fn complete_sale(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<Envelope<SaleCompleted>>, AppError> {
    let mut cart = load_cart(&session).await?;

    let mut request = SaleRequest::from_cart(
        &cart,
        form.customer_id,
        form.payment_method,
        form.discount.0,
        form.amount_paid.map(|m| m.0),
    )
    .ok_or_else(|| AppError::BadRequest("Cart is empty".to_string()))?;
    request.notes = form.notes.filter(|n| !n.trim().is_empty());

    let sale = state.api().complete_sale(&request, &credentials).await?;

    cart.clear();
    save_cart(&session, &cart).await?;
    state.invalidate_catalog().await;

    let sale_id = text(&sale, "id").or_else(|| text(&sale, "sale_id"));
    info!(
        sale_id = sale_id.as_deref().unwrap_or("-"),
        total = %request.total,
        "Sale completed"
    );

    Ok(ok(SaleCompleted {
        receipt_url: sale_id.as_ref().map(|id| format!("/pos/receipt/{id}")),
        sale_id,
        total: request.total,
        change_due: request.change_due(),
        sale,
    }))
}

/// Printable receipt. Failures render the page with an error banner.
#[instrument(skip(state, session, credentials))]
async fn receipt_page(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
    Path(id): Path<SaleId>,
) -> impl IntoResponse {
    let page = PageContext::load(&state, &session, "/pos/receipt").await;

    match state.api().get_sale(id, &credentials).await {
        Ok(sale) => ReceiptTemplate {
            page,
            receipt: Some(ReceiptView::from_sale(id, &sale)),
        },
        Err(e) => ReceiptTemplate {
            page: page.with_error(e.user_message()),
            receipt: None,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(id: i64, name: &str, brand: &str, price: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            brand: Some(brand.to_string()),
            category: Some("Phones".to_string()),
            price: Money::parse_lenient(price),
            stock,
            created_at: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_filter_products_keeps_full_facets() {
        let all = vec![
            product(1, "Galaxy A15", "Samsung", "1800", 4),
            product(2, "iPhone 13", "Apple", "5200", 0),
            product(3, "Redmi 13C", "Xiaomi", "1350", 9),
        ];
        let query = ListQuery::from_params(Some("SAMSUNG"), None, None, Some("price_asc"));
        let list = filter_products(&all, &query);

        assert_eq!(list.total, 1);
        assert_eq!(list.products.first().map(|p| p.id), Some(ProductId::new(1)));
        assert_eq!(list.facets.brands, vec!["Apple", "Samsung", "Xiaomi"]);
    }

    #[test]
    fn test_facet_options_mark_selection() {
        let values = vec!["Apple".to_string(), "Samsung".to_string()];
        let options = SelectOption::facet_options(&values, Some("samsung"));
        assert_eq!(options.len(), 3);
        assert!(options.iter().any(|o| o.value == "Samsung" && o.selected));
        assert!(!options.first().unwrap().selected);
    }

    #[test]
    fn test_receipt_from_sale_record() {
        let sale = json!({
            "id": 42,
            "created_at": "2026-03-14T10:15:00Z",
            "customer": {"name": "Ama Mensah"},
            "payment_method": "mobile_money",
            "items": [
                {"name": "Galaxy A15", "quantity": 2, "price": "1800.00", "total": "3600.00"},
                {"product_name": "Screen guard", "quantity": 1, "price": 50}
            ],
            "discount": "100",
            "amount_paid": "4000"
        });
        let receipt = ReceiptView::from_sale(SaleId::new(42), &sale);

        assert_eq!(receipt.sale_id, "42");
        assert_eq!(receipt.customer_name, "Ama Mensah");
        assert_eq!(receipt.payment_method, "mobile money");
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.subtotal, "3,650.00");
        assert_eq!(receipt.total, "3,550.00");
        assert_eq!(receipt.change_due.as_deref(), Some("450.00"));
    }

    #[test]
    fn test_receipt_tolerates_empty_record() {
        let receipt = ReceiptView::from_sale(SaleId::new(7), &json!({}));
        assert_eq!(receipt.sale_id, "7");
        assert_eq!(receipt.customer_name, "Walk-in customer");
        assert!(receipt.lines.is_empty());
        assert_eq!(receipt.total, "0.00");
        assert!(receipt.change_due.is_none());
    }

    #[test]
    fn test_checkout_form_defaults() {
        let form: CheckoutForm = serde_json::from_str(r#"{"discount": "10"}"#).unwrap();
        assert_eq!(form.payment_method, PaymentMethod::Cash);
        assert_eq!(form.discount.0, Money::parse_lenient("10"));
        assert!(form.customer_id.is_none());
    }
}
