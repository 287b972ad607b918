//! Device swap page, balance checks and checkout.
//!
//! A swap is only recorded when the customer's device value plus top-up
//! covers the store product's price to within a cent. The balance is
//! recomputed server-side on checkout; the page's live figure is advisory.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;
use tracing::{info, instrument};

use sellapp_core::envelope::Envelope;
use sellapp_core::models::{Customer, CustomerDevice, SwapRequest};
use sellapp_core::swap::{BalanceReport, SwapBalance};
use sellapp_core::{CustomerId, Money, ProductId};

use crate::error::AppError;
use crate::filters;
use crate::middleware::ApiCredentials;
use crate::routes::pos::ProductView;
use crate::routes::{LenientMoney, PageContext, ok};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/pos/swap", get(swap_page))
        .route("/dashboard/pos/swap/checkout", post(checkout))
        .route("/api/swap/balance", post(balance))
        .route("/api/swap/customers", get(customers))
}

/// Customer option for the swap form.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerOption {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
}

impl From<&Customer> for CustomerOption {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            phone: customer.phone.clone().unwrap_or_default(),
        }
    }
}

fn customer_options(mut customers: Vec<Customer>) -> Vec<CustomerOption> {
    customers.sort_by_key(|c| c.name.to_lowercase());
    customers.iter().map(CustomerOption::from).collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "pos/swap.html")]
pub struct SwapTemplate {
    pub page: PageContext,
    pub customers: Vec<CustomerOption>,
    pub products: Vec<ProductView>,
}

/// Display the swap page.
#[instrument(skip(state, session, credentials))]
async fn swap_page(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
) -> impl IntoResponse {
    let mut page = PageContext::load(&state, &session, "/dashboard/pos/swap").await;

    let products = match state.products(&credentials).await {
        Ok(all) => all
            .iter()
            .filter(|p| p.in_stock())
            .map(ProductView::from)
            .collect(),
        Err(e) => {
            page = page.with_error(e.user_message());
            Vec::new()
        }
    };

    let customers = match state.api().list_customers(&credentials).await {
        Ok(list) => customer_options(list),
        Err(e) => {
            if page.error.is_none() {
                page = page.with_error(e.user_message());
            }
            Vec::new()
        }
    };

    SwapTemplate {
        page,
        customers,
        products,
    }
}

/// Body of `POST /api/swap/balance`.
#[derive(Debug, Default, Deserialize)]
pub struct BalanceForm {
    #[serde(default)]
    pub company_price: LenientMoney,
    #[serde(default)]
    pub customer_value: LenientMoney,
    #[serde(default)]
    pub topup: LenientMoney,
}

impl BalanceForm {
    fn balance(&self) -> SwapBalance {
        SwapBalance::calculate(self.company_price.0, self.customer_value.0, self.topup.0)
    }
}

/// Classify a balance for the live indicator.
#[instrument]
async fn balance(Json(form): Json<BalanceForm>) -> Json<Envelope<BalanceReport>> {
    ok(BalanceReport::from(&form.balance()))
}

/// Customers sorted by name for the swap form's picker.
#[instrument(skip(state, credentials))]
async fn customers(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
) -> Result<Json<Envelope<Vec<CustomerOption>>>, AppError> {
    let list = state.api().list_customers(&credentials).await?;
    Ok(ok(customer_options(list)))
}

/// Body of `POST /dashboard/pos/swap/checkout`.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub company_product_id: Option<ProductId>,
    #[serde(default)]
    pub company_price: LenientMoney,
    #[serde(default)]
    pub device_brand: String,
    #[serde(default)]
    pub device_model: String,
    #[serde(default)]
    pub device_imei: Option<String>,
    #[serde(default)]
    pub device_condition: Option<String>,
    #[serde(default)]
    pub customer_value: LenientMoney,
    #[serde(default)]
    pub topup: LenientMoney,
    #[serde(default)]
    pub notes: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CheckoutForm {
    /// Validate the form into a swap request, pricing the store product at
    /// `catalog_price` when known.
    ///
    /// # Errors
    ///
    /// `Validation` for missing fields or an unbalanced swap.
    fn into_request(self, catalog_price: Option<Money>) -> Result<SwapRequest, AppError> {
        let customer_id = self
            .customer_id
            .ok_or_else(|| AppError::Validation("Select a customer".to_string()))?;
        let product_id = self
            .company_product_id
            .ok_or_else(|| AppError::Validation("Select the store product".to_string()))?;

        let brand = self.device_brand.trim();
        let model = self.device_model.trim();
        if brand.is_empty() || model.is_empty() {
            return Err(AppError::Validation(
                "Enter the customer's device brand and model".to_string(),
            ));
        }

        let company_price = catalog_price.unwrap_or(self.company_price.0);
        let balance = SwapBalance::calculate(company_price, self.customer_value.0, self.topup.0);
        if !balance.is_balanced() {
            let status = balance.status();
            return Err(AppError::Validation(format!(
                "{} (balance {})",
                status.message(),
                balance.display_amount()
            )));
        }

        let device = CustomerDevice {
            brand: brand.to_string(),
            model: model.to_string(),
            imei: non_blank(self.device_imei),
            condition: non_blank(self.device_condition),
        };

        Ok(SwapRequest::new(
            customer_id,
            product_id,
            device,
            &balance,
            non_blank(self.notes),
        ))
    }
}

/// Record a balanced swap.
#[instrument(skip(state, credentials, form))]
async fn checkout(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<Envelope<Value>>, AppError> {
    let catalog_price = match form.company_product_id {
        Some(id) => state
            .products(&credentials)
            .await
            .ok()
            .and_then(|all| all.iter().find(|p| p.id == id).map(|p| p.price)),
        None => None,
    };

    let request = form.into_request(catalog_price)?;
    let swap = state.api().create_swap(&request, &credentials).await?;
    state.invalidate_catalog().await;

    info!(
        customer_id = %request.customer_id,
        product_id = %request.company_product_id,
        "Swap recorded"
    );
    Ok(ok(swap))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sellapp_core::swap::BalanceStatus;

    fn form(price: &str, value: &str, topup: &str) -> CheckoutForm {
        CheckoutForm {
            customer_id: Some(CustomerId::new(3)),
            company_product_id: Some(ProductId::new(9)),
            company_price: LenientMoney(Money::parse_lenient(price)),
            device_brand: "Apple".to_string(),
            device_model: "iPhone 11".to_string(),
            device_imei: Some("  ".to_string()),
            customer_value: LenientMoney(Money::parse_lenient(value)),
            topup: LenientMoney(Money::parse_lenient(topup)),
            ..CheckoutForm::default()
        }
    }

    #[test]
    fn test_balance_form_worked_examples() {
        let parse = |json: &str| serde_json::from_str::<BalanceForm>(json).unwrap().balance();

        let balanced = parse(r#"{"company_price": "500", "customer_value": 450, "topup": "50"}"#);
        assert_eq!(balanced.status(), BalanceStatus::Balanced);

        let short = parse(r#"{"company_price": "500", "customer_value": "300", "topup": "50"}"#);
        let report = BalanceReport::from(&short);
        assert_eq!(report.status, BalanceStatus::Shortfall);
        assert_eq!(report.display_amount, "150.00");
    }

    #[test]
    fn test_checkout_builds_request_when_balanced() {
        let request = form("500", "450", "50").into_request(None).unwrap();
        assert_eq!(request.balance, Money::ZERO);
        assert_eq!(request.customer_device.imei, None);
        assert_eq!(request.company_product_id, ProductId::new(9));
    }

    #[test]
    fn test_checkout_prefers_catalog_price() {
        let err = form("500", "450", "50")
            .into_request(Some(Money::parse_lenient("600")))
            .unwrap_err();
        assert!(err.to_string().starts_with("Increase customer value or top-up"));
    }

    #[test]
    fn test_checkout_requires_customer_and_device() {
        let mut missing_customer = form("500", "450", "50");
        missing_customer.customer_id = None;
        assert!(matches!(
            missing_customer.into_request(None),
            Err(AppError::Validation(_))
        ));

        let mut missing_model = form("500", "450", "50");
        missing_model.device_model = " ".to_string();
        assert!(matches!(
            missing_model.into_request(None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_customer_options_sorted_by_name() {
        let customer = |id: i64, name: &str| Customer {
            id: CustomerId::new(id),
            name: name.to_string(),
            phone: None,
            email: None,
            address: None,
            created_at: None,
            extra: serde_json::Map::new(),
        };
        let options = customer_options(vec![customer(1, "zainab"), customer(2, "Abena")]);
        let names: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Abena", "zainab"]);
    }
}
