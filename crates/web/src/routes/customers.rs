//! Customer pages and JSON endpoints.

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
use tracing::{info, instrument};

use sellapp_core::catalog::{ListQuery, SortOrder};
use sellapp_core::duplicates::{DuplicateIndex, DuplicateMark, PhoneRow, mark_duplicates};
use sellapp_core::envelope::Envelope;
use sellapp_core::models::{Customer, CustomerInput};
use sellapp_core::{CustomerId, Money};

use crate::error::AppError;
use crate::filters;
use crate::middleware::ApiCredentials;
use crate::routes::pos::SelectOption;
use crate::routes::{PageContext, SearchOrder, Sequenced, ok, sequenced};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/customers", get(list_page))
        .route("/dashboard/customers/{id}", get(detail_page))
        .route("/api/customers", get(list).post(create))
        .route("/api/customers/search", get(search))
        .route("/api/customers/duplicates", post(duplicates))
        .route(
            "/api/customers/{id}",
            get(show).put(update).delete(destroy),
        )
        .route("/api/customers/{id}/history", get(history))
}

/// Sort orders offered on the customer list.
const CUSTOMER_SORTS: [SortOrder; 3] = [SortOrder::NameAsc, SortOrder::NameDesc, SortOrder::Newest];

// =============================================================================
// View Types
// =============================================================================

/// Customer table row.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerRow {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub duplicate: bool,
}

fn customer_rows(customers: &[Customer]) -> (Vec<CustomerRow>, usize) {
    let index = DuplicateIndex::build(customers.iter().map(|c| c.phone.as_deref()));
    let rows = customers
        .iter()
        .map(|c| CustomerRow {
            id: c.id,
            name: c.name.clone(),
            phone: c.phone.clone().unwrap_or_default(),
            email: c.email.clone().unwrap_or_default(),
            address: c.address.clone().unwrap_or_default(),
            duplicate: index.is_duplicate(c.phone.as_deref()),
        })
        .collect();
    (rows, index.duplicate_key_count())
}

/// One entry of a customer's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub kind: String,
    pub date: String,
    pub description: String,
    pub amount: String,
}

fn field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Flatten a history payload into display rows, newest first.
///
/// The API returns either a bare list or an object of lists keyed by kind
/// (`sales`, `repairs`, `swaps`).
#[must_use]
pub fn history_entries(history: &Value) -> Vec<HistoryEntry> {
    let mut groups: Vec<(String, &Vec<Value>)> = Vec::new();
    match history {
        Value::Array(items) => groups.push((String::new(), items)),
        Value::Object(map) => {
            for (key, value) in map {
                if let Value::Array(items) = value {
                    groups.push((key.trim_end_matches('s').to_string(), items));
                }
            }
        }
        _ => {}
    }

    let mut entries: Vec<HistoryEntry> = groups
        .into_iter()
        .flat_map(|(group_kind, items)| {
            items.iter().map(move |item| HistoryEntry {
                kind: field(item, &["type", "kind"]).unwrap_or_else(|| group_kind.clone()),
                date: field(item, &["created_at", "date"]).unwrap_or_default(),
                description: field(item, &["description", "product_name", "name", "notes"])
                    .unwrap_or_default(),
                amount: field(item, &["total", "amount", "cost"])
                    .map(|raw| Money::parse_lenient(&raw).display())
                    .unwrap_or_default(),
            })
        })
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersTemplate {
    pub page: PageContext,
    pub customers: Vec<CustomerRow>,
    pub search: String,
    pub sort_options: Vec<SelectOption>,
    pub duplicate_groups: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "customers/show.html")]
pub struct CustomerTemplate {
    pub page: PageContext,
    pub customer: Option<CustomerRow>,
    pub history: Vec<HistoryEntry>,
}

// =============================================================================
// Pages
// =============================================================================

/// List parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default, alias = "search")]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(default)]
    pub page: Option<String>,
}

impl ListParams {
    fn order(&self) -> SearchOrder<'_> {
        SearchOrder {
            seq: self.seq,
            page: self.page.as_deref(),
        }
    }

    fn list_query(&self) -> ListQuery {
        ListQuery::from_params(self.q.as_deref(), None, None, self.sort.as_deref())
    }
}

/// Customer list with duplicate badges.
#[instrument(skip(state, session, credentials))]
async fn list_page(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let mut page = PageContext::load(&state, &session, "/dashboard/customers").await;
    let query = params.list_query();

    let all = match state.api().list_customers(&credentials).await {
        Ok(all) => all,
        Err(e) => {
            page = page.with_error(e.user_message());
            Vec::new()
        }
    };

    // Badges reflect the whole list, not just the filtered rows.
    let (all_rows, duplicate_groups) = customer_rows(&all);
    let visible: Vec<CustomerId> = query.apply(&all).iter().map(|c| c.id).collect();
    let customers = visible
        .iter()
        .filter_map(|id| all_rows.iter().find(|row| row.id == *id).cloned())
        .collect();

    CustomersTemplate {
        page,
        customers,
        search: query.search.clone().unwrap_or_default(),
        sort_options: CUSTOMER_SORTS
            .into_iter()
            .map(|order| SelectOption {
                value: order.as_str().to_string(),
                label: order.label().to_string(),
                selected: order == query.sort,
            })
            .collect(),
        duplicate_groups,
    }
}

/// Customer detail with purchase and repair history.
#[instrument(skip(state, session, credentials))]
async fn detail_page(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
    Path(id): Path<CustomerId>,
) -> impl IntoResponse {
    let page = PageContext::load(&state, &session, "/dashboard/customers").await;

    let customer = match state.api().get_customer(id, &credentials).await {
        Ok(customer) => customer,
        Err(e) => {
            return CustomerTemplate {
                page: page.with_error(e.user_message()),
                customer: None,
                history: Vec::new(),
            };
        }
    };

    let (page, history) = match state.api().customer_history(id, &credentials).await {
        Ok(history) => (page, history_entries(&history)),
        Err(e) => (page.with_error(e.user_message()), Vec::new()),
    };

    let (rows, _) = customer_rows(std::slice::from_ref(&customer));
    CustomerTemplate {
        page,
        customer: rows.into_iter().next(),
        history,
    }
}

// =============================================================================
// JSON
// =============================================================================

/// Filtered customers with duplicate flags.
#[instrument(skip(state, credentials))]
async fn list(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Query<ListParams>,
) -> Result<Json<Envelope<Vec<CustomerRow>>>, AppError> {
    let all = state.api().list_customers(&credentials).await?;
    let (rows, _) = customer_rows(&all);
    let visible = params.list_query().apply(&all);
    Ok(ok(visible
        .iter()
        .filter_map(|c| rows.iter().find(|row| row.id == c.id).cloned())
        .collect()))
}

/// Search customers, dropping responses overtaken by a newer search.
#[instrument(skip(state, session, credentials))]
async fn search(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Query<ListParams>,
) -> Result<Sequenced<Vec<Customer>>, AppError> {
    let q = params.q.clone().unwrap_or_default();
    sequenced(&state, &session, "customers", params.order(), async {
        let customers = if q.trim().is_empty() {
            state.api().list_customers(&credentials).await?
        } else {
            state.api().search_customers(q.trim(), &credentials).await?
        };
        Ok::<_, AppError>(customers)
    })
    .await
}

/// Create a customer.
#[instrument(skip(state, credentials, input))]
async fn create(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Json(input): Json<CustomerInput>,
) -> Result<Json<Envelope<Customer>>, AppError> {
    let input = input.validated()?;
    let customer = state.api().create_customer(&input, &credentials).await?;
    info!(customer_id = %customer.id, "Customer created");
    Ok(ok(customer))
}

/// One customer.
#[instrument(skip(state, credentials))]
async fn show(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Path(id): Path<CustomerId>,
) -> Result<Json<Envelope<Customer>>, AppError> {
    Ok(ok(state.api().get_customer(id, &credentials).await?))
}

/// Update a customer.
#[instrument(skip(state, credentials, input))]
async fn update(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Path(id): Path<CustomerId>,
    Json(input): Json<CustomerInput>,
) -> Result<Json<Envelope<Customer>>, AppError> {
    let input = input.validated()?;
    let customer = state.api().update_customer(id, &input, &credentials).await?;
    info!(customer_id = %id, "Customer updated");
    Ok(ok(customer))
}

/// Delete a customer.
#[instrument(skip(state, credentials))]
async fn destroy(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Path(id): Path<CustomerId>,
) -> Result<Json<Envelope<Value>>, AppError> {
    state.api().delete_customer(id, &credentials).await?;
    info!(customer_id = %id, "Customer deleted");
    Ok(ok(serde_json::json!({ "deleted": id })))
}

/// Purchase and repair history, passed through.
#[instrument(skip(state, credentials))]
async fn history(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Path(id): Path<CustomerId>,
) -> Result<Json<Envelope<Value>>, AppError> {
    Ok(ok(state.api().customer_history(id, &credentials).await?))
}

/// Body of `POST /api/customers/duplicates`.
#[derive(Debug, Deserialize)]
pub struct DuplicatesForm {
    pub rows: Vec<PhoneRow>,
}

/// Recompute duplicate badges for the rows still on the page.
#[instrument(skip(form), fields(rows = form.rows.len()))]
async fn duplicates(Json(form): Json<DuplicatesForm>) -> Json<Envelope<Vec<DuplicateMark>>> {
    ok(mark_duplicates(&form.rows))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn customer(id: i64, name: &str, phone: Option<&str>) -> Customer {
        Customer {
            id: CustomerId::new(id),
            name: name.to_string(),
            phone: phone.map(String::from),
            email: None,
            address: None,
            created_at: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_customer_rows_flag_shared_phones() {
        let customers = vec![
            customer(1, "Ama", Some("+233 (20) 123-4567")),
            customer(2, "Kwame", Some("233201234567")),
            customer(3, "Efua", Some("0244000000")),
            customer(4, "Yaw", None),
        ];
        let (rows, groups) = customer_rows(&customers);
        let flags: Vec<bool> = rows.iter().map(|r| r.duplicate).collect();
        assert_eq!(flags, vec![true, true, false, false]);
        assert_eq!(groups, 1);
    }

    #[test]
    fn test_history_entries_from_grouped_object() {
        let history = json!({
            "sales": [
                {"created_at": "2026-02-01", "product_name": "Galaxy A15", "total": "1800"}
            ],
            "repairs": [
                {"created_at": "2026-03-05", "description": "Screen replacement", "cost": 350}
            ]
        });
        let entries = history_entries(&history);
        assert_eq!(entries.len(), 2);
        let first = entries.first().unwrap();
        assert_eq!(first.kind, "repair");
        assert_eq!(first.amount, "350.00");
        assert_eq!(entries.get(1).unwrap().description, "Galaxy A15");
    }

    #[test]
    fn test_history_entries_tolerate_odd_shapes() {
        assert!(history_entries(&json!(null)).is_empty());
        let entries = history_entries(&json!([{"type": "swap"}]));
        assert_eq!(entries.first().map(|e| e.kind.as_str()), Some("swap"));
    }
}
