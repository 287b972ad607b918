//! Cart route handlers.
//!
//! The cart lives in the server session. Prices and stock come from the
//! cached catalog, never from the request, so a tampered page cannot sell
//! below price or past stock.

use axum::{Json, Router, extract::State, routing::{get, post}};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, instrument};

use sellapp_core::cart::{Cart, CartItem, CatalogEntry};
use sellapp_core::envelope::Envelope;
use sellapp_core::{Money, ProductId};

use crate::error::AppError;
use crate::middleware::ApiCredentials;
use crate::models::session_keys;
use crate::routes::ok;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pos/cart", get(show))
        .route("/pos/cart/add", post(add))
        .route("/pos/cart/update", post(update))
        .route("/pos/cart/remove", post(remove))
        .route("/pos/cart/clear", post(clear))
}

// =============================================================================
// View Types
// =============================================================================

/// One cart line as the page script renders it.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub total: Money,
    pub available_stock: u32,
    pub price_display: String,
    pub total_display: String,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity(),
            total: item.total().rounded(),
            available_stock: item.available_stock,
            price_display: item.price.display(),
            total_display: item.total().display(),
        }
    }
}

/// Cart summary returned by every cart endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: Money,
    pub subtotal_display: String,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let subtotal = cart.subtotal().rounded();
        Self {
            items: cart.items().map(CartLineView::from).collect(),
            item_count: cart.item_count(),
            subtotal,
            subtotal_display: subtotal.display(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Read the cart from the session; a missing cart is empty.
pub(crate) async fn load_cart(session: &Session) -> Result<Cart, AppError> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<(), AppError> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Resolve a product from the catalog cache, refreshing once on a miss so
/// products added since the last fetch are found.
async fn resolve_product(
    state: &AppState,
    credentials: &crate::api::Credentials,
    product_id: ProductId,
) -> Result<CatalogEntry, AppError> {
    let find = |products: &[sellapp_core::models::Product]| {
        products
            .iter()
            .find(|p| p.id == product_id)
            .map(CatalogEntry::from)
    };

    if let Some(entry) = find(&state.products(credentials).await?) {
        return Ok(entry);
    }

    debug!(product_id = %product_id, "Product not in cached catalog, refreshing");
    state.invalidate_catalog().await;
    find(&state.products(credentials).await?)
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id} was not found")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Body of `POST /pos/cart/add`.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Body of `POST /pos/cart/update`.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /pos/cart/remove`.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: ProductId,
}

/// Current cart summary.
#[instrument(skip(session))]
async fn show(session: Session) -> Result<Json<Envelope<CartView>>, AppError> {
    let cart = load_cart(&session).await?;
    Ok(ok(CartView::from(&cart)))
}

/// Add units of a product.
#[instrument(skip(state, session, credentials))]
async fn add(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
    Json(form): Json<AddForm>,
) -> Result<Json<Envelope<CartView>>, AppError> {
    let entry = resolve_product(&state, &credentials, form.product_id).await?;

    let mut cart = load_cart(&session).await?;
    cart.add(&entry, form.quantity)?;
    save_cart(&session, &cart).await?;

    Ok(ok(CartView::from(&cart)))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(session))]
async fn update(
    session: Session,
    Json(form): Json<UpdateForm>,
) -> Result<Json<Envelope<CartView>>, AppError> {
    let mut cart = load_cart(&session).await?;
    cart.update(form.product_id, form.quantity)?;
    save_cart(&session, &cart).await?;

    Ok(ok(CartView::from(&cart)))
}

/// Remove a line.
#[instrument(skip(session))]
async fn remove(
    session: Session,
    Json(form): Json<RemoveForm>,
) -> Result<Json<Envelope<CartView>>, AppError> {
    let mut cart = load_cart(&session).await?;
    cart.remove(form.product_id)?;
    save_cart(&session, &cart).await?;

    Ok(ok(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
async fn clear(session: Session) -> Result<Json<Envelope<CartView>>, AppError> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;

    Ok(ok(CartView::from(&cart)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(id: i64, price: &str, stock: u32) -> CatalogEntry {
        CatalogEntry {
            product_id: ProductId::new(id),
            name: format!("Item {id}"),
            price: Money::parse_lenient(price),
            available_stock: stock,
        }
    }

    #[test]
    fn test_cart_view_rounds_and_formats() {
        let mut cart = Cart::default();
        cart.add(&entry(1, "1999.995", 5), 2).unwrap();
        cart.add(&entry(2, "0.10", 10), 3).unwrap();

        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 5);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.subtotal_display, "4,000.29");
        assert_eq!(
            view.items.first().map(|l| l.total_display.as_str()),
            Some("3,999.99")
        );
    }

    #[test]
    fn test_add_form_defaults_quantity() {
        let form: AddForm = serde_json::from_str(r#"{"product_id": 7}"#).unwrap();
        assert_eq!(form.quantity, 1);
        assert_eq!(form.product_id, ProductId::new(7));
    }
}
