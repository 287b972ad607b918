//! Brand lookups passed through to the page script.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde_json::Value;
use tracing::instrument;

use sellapp_core::envelope::Envelope;
use sellapp_core::{BrandId, CategoryId};

use crate::error::AppError;
use crate::middleware::ApiCredentials;
use crate::routes::ok;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/brands/by-category/{id}", get(by_category))
        .route("/api/brands/specs/{id}", get(specs))
}

/// Brands sold in a category.
#[instrument(skip(state, credentials))]
async fn by_category(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Path(id): Path<CategoryId>,
) -> Result<Json<Envelope<Value>>, AppError> {
    Ok(ok(state.api().brands_by_category(id, &credentials).await?))
}

/// Spec fields for a brand.
#[instrument(skip(state, credentials))]
async fn specs(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Path(id): Path<BrandId>,
) -> Result<Json<Envelope<Value>>, AppError> {
    Ok(ok(state.api().brand_specs(id, &credentials).await?))
}
