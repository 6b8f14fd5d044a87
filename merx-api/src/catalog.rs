use axum::{
    extract::{Path, Query, State},
    Json,
};
use merx_catalog::{PriceBreakdown, Product, Variant};
use merx_core::{EngineError, UserContext};
use merx_store::variant_repo;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// GET /v1/products
/// Read-only catalog listing; creation belongs to the catalog collaborator.
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = variant_repo::list_products(&state.db.pool)
        .await
        .map_err(EngineError::from)?;
    Ok(Json(products))
}

/// GET /v1/products/:id/variants
pub async fn list_variants(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<Variant>>, AppError> {
    let variants = variant_repo::list_for_product(&state.db.pool, product_id)
        .await
        .map_err(EngineError::from)?;
    Ok(Json(variants))
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub quantity: i64,
    pub user_tier: Option<String>,
    pub promo_code: Option<String>,
}

/// GET /v1/variants/:id/quote
/// Price preview against the live rule set; reserves nothing.
pub async fn quote(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<PriceBreakdown>, AppError> {
    let user = UserContext {
        user_id: None,
        tier: params.user_tier,
    };
    let breakdown = state
        .reservations
        .quote(
            variant_id,
            params.quantity,
            &user,
            params.promo_code.as_deref(),
        )
        .await?;

    Ok(Json(breakdown))
}
