use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use merx_core::UserContext;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreateCartResponse {
    pub cart_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub variant_id: Uuid,
    pub quantity: i64,
    pub user_tier: Option<String>,
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub cart_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    pub reserved_until: DateTime<Utc>,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub final_price: Decimal,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/carts
/// Create an empty cart. The owner is attached at checkout, not here.
pub async fn create_cart(
    State(state): State<AppState>,
) -> Result<Json<CreateCartResponse>, AppError> {
    let cart_id = state.reservations.create_cart(None).await?;
    Ok(Json(CreateCartResponse { cart_id }))
}

/// POST /v1/carts/:cart_id/items
/// Add a variant to the cart, or overwrite the existing line's quantity.
/// Either way the stock is held for 15 minutes and priced fresh.
pub async fn add_item(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let user = UserContext {
        user_id: None,
        tier: req.user_tier,
    };
    let reservation = state
        .reservations
        .add_or_update_item(
            cart_id,
            req.variant_id,
            req.quantity,
            &user,
            req.promo_code.as_deref(),
        )
        .await?;

    Ok(Json(ReservationResponse {
        cart_id: reservation.cart_id,
        variant_id: reservation.variant_id,
        quantity: reservation.quantity,
        reserved_until: reservation.reserved_until,
        unit_price: reservation.snapshot.unit_price,
        discount: reservation.snapshot.discount,
        final_price: reservation.snapshot.final_price,
    }))
}
