use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use merx_order::Order;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub cart_id: Uuid,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderLineResponse {
    pub variant_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub final_price: Decimal,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id,
            user_id: order.user_id,
            total_amount: order.total_amount,
            status: order.status,
            created_at: order.created_at,
            lines: order
                .lines
                .into_iter()
                .map(|line| OrderLineResponse {
                    variant_id: line.variant_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    discount: line.discount,
                    final_price: line.final_price,
                })
                .collect(),
        }
    }
}

/// POST /v1/checkout
/// Convert every reservation in the cart into a committed order
pub async fn checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let receipt = state.checkout.checkout(req.cart_id, req.user_id).await?;
    Ok(Json(CheckoutResponse {
        order_id: receipt.order_id,
        total: receipt.total,
    }))
}

/// GET /v1/orders/:id
/// Retrieve order details
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, (StatusCode, &'static str)> {
    let order = state
        .checkout
        .get_order(order_id)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))?
        .ok_or((StatusCode::NOT_FOUND, "Order not found"))?;

    Ok(Json(OrderResponse::from(order)))
}
