use chrono::{DateTime, Utc};
use merx_store::order_repo::{OrderLineRow, OrderRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ORDER_STATUS_CONFIRMED: &str = "CONFIRMED";

/// Immutable record of a completed checkout. The total is the sum of the
/// line snapshots, never recomputed against current rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// One order line, mirroring the reservation snapshot it was created from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub final_price: Decimal,
}

impl Order {
    pub fn from_rows(order: OrderRow, lines: Vec<OrderLineRow>) -> Self {
        Order {
            id: order.id,
            user_id: order.user_id,
            total_amount: order.total_amount,
            status: order.status,
            created_at: order.created_at,
            lines: lines.into_iter().map(OrderLine::from).collect(),
        }
    }
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            variant_id: row.variant_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            discount: row.discount,
            final_price: row.final_price,
        }
    }
}
