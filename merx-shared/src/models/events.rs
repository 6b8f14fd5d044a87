use rust_decimal::Decimal;
use uuid::Uuid;

/// Emitted when a cart line reserves (or re-reserves) stock for a variant.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ReservationHeldEvent {
    pub cart_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    pub reserved_until: i64,
    pub timestamp: i64,
}

/// Emitted when the expiry sweep returns a reservation's quantity to the pool.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ReservationReclaimedEvent {
    pub reservation_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    /// Portion of `quantity` that could not be released because the reserved
    /// counter would have gone negative. Zero in a healthy store.
    pub clamped: i64,
    pub timestamp: i64,
}

/// Emitted when a cart's reservations are converted into a committed order.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub cart_id: Uuid,
    pub user_id: Option<Uuid>,
    pub total: Decimal,
    pub timestamp: i64,
}
