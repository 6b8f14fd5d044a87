use chrono::{DateTime, Utc};
use merx_store::reservation_repo::ReservationRow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Price contract frozen when the reservation was (re)priced. Checkout
/// charges exactly this; it is never recomputed from the live rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub final_price: Decimal,
}

/// A time-bounded hold of quantity against a variant, unique per
/// (cart, variant). Ends either by conversion into an order line at
/// checkout or by deletion during the expiry sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    pub reserved_until: DateTime<Utc>,
    pub snapshot: PriceSnapshot,
}

impl Reservation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.reserved_until < now
    }
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            id: row.id,
            cart_id: row.cart_id,
            variant_id: row.variant_id,
            quantity: row.quantity,
            reserved_until: row.reserved_until,
            snapshot: PriceSnapshot {
                unit_price: row.unit_price_snapshot,
                discount: row.discount_snapshot,
                final_price: row.final_price_snapshot,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_predicate() {
        let now = Utc::now();
        let res = Reservation {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            variant_id: Uuid::new_v4(),
            quantity: 2,
            reserved_until: now + Duration::minutes(15),
            snapshot: PriceSnapshot {
                unit_price: Decimal::new(1000, 2),
                discount: Decimal::ZERO,
                final_price: Decimal::new(2000, 2),
            },
        };

        assert!(!res.is_expired(now));
        assert!(!res.is_expired(res.reserved_until));
        assert!(res.is_expired(now + Duration::minutes(16)));
    }
}
