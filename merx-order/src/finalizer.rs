use chrono::{DateTime, Utc};
use merx_catalog::StockCounters;
use merx_core::{EngineError, EngineResult};
use merx_shared::models::events::OrderPlacedEvent;
use merx_store::order_repo::{OrderLineRow, OrderRow};
use merx_store::reservation_repo::ReservationRow;
use merx_store::{cart_repo, order_repo, reservation_repo, variant_repo, DbClient, EventLog};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Order, ORDER_STATUS_CONFIRMED};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order_id: Uuid,
    pub total: Decimal,
}

/// Converts a cart's reservations into a committed order: one transaction
/// that validates every line, decrements the ledger permanently and deletes
/// the holds. Any single failure rolls the whole checkout back.
pub struct CheckoutFinalizer {
    db: DbClient,
    events: EventLog,
}

impl CheckoutFinalizer {
    pub fn new(db: DbClient) -> Self {
        Self {
            db,
            events: EventLog::new(),
        }
    }

    pub async fn checkout(
        &self,
        cart_id: Uuid,
        user_id: Option<Uuid>,
    ) -> EngineResult<CheckoutReceipt> {
        if !cart_repo::exists(&self.db.pool, cart_id).await? {
            return Err(EngineError::not_found("Cart", cart_id));
        }

        let mut tx = self.db.pool.begin().await?;

        // First read only determines which variant rows to lock; the rows
        // are re-read below once the locks are held.
        let preview = reservation_repo::list_for_cart(&mut tx, cart_id).await?;
        if preview.is_empty() {
            return Err(EngineError::EmptyCart);
        }

        let now = Utc::now();

        // Lock every variant row in ascending id order (the listing is
        // ordered by variant id) so concurrent multi-line checkouts cannot
        // deadlock.
        let mut variants = BTreeMap::new();
        for reservation in &preview {
            if variants.contains_key(&reservation.variant_id) {
                continue;
            }
            let variant = variant_repo::lock(&mut tx, reservation.variant_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Variant", reservation.variant_id))?;
            variants.insert(variant.id, variant);
        }

        // Re-read under the locks: a racing update or reclaim that won a
        // variant lock before us has already committed, and its effect must
        // be what we validate against.
        let reservations = reservation_repo::list_for_cart(&mut tx, cart_id).await?;
        if reservations.is_empty() {
            return Err(EngineError::EmptyCart);
        }

        let order_id = Uuid::new_v4();
        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(reservations.len());

        for reservation in &reservations {
            if !variants.contains_key(&reservation.variant_id) {
                // Line added to the cart after the first read; take its lock
                // now before touching the counters.
                let variant = variant_repo::lock(&mut tx, reservation.variant_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Variant", reservation.variant_id))?;
                variants.insert(variant.id, variant);
            }
            let Some(variant) = variants.get_mut(&reservation.variant_id) else {
                return Err(EngineError::not_found("Variant", reservation.variant_id));
            };

            let mut counters = variant.counters();
            validate_line(reservation, &counters, now)?;
            counters.commit(reservation.quantity)?;
            variant.stock_quantity = counters.stock_quantity;
            variant.reserved_quantity = counters.reserved_quantity;

            variant_repo::apply_counters(&mut tx, variant.id, &counters).await?;

            total += reservation.final_price_snapshot;
            lines.push(OrderLineRow {
                id: Uuid::new_v4(),
                order_id,
                variant_id: reservation.variant_id,
                quantity: reservation.quantity,
                unit_price: reservation.unit_price_snapshot,
                discount: reservation.discount_snapshot,
                final_price: reservation.final_price_snapshot,
            });
        }

        order_repo::insert(
            &mut tx,
            &OrderRow {
                id: order_id,
                user_id,
                total_amount: total,
                status: ORDER_STATUS_CONFIRMED.to_string(),
                created_at: now,
            },
        )
        .await?;
        for line in &lines {
            order_repo::insert_line(&mut tx, line).await?;
        }
        // Delete exactly the holds converted above; a line added to the cart
        // while this transaction ran keeps its hold and its counters.
        for reservation in &reservations {
            reservation_repo::delete(&mut tx, reservation.id).await?;
        }

        tx.commit().await?;

        debug!(order_id = %order_id, cart_id = %cart_id, %total, "Order placed");
        self.events.publish(
            "orders.placed",
            &OrderPlacedEvent {
                order_id,
                cart_id,
                user_id,
                total,
                timestamp: now.timestamp(),
            },
        );

        Ok(CheckoutReceipt { order_id, total })
    }

    pub async fn get_order(&self, order_id: Uuid) -> EngineResult<Option<Order>> {
        let Some(order) = order_repo::get(&self.db.pool, order_id).await? else {
            return Ok(None);
        };
        let lines = order_repo::lines_for_order(&self.db.pool, order_id).await?;
        Ok(Some(Order::from_rows(order, lines)))
    }
}

/// Re-checks a reservation against the locked counters at checkout time.
/// These are defensive: drift since reservation time means a missed lock
/// somewhere, and the whole checkout must fail rather than oversell.
pub fn validate_line(
    reservation: &ReservationRow,
    counters: &StockCounters,
    now: DateTime<Utc>,
) -> EngineResult<()> {
    if reservation.reserved_until < now {
        return Err(EngineError::ReservationExpired {
            variant_id: reservation.variant_id,
        });
    }
    if counters.reserved_quantity < reservation.quantity {
        return Err(EngineError::ReservedMismatch {
            requested: reservation.quantity,
            reserved: counters.reserved_quantity,
        });
    }
    if counters.stock_quantity < reservation.quantity {
        return Err(EngineError::InsufficientStock {
            requested: reservation.quantity,
            available: counters.stock_quantity,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reservation(quantity: i64, reserved_until: DateTime<Utc>) -> ReservationRow {
        ReservationRow {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            variant_id: Uuid::new_v4(),
            quantity,
            reserved_until,
            unit_price_snapshot: Decimal::new(1000, 2),
            discount_snapshot: Decimal::ZERO,
            final_price_snapshot: Decimal::new(1000, 2) * Decimal::from(quantity),
        }
    }

    fn counters(stock: i64, reserved: i64) -> StockCounters {
        StockCounters {
            stock_quantity: stock,
            reserved_quantity: reserved,
        }
    }

    #[test]
    fn test_valid_line_passes() {
        let now = Utc::now();
        let res = reservation(5, now + Duration::minutes(10));
        assert!(validate_line(&res, &counters(100, 5), now).is_ok());
    }

    #[test]
    fn test_expired_reservation_rejects_checkout() {
        let now = Utc::now();
        let res = reservation(5, now - Duration::minutes(1));

        let err = validate_line(&res, &counters(100, 5), now).unwrap_err();
        assert!(matches!(err, EngineError::ReservationExpired { .. }));
    }

    #[test]
    fn test_deadline_exactly_now_is_still_valid() {
        let now = Utc::now();
        let res = reservation(5, now);
        assert!(validate_line(&res, &counters(100, 5), now).is_ok());
    }

    #[test]
    fn test_reserved_drift_rejected() {
        let now = Utc::now();
        let res = reservation(5, now + Duration::minutes(10));

        let err = validate_line(&res, &counters(100, 3), now).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ReservedMismatch {
                requested: 5,
                reserved: 3
            }
        ));
    }

    #[test]
    fn test_stock_drift_rejected() {
        let now = Utc::now();
        let res = reservation(5, now + Duration::minutes(10));

        let err = validate_line(&res, &counters(4, 5), now).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientStock {
                requested: 5,
                available: 4
            }
        ));
    }
}
