use chrono::{Duration, Utc};
use merx_catalog::{calculate_price, PriceBreakdown};
use merx_core::{EngineError, EngineResult, UserContext};
use merx_shared::models::events::ReservationHeldEvent;
use merx_store::reservation_repo::ReservationRow;
use merx_store::{cart_repo, reservation_repo, rule_repo, variant_repo, DbClient, EventLog};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Reservation;

/// Fixed lifetime of a reservation. Deliberately a constant, not
/// configuration: callers cannot vary it per request.
pub const RESERVATION_TTL_MINUTES: i64 = 15;

/// Orchestrates cart-line reservations: locks the variant row, prices the
/// line against the live rule set and writes the hold, all in one
/// transaction.
pub struct ReservationManager {
    db: DbClient,
    events: EventLog,
}

impl ReservationManager {
    pub fn new(db: DbClient) -> Self {
        Self {
            db,
            events: EventLog::new(),
        }
    }

    pub async fn create_cart(&self, user_id: Option<Uuid>) -> EngineResult<Uuid> {
        let cart_id = Uuid::new_v4();
        cart_repo::create(&self.db.pool, cart_id, user_id, Utc::now()).await?;
        debug!(cart_id = %cart_id, "Cart created");
        Ok(cart_id)
    }

    /// Create or overwrite the hold for (cart, variant).
    ///
    /// An update re-prices against the new quantity and the current rule
    /// set, re-arms the deadline and adjusts the reserved counter by the
    /// delta; a lower quantity releases the difference. Everything commits
    /// atomically or not at all.
    pub async fn add_or_update_item(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        quantity: i64,
        user: &UserContext,
        promo_code: Option<&str>,
    ) -> EngineResult<Reservation> {
        if quantity <= 0 {
            return Err(EngineError::Validation(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        if !cart_repo::exists(&self.db.pool, cart_id).await? {
            return Err(EngineError::not_found("Cart", cart_id));
        }

        let mut tx = self.db.pool.begin().await?;

        let variant = variant_repo::lock(&mut tx, variant_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Variant", variant_id))?;

        let existing = reservation_repo::find(&mut tx, cart_id, variant_id).await?;
        let delta = reservation_delta(quantity, existing.as_ref().map(|r| r.quantity));

        let mut counters = variant.counters();
        if delta > 0 {
            counters.reserve(delta)?;
        } else if delta < 0 {
            let released = counters.release(-delta);
            if released < -delta {
                warn!(
                    variant_id = %variant_id,
                    expected = -delta,
                    released,
                    "Reserved counter short during partial release"
                );
            }
        }

        // Pricing runs inside the lock so the snapshot matches the counters
        // we are about to commit; the rule fetch is a cheap indexed read.
        let rules = rule_repo::candidates_for_variant(&mut tx, variant.product_id, variant.id).await?;
        let now = Utc::now();
        let breakdown = calculate_price(&variant, quantity, user, promo_code, now, &rules);

        let row = ReservationRow {
            id: existing.as_ref().map(|r| r.id).unwrap_or_else(Uuid::new_v4),
            cart_id,
            variant_id,
            quantity,
            reserved_until: now + Duration::minutes(RESERVATION_TTL_MINUTES),
            unit_price_snapshot: breakdown.final_unit_price,
            discount_snapshot: breakdown.total_discount,
            final_price_snapshot: breakdown.total_after_discount,
        };
        reservation_repo::upsert(&mut tx, &row).await?;
        variant_repo::apply_counters(&mut tx, variant.id, &counters).await?;

        tx.commit().await?;

        debug!(
            cart_id = %cart_id,
            variant_id = %variant_id,
            quantity,
            delta,
            "Reservation held"
        );
        self.events.publish(
            "reservations.held",
            &ReservationHeldEvent {
                cart_id,
                variant_id,
                quantity,
                reserved_until: row.reserved_until.timestamp(),
                timestamp: now.timestamp(),
            },
        );

        Ok(Reservation::from(row))
    }

    /// Price a variant/quantity without reserving anything. Same engine,
    /// same live rule fetch, no lock taken.
    pub async fn quote(
        &self,
        variant_id: Uuid,
        quantity: i64,
        user: &UserContext,
        promo_code: Option<&str>,
    ) -> EngineResult<PriceBreakdown> {
        if quantity <= 0 {
            return Err(EngineError::Validation(format!(
                "quantity must be positive, got {quantity}"
            )));
        }

        let variant = variant_repo::get(&self.db.pool, variant_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Variant", variant_id))?;

        let mut conn = self.db.pool.acquire().await?;
        let rules =
            rule_repo::candidates_for_variant(&mut conn, variant.product_id, variant.id).await?;

        Ok(calculate_price(
            &variant,
            quantity,
            user,
            promo_code,
            Utc::now(),
            &rules,
        ))
    }
}

/// Change to apply to the reserved counter: the full quantity for a new
/// hold, otherwise the difference against the existing one. Negative means
/// a partial release.
fn reservation_delta(requested: i64, existing: Option<i64>) -> i64 {
    requested - existing.unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_for_new_reservation() {
        assert_eq!(reservation_delta(10, None), 10);
    }

    #[test]
    fn test_delta_for_increase() {
        assert_eq!(reservation_delta(10, Some(4)), 6);
    }

    #[test]
    fn test_delta_for_decrease_is_negative() {
        assert_eq!(reservation_delta(3, Some(8)), -5);
    }

    #[test]
    fn test_delta_for_unchanged_quantity_is_zero() {
        // Idempotent re-add: counters stay put, only the deadline re-arms
        assert_eq!(reservation_delta(5, Some(5)), 0);
    }
}
