use chrono::{DateTime, Utc};
use merx_core::EngineResult;
use merx_shared::models::events::ReservationReclaimedEvent;
use merx_store::reservation_repo::ExpiredCandidate;
use merx_store::{reservation_repo, variant_repo, DbClient, EventLog};
use tracing::{debug, warn};

/// Returns timed-out reservations to the available pool.
///
/// The scan runs unlocked; each candidate is then re-validated inside its
/// own transaction holding the variant lock, so a checkout racing the sweep
/// is decided purely by who takes the lock first.
pub struct Reclaimer {
    db: DbClient,
    events: EventLog,
}

impl Reclaimer {
    pub fn new(db: DbClient) -> Self {
        Self {
            db,
            events: EventLog::new(),
        }
    }

    /// One full sweep. Per-candidate failures are logged and skipped; the
    /// reservation stays for the next run. Returns how many holds were
    /// reclaimed.
    pub async fn sweep(&self) -> EngineResult<u64> {
        let now = Utc::now();
        let candidates = reservation_repo::expired_candidates(&self.db.pool, now).await?;
        if candidates.is_empty() {
            return Ok(0);
        }
        debug!(candidates = candidates.len(), "Expiry sweep starting");

        let mut reclaimed = 0u64;
        for candidate in candidates {
            match self.reclaim_one(candidate, now).await {
                Ok(true) => reclaimed += 1,
                Ok(false) => {} // gone or re-armed since the scan
                Err(e) => {
                    warn!(
                        reservation_id = %candidate.id,
                        "Reclaim failed, leaving for next sweep: {}",
                        e
                    );
                }
            }
        }

        Ok(reclaimed)
    }

    async fn reclaim_one(
        &self,
        candidate: ExpiredCandidate,
        now: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let mut tx = self.db.pool.begin().await?;

        let Some(variant) = variant_repo::lock(&mut tx, candidate.variant_id).await? else {
            return Ok(false);
        };
        // Re-read under the lock: checkout may have converted the hold, or
        // an update may have re-armed the deadline, since the scan.
        let Some(reservation) = reservation_repo::find_by_id(&mut tx, candidate.id).await? else {
            return Ok(false);
        };
        if reservation.reserved_until >= now {
            return Ok(false);
        }

        let mut counters = variant.counters();
        let released = counters.release(reservation.quantity);
        let clamped = reservation.quantity - released;
        if clamped > 0 {
            // The floor masks a prior double-release; keep the counter legal
            // but leave a loud trace for the operator.
            warn!(
                variant_id = %variant.id,
                reservation_id = %reservation.id,
                quantity = reservation.quantity,
                clamped,
                "Reserved counter underflow clamped during reclaim"
            );
        }

        variant_repo::apply_counters(&mut tx, variant.id, &counters).await?;
        reservation_repo::delete(&mut tx, reservation.id).await?;

        tx.commit().await?;

        self.events.publish(
            "reservations.reclaimed",
            &ReservationReclaimedEvent {
                reservation_id: reservation.id,
                variant_id: variant.id,
                quantity: reservation.quantity,
                clamped,
                timestamp: now.timestamp(),
            },
        );

        Ok(true)
    }
}
