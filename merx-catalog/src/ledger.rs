use merx_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Stock and reservation counters for a single variant.
///
/// The arithmetic here is the whole ledger contract; callers apply it to a
/// row they hold under an exclusive lock and write the result back before
/// committing. Invariant at every committed state:
/// `0 <= reserved_quantity <= stock_quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCounters {
    pub stock_quantity: i64,
    pub reserved_quantity: i64,
}

impl StockCounters {
    pub fn available(&self) -> i64 {
        self.stock_quantity - self.reserved_quantity
    }

    /// Hold `delta` units for a cart.
    pub fn reserve(&mut self, delta: i64) -> EngineResult<()> {
        if self.available() < delta {
            return Err(EngineError::InsufficientStock {
                requested: delta,
                available: self.available(),
            });
        }
        self.reserved_quantity += delta;
        Ok(())
    }

    /// Return up to `qty` held units to the available pool.
    ///
    /// Returns the amount actually released; the reserved counter is
    /// floor-clamped at zero, so a shortfall signals a prior inconsistency
    /// and the caller is expected to surface it.
    pub fn release(&mut self, qty: i64) -> i64 {
        let released = qty.min(self.reserved_quantity);
        self.reserved_quantity -= released;
        released
    }

    /// Convert `qty` held units into a permanent stock decrement (checkout).
    pub fn commit(&mut self, qty: i64) -> EngineResult<()> {
        if self.reserved_quantity < qty {
            return Err(EngineError::ReservedMismatch {
                requested: qty,
                reserved: self.reserved_quantity,
            });
        }
        if self.stock_quantity < qty {
            return Err(EngineError::InsufficientStock {
                requested: qty,
                available: self.stock_quantity,
            });
        }
        self.stock_quantity -= qty;
        self.reserved_quantity -= qty;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn counters(stock: i64, reserved: i64) -> StockCounters {
        StockCounters {
            stock_quantity: stock,
            reserved_quantity: reserved,
        }
    }

    #[test]
    fn test_counter_lifecycle() {
        let mut c = counters(100, 0);

        c.reserve(10).unwrap();
        assert_eq!(c.reserved_quantity, 10);
        assert_eq!(c.available(), 90);

        c.commit(10).unwrap();
        assert_eq!(c.stock_quantity, 90);
        assert_eq!(c.reserved_quantity, 0);
    }

    #[test]
    fn test_reserve_rejects_over_available() {
        let mut c = counters(10, 8);

        let err = c.reserve(3).unwrap_err();
        assert!(matches!(
            err,
            merx_core::EngineError::InsufficientStock {
                requested: 3,
                available: 2
            }
        ));
        // Failed reserve leaves the counters untouched
        assert_eq!(c, counters(10, 8));
    }

    #[test]
    fn test_release_clamps_at_zero() {
        let mut c = counters(10, 4);

        assert_eq!(c.release(6), 4);
        assert_eq!(c.reserved_quantity, 0);
        assert_eq!(c.available(), 10);
    }

    #[test]
    fn test_commit_requires_matching_reservation() {
        let mut c = counters(10, 2);

        let err = c.commit(5).unwrap_err();
        assert!(matches!(
            err,
            merx_core::EngineError::ReservedMismatch {
                requested: 5,
                reserved: 2
            }
        ));
        assert_eq!(c, counters(10, 2));
    }

    #[test]
    fn test_invariant_holds_through_mixed_operations() {
        let mut c = counters(50, 0);

        c.reserve(20).unwrap();
        assert_eq!(c.release(5), 5);
        c.commit(10).unwrap();
        c.reserve(3).unwrap();

        assert!(c.reserved_quantity >= 0);
        assert!(c.reserved_quantity <= c.stock_quantity);
        assert!(c.available() >= 0);
    }

    // Two carts race for more units than exist; serialized on a per-variant
    // lock, exactly one wins and the loser sees InsufficientStock.
    #[tokio::test]
    async fn test_concurrent_reserves_admit_one_winner() {
        let shared = Arc::new(tokio::sync::Mutex::new(counters(10, 0)));

        let a = {
            let shared = shared.clone();
            tokio::spawn(async move { shared.lock().await.reserve(7) })
        };
        let b = {
            let shared = shared.clone();
            tokio::spawn(async move { shared.lock().await.reserve(7) })
        };

        let ra = a.await.unwrap();
        let rb = b.await.unwrap();

        assert!(ra.is_ok() != rb.is_ok());
        let final_state = shared.lock().await;
        assert_eq!(final_state.reserved_quantity, 7);
        assert_eq!(final_state.available(), 3);
    }
}
