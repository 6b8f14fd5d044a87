use merx_cart::Reclaimer;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

/// Periodic expiry sweep. Runs until the process exits; a failed sweep is
/// logged and retried on the next tick, so expired holds linger at most one
/// extra interval.
pub async fn start_reclaim_worker(reclaimer: Arc<Reclaimer>, sweep_interval_seconds: u64) {
    let mut ticker = interval(Duration::from_secs(sweep_interval_seconds));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Reclaim worker started, sweeping every {}s",
        sweep_interval_seconds
    );

    loop {
        ticker.tick().await;
        match reclaimer.sweep().await {
            Ok(0) => {}
            Ok(reclaimed) => {
                info!(reclaimed, "Expired reservations returned to the pool");
            }
            Err(e) => error!("Reclaim sweep failed: {}", e),
        }
    }
}
