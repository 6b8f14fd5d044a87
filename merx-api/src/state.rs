use merx_cart::ReservationManager;
use merx_order::CheckoutFinalizer;
use merx_store::DbClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbClient>,
    pub reservations: Arc<ReservationManager>,
    pub checkout: Arc<CheckoutFinalizer>,
}

impl AppState {
    pub fn new(db: DbClient) -> Self {
        Self {
            db: Arc::new(db.clone()),
            reservations: Arc::new(ReservationManager::new(db.clone())),
            checkout: Arc::new(CheckoutFinalizer::new(db)),
        }
    }
}
