pub mod app_config;
pub mod cart_repo;
pub mod database;
pub mod events;
pub mod order_repo;
pub mod reservation_repo;
pub mod rule_repo;
pub mod variant_repo;

pub use database::DbClient;
pub use events::EventLog;
