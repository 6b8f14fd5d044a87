pub mod expiry;
pub mod manager;
pub mod models;

pub use expiry::Reclaimer;
pub use manager::ReservationManager;
pub use models::{PriceSnapshot, Reservation};
