pub mod finalizer;
pub mod models;

pub use finalizer::{CheckoutFinalizer, CheckoutReceipt};
pub use models::{Order, OrderLine};
