use uuid::Uuid;

/// Failure taxonomy shared by every mutating flow of the engine.
///
/// Each mutating sequence runs as a single transaction; returning any of
/// these rolls the whole transaction back, so counters and reservation rows
/// are never left partially updated.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("Reserved quantity mismatch: requested {requested}, reserved {reserved}")]
    ReservedMismatch { requested: i64, reserved: i64 },

    #[error("Reservation expired for variant {variant_id}")]
    ReservationExpired { variant_id: Uuid },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Storage error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
