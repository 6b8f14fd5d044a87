use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use merx_core::EngineError;
use serde_json::json;

#[derive(Debug)]
pub struct AppError(pub EngineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self.0 {
            EngineError::Validation(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            EngineError::InsufficientStock { .. } | EngineError::ReservedMismatch { .. } => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            EngineError::ReservationExpired { .. } => (StatusCode::GONE, self.0.to_string()),
            EngineError::EmptyCart => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::Database(e) => {
                tracing::error!("Internal Server Error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}
