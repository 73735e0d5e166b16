use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use aerobook_core::EngineError;

#[derive(Debug)]
pub enum AppError {
    Engine(EngineError),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Engine(EngineError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            AppError::Engine(EngineError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            AppError::Engine(EngineError::StateConflict(msg)) => (StatusCode::CONFLICT, msg),
            AppError::Engine(err @ EngineError::CapacityExceeded { .. }) => {
                (StatusCode::CONFLICT, err.to_string())
            }
            AppError::Engine(EngineError::InvalidSignature) => {
                (StatusCode::BAD_REQUEST, "Invalid signature".to_string())
            }
            AppError::Engine(EngineError::Gateway(msg)) => {
                tracing::error!("Payment gateway error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment provider unavailable".to_string())
            }
            AppError::Engine(EngineError::Database(msg)) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
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
        Self::Engine(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
