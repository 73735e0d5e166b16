pub mod gateway;
pub mod models;
pub mod money;
pub mod policy;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("State conflict: {0}")]
    StateConflict(String),
    #[error("Insufficient seats: requested {requested}, available {available}")]
    CapacityExceeded { requested: i32, available: i32 },
    #[error("Payment provider error: {0}")]
    Gateway(String),
    #[error("Webhook signature verification failed")]
    InvalidSignature,
    #[error("Database error: {0}")]
    Database(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
