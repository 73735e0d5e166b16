pub mod booking;
pub mod ledger;
pub mod refund;

pub use booking::BookingService;
pub use ledger::{OrderDescriptor, PaymentLedger};
pub use refund::RefundService;

use aerobook_core::EngineError;

pub(crate) fn db_err(e: sqlx::Error) -> EngineError {
    EngineError::Database(e.to_string())
}
