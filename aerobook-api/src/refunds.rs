use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use aerobook_core::models::RefundTransaction;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefundView {
    id: Uuid,
    booking_ref: String,
    provider_payment_id: String,
    provider_refund_id: Option<String>,
    amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl RefundView {
    fn from_transaction(booking_ref: String, rt: RefundTransaction) -> Self {
        Self {
            id: rt.id,
            booking_ref,
            provider_payment_id: rt.provider_payment_id,
            provider_refund_id: rt.provider_refund_id,
            amount: rt.amount,
            status: rt.status.to_string(),
            created_at: rt.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/refunds/initiate/{booking_ref}", post(initiate_refund))
}

/// POST /api/refunds/initiate/{booking_ref}
/// Start a refund for a paid booking. Idempotent: while a refund is in
/// flight, repeated calls return it instead of asking the provider again.
async fn initiate_refund(
    State(state): State<AppState>,
    Path(booking_ref): Path<String>,
) -> Result<Json<RefundView>, AppError> {
    let refund = state.refunds.initiate(&booking_ref).await?;

    info!("Refund {} for booking {} is {}", refund.id, booking_ref, refund.status);
    Ok(Json(RefundView::from_transaction(booking_ref, refund)))
}
