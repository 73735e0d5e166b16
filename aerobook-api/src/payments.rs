use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use aerobook_settlement::OrderDescriptor;

use crate::error::AppError;
use crate::state::AppState;

/// What the checkout frontend needs to open the provider's payment modal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderView {
    provider_order_id: String,
    amount_minor_units: i64,
    currency: String,
    public_key: String,
    booking_ref: String,
}

impl From<OrderDescriptor> for OrderView {
    fn from(o: OrderDescriptor) -> Self {
        Self {
            provider_order_id: o.provider_order_id,
            amount_minor_units: o.amount_minor,
            currency: o.currency,
            public_key: o.key_id,
            booking_ref: o.booking_ref,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/payments/create/{booking_ref}", post(create_order))
}

/// POST /api/payments/create/{booking_ref}
/// Issue a provider order for the booking's total fare. Repeating the call
/// while the order is still open returns the same order.
async fn create_order(
    State(state): State<AppState>,
    Path(booking_ref): Path<String>,
) -> Result<Json<OrderView>, AppError> {
    let order = state.ledger.create_order(&booking_ref).await?;

    info!("Payment order {} issued for booking {}", order.provider_order_id, booking_ref);
    Ok(Json(order.into()))
}
