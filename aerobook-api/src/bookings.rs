use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use aerobook_core::models::Booking;

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub flight_id: Uuid,
    pub seat_count: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingView {
    booking_ref: String,
    flight_id: Uuid,
    seat_count: i32,
    total_fare: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        Self {
            booking_ref: b.booking_ref,
            flight_id: b.flight_id,
            seat_count: b.seat_count,
            total_fare: b.total_fare,
            status: b.status.to_string(),
            created_at: b.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking))
        .route("/api/bookings/{booking_ref}", get(get_booking))
        .route("/api/bookings/{booking_ref}/confirm", post(confirm_booking))
}

/// POST /api/bookings
/// Reserve seats: creates a PENDING booking and takes the seats off the
/// flight under its row lock.
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state
        .bookings
        .reserve(&claims.sub, req.flight_id, req.seat_count)
        .await?;

    info!("Booking {} created for {}", booking.booking_ref, claims.sub);
    Ok(Json(booking.into()))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(booking_ref): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state.bookings.find_by_ref(&booking_ref).await?;
    Ok(Json(booking.into()))
}

/// POST /api/bookings/{booking_ref}/confirm
/// Directly confirm a PENDING booking, bypassing the payment provider.
/// Kept for manual settlement; the webhook flow is the normal path.
async fn confirm_booking(
    State(state): State<AppState>,
    Path(booking_ref): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state.bookings.confirm(&booking_ref).await?;
    Ok(Json(booking.into()))
}
