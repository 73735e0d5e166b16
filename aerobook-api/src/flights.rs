use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aerobook_core::models::Flight;
use aerobook_core::EngineError;
use aerobook_store::FlightRepository;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FlightQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlightView {
    id: Uuid,
    flight_number: String,
    airline: String,
    origin: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    total_seats: i32,
    remaining_seats: i32,
    base_fare: Decimal,
    status: String,
}

impl From<Flight> for FlightView {
    fn from(f: Flight) -> Self {
        Self {
            id: f.id,
            flight_number: f.flight_number,
            airline: f.airline,
            origin: f.origin,
            destination: f.destination,
            departure_time: f.departure_time,
            arrival_time: f.arrival_time,
            total_seats: f.total_seats,
            remaining_seats: f.remaining_seats,
            base_fare: f.base_fare,
            status: f.status.to_string(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/flights", get(list_flights))
        .route("/api/flights/{flight_id}", get(get_flight))
}

/// GET /api/flights?origin=DEL&destination=BOM
/// Upcoming bookable flights, optionally narrowed to a route.
async fn list_flights(
    State(state): State<AppState>,
    Query(query): Query<FlightQuery>,
) -> Result<Json<Vec<FlightView>>, AppError> {
    let flights = FlightRepository::list_scheduled(
        &state.db.pool,
        query.origin.as_deref(),
        query.destination.as_deref(),
    )
    .await
    .map_err(|e| EngineError::Database(e.to_string()))?;

    Ok(Json(flights.into_iter().map(FlightView::from).collect()))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<FlightView>, AppError> {
    let flight = FlightRepository::find_by_id(&state.db.pool, flight_id)
        .await
        .map_err(|e| EngineError::Database(e.to_string()))?
        .ok_or_else(|| EngineError::NotFound(format!("flight {}", flight_id)))?;

    Ok(Json(flight.into()))
}
