use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use aerobook_core::models::{Flight, FlightStatus};

const FLIGHT_COLUMNS: &str = "id, flight_number, airline, origin, destination, departure_time, \
     arrival_time, total_seats, remaining_seats, base_fare, status, created_at, updated_at";

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct FlightRow {
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
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FlightRow {
    fn into_flight(self) -> Result<Flight, sqlx::Error> {
        let status = FlightStatus::parse(&self.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown flight status: {}", self.status).into())
        })?;
        Ok(Flight {
            id: self.id,
            flight_number: self.flight_number,
            airline: self.airline,
            origin: self.origin,
            destination: self.destination,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            total_seats: self.total_seats,
            remaining_seats: self.remaining_seats,
            base_fare: self.base_fare,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct FlightRepository;

impl FlightRepository {
    /// Lock the flight row until the surrounding transaction ends. Every
    /// seat-count change must go through this lock.
    pub async fn find_for_update(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        flight_id: Uuid,
    ) -> Result<Option<Flight>, sqlx::Error> {
        let row: Option<FlightRow> = sqlx::query_as(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = $1 FOR UPDATE"
        ))
        .bind(flight_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(FlightRow::into_flight).transpose()
    }

    pub async fn find_by_id(pool: &PgPool, flight_id: Uuid) -> Result<Option<Flight>, sqlx::Error> {
        let row: Option<FlightRow> =
            sqlx::query_as(&format!("SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = $1"))
                .bind(flight_id)
                .fetch_optional(pool)
                .await?;

        row.map(FlightRow::into_flight).transpose()
    }

    /// Upcoming sellable flights, optionally narrowed by route endpoints.
    pub async fn list_scheduled(
        pool: &PgPool,
        origin: Option<&str>,
        destination: Option<&str>,
    ) -> Result<Vec<Flight>, sqlx::Error> {
        let rows: Vec<FlightRow> = sqlx::query_as(&format!(
            r#"
            SELECT {FLIGHT_COLUMNS} FROM flights
            WHERE status = 'SCHEDULED'
              AND departure_time > NOW()
              AND ($1::text IS NULL OR origin = $1)
              AND ($2::text IS NULL OR destination = $2)
            ORDER BY departure_time ASC
            "#
        ))
        .bind(origin)
        .bind(destination)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(FlightRow::into_flight).collect()
    }

    pub async fn update_remaining_seats(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        flight_id: Uuid,
        remaining_seats: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE flights SET remaining_seats = $1, updated_at = $2 WHERE id = $3")
            .bind(remaining_seats)
            .bind(Utc::now())
            .bind(flight_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
