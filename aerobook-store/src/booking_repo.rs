use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Postgres;
use uuid::Uuid;

use aerobook_core::models::{Booking, BookingStatus, PaymentState};

const BOOKING_COLUMNS: &str = "id, booking_ref, user_id, flight_id, seat_count, fare_per_seat, \
     total_fare, status, payment_status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_ref: String,
    user_id: Uuid,
    flight_id: Uuid,
    seat_count: i32,
    fare_per_seat: Decimal,
    total_fare: Decimal,
    status: String,
    payment_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, sqlx::Error> {
        let status = BookingStatus::parse(&self.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown booking status: {}", self.status).into())
        })?;
        let payment_status = PaymentState::parse(&self.payment_status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown payment status: {}", self.payment_status).into())
        })?;
        Ok(Booking {
            id: self.id,
            booking_ref: self.booking_ref,
            user_id: self.user_id,
            flight_id: self.flight_id,
            seat_count: self.seat_count,
            fare_per_seat: self.fare_per_seat,
            total_fare: self.total_fare,
            status,
            payment_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct BookingRepository;

impl BookingRepository {
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        booking: &Booking,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, booking_ref, user_id, flight_id, seat_count, fare_per_seat,
                                  total_fare, status, payment_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_ref)
        .bind(booking.user_id)
        .bind(booking.flight_id)
        .bind(booking.seat_count)
        .bind(booking.fare_per_seat)
        .bind(booking.total_fare)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_by_ref(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        booking_ref: &str,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_ref = $1"
        ))
        .bind(booking_ref)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    pub async fn find_by_id(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    /// Persist both lifecycle fields together so they never drift apart.
    pub async fn update_status(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        booking_id: Uuid,
        status: &BookingStatus,
        payment_status: &PaymentState,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bookings SET status = $1, payment_status = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(status.as_str())
        .bind(payment_status.as_str())
        .bind(Utc::now())
        .bind(booking_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
