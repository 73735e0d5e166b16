use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use aerobook_core::models::{Booking, BookingStatus, FlightStatus, PaymentState};
use aerobook_core::{EngineError, EngineResult};
use aerobook_store::{BookingRepository, FlightRepository, UserRepository};

use crate::db_err;

/// Creates and transitions bookings. Seat counts only ever change inside a
/// transaction that holds the flight row lock.
pub struct BookingService {
    pool: PgPool,
}

impl BookingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically take seats from a flight and record a PENDING booking.
    pub async fn reserve(
        &self,
        username: &str,
        flight_id: Uuid,
        seat_count: i32,
    ) -> EngineResult<Booking> {
        // 1. Reject bad input before touching the database
        if seat_count <= 0 {
            return Err(EngineError::Validation("seatCount must be > 0".to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // 2. Resolve the traveller
        let user = UserRepository::find_by_username(&mut tx, username)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("user {}", username)))?;

        // 3. Lock the flight row; concurrent reservations queue up here
        let flight = FlightRepository::find_for_update(&mut tx, flight_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("flight {}", flight_id)))?;

        if flight.status != FlightStatus::Scheduled {
            return Err(EngineError::StateConflict(format!(
                "flight {} is not open for booking ({})",
                flight.flight_number, flight.status
            )));
        }

        // 4. Capacity check under the lock
        if flight.remaining_seats < seat_count {
            return Err(EngineError::CapacityExceeded {
                requested: seat_count,
                available: flight.remaining_seats,
            });
        }

        // 5. Decrement seats and create the booking in the same transaction
        FlightRepository::update_remaining_seats(
            &mut tx,
            flight.id,
            flight.remaining_seats - seat_count,
        )
        .await
        .map_err(db_err)?;

        let booking = Booking::new(user.id, flight.id, seat_count, flight.base_fare);
        BookingRepository::insert(&mut tx, &booking).await.map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        info!(
            "Reserved {} seat(s) on flight {} as booking {}",
            seat_count, flight.flight_number, booking.booking_ref
        );
        Ok(booking)
    }

    /// Direct confirmation path, normally superseded by the payment webhook.
    pub async fn confirm(&self, booking_ref: &str) -> EngineResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let mut booking = BookingRepository::find_by_ref(&mut tx, booking_ref)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {}", booking_ref)))?;

        // Only a PENDING booking can be confirmed
        booking.transition(BookingStatus::Confirmed)?;
        booking.payment_status = PaymentState::Success;

        BookingRepository::update_status(&mut tx, booking.id, &booking.status, &booking.payment_status)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!("Booking confirmed: {}", booking.booking_ref);
        Ok(booking)
    }

    pub async fn find_by_ref(&self, booking_ref: &str) -> EngineResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let booking = BookingRepository::find_by_ref(&mut tx, booking_ref)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {}", booking_ref)))?;
        Ok(booking)
    }
}
