use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};

use aerobook_core::gateway::PaymentGateway;
use aerobook_core::models::{Booking, BookingStatus, RefundState, RefundTransaction};
use aerobook_core::money::to_minor_units;
use aerobook_core::policy::{refund_amount, refund_fraction};
use aerobook_core::{EngineError, EngineResult};
use aerobook_store::{BookingRepository, FlightRepository, PaymentRepository, RefundRepository};

use crate::db_err;

enum Prepared {
    Existing(RefundTransaction),
    Fresh(Booking, RefundTransaction),
}

/// Runs the refund lifecycle: policy evaluation, provider calls and the
/// webhook-driven settlement that hands seats back to the flight.
pub struct RefundService {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
}

impl RefundService {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }

    /// Start a refund for a booking. Repeated calls while an attempt is
    /// INITIATED, PROCESSING or already SUCCESS return that attempt without
    /// another provider call; only a FAILED attempt frees the booking for a
    /// retry.
    pub async fn initiate(&self, booking_ref: &str) -> EngineResult<RefundTransaction> {
        // Phase 1: eligibility, policy amount, and a committed INITIATED row.
        // Committing before the provider call pins the idempotency marker
        // even if the process dies mid-request.
        let (booking, mut refund) = match self.prepare(booking_ref).await? {
            Prepared::Existing(existing) => return Ok(existing),
            Prepared::Fresh(booking, refund) => (booking, refund),
        };

        // Phase 2: ask the provider, then record the outcome in a second
        // transaction.
        let amount_minor = to_minor_units(refund.amount)?;
        match self
            .gateway
            .create_refund(&refund.provider_payment_id, amount_minor, booking_ref)
            .await
        {
            Ok(ack) => {
                let mut tx = self.pool.begin().await.map_err(db_err)?;
                RefundRepository::mark_processing(&mut tx, refund.id, &ack.refund_id, &ack.raw)
                    .await
                    .map_err(db_err)?;

                let mut current = BookingRepository::find_by_id(&mut tx, booking.id)
                    .await
                    .map_err(db_err)?
                    .ok_or_else(|| EngineError::NotFound(format!("booking {}", booking.id)))?;
                if current.status == BookingStatus::Confirmed {
                    current.transition(BookingStatus::Cancelled)?;
                    BookingRepository::update_status(
                        &mut tx,
                        current.id,
                        &current.status,
                        &current.payment_status,
                    )
                    .await
                    .map_err(db_err)?;
                }
                tx.commit().await.map_err(db_err)?;

                info!(
                    "Refund {} accepted by provider as {} for booking {}",
                    refund.id, ack.refund_id, booking_ref
                );
                refund.status = RefundState::Processing;
                refund.provider_refund_id = Some(ack.refund_id);
                refund.provider_response = ack.raw;
                refund.updated_at = Utc::now();
                Ok(refund)
            }
            Err(err) => {
                // Provider said no: keep the FAILED attempt for audit and
                // leave the booking untouched.
                let mut tx = self.pool.begin().await.map_err(db_err)?;
                RefundRepository::set_status(
                    &mut tx,
                    refund.id,
                    &RefundState::Failed,
                    &json!({ "error": err.to_string() }),
                )
                .await
                .map_err(db_err)?;
                tx.commit().await.map_err(db_err)?;

                warn!("Provider refund failed for booking {}: {}", booking_ref, err);
                Err(err)
            }
        }
    }

    async fn prepare(&self, booking_ref: &str) -> EngineResult<Prepared> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let booking = BookingRepository::find_by_ref(&mut tx, booking_ref)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {}", booking_ref)))?;

        if !matches!(&booking.status, BookingStatus::Confirmed | BookingStatus::Cancelled) {
            return Err(EngineError::StateConflict(format!(
                "booking {} is {} and not eligible for a refund",
                booking_ref, booking.status
            )));
        }

        if let Some(existing) = RefundRepository::find_active_by_booking(&mut tx, booking.id)
            .await
            .map_err(db_err)?
        {
            info!(
                "Refund already {} for booking {}, returning it",
                existing.status, booking_ref
            );
            return Ok(Prepared::Existing(existing));
        }

        let payment = PaymentRepository::find_by_booking_id(&mut tx, booking.id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| {
                EngineError::StateConflict(format!("no payment recorded for booking {}", booking_ref))
            })?;
        let provider_payment_id = payment.provider_payment_id.ok_or_else(|| {
            EngineError::StateConflict(format!(
                "payment for booking {} was never captured",
                booking_ref
            ))
        })?;

        let flight = FlightRepository::find_by_id(&self.pool, booking.flight_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("flight {}", booking.flight_id)))?;

        let fraction = refund_fraction(flight.departure_time, Utc::now());
        if fraction <= Decimal::ZERO {
            return Err(EngineError::StateConflict(format!(
                "booking {} is past the refund window",
                booking_ref
            )));
        }
        let amount = refund_amount(booking.total_fare, fraction);

        let refund = RefundTransaction::new(booking.id, provider_payment_id, amount);
        RefundRepository::insert(&mut tx, &refund).await.map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!(
            "Refund {} initiated for booking {}: {} of {} ({}%)",
            refund.id,
            booking_ref,
            amount,
            booking.total_fare,
            fraction * Decimal::ONE_HUNDRED
        );
        Ok(Prepared::Fresh(booking, refund))
    }

    /// Apply a provider verdict for a refund. Unknown refund ids are logged
    /// and dropped so replayed or foreign events never error. On success the
    /// booking becomes REFUNDED and its seats return to the flight, once.
    pub async fn handle_webhook(
        &self,
        provider_refund_id: &str,
        payload: &serde_json::Value,
        success: bool,
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let refund = match RefundRepository::find_by_provider_refund_id(&mut tx, provider_refund_id)
            .await
            .map_err(db_err)?
        {
            Some(r) => r,
            None => {
                warn!("Refund webhook for unknown provider refund {}, ignoring", provider_refund_id);
                return Ok(());
            }
        };

        // Verdicts are terminal. A replay, or a contradictory later event,
        // must not move the refund or touch seats again.
        if matches!(refund.status, RefundState::Success | RefundState::Failed) {
            info!(
                "Refund {} already {}, skipping webhook",
                provider_refund_id, refund.status
            );
            return Ok(());
        }

        if !success {
            RefundRepository::set_status(&mut tx, refund.id, &RefundState::Failed, payload)
                .await
                .map_err(db_err)?;
            tx.commit().await.map_err(db_err)?;
            warn!("Refund {} failed at provider", provider_refund_id);
            return Ok(());
        }

        RefundRepository::set_status(&mut tx, refund.id, &RefundState::Success, payload)
            .await
            .map_err(db_err)?;

        let mut booking = BookingRepository::find_by_id(&mut tx, refund.booking_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {}", refund.booking_id)))?;

        // Seats go back exactly once, keyed on the booking's move to REFUNDED
        if booking.status != BookingStatus::Refunded {
            booking.transition(BookingStatus::Refunded)?;
            BookingRepository::update_status(&mut tx, booking.id, &booking.status, &booking.payment_status)
                .await
                .map_err(db_err)?;

            let flight = FlightRepository::find_for_update(&mut tx, booking.flight_id)
                .await
                .map_err(db_err)?
                .ok_or_else(|| EngineError::NotFound(format!("flight {}", booking.flight_id)))?;
            FlightRepository::update_remaining_seats(
                &mut tx,
                flight.id,
                flight.remaining_seats + booking.seat_count,
            )
            .await
            .map_err(db_err)?;

            info!(
                "Restored {} seat(s) to flight {} after refund {}",
                booking.seat_count, flight.flight_number, provider_refund_id
            );
        }

        tx.commit().await.map_err(db_err)?;
        info!("Refund {} settled for booking {}", provider_refund_id, booking.booking_ref);
        Ok(())
    }
}
