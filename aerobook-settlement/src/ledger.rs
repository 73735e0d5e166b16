use std::sync::Arc;

use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use aerobook_core::gateway::PaymentGateway;
use aerobook_core::models::{BookingStatus, Payment, PaymentState};
use aerobook_core::money::to_minor_units;
use aerobook_core::{EngineError, EngineResult};
use aerobook_store::{BookingRepository, FlightRepository, PaymentRepository};

use crate::db_err;

/// What a client needs to drive the provider checkout for a booking.
#[derive(Debug, Clone)]
pub struct OrderDescriptor {
    pub provider_order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub key_id: String,
    pub booking_ref: String,
}

/// Issues provider payment orders and settles their outcomes. Keeps the
/// local payments table as the source of truth for what was asked of the
/// provider.
pub struct PaymentLedger {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
    key_id: String,
    currency: String,
}

impl PaymentLedger {
    pub fn new(
        pool: PgPool,
        gateway: Arc<dyn PaymentGateway>,
        key_id: String,
        currency: String,
    ) -> Self {
        Self { pool, gateway, key_id, currency }
    }

    /// Create a provider order for a PENDING booking's total fare and record
    /// it locally in the same transaction. Calling this again for the same
    /// booking returns the still-open order instead of issuing a new one.
    pub async fn create_order(&self, booking_ref: &str) -> EngineResult<OrderDescriptor> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let booking = BookingRepository::find_by_ref(&mut tx, booking_ref)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {}", booking_ref)))?;

        // 1. A payment row may already exist for this booking
        if let Some(existing) = PaymentRepository::find_by_booking_id(&mut tx, booking.id)
            .await
            .map_err(db_err)?
        {
            return match existing.status {
                PaymentState::Initiated => {
                    info!(
                        "Reusing open provider order {} for booking {}",
                        existing.provider_order_id, booking_ref
                    );
                    Ok(OrderDescriptor {
                        provider_order_id: existing.provider_order_id,
                        amount_minor: to_minor_units(existing.amount)?,
                        currency: existing.currency,
                        key_id: self.key_id.clone(),
                        booking_ref: booking.booking_ref,
                    })
                }
                PaymentState::Success => Err(EngineError::StateConflict(format!(
                    "booking {} is already paid",
                    booking_ref
                ))),
                PaymentState::Failed => Err(EngineError::StateConflict(format!(
                    "payment for booking {} already failed; book again",
                    booking_ref
                ))),
            };
        }

        // 2. Orders are only issued while the booking awaits payment
        if booking.status != BookingStatus::Pending {
            return Err(EngineError::StateConflict(format!(
                "booking {} is {} and cannot take a payment order",
                booking_ref, booking.status
            )));
        }

        // 3. Ask the provider for an order, then persist it before commit
        let amount_minor = to_minor_units(booking.total_fare)?;
        let order = self
            .gateway
            .create_order(amount_minor, &self.currency, &booking.booking_ref)
            .await?;

        let payment = Payment::new(
            booking.id,
            order.order_id.clone(),
            booking.total_fare,
            self.currency.clone(),
            order.raw,
        );
        PaymentRepository::insert(&mut tx, &payment).await.map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!("Created provider order {} for booking {}", payment.provider_order_id, booking_ref);
        Ok(OrderDescriptor {
            provider_order_id: payment.provider_order_id,
            amount_minor,
            currency: payment.currency,
            key_id: self.key_id.clone(),
            booking_ref: booking.booking_ref,
        })
    }

    /// Settle a captured payment: the payment goes to SUCCESS and the booking
    /// to CONFIRMED. Replayed webhooks are absorbed without a second write.
    pub async fn mark_success(
        &self,
        provider_order_id: &str,
        provider_payment_id: &str,
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let payment = PaymentRepository::find_by_order_id(&mut tx, provider_order_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("order {}", provider_order_id)))?;

        if payment.status.is_terminal() {
            info!(
                "Payment for order {} already {}, skipping",
                provider_order_id, payment.status
            );
            return Ok(());
        }

        let updated = PaymentRepository::mark_success(&mut tx, payment.id, provider_payment_id)
            .await
            .map_err(db_err)?;
        if !updated {
            // lost the race against another delivery of the same event
            info!("Payment for order {} settled concurrently, skipping", provider_order_id);
            return Ok(());
        }

        let mut booking = BookingRepository::find_by_id(&mut tx, payment.booking_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {}", payment.booking_id)))?;

        if booking.status == BookingStatus::Pending {
            booking.transition(BookingStatus::Confirmed)?;
        }
        booking.payment_status = PaymentState::Success;
        BookingRepository::update_status(&mut tx, booking.id, &booking.status, &booking.payment_status)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        info!("Booking {} confirmed by payment {}", booking.booking_ref, provider_payment_id);
        Ok(())
    }

    /// Settle a failed payment: the booking is cancelled and its seats go
    /// back to the flight, under the flight row lock, in one transaction.
    pub async fn mark_failed(
        &self,
        provider_order_id: &str,
        provider_payment_id: Option<&str>,
        reason: &str,
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let payment = PaymentRepository::find_by_order_id(&mut tx, provider_order_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("order {}", provider_order_id)))?;

        if payment.status.is_terminal() {
            info!(
                "Payment for order {} already {}, skipping",
                provider_order_id, payment.status
            );
            return Ok(());
        }

        let updated = PaymentRepository::mark_failed(
            &mut tx,
            payment.id,
            provider_payment_id,
            &json!({ "error_description": reason }),
        )
        .await
        .map_err(db_err)?;
        if !updated {
            info!("Payment for order {} settled concurrently, skipping", provider_order_id);
            return Ok(());
        }

        let mut booking = BookingRepository::find_by_id(&mut tx, payment.booking_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {}", payment.booking_id)))?;

        // exactly-once: the seat restore rides on the INITIATED -> FAILED edge
        booking.transition(BookingStatus::Cancelled)?;

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
            "Restored {} seat(s) to flight {} after payment failure",
            booking.seat_count, flight.flight_number
        );

        booking.payment_status = PaymentState::Failed;
        BookingRepository::update_status(&mut tx, booking.id, &booking.status, &booking.payment_status)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        info!("Booking {} cancelled, reason: {}", booking.booking_ref, reason);
        Ok(())
    }
}
