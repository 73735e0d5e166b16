use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// Flight availability status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    Cancelled,
    Departed,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "SCHEDULED",
            FlightStatus::Cancelled => "CANCELLED",
            FlightStatus::Departed => "DEPARTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SCHEDULED" => Some(FlightStatus::Scheduled),
            "CANCELLED" => Some(FlightStatus::Cancelled),
            "DEPARTED" => Some(FlightStatus::Departed),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking status in the lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            "REFUNDED" => Some(BookingStatus::Refunded),
            _ => None,
        }
    }

    /// The only moves the booking lifecycle allows.
    pub fn can_transition_to(&self, next: &BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, Refunded)
                | (Cancelled, Refunded)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment order status as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Initiated,
    Success,
    Failed,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Initiated => "INITIATED",
            PaymentState::Success => "SUCCESS",
            PaymentState::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INITIATED" => Some(PaymentState::Initiated),
            "SUCCESS" => Some(PaymentState::Success),
            "FAILED" => Some(PaymentState::Failed),
            _ => None,
        }
    }

    /// Terminal states accept no further webhook updates.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentState::Success | PaymentState::Failed)
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refund attempt status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundState {
    Initiated,
    Processing,
    Success,
    Failed,
}

impl RefundState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundState::Initiated => "INITIATED",
            RefundState::Processing => "PROCESSING",
            RefundState::Success => "SUCCESS",
            RefundState::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INITIATED" => Some(RefundState::Initiated),
            "PROCESSING" => Some(RefundState::Processing),
            "SUCCESS" => Some(RefundState::Success),
            "FAILED" => Some(RefundState::Failed),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: &RefundState) -> bool {
        use RefundState::*;
        matches!(
            (self, next),
            (Initiated, Processing)
                | (Initiated, Success)
                | (Initiated, Failed)
                | (Processing, Success)
                | (Processing, Failed)
        )
    }
}

impl std::fmt::Display for RefundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sellable flight with its live seat inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub total_seats: i32,
    pub remaining_seats: i32,
    pub base_fare: Decimal,
    pub status: FlightStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registered traveller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

/// A seat reservation with its fare frozen at creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub booking_ref: String,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub seat_count: i32,
    pub fare_per_seat: Decimal,
    pub total_fare: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(user_id: Uuid, flight_id: Uuid, seat_count: i32, fare_per_seat: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_ref: new_booking_ref(),
            user_id,
            flight_id,
            seat_count,
            fare_per_seat,
            total_fare: fare_per_seat * Decimal::from(seat_count),
            status: BookingStatus::Pending,
            payment_status: PaymentState::Initiated,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the booking to `next`, rejecting transitions the lifecycle forbids.
    pub fn transition(&mut self, next: BookingStatus) -> Result<(), EngineError> {
        if !self.status.can_transition_to(&next) {
            return Err(EngineError::StateConflict(format!(
                "booking {} cannot move from {} to {}",
                self.booking_ref, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// A payment order issued to the provider for a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider: String,
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentState,
    pub provider_response: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        booking_id: Uuid,
        provider_order_id: String,
        amount: Decimal,
        currency: String,
        provider_response: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            provider: "RAZORPAY".to_string(),
            provider_order_id,
            provider_payment_id: None,
            amount,
            currency,
            status: PaymentState::Initiated,
            provider_response,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A refund attempt against a captured payment, kept for audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundTransaction {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider_payment_id: String,
    pub provider_refund_id: Option<String>,
    pub amount: Decimal,
    pub status: RefundState,
    pub provider_response: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefundTransaction {
    pub fn new(booking_id: Uuid, provider_payment_id: String, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            provider_payment_id,
            provider_refund_id: None,
            amount,
            status: RefundState::Initiated,
            provider_response: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Booking reference shown to travellers, e.g. BK-9F3A21C4
pub fn new_booking_ref() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("BK-{}", id[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_booking_lifecycle_transitions() {
        let mut booking = Booking::new(Uuid::new_v4(), Uuid::new_v4(), 2, dec!(500.00));
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_fare, dec!(1000.00));

        // Pending → Confirmed → Refunded
        booking.transition(BookingStatus::Confirmed).unwrap();
        booking.transition(BookingStatus::Refunded).unwrap();
        assert_eq!(booking.status, BookingStatus::Refunded);
    }

    #[test]
    fn test_booking_rejects_illegal_transition() {
        let mut booking = Booking::new(Uuid::new_v4(), Uuid::new_v4(), 1, dec!(100.00));

        // Pending → Refunded skips the paid state and must fail
        let err = booking.transition(BookingStatus::Refunded).unwrap_err();
        assert!(matches!(err, EngineError::StateConflict(_)));
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn test_cancelled_booking_can_still_be_refunded() {
        let mut booking = Booking::new(Uuid::new_v4(), Uuid::new_v4(), 1, dec!(100.00));
        booking.transition(BookingStatus::Confirmed).unwrap();
        booking.transition(BookingStatus::Cancelled).unwrap();
        booking.transition(BookingStatus::Refunded).unwrap();
        assert_eq!(booking.status, BookingStatus::Refunded);
    }

    #[test]
    fn test_payment_terminal_states() {
        assert!(!PaymentState::Initiated.is_terminal());
        assert!(PaymentState::Success.is_terminal());
        assert!(PaymentState::Failed.is_terminal());
    }

    #[test]
    fn test_refund_transitions() {
        assert!(RefundState::Initiated.can_transition_to(&RefundState::Processing));
        assert!(RefundState::Initiated.can_transition_to(&RefundState::Success));
        assert!(RefundState::Processing.can_transition_to(&RefundState::Failed));
        assert!(!RefundState::Success.can_transition_to(&RefundState::Failed));
        assert!(!RefundState::Failed.can_transition_to(&RefundState::Processing));
    }

    #[test]
    fn test_status_round_trips_through_storage_form() {
        assert_eq!(BookingStatus::parse("CONFIRMED"), Some(BookingStatus::Confirmed));
        assert_eq!(BookingStatus::parse("confirmed"), Some(BookingStatus::Confirmed));
        assert_eq!(BookingStatus::parse("UNKNOWN"), None);
        assert_eq!(RefundState::Processing.as_str(), "PROCESSING");
        assert_eq!(FlightStatus::parse("scheduled"), Some(FlightStatus::Scheduled));
    }

    #[test]
    fn test_booking_ref_format() {
        let r = new_booking_ref();
        assert!(r.starts_with("BK-"));
        assert_eq!(r.len(), 11);
        assert!(r[3..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
