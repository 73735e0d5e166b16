use std::sync::Arc;

use aerobook_gateway::WebhookVerifier;
use aerobook_settlement::{BookingService, PaymentLedger, RefundService};
use aerobook_store::DbClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbClient>,
    pub bookings: Arc<BookingService>,
    pub ledger: Arc<PaymentLedger>,
    pub refunds: Arc<RefundService>,
    pub verifier: WebhookVerifier,
    pub auth: AuthConfig,
}
