use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::EngineResult;

/// Provider acknowledgment for a freshly issued payment order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String, // Provider's ID (e.g., order_LXxG7uTtHjA1Zr)
    pub raw: serde_json::Value,
}

/// Provider acknowledgment for an accepted refund request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    pub refund_id: String, // Provider's ID (e.g., rfnd_M0aB3cDeFgHiJk)
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment order with the provider
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> EngineResult<GatewayOrder>;

    /// Request a refund against a captured payment
    async fn create_refund(
        &self,
        provider_payment_id: &str,
        amount_minor: i64,
        receipt: &str,
    ) -> EngineResult<GatewayRefund>;
}
