use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use aerobook_core::gateway::{GatewayOrder, GatewayRefund, PaymentGateway};
use aerobook_core::{EngineError, EngineResult};

/// In-process stand-in for the provider. Counts calls so tests can assert
/// how many times the network would have been hit.
#[derive(Default)]
pub struct MockGateway {
    pub order_calls: AtomicU32,
    pub refund_calls: AtomicU32,
    fail_orders: AtomicBool,
    fail_refunds: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent order creation fail like a provider outage.
    pub fn fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent refund requests fail like a provider rejection.
    pub fn fail_refunds(&self, fail: bool) {
        self.fail_refunds.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> EngineResult<GatewayOrder> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(EngineError::Gateway("simulated order failure".to_string()));
        }

        let order_id = format!("order_mock{}", Uuid::new_v4().simple());
        Ok(GatewayOrder {
            raw: json!({
                "id": order_id,
                "entity": "order",
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
                "status": "created",
            }),
            order_id,
        })
    }

    async fn create_refund(
        &self,
        provider_payment_id: &str,
        amount_minor: i64,
        receipt: &str,
    ) -> EngineResult<GatewayRefund> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refunds.load(Ordering::SeqCst) {
            return Err(EngineError::Gateway("simulated refund rejection".to_string()));
        }

        let refund_id = format!("rfnd_mock{}", Uuid::new_v4().simple());
        Ok(GatewayRefund {
            raw: json!({
                "id": refund_id,
                "entity": "refund",
                "payment_id": provider_payment_id,
                "amount": amount_minor,
                "notes": { "bookingRef": receipt },
                "status": "pending",
            }),
            refund_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_order_calls() {
        let gateway = MockGateway::new();
        let order = gateway.create_order(100_000, "INR", "BK-TEST0001").await.unwrap();
        assert!(order.order_id.starts_with("order_mock"));
        assert_eq!(order.raw["amount"], 100_000);
        assert_eq!(gateway.order_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mock_refund_failure_still_counts() {
        let gateway = MockGateway::new();
        gateway.fail_refunds(true);
        let err = gateway.create_refund("pay_x", 9000, "BK-TEST0001").await.unwrap_err();
        assert!(matches!(err, EngineError::Gateway(_)));
        assert_eq!(gateway.refund_calls.load(Ordering::SeqCst), 1);
    }
}
