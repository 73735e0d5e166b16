use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::Value;

use aerobook_core::EngineError;

use crate::error::AppError;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

#[derive(Debug, Deserialize)]
pub struct RazorpayWebhook {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<EntityWrapper<PaymentEntity>>,
    pub refund: Option<EntityWrapper<RefundEntity>>,
}

#[derive(Debug, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    pub order_id: String,
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefundEntity {
    pub id: String,
    pub status: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/payments/webhook", post(handle_payment_webhook))
}

/// POST /api/payments/webhook
/// Receive payment and refund updates from Razorpay. The raw body is
/// authenticated against the webhook secret before anything is parsed.
async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(EngineError::InvalidSignature)?;
    state.verifier.verify(&body, signature)?;

    let raw: Value = serde_json::from_slice(&body)
        .map_err(|e| EngineError::Validation(format!("Malformed webhook body: {}", e)))?;
    let event: RazorpayWebhook = serde_json::from_value(raw.clone())
        .map_err(|e| EngineError::Validation(format!("Malformed webhook body: {}", e)))?;

    tracing::info!("Received provider webhook: {}", event.event);

    match event.event.as_str() {
        "payment.captured" => {
            let payment = required_payment(event.payload.payment)?;
            match state.ledger.mark_success(&payment.order_id, &payment.id).await {
                Ok(()) => {}
                // a capture for an order we never issued must not make the
                // provider retry forever
                Err(EngineError::NotFound(msg)) => {
                    tracing::warn!("Capture webhook for unknown order: {}", msg);
                }
                Err(e) => return Err(e.into()),
            }
        }
        "payment.failed" => {
            let payment = required_payment(event.payload.payment)?;
            let reason = payment.error_description.as_deref().unwrap_or("Unknown error");
            match state
                .ledger
                .mark_failed(&payment.order_id, Some(&payment.id), reason)
                .await
            {
                Ok(()) => {}
                Err(EngineError::NotFound(msg)) => {
                    tracing::warn!("Failure webhook for unknown order: {}", msg);
                }
                Err(e) => return Err(e.into()),
            }
        }
        "refund.processed" | "refund.updated" => {
            let refund = event
                .payload
                .refund
                .ok_or_else(|| EngineError::Validation("Webhook missing refund entity".to_string()))?
                .entity;
            let success = refund_settled(refund.status.as_deref());
            state.refunds.handle_webhook(&refund.id, &raw, success).await?;
        }
        other => {
            tracing::info!("Unhandled webhook event type: {}", other);
        }
    }

    Ok(StatusCode::OK)
}

fn required_payment(
    wrapper: Option<EntityWrapper<PaymentEntity>>,
) -> Result<PaymentEntity, EngineError> {
    wrapper
        .map(|w| w.entity)
        .ok_or_else(|| EngineError::Validation("Webhook missing payment entity".to_string()))
}

/// Razorpay marks settled refunds "processed"; a refund event without a
/// status field means the same thing.
fn refund_settled(status: Option<&str>) -> bool {
    match status {
        Some(s) => s.eq_ignore_ascii_case("processed") || s.eq_ignore_ascii_case("success"),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capture_envelope_parses() {
        let body = json!({
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_29QQoUBi66xm2f",
                        "order_id": "order_9A33XWu170gUtm",
                        "status": "captured",
                        "amount": 100000,
                        "currency": "INR"
                    }
                }
            }
        });

        let event: RazorpayWebhook = serde_json::from_value(body).expect("parse");
        assert_eq!(event.event, "payment.captured");
        let payment = event.payload.payment.expect("payment entity").entity;
        assert_eq!(payment.id, "pay_29QQoUBi66xm2f");
        assert_eq!(payment.order_id, "order_9A33XWu170gUtm");
        assert!(payment.error_description.is_none());
    }

    #[test]
    fn test_failure_envelope_carries_reason() {
        let body = json!({
            "event": "payment.failed",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_29QQoUBi66xm2f",
                        "order_id": "order_9A33XWu170gUtm",
                        "error_description": "Card issuer declined the transaction"
                    }
                }
            }
        });

        let event: RazorpayWebhook = serde_json::from_value(body).expect("parse");
        let payment = event.payload.payment.expect("payment entity").entity;
        assert_eq!(
            payment.error_description.as_deref(),
            Some("Card issuer declined the transaction")
        );
    }

    #[test]
    fn test_refund_envelope_without_status() {
        let body = json!({
            "event": "refund.processed",
            "payload": {
                "refund": {
                    "entity": {
                        "id": "rfnd_FP8QHiV938haTz",
                        "amount": 90000
                    }
                }
            }
        });

        let event: RazorpayWebhook = serde_json::from_value(body).expect("parse");
        let refund = event.payload.refund.expect("refund entity").entity;
        assert_eq!(refund.id, "rfnd_FP8QHiV938haTz");
        assert!(refund.status.is_none());
    }

    #[test]
    fn test_unknown_event_parses_with_empty_payload() {
        let body = json!({ "event": "order.paid" });

        let event: RazorpayWebhook = serde_json::from_value(body).expect("parse");
        assert_eq!(event.event, "order.paid");
        assert!(event.payload.payment.is_none());
        assert!(event.payload.refund.is_none());
    }

    #[test]
    fn test_refund_settled_matrix() {
        assert!(refund_settled(None));
        assert!(refund_settled(Some("processed")));
        assert!(refund_settled(Some("PROCESSED")));
        assert!(refund_settled(Some("success")));
        assert!(!refund_settled(Some("failed")));
        assert!(!refund_settled(Some("pending")));
    }
}
