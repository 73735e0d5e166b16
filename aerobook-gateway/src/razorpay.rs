use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use aerobook_core::gateway::{GatewayOrder, GatewayRefund, PaymentGateway};
use aerobook_core::{EngineError, EngineResult};

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// HTTP client for the Razorpay Orders and Refunds APIs.
/// Authenticates with basic auth (key id / key secret).
pub struct RazorpayGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self::with_base_url(key_id, key_secret, RAZORPAY_API_BASE)
    }

    pub fn with_base_url(
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }

    async fn post_json(&self, url: String, body: serde_json::Value) -> EngineResult<serde_json::Value> {
        let resp = self
            .client
            .post(url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Gateway(format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| EngineError::Gateway(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(EngineError::Gateway(format!(
                "provider returned {}: {}",
                status.as_u16(),
                text
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| EngineError::Gateway(format!("invalid provider response: {e}; body={text}")))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> EngineResult<GatewayOrder> {
        let body = json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": receipt,
            "payment_capture": 1,
        });

        let raw = self.post_json(format!("{}/orders", self.base_url), body).await?;
        let order_id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::Gateway("order response missing id".to_string()))?
            .to_string();

        info!("Created provider order {} for receipt {}", order_id, receipt);
        Ok(GatewayOrder { order_id, raw })
    }

    async fn create_refund(
        &self,
        provider_payment_id: &str,
        amount_minor: i64,
        receipt: &str,
    ) -> EngineResult<GatewayRefund> {
        let body = json!({
            "amount": amount_minor,
            "speed": "normal",
            "notes": { "bookingRef": receipt },
        });

        let raw = self
            .post_json(
                format!("{}/payments/{}/refund", self.base_url, provider_payment_id),
                body,
            )
            .await?;
        let refund_id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::Gateway("refund response missing id".to_string()))?
            .to_string();

        info!("Created provider refund {} for payment {}", refund_id, provider_payment_id);
        Ok(GatewayRefund { refund_id, raw })
    }
}
