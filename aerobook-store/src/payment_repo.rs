use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Postgres;
use uuid::Uuid;

use aerobook_core::models::{Payment, PaymentState};

const PAYMENT_COLUMNS: &str = "id, booking_id, provider, provider_order_id, provider_payment_id, \
     amount, currency, status, provider_response, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    provider: String,
    provider_order_id: String,
    provider_payment_id: Option<String>,
    amount: Decimal,
    currency: String,
    status: String,
    provider_response: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> Result<Payment, sqlx::Error> {
        let status = PaymentState::parse(&self.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown payment status: {}", self.status).into())
        })?;
        Ok(Payment {
            id: self.id,
            booking_id: self.booking_id,
            provider: self.provider,
            provider_order_id: self.provider_order_id,
            provider_payment_id: self.provider_payment_id,
            amount: self.amount,
            currency: self.currency,
            status,
            provider_response: self.provider_response,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct PaymentRepository;

impl PaymentRepository {
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        payment: &Payment,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, provider, provider_order_id, provider_payment_id,
                                  amount, currency, status, provider_response, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(&payment.provider)
        .bind(&payment.provider_order_id)
        .bind(&payment.provider_payment_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(&payment.provider_response)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_by_order_id(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        provider_order_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE provider_order_id = $1"
        ))
        .bind(provider_order_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(PaymentRow::into_payment).transpose()
    }

    pub async fn find_by_booking_id(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(PaymentRow::into_payment).transpose()
    }

    /// Settle the payment as SUCCESS. The status predicate makes concurrent
    /// duplicate deliveries race safely: exactly one caller sees a row
    /// updated, the rest see the already-terminal row and must not re-apply
    /// booking or seat changes.
    pub async fn mark_success(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        payment_id: Uuid,
        provider_payment_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $1, provider_payment_id = $2, updated_at = $3
            WHERE id = $4 AND status = 'INITIATED'
            "#,
        )
        .bind(PaymentState::Success.as_str())
        .bind(provider_payment_id)
        .bind(Utc::now())
        .bind(payment_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the failure and fold the provider's reason into the audit blob.
    /// Guarded like `mark_success`.
    pub async fn mark_failed(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        payment_id: Uuid,
        provider_payment_id: Option<&str>,
        detail: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $1,
                provider_payment_id = COALESCE($2, provider_payment_id),
                provider_response = provider_response || $3,
                updated_at = $4
            WHERE id = $5 AND status = 'INITIATED'
            "#,
        )
        .bind(PaymentState::Failed.as_str())
        .bind(provider_payment_id)
        .bind(detail)
        .bind(Utc::now())
        .bind(payment_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
