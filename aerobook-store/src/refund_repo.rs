use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Postgres;
use uuid::Uuid;

use aerobook_core::models::{RefundState, RefundTransaction};

const REFUND_COLUMNS: &str = "id, booking_id, provider_payment_id, provider_refund_id, amount, \
     status, provider_response, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct RefundRow {
    id: Uuid,
    booking_id: Uuid,
    provider_payment_id: String,
    provider_refund_id: Option<String>,
    amount: Decimal,
    status: String,
    provider_response: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RefundRow {
    fn into_refund(self) -> Result<RefundTransaction, sqlx::Error> {
        let status = RefundState::parse(&self.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown refund status: {}", self.status).into())
        })?;
        Ok(RefundTransaction {
            id: self.id,
            booking_id: self.booking_id,
            provider_payment_id: self.provider_payment_id,
            provider_refund_id: self.provider_refund_id,
            amount: self.amount,
            status,
            provider_response: self.provider_response,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct RefundRepository;

impl RefundRepository {
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        refund: &RefundTransaction,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO refund_transactions (id, booking_id, provider_payment_id, provider_refund_id,
                                             amount, status, provider_response, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(refund.id)
        .bind(refund.booking_id)
        .bind(&refund.provider_payment_id)
        .bind(&refund.provider_refund_id)
        .bind(refund.amount)
        .bind(refund.status.as_str())
        .bind(&refund.provider_response)
        .bind(refund.created_at)
        .bind(refund.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// The refund that should absorb a repeated initiate call. FAILED attempts
    /// are excluded so a booking can be retried after a provider rejection.
    pub async fn find_active_by_booking(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> Result<Option<RefundTransaction>, sqlx::Error> {
        let row: Option<RefundRow> = sqlx::query_as(&format!(
            r#"
            SELECT {REFUND_COLUMNS} FROM refund_transactions
            WHERE booking_id = $1 AND status IN ('INITIATED', 'PROCESSING', 'SUCCESS')
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(RefundRow::into_refund).transpose()
    }

    pub async fn find_by_provider_refund_id(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        provider_refund_id: &str,
    ) -> Result<Option<RefundTransaction>, sqlx::Error> {
        let row: Option<RefundRow> = sqlx::query_as(&format!(
            "SELECT {REFUND_COLUMNS} FROM refund_transactions WHERE provider_refund_id = $1"
        ))
        .bind(provider_refund_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(RefundRow::into_refund).transpose()
    }

    /// Provider accepted the refund request: keep its id and response. The
    /// status predicate stops a late write from clobbering a webhook that
    /// already settled the refund.
    pub async fn mark_processing(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        refund_id: Uuid,
        provider_refund_id: &str,
        response: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE refund_transactions
            SET status = $1, provider_refund_id = $2, provider_response = $3, updated_at = $4
            WHERE id = $5 AND status = 'INITIATED'
            "#,
        )
        .bind(RefundState::Processing.as_str())
        .bind(provider_refund_id)
        .bind(response)
        .bind(Utc::now())
        .bind(refund_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn set_status(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        refund_id: Uuid,
        status: &RefundState,
        response: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE refund_transactions
            SET status = $1, provider_response = $2, updated_at = $3
            WHERE id = $4 AND status IN ('INITIATED', 'PROCESSING')
            "#,
        )
        .bind(status.as_str())
        .bind(response)
        .bind(Utc::now())
        .bind(refund_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
