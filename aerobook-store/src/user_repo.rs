use chrono::{DateTime, Utc};
use sqlx::Postgres;
use uuid::Uuid;

use aerobook_core::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    full_name: String,
    created_at: DateTime<Utc>,
}

pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_username(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, full_name, created_at FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(row.map(|r| User {
            id: r.id,
            username: r.username,
            full_name: r.full_name,
            created_at: r.created_at,
        }))
    }
}
