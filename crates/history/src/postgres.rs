//! PostgreSQL history store.
//!
//! Reads the same `chat_history` table the Supabase backend reads, but
//! over a direct connection pool instead of the REST gateway.
//!
//! # Feature gate
//!
//! ```toml
//! plandesk-history = { workspace = true, features = ["postgres"] }
//! ```

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use plandesk_core::error::HistoryError;
use plandesk_core::history::{ConversationTurn, HistoryStore};

/// PostgreSQL history store.
pub struct PostgresHistory {
    pool: PgPool,
}

impl PostgresHistory {
    /// Connect to `database_url`; `timeout` bounds pool acquisition.
    pub async fn connect(database_url: &str, timeout: Duration) -> Result<Self, HistoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await
            .map_err(|e| HistoryError::Unreachable(format!("PostgreSQL connection failed: {e}")))?;

        info!("Connected to PostgreSQL for chat history");
        Ok(Self { pool })
    }
}

#[async_trait]
impl HistoryStore for PostgresHistory {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn recent(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, HistoryError> {
        let rows = sqlx::query(
            "SELECT message FROM chat_history \
             WHERE user_id = $1 AND message IS NOT NULL \
             ORDER BY created_at DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                HistoryError::Unreachable(e.to_string())
            }
            other => HistoryError::QueryFailed(other.to_string()),
        })?;

        rows.iter()
            .map(|row| {
                let message: String = row
                    .try_get("message")
                    .map_err(|e| HistoryError::MalformedResponse(e.to_string()))?;
                Ok(ConversationTurn::untimed(user_id, message))
            })
            .collect()
    }
}
