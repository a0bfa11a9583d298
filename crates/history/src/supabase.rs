//! Supabase history store: reads the `chat_history` table over PostgREST.
//!
//! Equivalent SQL:
//!
//! ```sql
//! SELECT message FROM chat_history
//! WHERE user_id = $1 AND message IS NOT NULL
//! ORDER BY created_at DESC LIMIT $2;
//! ```

use async_trait::async_trait;
use plandesk_core::error::HistoryError;
use plandesk_core::history::{ConversationTurn, HistoryStore};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const TABLE: &str = "chat_history";

/// History store backed by a Supabase project's REST API.
pub struct SupabaseHistory {
    base_url: String,
    service_key: String,
    client: reqwest::Client,
}

impl SupabaseHistory {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    message: Option<String>,
}

#[async_trait]
impl HistoryStore for SupabaseHistory {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn recent(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, HistoryError> {
        let url = format!("{}/rest/v1/{TABLE}", self.base_url);
        let user_filter = format!("eq.{user_id}");
        let limit = limit.to_string();

        debug!(%user_id, "Fetching chat history from Supabase");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("select", "message"),
                ("user_id", user_filter.as_str()),
                ("message", "not.is.null"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .send()
            .await
            .map_err(|e| HistoryError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HistoryError::QueryFailed(format!("status {status}: {body}")));
        }

        let rows: Vec<HistoryRow> = response
            .json()
            .await
            .map_err(|e| HistoryError::MalformedResponse(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.message)
            .map(|message| ConversationTurn::untimed(user_id, message))
            .collect())
    }
}
