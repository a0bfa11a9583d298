//! Chat history: prior conversation turns for a user.
//!
//! The request pipeline only reads history. Stores return turns
//! newest-first; callers that need chronological order reverse them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HistoryError;

/// One stored chat message belonging to a user.
///
/// Remote stores order rows themselves and only return the message, so
/// `created_at` is absent for turns read from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_id: Uuid,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ConversationTurn {
    pub fn new(user_id: Uuid, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            message: message.into(),
            created_at: Some(created_at),
        }
    }

    /// A turn whose position is already fixed by the store's ordering.
    pub fn untimed(user_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            user_id,
            message: message.into(),
            created_at: None,
        }
    }
}

/// Read access to a chat-history store.
///
/// Implementations: Supabase REST, PostgreSQL, in-memory.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The backend name (e.g., "supabase", "postgres", "memory").
    fn name(&self) -> &str;

    /// Up to `limit` turns for `user_id`, newest first.
    async fn recent(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> std::result::Result<Vec<ConversationTurn>, HistoryError>;
}
