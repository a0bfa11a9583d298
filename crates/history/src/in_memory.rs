//! In-memory history store: useful for testing and offline runs.

use async_trait::async_trait;
use plandesk_core::error::HistoryError;
use plandesk_core::history::{ConversationTurn, HistoryStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A history store that keeps turns in a Vec.
#[derive(Clone, Default)]
pub struct InMemoryHistory {
    turns: Arc<RwLock<Vec<ConversationTurn>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a turn.
    pub async fn append(&self, turn: ConversationTurn) {
        self.turns.write().await.push(turn);
    }

    /// Total turns across all users.
    pub async fn len(&self) -> usize {
        self.turns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.turns.read().await.is_empty()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    fn name(&self) -> &str {
        "memory"
    }

    async fn recent(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, HistoryError> {
        let turns = self.turns.read().await;
        let mut matching: Vec<ConversationTurn> = turns
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}
