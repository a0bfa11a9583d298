//! Context gathering: the recent chat history for a user.

use plandesk_config::HistoryPolicy;
use plandesk_core::error::{Error, HistoryError};
use plandesk_core::history::HistoryStore;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Number of prior turns included in a prompt.
pub const HISTORY_TURNS: usize = 4;

/// Fetches and formats the recent conversation for a user.
pub struct ContextGatherer {
    store: Arc<dyn HistoryStore>,
    policy: HistoryPolicy,
}

impl ContextGatherer {
    pub fn new(store: Arc<dyn HistoryStore>, policy: HistoryPolicy) -> Self {
        Self { store, policy }
    }

    /// The last [`HISTORY_TURNS`] turns, oldest first, one per line.
    ///
    /// An empty string means the user has no history.
    pub async fn fetch(&self, user_id: Uuid) -> Result<String, HistoryError> {
        let mut turns = self.store.recent(user_id, HISTORY_TURNS).await?;
        turns.truncate(HISTORY_TURNS);
        turns.reverse();

        debug!(%user_id, turns = turns.len(), store = %self.store.name(), "Fetched chat history");

        Ok(turns
            .into_iter()
            .map(|t| t.message)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Like [`fetch`](Self::fetch), with the unavailable-store policy applied.
    ///
    /// Under [`HistoryPolicy::Proceed`] a store failure yields empty history.
    pub async fn gather(&self, user_id: Uuid) -> Result<String, Error> {
        match self.fetch(user_id).await {
            Ok(history) => Ok(history),
            Err(e) => match self.policy {
                HistoryPolicy::Proceed => {
                    warn!(%user_id, error = %e, "Chat history unavailable; continuing without it");
                    Ok(String::new())
                }
                HistoryPolicy::Abort => Err(Error::HistoryUnavailable(e)),
            },
        }
    }
}
