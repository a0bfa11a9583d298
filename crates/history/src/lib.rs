//! Chat-history store backends for plandesk.

pub mod in_memory;
pub mod supabase;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryHistory;
pub use supabase::SupabaseHistory;

#[cfg(feature = "postgres")]
pub use postgres::PostgresHistory;

use plandesk_config::AppConfig;
use plandesk_core::error::HistoryError;
use plandesk_core::history::HistoryStore;
use std::sync::Arc;
use std::time::Duration;

/// Build the history store selected by `history.backend`.
pub async fn build_from_config(config: &AppConfig) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    let history = &config.history;
    let timeout = Duration::from_secs(history.timeout_secs);

    match history.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryHistory::new())),
        "postgres" => build_postgres(history.database_url.as_deref(), timeout).await,
        _ => {
            let url = history.supabase_url.as_deref().ok_or_else(|| {
                HistoryError::Unreachable("SUPABASE_URL is not configured".into())
            })?;
            let key = history.supabase_key.as_deref().ok_or_else(|| {
                HistoryError::Unreachable("SUPABASE_SERVICE_ROLE_KEY is not configured".into())
            })?;
            Ok(Arc::new(SupabaseHistory::new(url, key, timeout)))
        }
    }
}

#[cfg(feature = "postgres")]
async fn build_postgres(
    database_url: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    let url = database_url
        .ok_or_else(|| HistoryError::Unreachable("DATABASE_URL is not configured".into()))?;
    Ok(Arc::new(PostgresHistory::connect(url, timeout).await?))
}

#[cfg(not(feature = "postgres"))]
async fn build_postgres(
    _database_url: Option<&str>,
    _timeout: Duration,
) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    Err(HistoryError::Unreachable(
        "the postgres history backend requires the `postgres` feature".into(),
    ))
}
