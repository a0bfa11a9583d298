//! Knowledge-base search clients for plandesk.
//!
//! The only production backend is the hosted vector-search service
//! (`VECTORIZE_URL`). [`StaticRetriever`] serves a fixed passage set for
//! offline runs and tests.

pub mod vectorize;

pub use vectorize::VectorizeClient;

use async_trait::async_trait;
use plandesk_config::AppConfig;
use plandesk_core::error::RetrievalError;
use plandesk_core::retrieval::{RetrievedDocument, Retriever, join_documents};
use std::sync::Arc;
use std::time::Duration;

/// Build the search client described by the `[retrieval]` section.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Retriever>, RetrievalError> {
    let retrieval = &config.retrieval;
    let url = retrieval
        .url
        .as_deref()
        .ok_or_else(|| RetrievalError::RequestFailed("VECTORIZE_URL is not configured".into()))?;
    let key = retrieval.api_key.as_deref().unwrap_or_default();

    Ok(Arc::new(VectorizeClient::new(
        url,
        key,
        Duration::from_secs(retrieval.timeout_secs),
    )))
}

/// A retriever that always returns the same passages.
#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    documents: Vec<RetrievedDocument>,
}

impl StaticRetriever {
    pub fn new(documents: Vec<RetrievedDocument>) -> Self {
        Self { documents }
    }

    /// Build from plain passage texts.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            texts
                .into_iter()
                .map(|t| RetrievedDocument {
                    score: None,
                    content: t.into(),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, _question: &str) -> Result<String, RetrievalError> {
        Ok(join_documents(&self.documents))
    }
}
