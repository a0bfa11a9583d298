//! Retrieval: semantic search over the benefits knowledge base.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Number of passages requested from the search service per question.
pub const RETRIEVAL_RESULT_COUNT: usize = 10;

/// Separator placed between passages in the joined knowledge text.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// A scored passage returned by the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Service-assigned relevance score, informational only
    pub score: Option<f64>,
    /// Passage text
    pub content: String,
}

/// Join passages in service order with [`DOCUMENT_SEPARATOR`].
pub fn join_documents(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// A semantic-search backend.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch passages relevant to `question` and join them into one blob.
    ///
    /// No matches is `Ok("")`, not an error.
    async fn search(&self, question: &str) -> std::result::Result<String, RetrievalError>;
}
