//! Hosted vector-search client.
//!
//! Sends `{"question", "numResults"}` with a bearer token and joins the
//! `payload.content` of each match in service order.

use async_trait::async_trait;
use plandesk_core::error::RetrievalError;
use plandesk_core::retrieval::{RETRIEVAL_RESULT_COUNT, RetrievedDocument, Retriever, join_documents};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Characters of each passage shown in the match log.
const PREVIEW_CHARS: usize = 120;

/// Client for the vector-search retrieval endpoint.
pub struct VectorizeClient {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl VectorizeClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            url: url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Keep matches that carry passage text, in service order.
    fn documents(response: SearchResponse) -> Vec<RetrievedDocument> {
        response
            .matches
            .into_iter()
            .filter_map(|m| {
                let content = m.payload?.content?;
                Some(RetrievedDocument {
                    score: m.score,
                    content,
                })
            })
            .collect()
    }
}

fn preview(content: &str) -> String {
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head.replace('\n', " "))
}

#[async_trait]
impl Retriever for VectorizeClient {
    fn name(&self) -> &str {
        "vectorize"
    }

    async fn search(&self, question: &str) -> Result<String, RetrievalError> {
        debug!(question, "Searching knowledge base");

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&SearchRequest {
                question,
                num_results: RETRIEVAL_RESULT_COUNT,
            })
            .send()
            .await
            .map_err(|e| RetrievalError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RetrievalError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(RetrievalError::Status {
                status_code: status.as_u16(),
                message: body,
            });
        }

        let parsed: SearchResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, raw = %body, "Search response did not parse; continuing without documents");
                return Ok(String::new());
            }
        };

        let documents = Self::documents(parsed);
        if documents.is_empty() {
            info!("No knowledge-base matches for question");
            return Ok(String::new());
        }

        for doc in &documents {
            let score = doc
                .score
                .map(|s| format!("{s:.4}"))
                .unwrap_or_else(|| "n/a".into());
            debug!(score = %score, preview = %preview(&doc.content), "Knowledge-base match");
        }

        Ok(join_documents(&documents))
    }
}

// --- Search API types (internal) ---

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    question: &'a str,
    #[serde(rename = "numResults")]
    num_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    matches: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    payload: Option<MatchPayload>,
}

#[derive(Debug, Deserialize)]
struct MatchPayload {
    #[serde(default)]
    content: Option<String>,
}
