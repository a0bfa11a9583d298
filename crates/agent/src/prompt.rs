//! Prompt assembly for the two answer stages.
//!
//! Stage 1 grounds the model in the benefits-guide digest only; stage 2
//! grounds it in passages fetched from the knowledge base. The policy texts
//! are compiled in and must stay byte-identical: downstream consumers parse
//! the markdown they prescribe.

use plandesk_config::KnowledgeConfig;
use plandesk_core::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const STAGE1_POLICY: &str = include_str!("../prompts/stage1_policy.md");
const STAGE2_POLICY: &str = include_str!("../prompts/stage2_policy.md");

/// The built-in Digital Benefits Guide digest appended to the stage-1 policy.
pub const BUILTIN_DIGEST: &str = include_str!("../prompts/benefits_guide.txt");

/// Stand-in for an empty history section.
const NO_HISTORY: &str = "None";

/// Which answer stage a prompt or answer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Narrow context: the digest only
    Digest,
    /// Wide context: knowledge-base search results
    KnowledgeBase,
}

impl Stage {
    pub fn number(&self) -> u8 {
        match self {
            Self::Digest => 1,
            Self::KnowledgeBase => 2,
        }
    }
}

/// A fixed instruction document for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTemplate {
    text: String,
}

impl PolicyTemplate {
    /// Stage-1 policy followed by `digest`.
    pub fn digest(digest: &str) -> Self {
        Self {
            text: format!("{STAGE1_POLICY}{digest}"),
        }
    }

    pub fn knowledge_base() -> Self {
        Self {
            text: STAGE2_POLICY.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Builds the exact text sent to the completion backend for each stage.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    stage1: PolicyTemplate,
    stage2: PolicyTemplate,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::with_digest(BUILTIN_DIGEST)
    }
}

impl PromptAssembler {
    /// Use `digest` in place of the built-in benefits guide.
    pub fn with_digest(digest: &str) -> Self {
        Self {
            stage1: PolicyTemplate::digest(digest),
            stage2: PolicyTemplate::knowledge_base(),
        }
    }

    /// Built-in templates, or the digest at `knowledge.digest_path` when set.
    pub fn from_config(knowledge: &KnowledgeConfig) -> Result<Self, Error> {
        match &knowledge.digest_path {
            Some(path) => Self::from_digest_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_digest_file(path: &Path) -> Result<Self, Error> {
        let digest = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Failed to read digest {}: {e}", path.display()),
        })?;
        info!(path = %path.display(), bytes = digest.len(), "Loaded benefits-guide digest");
        Ok(Self::with_digest(&digest))
    }

    pub fn template(&self, stage: Stage) -> &PolicyTemplate {
        match stage {
            Stage::Digest => &self.stage1,
            Stage::KnowledgeBase => &self.stage2,
        }
    }

    /// The stage-1 prompt: digest policy, question, and past history.
    pub fn stage1(&self, question: &str, history: &str) -> String {
        format!(
            "{}\n\n**CURRENT QUESTION:**\n{question}\n\n**PAST CHAT HISTORY**\n{}\n",
            self.stage1.text(),
            or_none(history),
        )
    }

    /// The stage-2 prompt: knowledge-base policy, question, history, and documents.
    pub fn stage2(&self, question: &str, history: &str, documents: &str) -> String {
        format!(
            "{}\n\n**CURRENT QUESTION:**\n{question}\n\n**CHAT HISTORY:**\n{}\n\n**KNOWLEDGE BASE DOCUMENTS:**\n{documents}\n",
            self.stage2.text(),
            or_none(history),
        )
    }
}

fn or_none(history: &str) -> &str {
    if history.is_empty() { NO_HISTORY } else { history }
}
