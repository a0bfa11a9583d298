//! # plandesk core
//!
//! Domain types, traits, and error definitions for the plandesk benefits
//! assistant. This crate has **no I/O dependencies**: it defines the domain
//! model and the seams (completion backend, history store, search service)
//! that the other crates implement against.

pub mod error;
pub mod history;
pub mod message;
pub mod provider;
pub mod question;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use error::{Error, HistoryError, ProviderError, Result, RetrievalError};
pub use history::{ConversationTurn, HistoryStore};
pub use message::{Message, Role, flatten_messages};
pub use provider::{CallingConvention, Provider, ProviderRequest, ProviderResponse, Usage};
pub use question::{BenefitPlan, Question, format_plans};
pub use retrieval::{RetrievedDocument, Retriever, join_documents};
