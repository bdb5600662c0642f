//! Collaborator contracts the pipeline depends on.
//!
//! The pipeline consumes retrieval, threshold storage, and the model service
//! only through these traits; concrete backends (database, vector store, LLM
//! provider client) live outside this crate. All trait errors are
//! [`ClassifiedError`] values so that failures arrive pre-classified or are
//! wrapped at the call site.

use crate::error::PipelineResult;
use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// A stored FAQ entry as returned by retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question_text: String,
    pub answer_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl FaqEntry {
    pub fn new(question_text: impl Into<String>, answer_text: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            answer_text: answer_text.into(),
            category: None,
        }
    }
}

/// Streamed text response from the model collaborator.
pub type ModelStream = Pin<Box<dyn Stream<Item = PipelineResult<String>> + Send>>;

/// Retrieval collaborator over the FAQ knowledge base.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FaqRetriever: Send + Sync {
    /// Top candidate entries for a query. An empty result is not an error;
    /// implementations fail only for genuine infrastructure problems.
    async fn search(&self, query: &str) -> PipelineResult<Vec<FaqEntry>>;
}

/// Source of the current match threshold.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThresholdSource: Send + Sync {
    /// Current threshold in `[0, 1]`, or `None` when no value is stored.
    /// Absence is not a failure; the caller substitutes the default.
    async fn threshold(&self) -> PipelineResult<Option<f64>>;
}

/// External language-model collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Stream a completion for the query under the given system prompt. May
    /// fail with timeout, rate-limit, content-filter, or
    /// service-unavailable conditions, each carrying the matching
    /// external-model code.
    async fn complete(&self, system_prompt: &str, user_query: &str) -> PipelineResult<ModelStream>;
}
