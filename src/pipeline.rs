//! Request orchestrator for FAQ resolution.
//!
//! One [`FaqPipeline::resolve`] call drives a single request through a fixed
//! sequence: validate, retrieve, score, decide, and on a threshold miss fall
//! back to the external model through the retry executor. Every failure path
//! leaves this module as a [`ClassifiedError`]; the HTTP mapper converts it
//! at the boundary. A trace id is generated once per request and passed
//! explicitly through every step.
//!
//! Requests are handled independently; the only shared state (configuration
//! and retry policy) is immutable after construction, so no locking is
//! needed. All waits (retrieval, threshold read, model attempts, backoff
//! sleeps) are cooperative suspension points.

use crate::codes;
use crate::config::PipelineConfig;
use crate::error::{ClassifiedError, PipelineResult};
use crate::logging::{log_debug, log_info, log_warn};
use crate::provider::{FaqRetriever, ModelProvider, ModelStream, ThresholdSource};
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::scoring::{build_context, score_candidates};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use uuid::Uuid;

/// Which path produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerSource {
    /// Deterministic hit against the knowledge base.
    #[serde(rename = "FAQ")]
    Faq,
    /// Model fallback.
    #[serde(rename = "AI")]
    Ai,
}

/// The answer payload: direct text for FAQ hits, a stream for model output.
pub enum AnswerBody {
    Text(String),
    Stream(ModelStream),
}

impl fmt::Debug for AnswerBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Successful resolution of one request.
#[derive(Debug)]
pub struct Resolution {
    pub source: AnswerSource,
    /// Top candidate score, when any candidate was retrieved.
    pub score: Option<f64>,
    pub trace_id: String,
    pub body: AnswerBody,
}

fn build_system_prompt(context: &str) -> String {
    format!(
        "\
あなたは企業のAIサポートアシスタントです。
以下のコンテキスト情報を参考に、ユーザーの質問に丁寧に回答してください。

コンテキスト情報:
{context}

回答の際の注意点:
1. コンテキスト情報に含まれる内容のみを使用して回答してください。
2. 情報がない場合は、「その情報は現在持ち合わせていません」と正直に伝えてください。
3. 回答は簡潔かつ丁寧な日本語で行ってください。
"
    )
}

fn generate_request_trace_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("faq-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

/// The FAQ resolution orchestrator.
pub struct FaqPipeline {
    retriever: Arc<dyn FaqRetriever>,
    thresholds: Arc<dyn ThresholdSource>,
    model: Arc<dyn ModelProvider>,
    config: PipelineConfig,
    retry_policy: RetryPolicy,
}

impl FaqPipeline {
    /// Build a pipeline over the given collaborators. The retry policy for
    /// model calls is derived from the configuration once, here.
    pub fn new(
        retriever: Arc<dyn FaqRetriever>,
        thresholds: Arc<dyn ThresholdSource>,
        model: Arc<dyn ModelProvider>,
        config: PipelineConfig,
    ) -> Self {
        let retry_policy = RetryPolicy::from_config(&config);
        Self {
            retriever,
            thresholds,
            model,
            config,
            retry_policy,
        }
    }

    /// Replace the model-call retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Resolve a query, either from the knowledge base or via the model
    /// fallback.
    ///
    /// Emits one completion record per request (trace id, query length,
    /// duration, success flag) on every path, including early termination.
    pub async fn resolve(&self, query: &str) -> PipelineResult<Resolution> {
        let trace_id = generate_request_trace_id();
        let started = Instant::now();

        let result = self.resolve_inner(&trace_id, query).await;

        log_info!(
            trace_id = %trace_id,
            query_chars = query.chars().count(),
            duration_ms = started.elapsed().as_millis() as u64,
            success = result.is_ok(),
            "faq request completed"
        );
        result
    }

    async fn resolve_inner(&self, trace_id: &str, query: &str) -> PipelineResult<Resolution> {
        // Validate
        if query.trim().is_empty() {
            return Err(
                ClassifiedError::validation_failed("質問を入力してください")
                    .with_trace_id(trace_id),
            );
        }

        // Retrieve, bounded by the infra timeout. No retry at this tier;
        // infra retries are the collaborator's responsibility.
        let entries = match timeout(self.config.infra_timeout, self.retriever.search(query)).await
        {
            Ok(Ok(entries)) => entries,
            Ok(Err(err)) => {
                // Restamp with the request id so the wire envelope correlates
                // with the completion record.
                let err = ClassifiedError::classify(
                    Box::new(err),
                    codes::INFRA_INTERNAL_ERROR,
                    "FAQ検索に失敗しました",
                );
                log_warn!(
                    trace_id = %trace_id,
                    code = %err.code(),
                    error_trace_id = %err.trace_id(),
                    "retrieval failed"
                );
                return Err(err.with_trace_id(trace_id));
            }
            Err(_elapsed) => {
                return Err(
                    ClassifiedError::infra_internal_error("FAQ検索がタイムアウトしました")
                        .with_trace_id(trace_id),
                );
            }
        };

        if entries.is_empty() {
            log_debug!(trace_id = %trace_id, "no faq candidates, continuing to model fallback");
        }

        // Score
        let scored = score_candidates(query, entries);
        let top_score = scored.first().map(|s| s.score);

        // Decide
        let threshold = match self.thresholds.threshold().await {
            Ok(Some(value)) => value,
            Ok(None) => self.config.default_threshold,
            Err(err) => {
                log_warn!(
                    trace_id = %trace_id,
                    error = %err,
                    "threshold lookup failed, using default"
                );
                self.config.default_threshold
            }
        };

        if let Some(top) = scored.first() {
            if top.score >= threshold {
                log_info!(
                    trace_id = %trace_id,
                    score = top.score,
                    threshold = threshold,
                    "direct faq hit"
                );
                return Ok(Resolution {
                    source: AnswerSource::Faq,
                    score: top_score,
                    trace_id: trace_id.to_string(),
                    body: AnswerBody::Text(top.entry.answer_text.clone()),
                });
            }
        }

        // Fallback: model call through the retry executor.
        let context = build_context(&scored);
        let system_prompt = build_system_prompt(&context);

        let mut policy = self.retry_policy.clone();
        let observer_trace_id = trace_id.to_string();
        policy.on_retry = Some(Arc::new(move |error, attempt, delay| {
            log_warn!(
                trace_id = %observer_trace_id,
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                code = %error.code(),
                "model call failed, retrying"
            );
        }));

        let stream = execute_with_retry(&policy, || self.model.complete(&system_prompt, query))
            .await
            .map_err(|err| {
                log_warn!(
                    trace_id = %trace_id,
                    code = %err.code(),
                    error_trace_id = %err.trace_id(),
                    "model fallback failed after retries"
                );
                err.with_trace_id(trace_id)
            })?;

        log_info!(
            trace_id = %trace_id,
            score = top_score,
            threshold = threshold,
            "answering via model fallback"
        );
        Ok(Resolution {
            source: AnswerSource::Ai,
            score: top_score,
            trace_id: trace_id.to_string(),
            body: AnswerBody::Stream(stream),
        })
    }
}
