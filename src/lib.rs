//! # faq-pipeline
//!
//! Customer-support FAQ resolution pipeline: an incoming query is answered
//! either by a deterministic knowledge-base lookup or, on a miss, by a
//! retry-wrapped external model call streamed back to the caller.
//!
//! ## Key Features
//!
//! - **Layered error taxonomy**: closed set of stable `<Layer>-<Number>`
//!   codes across validation, API, business, infrastructure, and external
//!   model tiers, each with a fixed retryability flag
//! - **Structured failures**: every error carries a trace id, timestamp, and
//!   optional cause chain, serialized to a stable wire envelope
//! - **Retry/backoff executor**: exponential backoff with per-attempt
//!   timeouts and a retryability predicate as a hard gate
//! - **HTTP mapping**: total, deterministic code-to-status table as the
//!   single failure exit point
//! - **Orchestration**: validate, retrieve, score, threshold decision, and
//!   model fallback with full trace-id propagation
//!
//! ## Example
//!
//! ```rust
//! use faq_pipeline::{http, ClassifiedError};
//! use std::time::Duration;
//!
//! let err = ClassifiedError::model_timeout(Duration::from_secs(5));
//! assert!(err.retryable());
//!
//! let (status, body) = http::respond(&err);
//! assert_eq!(status.as_u16(), 504);
//! assert_eq!(body.code, "E-5001");
//! assert_eq!(body.status, "fail");
//! ```

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod codes;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod provider;
pub mod retry;
pub mod scoring;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use codes::{ErrorCode, Layer};
pub use config::PipelineConfig;
pub use error::{BoxError, ClassifiedError, ErrorEnvelope, PipelineResult, WireEnvelope, WireInfo};
pub use pipeline::{AnswerBody, AnswerSource, FaqPipeline, Resolution};
pub use provider::{FaqEntry, FaqRetriever, ModelProvider, ModelStream, ThresholdSource};
pub use retry::{execute_with_retry, RetryObserver, RetryPolicy, RetryPredicate};
pub use scoring::{
    build_context, check_consistency, score_candidates, ConsistencyReport, ScoredEntry,
    MAX_CONTEXT_CHARS,
};
