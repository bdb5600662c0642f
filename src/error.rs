//! Classified error types for the support pipeline.
//!
//! Every failure flowing through the pipeline is a [`ClassifiedError`]: a
//! tagged variant per originating layer, each carrying the same
//! [`ErrorEnvelope`] (stable code, trace id, retryability flag, timestamp,
//! optional cause chain). Errors are immutable after construction; a layer
//! that needs to re-interpret a lower-level failure wraps it in a new value
//! with the original preserved as `cause`.
//!
//! # Error Handling Example
//!
//! ```rust
//! use faq_pipeline::ClassifiedError;
//!
//! let err = ClassifiedError::model_rate_limited();
//! assert!(err.retryable());
//! assert_eq!(err.code().as_str(), "E-5002");
//!
//! // Wire shape for the caller: code, message, trace info. Never the cause.
//! let envelope = err.to_wire_envelope();
//! assert_eq!(envelope.status, "fail");
//! ```
//!
//! # Retryability
//!
//! The `retryable` flag is a property of the failure condition, fixed by the
//! constructor, never derived from attempt counts (the retry executor owns
//! attempt counting):
//!
//! | Constructor | Code | Retryable |
//! |---|---|---|
//! | `validation_failed` | U-1001 | No |
//! | `authentication_failed` | A-2001 | No |
//! | `authorization_failed` | A-2002 | No |
//! | `invalid_request` | A-2003 | No |
//! | `resource_not_found` | A-2004 | No |
//! | `method_not_allowed` | A-2005 | No |
//! | `rate_limit_exceeded` | A-2006 | Yes |
//! | `api_internal_error` | A-2999 | No |
//! | `retrieval_empty` | B-3001 | No |
//! | `hallucination_detected` | B-3002 | Yes |
//! | `context_mismatch` | B-3003 | No |
//! | `processing_failed` | B-3004 | Yes |
//! | `db_connection_exhausted` | I-4001 | Yes |
//! | `db_query_failed` | I-4002 | No |
//! | `cache_unavailable` | I-4003 | Yes |
//! | `infra_internal_error` | I-4004 | No |
//! | `deadlock_detected` | I-4005 | Yes |
//! | `model_timeout` | E-5001 | Yes |
//! | `model_rate_limited` | E-5002 | Yes |
//! | `content_filtered` | E-5003 | No |
//! | `invalid_model_response` | E-5004 | Yes |
//! | `model_unavailable` | E-5005 | Yes |
//!
//! `invalid_model_response` defaulting to retryable is a deliberate policy
//! choice: malformed model output is often transient. The retry predicate
//! makes this explicit and it is covered by tests.

use crate::codes::{self, ErrorCode, Layer};
use crate::logging::{log_error, log_warn};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Convenient result type for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, ClassifiedError>;

/// Boxed error used for opaque causes from collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Length of generated trace ids.
const TRACE_ID_LEN: usize = 10;

fn generate_trace_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..TRACE_ID_LEN].to_string()
}

/// The common envelope every classified failure carries.
///
/// Fields are public for inspection but the envelope is treated as immutable
/// after construction; `with_trace_id` / `with_cause` are construction-site
/// builders that consume the value.
#[derive(Debug)]
pub struct ErrorEnvelope {
    /// Stable machine-readable code, `<Layer>-<Number>`.
    pub code: ErrorCode,
    /// User-facing message, localized for the support UI.
    pub message: String,
    /// Opaque correlation token, generated if not supplied.
    pub trace_id: String,
    /// Whether blind re-attempt of the failed operation is safe.
    pub retryable: bool,
    /// Seconds since epoch at construction.
    pub timestamp: i64,
    /// Original lower-level failure, kept for diagnostics, never serialized.
    pub cause: Option<BoxError>,
}

impl ErrorEnvelope {
    fn new(code: ErrorCode, message: String, retryable: bool) -> Self {
        if !codes::is_registered(code) {
            // Advisory check only: new codes must not crash callers.
            log_warn!(
                code = %code,
                "classified error constructed with unregistered code"
            );
        }
        Self {
            code,
            message,
            trace_id: generate_trace_id(),
            retryable,
            timestamp: Utc::now().timestamp(),
            cause: None,
        }
    }
}

/// Serialized failure shape crossing the system boundary.
///
/// Exactly `{"status":"fail","code":..,"message":..,"info":{..}}`; the cause
/// chain and any internal diagnostics are stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnvelope {
    pub status: String,
    pub code: String,
    pub message: String,
    pub info: WireInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireInfo {
    #[serde(rename = "traceId")]
    pub trace_id: String,
    pub retryable: bool,
    pub ts: i64,
}

/// The sole error representation flowing through the pipeline.
///
/// One variant per originating layer, dispatched by explicit kind tag. Use
/// the named constructors, which fix the retryability flag for each failure
/// condition and log at a level matching its severity.
#[derive(Debug, Error)]
pub enum ClassifiedError {
    #[error("[{}] {}", .0.code, .0.message)]
    Validation(ErrorEnvelope),
    #[error("[{}] {}", .0.code, .0.message)]
    Api(ErrorEnvelope),
    #[error("[{}] {}", .0.code, .0.message)]
    Business(ErrorEnvelope),
    #[error("[{}] {}", .0.code, .0.message)]
    Infra(ErrorEnvelope),
    #[error("[{}] {}", .0.code, .0.message)]
    External(ErrorEnvelope),
}

impl ClassifiedError {
    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn envelope(&self) -> &ErrorEnvelope {
        match self {
            Self::Validation(env)
            | Self::Api(env)
            | Self::Business(env)
            | Self::Infra(env)
            | Self::External(env) => env,
        }
    }

    fn envelope_mut(&mut self) -> &mut ErrorEnvelope {
        match self {
            Self::Validation(env)
            | Self::Api(env)
            | Self::Business(env)
            | Self::Infra(env)
            | Self::External(env) => env,
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            Self::Validation(_) => Layer::Validation,
            Self::Api(_) => Layer::Api,
            Self::Business(_) => Layer::Business,
            Self::Infra(_) => Layer::Infra,
            Self::External(_) => Layer::External,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.envelope().code
    }

    pub fn message(&self) -> &str {
        &self.envelope().message
    }

    pub fn trace_id(&self) -> &str {
        &self.envelope().trace_id
    }

    pub fn retryable(&self) -> bool {
        self.envelope().retryable
    }

    pub fn timestamp(&self) -> i64 {
        self.envelope().timestamp
    }

    /// The wrapped lower-level failure, if any. Diagnostic only; never part
    /// of the wire envelope.
    pub fn cause(&self) -> Option<&BoxError> {
        self.envelope().cause.as_ref()
    }

    // =========================================================================
    // Construction-site builders
    // =========================================================================

    /// Replace the generated trace id with the request-scoped one. Used at
    /// construction sites and once more at the request boundary, so every
    /// surfaced error carries the id logged in the completion record.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.envelope_mut().trace_id = trace_id.into();
        self
    }

    /// Attach the original lower-level failure for diagnostics.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.envelope_mut().cause = Some(cause.into());
        self
    }

    /// Override the default user-facing message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.envelope_mut().message = message.into();
        self
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Classify an arbitrary error under a layer's fallback code.
    ///
    /// Idempotent: an error that is already classified passes through
    /// unchanged. Anything else is wrapped under `fallback_code` with the
    /// original preserved as `cause`.
    pub fn classify(
        raw: BoxError,
        fallback_code: ErrorCode,
        default_message: impl Into<String>,
    ) -> Self {
        match raw.downcast::<ClassifiedError>() {
            Ok(already_classified) => *already_classified,
            Err(other) => {
                let message = default_message.into();
                log_warn!(
                    code = %fallback_code,
                    cause = %other,
                    "wrapping unclassified error"
                );
                let mut env = ErrorEnvelope::new(fallback_code, message, false);
                env.cause = Some(other);
                Self::from_envelope(env)
            }
        }
    }

    fn from_envelope(env: ErrorEnvelope) -> Self {
        let layer = codes::lookup(env.code)
            .map(|info| info.layer)
            .unwrap_or_else(|| Layer::from_code(env.code));
        match layer {
            Layer::Validation => Self::Validation(env),
            Layer::Api => Self::Api(env),
            Layer::Business => Self::Business(env),
            Layer::Infra => Self::Infra(env),
            Layer::External => Self::External(env),
        }
    }

    /// Serialize to the documented wire shape. Pure and deterministic;
    /// excludes the cause chain.
    pub fn to_wire_envelope(&self) -> WireEnvelope {
        let env = self.envelope();
        WireEnvelope {
            status: "fail".to_string(),
            code: env.code.as_str().to_string(),
            message: env.message.clone(),
            info: WireInfo {
                trace_id: env.trace_id.clone(),
                retryable: env.retryable,
                ts: env.timestamp,
            },
        }
    }

    // =========================================================================
    // Validation layer (U-1xxx)
    // =========================================================================

    /// Input validation failure (logs at WARN level). Not retryable.
    pub fn validation_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "validation_failed",
            message = %message,
            "input validation failed"
        );
        Self::Validation(ErrorEnvelope::new(codes::VALIDATION_FAILED, message, false))
    }

    // =========================================================================
    // API layer (A-2xxx)
    // =========================================================================

    pub fn authentication_failed() -> Self {
        log_warn!(error_type = "authentication_failed", "authentication failed");
        Self::Api(ErrorEnvelope::new(
            codes::AUTHENTICATION_FAILED,
            codes::default_message(codes::AUTHENTICATION_FAILED).to_string(),
            false,
        ))
    }

    pub fn authorization_failed() -> Self {
        log_warn!(error_type = "authorization_failed", "authorization denied");
        Self::Api(ErrorEnvelope::new(
            codes::AUTHORIZATION_FAILED,
            codes::default_message(codes::AUTHORIZATION_FAILED).to_string(),
            false,
        ))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "invalid_request",
            message = %message,
            "malformed request"
        );
        Self::Api(ErrorEnvelope::new(codes::INVALID_REQUEST, message, false))
    }

    pub fn resource_not_found() -> Self {
        log_warn!(error_type = "resource_not_found", "resource not found");
        Self::Api(ErrorEnvelope::new(
            codes::RESOURCE_NOT_FOUND,
            codes::default_message(codes::RESOURCE_NOT_FOUND).to_string(),
            false,
        ))
    }

    pub fn method_not_allowed() -> Self {
        log_warn!(error_type = "method_not_allowed", "method not allowed");
        Self::Api(ErrorEnvelope::new(
            codes::METHOD_NOT_ALLOWED,
            codes::default_message(codes::METHOD_NOT_ALLOWED).to_string(),
            false,
        ))
    }

    /// API rate limit exceeded. Retryable after a delay.
    pub fn rate_limit_exceeded() -> Self {
        log_warn!(error_type = "rate_limit_exceeded", "api rate limit exceeded");
        Self::Api(ErrorEnvelope::new(
            codes::RATE_LIMIT_EXCEEDED,
            codes::default_message(codes::RATE_LIMIT_EXCEEDED).to_string(),
            true,
        ))
    }

    /// API-layer fallback for unexpected failures (logs at ERROR level).
    pub fn api_internal_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "api_internal_error",
            message = %message,
            "internal service error"
        );
        Self::Api(ErrorEnvelope::new(codes::API_INTERNAL_ERROR, message, false))
    }

    // =========================================================================
    // Business / retrieval layer (B-3xxx)
    // =========================================================================

    /// Retrieval produced no candidates where at least one was required.
    pub fn retrieval_empty() -> Self {
        log_warn!(error_type = "retrieval_empty", "retrieval returned no results");
        Self::Business(ErrorEnvelope::new(
            codes::RETRIEVAL_EMPTY,
            codes::default_message(codes::RETRIEVAL_EMPTY).to_string(),
            false,
        ))
    }

    /// Generated answer contradicts the retrieved context. Retryable by
    /// policy: the orchestrator may re-invoke the model with an adjusted
    /// prompt.
    pub fn hallucination_detected() -> Self {
        log_error!(error_type = "hallucination_detected", "answer failed consistency check");
        Self::Business(ErrorEnvelope::new(
            codes::HALLUCINATION_DETECTED,
            codes::default_message(codes::HALLUCINATION_DETECTED).to_string(),
            true,
        ))
    }

    pub fn context_mismatch() -> Self {
        log_warn!(error_type = "context_mismatch", "context does not match query");
        Self::Business(ErrorEnvelope::new(
            codes::CONTEXT_MISMATCH,
            codes::default_message(codes::CONTEXT_MISMATCH).to_string(),
            false,
        ))
    }

    pub fn processing_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "processing_failed",
            message = %message,
            "request processing failed"
        );
        Self::Business(ErrorEnvelope::new(codes::PROCESSING_FAILED, message, true))
    }

    // =========================================================================
    // Infrastructure layer (I-4xxx)
    // =========================================================================

    /// Connection pool exhausted. Transient, retryable.
    pub fn db_connection_exhausted() -> Self {
        log_error!(error_type = "db_connection_exhausted", "connection pool exhausted");
        Self::Infra(ErrorEnvelope::new(
            codes::DB_CONNECTION_EXHAUSTED,
            codes::default_message(codes::DB_CONNECTION_EXHAUSTED).to_string(),
            true,
        ))
    }

    /// Query failed. Indicates a malformed query; retrying will not help.
    pub fn db_query_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "db_query_failed",
            message = %message,
            "database query failed"
        );
        Self::Infra(ErrorEnvelope::new(codes::DB_QUERY_FAILED, message, false))
    }

    pub fn cache_unavailable() -> Self {
        log_warn!(error_type = "cache_unavailable", "cache service unavailable");
        Self::Infra(ErrorEnvelope::new(
            codes::CACHE_UNAVAILABLE,
            codes::default_message(codes::CACHE_UNAVAILABLE).to_string(),
            true,
        ))
    }

    /// Infrastructure-layer fallback for unexpected failures.
    pub fn infra_internal_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "infra_internal_error",
            message = %message,
            "infrastructure failure"
        );
        Self::Infra(ErrorEnvelope::new(codes::INFRA_INTERNAL_ERROR, message, false))
    }

    pub fn deadlock_detected() -> Self {
        log_warn!(error_type = "deadlock_detected", "deadlock detected");
        Self::Infra(ErrorEnvelope::new(
            codes::DEADLOCK_DETECTED,
            codes::default_message(codes::DEADLOCK_DETECTED).to_string(),
            true,
        ))
    }

    // =========================================================================
    // External model layer (E-5xxx)
    // =========================================================================

    /// Model call exceeded its per-attempt deadline. Retryable.
    pub fn model_timeout(timeout: Duration) -> Self {
        log_warn!(
            error_type = "model_timeout",
            timeout_ms = timeout.as_millis() as u64,
            "model request timed out"
        );
        Self::External(ErrorEnvelope::new(
            codes::MODEL_TIMEOUT,
            codes::default_message(codes::MODEL_TIMEOUT).to_string(),
            true,
        ))
    }

    pub fn model_rate_limited() -> Self {
        log_warn!(error_type = "model_rate_limited", "model provider rate limit hit");
        Self::External(ErrorEnvelope::new(
            codes::MODEL_RATE_LIMITED,
            codes::default_message(codes::MODEL_RATE_LIMITED).to_string(),
            true,
        ))
    }

    /// Content rejected by the provider's filter. Not retryable without
    /// changing the content.
    pub fn content_filtered() -> Self {
        log_warn!(error_type = "content_filtered", "content filtered by model provider");
        Self::External(ErrorEnvelope::new(
            codes::CONTENT_FILTERED,
            codes::default_message(codes::CONTENT_FILTERED).to_string(),
            false,
        ))
    }

    /// Malformed model output. Retryable as a defensive measure; malformed
    /// output is often transient.
    pub fn invalid_model_response(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "invalid_model_response",
            message = %message,
            "model response format invalid"
        );
        Self::External(ErrorEnvelope::new(
            codes::INVALID_MODEL_RESPONSE,
            message,
            true,
        ))
    }

    pub fn model_unavailable() -> Self {
        log_error!(error_type = "model_unavailable", "model service unavailable");
        Self::External(ErrorEnvelope::new(
            codes::MODEL_UNAVAILABLE,
            codes::default_message(codes::MODEL_UNAVAILABLE).to_string(),
            true,
        ))
    }
}
