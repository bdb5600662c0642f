//! HTTP status mapping for classified errors.
//!
//! A total, deterministic function from error code to transport status, backed
//! by a static table fixed at startup. [`respond`] is the single exit point
//! for every failure crossing the system boundary: it pairs the mapped status
//! with the serialized wire envelope.

use crate::codes::{self, ErrorCode};
use crate::error::{ClassifiedError, WireEnvelope};
use ::http::StatusCode;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Status returned for any code absent from the table.
pub const DEFAULT_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

static STATUS_TABLE: Lazy<HashMap<ErrorCode, StatusCode>> = Lazy::new(|| {
    HashMap::from([
        // Validation layer (U-1xxx)
        (codes::VALIDATION_FAILED, StatusCode::BAD_REQUEST),
        // API layer (A-2xxx)
        (codes::AUTHENTICATION_FAILED, StatusCode::UNAUTHORIZED),
        (codes::AUTHORIZATION_FAILED, StatusCode::FORBIDDEN),
        (codes::INVALID_REQUEST, StatusCode::BAD_REQUEST),
        (codes::RESOURCE_NOT_FOUND, StatusCode::NOT_FOUND),
        (codes::METHOD_NOT_ALLOWED, StatusCode::METHOD_NOT_ALLOWED),
        (codes::RATE_LIMIT_EXCEEDED, StatusCode::TOO_MANY_REQUESTS),
        (codes::API_INTERNAL_ERROR, StatusCode::INTERNAL_SERVER_ERROR),
        // Business / retrieval layer (B-3xxx)
        (codes::RETRIEVAL_EMPTY, StatusCode::NOT_FOUND),
        (codes::HALLUCINATION_DETECTED, StatusCode::INTERNAL_SERVER_ERROR),
        (codes::CONTEXT_MISMATCH, StatusCode::UNPROCESSABLE_ENTITY),
        (codes::PROCESSING_FAILED, StatusCode::INTERNAL_SERVER_ERROR),
        // Infrastructure layer (I-4xxx)
        (codes::DB_CONNECTION_EXHAUSTED, StatusCode::SERVICE_UNAVAILABLE),
        (codes::DB_QUERY_FAILED, StatusCode::INTERNAL_SERVER_ERROR),
        (codes::CACHE_UNAVAILABLE, StatusCode::SERVICE_UNAVAILABLE),
        (codes::INFRA_INTERNAL_ERROR, StatusCode::INTERNAL_SERVER_ERROR),
        (codes::DEADLOCK_DETECTED, StatusCode::SERVICE_UNAVAILABLE),
        // External model layer (E-5xxx)
        (codes::MODEL_TIMEOUT, StatusCode::GATEWAY_TIMEOUT),
        (codes::MODEL_RATE_LIMITED, StatusCode::TOO_MANY_REQUESTS),
        (codes::CONTENT_FILTERED, StatusCode::UNPROCESSABLE_ENTITY),
        (codes::INVALID_MODEL_RESPONSE, StatusCode::BAD_GATEWAY),
        (codes::MODEL_UNAVAILABLE, StatusCode::SERVICE_UNAVAILABLE),
    ])
});

/// Map an error code to its HTTP status. Total: unknown codes map to 500.
pub fn map_to_status(code: ErrorCode) -> StatusCode {
    STATUS_TABLE.get(&code).copied().unwrap_or(DEFAULT_STATUS)
}

/// Convert a classified error into its boundary response.
pub fn respond(error: &ClassifiedError) -> (StatusCode, WireEnvelope) {
    (map_to_status(error.code()), error.to_wire_envelope())
}
