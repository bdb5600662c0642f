//! Pipeline configuration.
//!
//! Environment-tunable parameters are read once at initialization via
//! [`PipelineConfig::from_env`]; they are not hot-reloaded. Unset or
//! unparsable values fall back to documented defaults with a warning.

use crate::logging::log_warn;
use std::time::Duration;

/// Per-attempt deadline for external model calls (`LLM_TIMEOUT_MS`).
pub const DEFAULT_MODEL_TIMEOUT_MS: u64 = 5000;
/// Deadline for infrastructure calls such as retrieval (`INFRA_TIMEOUT_MS`).
pub const DEFAULT_INFRA_TIMEOUT_MS: u64 = 3000;
/// Minimum match score for returning a stored answer without a model call.
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Immutable pipeline settings, shared read-only across requests.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-attempt timeout applied by the retry executor to model calls.
    pub model_timeout: Duration,
    /// Timeout for the retrieval collaborator call.
    pub infra_timeout: Duration,
    /// Fallback match threshold when the threshold source has no value.
    pub default_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_timeout: Duration::from_millis(DEFAULT_MODEL_TIMEOUT_MS),
            infra_timeout: Duration::from_millis(DEFAULT_INFRA_TIMEOUT_MS),
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            model_timeout: Duration::from_millis(env_ms("LLM_TIMEOUT_MS", DEFAULT_MODEL_TIMEOUT_MS)),
            infra_timeout: Duration::from_millis(env_ms(
                "INFRA_TIMEOUT_MS",
                DEFAULT_INFRA_TIMEOUT_MS,
            )),
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

fn env_ms(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                log_warn!(var = name, value = %raw, "unparsable timeout value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
