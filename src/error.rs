//! Error types for agent requests
//!
//! Every failure inside a pipeline becomes an `AgentError`. Callers only ever
//! see [`FAILURE_MESSAGE`]; the error itself (sanitized) goes to the log.

use crate::llm::provider::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// The only text a caller receives when a request fails
pub const FAILURE_MESSAGE: &str = "Sorry, there was an error processing your request.";

const MAX_ERROR_MESSAGE_LEN: usize = 500;
const TRUNCATE_SUFFIX: &str = "...[truncated]";

/// Main error type for agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Generation failed at {stage}: {source}")]
    GenerationFailed {
        stage: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl AgentError {
    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create generation error for the named stage
    pub fn generation_failed(stage: &'static str, source: LlmError) -> Self {
        Self::GenerationFailed { stage, source }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::InvalidInput { .. } => "invalid_input",
            AgentError::GenerationFailed { source, .. } => match source {
                LlmError::SchemaViolation(_) => "schema_violation",
                LlmError::NotConfigured(_) => "provider_not_configured",
                LlmError::RateLimitExceeded(_) => "rate_limited",
                LlmError::AuthenticationFailed(_) => "authentication_failed",
                _ => "generation_failed",
            },
            AgentError::InternalError { .. } => "internal_error",
        }
    }

    /// Error text safe to write to logs
    pub fn log_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

static SECRET_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static BEARER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)bearer\s+[A-Za-z0-9._~+/=-]+").expect("bearer pattern is valid")
});

static SENSITIVE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("path pattern is valid")
});

/// Redact secrets and sensitive paths and cap the length at 500 characters
pub fn sanitize_error_message(message: &str) -> String {
    let sanitized = SECRET_ASSIGNMENT.replace_all(message, "${1}=***");
    let sanitized = BEARER_TOKEN.replace_all(&sanitized, "Bearer ***");
    let sanitized = SENSITIVE_PATH
        .replace_all(&sanitized, "/***REDACTED***/")
        .into_owned();

    if sanitized.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return sanitized;
    }

    let keep = MAX_ERROR_MESSAGE_LEN - TRUNCATE_SUFFIX.len();
    let mut truncated: String = sanitized.chars().take(keep).collect();
    truncated.push_str(TRUNCATE_SUFFIX);
    truncated
}

/// Result type for Agent operations
pub type AgentResult<T> = Result<T, AgentError>;
