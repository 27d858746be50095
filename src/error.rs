//! Error types for the onboarding engine.

use std::time::Duration;

use crate::catalog::task::TaskStatus;

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generative service error: {0}")]
    Llm(#[from] LlmError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Credential {key} is unset or still a placeholder. {hint}")]
    PlaceholderCredential { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Generative service errors.
///
/// Every failure mode of the hint service collapses into this taxonomy at
/// the client boundary; nothing upstream of the client sees raw transport
/// or serde errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Authentication failed: the configured API credential was rejected or missing")]
    AuthFailed,

    #[error("Throttled, retry after {retry_after:?}")]
    Throttled { retry_after: Option<Duration> },

    #[error("Upstream service error (status {status}), transient")]
    Transient { status: u16 },

    #[error("Upstream rejected the request (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid response from generative service: {reason}")]
    InvalidResponse { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session state machine errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    #[error("Task {id} cannot transition from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Task {id} has no quiz payload")]
    NotAQuiz { id: String },

    #[error("Task {id} has no question payload")]
    NotAQuestion { id: String },
}

/// Session persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open session store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
