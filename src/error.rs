use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use thiserror::Error;

/// Faults that are surfaced to the caller instead of a verdict
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("Display name is required.")]
    EmptyInput,
}

impl GateError {
    /// Machine-readable fault code for the invocation contract
    pub fn code(&self) -> &'static str {
        match self {
            GateError::EmptyInput => "invalid-argument",
        }
    }

    pub fn into_http(self) -> (StatusCode, Json<Value>) {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": self.code(),
                "message": self.to_string(),
            })),
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to encode field {field}: {source}")]
    Encode {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Connection-level failures read as the store being unavailable
    pub fn from_redis(e: redis::RedisError) -> Self {
        if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Redis(e)
        }
    }
}

/// Failure of a single request to the moderation endpoint, before any
/// HTTP status is known
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("moderation transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("moderation endpoint unreachable: {0}")]
    Unreachable(String),
}

/// Why the moderation client gave up without a classification
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModerationFailure {
    #[error("moderation endpoint returned status {status}")]
    Fatal { status: u16 },

    #[error("moderation still unavailable after {attempts} attempts")]
    Exhausted { attempts: u32 },
}
