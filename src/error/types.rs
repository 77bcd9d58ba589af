use thiserror::Error;

use crate::registry::ToastId;

/// Unified result type for the toast engine.
pub type Result<T> = std::result::Result<T, ToastError>;

/// Errors surfaced by the toast engine.
#[derive(Debug, Error)]
pub enum ToastError {
    #[error("toast `{0}` not found")]
    NotFound(ToastId),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToastError {
    /// `NotFound` is a benign outcome for remove/clear style calls.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ToastError::NotFound(_))
    }
}

/// Failure reported by a lifecycle listener. Never propagated past the bus.
#[derive(Debug, Clone, Error)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
