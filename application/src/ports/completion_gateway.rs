//! Completion gateway port
//!
//! Defines the interface for querying one warrior's model backend.
//! Implementations (adapters) live in the infrastructure layer.

use async_trait::async_trait;
use council_domain::Warrior;
use thiserror::Error;

/// Errors that can occur while querying a backend
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Backend error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl GatewayError {
    /// Transient failures are worth retrying: timeouts, connection drops,
    /// and server-side errors. Rejections (4xx-style) never are — retrying a
    /// non-idempotent failure misclassified as transient is how duplicate
    /// side effects happen.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Connection(_) | GatewayError::Timeout | GatewayError::Server { .. }
        )
    }
}

/// One completion request to a warrior's backend.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The prompt sent as the user message
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Gateway for backend communication.
///
/// The warrior carries everything backend-specific: model, persona (sent as
/// the system message), temperature, output budget, and endpoint override.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Send one prompt to one warrior's backend and return the answer text.
    async fn complete(
        &self,
        warrior: &Warrior,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError>;
}
