//! Action executor port
//!
//! Execution of council-proposed actions is an external collaborator. The
//! engine's contract is narrower than execution itself: a DANGEROUS-tiered
//! action is never handed to an implementation of this port.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from an action executor
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Execution failed: {0}")]
    Failed(String),

    #[error("Execution timed out")]
    Timeout,
}

/// External executor for safety-cleared actions.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Run an action string and return its output.
    async fn execute(&self, action: &str) -> Result<String, ExecutorError>;
}
