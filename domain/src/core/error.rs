//! Domain error types

use crate::quest::status::QuestStatus;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No warriors configured for the council")]
    NoWarriors,

    #[error("All warriors failed to respond")]
    AllWarriorsFailed,

    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error("Invalid warrior '{name}': {reason}")]
    InvalidWarrior { name: String, reason: String },

    #[error("Duplicate warrior name: {0}")]
    DuplicateWarrior(String),

    #[error("Invalid status transition {from} -> {to}: {reason}")]
    InvalidTransition {
        from: QuestStatus,
        to: QuestStatus,
        reason: String,
    },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled(_))
    }
}
