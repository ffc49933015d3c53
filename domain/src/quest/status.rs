//! Quest status machine.
//!
//! `created -> running -> {paused, completed, failed, stopped}`,
//! `paused -> {running, stopped}`. Completed, failed, and stopped are
//! terminal. A quest completes only if it has at least one successful
//! attempt; the transition validator enforces this rather than coercing.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    Created,
    Running,
    Paused,
    Completed,
    Failed,
    Stopped,
}

impl QuestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QuestStatus::Created => "created",
            QuestStatus::Running => "running",
            QuestStatus::Paused => "paused",
            QuestStatus::Completed => "completed",
            QuestStatus::Failed => "failed",
            QuestStatus::Stopped => "stopped",
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuestStatus::Completed | QuestStatus::Failed | QuestStatus::Stopped
        )
    }

    /// Validate a transition, including the completion invariant.
    ///
    /// `success_count` is the quest's success counter at the moment of the
    /// transition; completing with zero successes is rejected.
    pub fn validate_transition(
        self,
        to: QuestStatus,
        success_count: u32,
    ) -> Result<(), DomainError> {
        let allowed = match (self, to) {
            (QuestStatus::Created, QuestStatus::Running) => true,
            (QuestStatus::Running, QuestStatus::Paused)
            | (QuestStatus::Running, QuestStatus::Completed)
            | (QuestStatus::Running, QuestStatus::Failed)
            | (QuestStatus::Running, QuestStatus::Stopped) => true,
            (QuestStatus::Paused, QuestStatus::Running)
            | (QuestStatus::Paused, QuestStatus::Stopped) => true,
            _ => false,
        };

        if !allowed {
            return Err(DomainError::InvalidTransition {
                from: self,
                to,
                reason: if self.is_terminal() {
                    "quest is terminal".to_string()
                } else {
                    "transition not in the state machine".to_string()
                },
            });
        }

        if to == QuestStatus::Completed && success_count == 0 {
            return Err(DomainError::InvalidTransition {
                from: self,
                to,
                reason: "no successful attempts".to_string(),
            });
        }

        Ok(())
    }
}

impl std::fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QuestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(QuestStatus::Created),
            "running" => Ok(QuestStatus::Running),
            "paused" => Ok(QuestStatus::Paused),
            "completed" => Ok(QuestStatus::Completed),
            "failed" => Ok(QuestStatus::Failed),
            "stopped" => Ok(QuestStatus::Stopped),
            other => Err(format!("unknown quest status: {}", other)),
        }
    }
}
