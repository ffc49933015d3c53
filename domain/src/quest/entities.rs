//! Quest and attempt entities.
//!
//! A [`Quest`] row carries derived counters (attempts_count, success_count,
//! best_score) maintained transactionally by the store as attempts are
//! logged. [`Attempt`]s are append-only and never updated after creation.

use crate::consensus::dispatch::DispatchResult;
use crate::core::goal::Goal;
use crate::quest::status::QuestStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel meaning "unbounded" for max_attempts / timeout_minutes.
pub const UNBOUNDED: i64 = -1;

/// A long-lived, persisted goal pursued via repeated autonomous attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: i64,
    pub goal: String,
    /// Strategy tag steering approach generation (free text, e.g. "adaptive")
    pub strategy: String,
    pub status: QuestStatus,
    pub priority: i64,
    /// Maximum attempts before the quest terminates; -1 = unbounded
    pub max_attempts: i64,
    /// Wall-clock budget from started_at; -1 = unbounded
    pub timeout_minutes: i64,
    pub attempts_count: u32,
    pub success_count: u32,
    pub best_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_solution: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Quest {
    /// Whether the attempt budget is used up.
    pub fn attempts_exhausted(&self) -> bool {
        self.max_attempts > 0 && u64::from(self.attempts_count) >= self.max_attempts as u64
    }

    /// Whether the wall-clock budget (from started_at) is used up.
    pub fn timed_out(&self, now: DateTime<Utc>) -> bool {
        if self.timeout_minutes <= 0 {
            return false;
        }
        match self.started_at {
            Some(started) => (now - started).num_minutes() >= self.timeout_minutes,
            None => false,
        }
    }

    /// The engine keeps attempting while this holds.
    pub fn should_continue(&self, now: DateTime<Utc>) -> bool {
        self.status == QuestStatus::Running && !self.attempts_exhausted() && !self.timed_out(now)
    }
}

/// Parameters for creating a quest. Status and counters are store-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuest {
    pub goal: Goal,
    pub strategy: String,
    pub priority: i64,
    pub max_attempts: i64,
    pub timeout_minutes: i64,
}

impl NewQuest {
    pub fn new(goal: Goal) -> Self {
        Self {
            goal,
            strategy: "adaptive".to_string(),
            priority: 0,
            max_attempts: UNBOUNDED,
            timeout_minutes: UNBOUNDED,
        }
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: i64) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout_minutes(mut self, timeout_minutes: i64) -> Self {
        self.timeout_minutes = timeout_minutes;
        self
    }
}

/// One scored trial within a quest. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub quest_id: i64,
    /// 1-based, strictly increasing per quest with no gaps
    pub attempt_number: u32,
    pub approach: String,
    pub result_summary: String,
    pub score: f64,
    pub success: bool,
    pub execution_time_ms: u64,
    /// Full per-warrior responses from the dispatch
    pub responses: Vec<DispatchResult>,
    /// What this attempt taught the next one
    pub learned: String,
    pub created_at: DateTime<Utc>,
}

/// Attempt payload before the store assigns its number and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttempt {
    pub approach: String,
    pub result_summary: String,
    pub score: f64,
    pub success: bool,
    pub execution_time_ms: u64,
    pub responses: Vec<DispatchResult>,
    pub learned: String,
}

impl NewAttempt {
    pub fn new(approach: impl Into<String>, score: f64, success: bool) -> Self {
        Self {
            approach: approach.into(),
            result_summary: String::new(),
            score: score.clamp(0.0, 1.0),
            success,
            execution_time_ms: 0,
            responses: Vec::new(),
            learned: String::new(),
        }
    }

    pub fn with_result_summary(mut self, summary: impl Into<String>) -> Self {
        self.result_summary = summary.into();
        self
    }

    pub fn with_execution_time_ms(mut self, ms: u64) -> Self {
        self.execution_time_ms = ms;
        self
    }

    pub fn with_responses(mut self, responses: Vec<DispatchResult>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_learned(mut self, learned: impl Into<String>) -> Self {
        self.learned = learned.into();
        self
    }
}

/// Aggregate counters for the service stats endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestStats {
    pub total_quests: u64,
    pub active: u64,
    pub completed: u64,
    pub failed: u64,
    pub total_attempts: u64,
    pub total_successes: u64,
    pub success_rate: f64,
}
