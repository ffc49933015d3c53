//! Quest service — the external request/response surface.
//!
//! A thin layer external tooling (CLI, UI, other services) drives the quest
//! engine through. DTOs mirror the wire JSON shapes one-to-one; everything
//! interesting happens in the store and the engine.

use crate::ports::quest_store::{QuestStore, StoreError};
use council_domain::{
    Attempt, DomainError, Goal, NewQuest, Quest, QuestStats, QuestStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::info;

/// How many recent attempts ride along on a quest detail response
const RECENT_ATTEMPTS: usize = 5;

/// Default history page size
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Errors surfaced to service callers
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Quest not found: {0}")]
    NotFound(i64),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::QuestNotFound(id) => ServiceError::NotFound(id),
            StoreError::Domain(DomainError::InvalidTransition { .. }) => {
                ServiceError::InvalidTransition(e.to_string())
            }
            other => ServiceError::Store(other),
        }
    }
}

// ==================== Request / Response DTOs ====================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestRequest {
    pub goal: String,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub max_attempts: Option<i64>,
    #[serde(default)]
    pub timeout_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateQuestResponse {
    pub quest_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestListResponse {
    pub quests: Vec<Quest>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestDetailResponse {
    pub quest: Quest,
    pub recent_attempts: Vec<Attempt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<Attempt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: QuestStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub quest_manager_running: bool,
}

// ==================== Service ====================

/// Request/response facade over the quest store and manager state.
pub struct QuestService {
    store: Arc<dyn QuestStore>,
    manager_running: Arc<AtomicBool>,
}

impl QuestService {
    pub fn new(store: Arc<dyn QuestStore>, manager_running: Arc<AtomicBool>) -> Self {
        Self {
            store,
            manager_running,
        }
    }

    /// Create a quest in `created` status.
    pub async fn create(
        &self,
        request: CreateQuestRequest,
    ) -> Result<CreateQuestResponse, ServiceError> {
        let goal = Goal::try_new(request.goal)
            .ok_or_else(|| ServiceError::InvalidRequest("goal cannot be empty".to_string()))?;

        let mut new_quest = NewQuest::new(goal);
        if let Some(strategy) = request.strategy {
            new_quest = new_quest.with_strategy(strategy);
        }
        if let Some(priority) = request.priority {
            new_quest = new_quest.with_priority(priority);
        }
        if let Some(max_attempts) = request.max_attempts {
            new_quest = new_quest.with_max_attempts(max_attempts);
        }
        if let Some(timeout_minutes) = request.timeout_minutes {
            new_quest = new_quest.with_timeout_minutes(timeout_minutes);
        }

        let quest = self.store.create_quest(new_quest).await?;
        info!("Quest {} created", quest.id);
        Ok(CreateQuestResponse { quest_id: quest.id })
    }

    /// List quests, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<QuestStatus>,
    ) -> Result<QuestListResponse, ServiceError> {
        let quests = self.store.quests(status).await?;
        let count = quests.len();
        Ok(QuestListResponse { quests, count })
    }

    /// Fetch one quest with its most recent attempts.
    pub async fn get(&self, id: i64) -> Result<QuestDetailResponse, ServiceError> {
        let quest = self.store.quest(id).await?;
        let recent_attempts = self.store.history(id, RECENT_ATTEMPTS).await?;
        Ok(QuestDetailResponse {
            quest,
            recent_attempts,
        })
    }

    /// Start a created quest, or resume a paused one.
    pub async fn start(&self, id: i64) -> Result<StatusChangeResponse, ServiceError> {
        let quest = self.store.update_status(id, QuestStatus::Running).await?;
        Ok(StatusChangeResponse {
            message: format!("quest {} running", quest.id),
        })
    }

    /// Pause a running quest; observed at the next attempt boundary.
    pub async fn pause(&self, id: i64) -> Result<StatusChangeResponse, ServiceError> {
        let quest = self.store.update_status(id, QuestStatus::Paused).await?;
        Ok(StatusChangeResponse {
            message: format!("quest {} paused", quest.id),
        })
    }

    /// Stop a quest for good. Always yields `stopped`, never `completed`.
    pub async fn stop(&self, id: i64) -> Result<StatusChangeResponse, ServiceError> {
        let quest = self.store.update_status(id, QuestStatus::Stopped).await?;
        Ok(StatusChangeResponse {
            message: format!("quest {} stopped", quest.id),
        })
    }

    /// Attempt history, newest first.
    pub async fn history(
        &self,
        id: i64,
        limit: Option<usize>,
    ) -> Result<HistoryResponse, ServiceError> {
        // Surface NotFound for unknown quests instead of an empty history
        self.store.quest(id).await?;
        let history = self
            .store
            .history(id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await?;
        Ok(HistoryResponse { history })
    }

    /// Aggregate counters across all quests.
    pub async fn stats(&self) -> Result<StatsResponse, ServiceError> {
        let stats = self.store.stats().await?;
        Ok(StatsResponse { stats })
    }

    /// Liveness of the service and its manager loop.
    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "operational".to_string(),
            quest_manager_running: self.manager_running.load(Ordering::SeqCst),
        }
    }
}
