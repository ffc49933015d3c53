//! Quest store port
//!
//! Durable, transactional storage for quests and their attempt history.
//! The adapter lives in the infrastructure layer; everything here is
//! contract.

use async_trait::async_trait;
use council_domain::{Attempt, DomainError, NewAttempt, NewQuest, Quest, QuestStats, QuestStatus};
use thiserror::Error;

/// Errors from the quest store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Quest not found: {0}")]
    QuestNotFound(i64),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Durable quest storage.
///
/// Implementations must make `log_attempt` atomic: the attempt row and every
/// derived counter on the quest move in one transaction, so a concurrent
/// reader never observes a partially-updated summary.
#[async_trait]
pub trait QuestStore: Send + Sync {
    /// Create a quest with status `created`.
    async fn create_quest(&self, new_quest: NewQuest) -> Result<Quest, StoreError>;

    /// Fetch one quest by id.
    async fn quest(&self, id: i64) -> Result<Quest, StoreError>;

    /// All quests, optionally filtered by status, newest first.
    async fn quests(&self, status: Option<QuestStatus>) -> Result<Vec<Quest>, StoreError>;

    /// Running quests ordered by priority desc, then created_at asc.
    async fn active_quests(&self) -> Result<Vec<Quest>, StoreError>;

    /// Transition a quest's status, stamping the matching timestamp field.
    ///
    /// Invalid transitions (including completing with zero successes) are
    /// rejected with an error, never coerced.
    async fn update_status(&self, id: i64, status: QuestStatus) -> Result<Quest, StoreError>;

    /// Append an attempt and update the quest's derived counters atomically.
    ///
    /// Assigns the attempt number (`attempts_count + 1` at insertion),
    /// increments `attempts_count`, conditionally increments
    /// `success_count`, and raises `best_score`/`best_solution` when a
    /// successful attempt beats the previous best. Returns the updated
    /// quest together with the stored attempt.
    async fn log_attempt(
        &self,
        quest_id: i64,
        attempt: NewAttempt,
    ) -> Result<(Quest, Attempt), StoreError>;

    /// Attempt history, newest first, up to `limit`.
    async fn history(&self, quest_id: i64, limit: usize) -> Result<Vec<Attempt>, StoreError>;

    /// Aggregate counters across all quests.
    async fn stats(&self) -> Result<QuestStats, StoreError>;

    /// Persist an opaque snapshot blob for crash recovery.
    async fn save_checkpoint(&self, quest_id: i64, blob: &[u8]) -> Result<(), StoreError>;

    /// Most recent checkpoint blob for a quest, if any.
    async fn latest_checkpoint(&self, quest_id: i64) -> Result<Option<Vec<u8>>, StoreError>;
}
