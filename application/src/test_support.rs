//! Shared test doubles: a scriptable gateway stub and an in-memory store.

use crate::ports::completion_gateway::{CompletionGateway, CompletionRequest, GatewayError};
use crate::ports::quest_store::{QuestStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use council_domain::{
    Attempt, NewAttempt, NewQuest, Quest, QuestStats, QuestStatus, Warrior,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Scriptable [`CompletionGateway`] double.
pub struct StubGateway {
    answer: String,
    answers: HashMap<String, String>,
    delay: Option<Duration>,
    failing: HashSet<String>,
    rejecting: HashSet<String>,
    transient: Mutex<HashMap<String, u32>>,
}

impl StubGateway {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            answers: HashMap::new(),
            delay: None,
            failing: HashSet::new(),
            rejecting: HashSet::new(),
            transient: Mutex::new(HashMap::new()),
        }
    }

    /// Per-warrior answer override.
    pub fn answer_for(mut self, warrior: &str, answer: impl Into<String>) -> Self {
        self.answers.insert(warrior.to_string(), answer.into());
        self
    }

    /// Every call sleeps this long before responding.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// This warrior always fails with a (transient) connection error.
    pub fn failing_for(mut self, warrior: &str) -> Self {
        self.failing.insert(warrior.to_string());
        self
    }

    /// This warrior always fails with a permanent rejection.
    pub fn rejecting(mut self, warrior: &str) -> Self {
        self.rejecting.insert(warrior.to_string());
        self
    }

    /// This warrior fails transiently `count` times, then succeeds.
    pub fn transient_failures(self, warrior: &str, count: u32) -> Self {
        self.transient
            .lock()
            .unwrap()
            .insert(warrior.to_string(), count);
        self
    }
}

#[async_trait]
impl CompletionGateway for StubGateway {
    async fn complete(
        &self,
        warrior: &Warrior,
        _request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.rejecting.contains(&warrior.name) {
            return Err(GatewayError::Rejected {
                status: 400,
                message: "stub: rejected".to_string(),
            });
        }
        if self.failing.contains(&warrior.name) {
            return Err(GatewayError::Connection("stub: unreachable".to_string()));
        }
        if let Some(left) = self.transient.lock().unwrap().get_mut(&warrior.name)
            && *left > 0
        {
            *left -= 1;
            return Err(GatewayError::Server {
                status: 503,
                message: "stub: overloaded".to_string(),
            });
        }
        Ok(self
            .answers
            .get(&warrior.name)
            .cloned()
            .unwrap_or_else(|| self.answer.clone()))
    }
}

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    quests: BTreeMap<i64, Quest>,
    attempts: HashMap<i64, Vec<Attempt>>,
    checkpoints: HashMap<i64, Vec<u8>>,
}

/// In-memory [`QuestStore`] with the same transactional semantics as the
/// sqlite adapter (a single lock stands in for the transaction).
#[derive(Default)]
pub struct MemoryQuestStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryQuestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestStore for MemoryQuestStore {
    async fn create_quest(&self, new_quest: NewQuest) -> Result<Quest, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let quest = Quest {
            id: inner.next_id,
            goal: new_quest.goal.into_content(),
            strategy: new_quest.strategy,
            status: QuestStatus::Created,
            priority: new_quest.priority,
            max_attempts: new_quest.max_attempts,
            timeout_minutes: new_quest.timeout_minutes,
            attempts_count: 0,
            success_count: 0,
            best_score: 0.0,
            best_solution: None,
            created_at: Utc::now(),
            started_at: None,
            paused_at: None,
            completed_at: None,
        };
        inner.quests.insert(quest.id, quest.clone());
        Ok(quest)
    }

    async fn quest(&self, id: i64) -> Result<Quest, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .quests
            .get(&id)
            .cloned()
            .ok_or(StoreError::QuestNotFound(id))
    }

    async fn quests(&self, status: Option<QuestStatus>) -> Result<Vec<Quest>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut quests: Vec<Quest> = inner
            .quests
            .values()
            .filter(|q| status.is_none_or(|s| q.status == s))
            .cloned()
            .collect();
        quests.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(quests)
    }

    async fn active_quests(&self) -> Result<Vec<Quest>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut quests: Vec<Quest> = inner
            .quests
            .values()
            .filter(|q| q.status == QuestStatus::Running)
            .cloned()
            .collect();
        quests.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        Ok(quests)
    }

    async fn update_status(&self, id: i64, status: QuestStatus) -> Result<Quest, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let quest = inner
            .quests
            .get_mut(&id)
            .ok_or(StoreError::QuestNotFound(id))?;
        quest
            .status
            .validate_transition(status, quest.success_count)?;
        let now = Utc::now();
        match status {
            QuestStatus::Running => {
                if quest.started_at.is_none() {
                    quest.started_at = Some(now);
                }
            }
            QuestStatus::Paused => quest.paused_at = Some(now),
            QuestStatus::Completed | QuestStatus::Failed | QuestStatus::Stopped => {
                quest.completed_at = Some(now);
            }
            QuestStatus::Created => {}
        }
        quest.status = status;
        Ok(quest.clone())
    }

    async fn log_attempt(
        &self,
        quest_id: i64,
        new_attempt: NewAttempt,
    ) -> Result<(Quest, Attempt), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let quest = inner
            .quests
            .get_mut(&quest_id)
            .ok_or(StoreError::QuestNotFound(quest_id))?;

        let attempt = Attempt {
            quest_id,
            attempt_number: quest.attempts_count + 1,
            approach: new_attempt.approach,
            result_summary: new_attempt.result_summary,
            score: new_attempt.score,
            success: new_attempt.success,
            execution_time_ms: new_attempt.execution_time_ms,
            responses: new_attempt.responses,
            learned: new_attempt.learned,
            created_at: Utc::now(),
        };

        quest.attempts_count += 1;
        if attempt.success {
            quest.success_count += 1;
            if attempt.score > quest.best_score {
                quest.best_score = attempt.score;
                quest.best_solution = Some(attempt.result_summary.clone());
            }
        }

        let updated = quest.clone();
        inner.attempts.entry(quest_id).or_default().push(attempt.clone());
        Ok((updated, attempt))
    }

    async fn history(&self, quest_id: i64, limit: usize) -> Result<Vec<Attempt>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut attempts = inner.attempts.get(&quest_id).cloned().unwrap_or_default();
        attempts.reverse();
        attempts.truncate(limit);
        Ok(attempts)
    }

    async fn stats(&self) -> Result<QuestStats, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut stats = QuestStats::default();
        for quest in inner.quests.values() {
            stats.total_quests += 1;
            match quest.status {
                QuestStatus::Running | QuestStatus::Paused => stats.active += 1,
                QuestStatus::Completed => stats.completed += 1,
                QuestStatus::Failed => stats.failed += 1,
                _ => {}
            }
            stats.total_attempts += u64::from(quest.attempts_count);
            stats.total_successes += u64::from(quest.success_count);
        }
        if stats.total_attempts > 0 {
            stats.success_rate = stats.total_successes as f64 / stats.total_attempts as f64;
        }
        Ok(stats)
    }

    async fn save_checkpoint(&self, quest_id: i64, blob: &[u8]) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .checkpoints
            .insert(quest_id, blob.to_vec());
        Ok(())
    }

    async fn latest_checkpoint(&self, quest_id: i64) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .checkpoints
            .get(&quest_id)
            .cloned())
    }
}
