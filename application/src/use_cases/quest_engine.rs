//! Quest engine — one autonomous attempt at a time.
//!
//! Each attempt: generate an approach from the quest's goal, strategy, and
//! recent history; dispatch it to the full council; reduce the answers to a
//! consensus; score it; gate any proposed action through the safety
//! classifier; persist the attempt; and finalize the quest when its budgets
//! run out. Every attempt is logged, including all-failed dispatches.

use crate::config::EngineParams;
use crate::ports::action_executor::ActionExecutor;
use crate::ports::attempt_logger::{AttemptEvent, AttemptLogger, NoAttemptLog};
use crate::ports::completion_gateway::CompletionGateway;
use crate::ports::quest_store::{QuestStore, StoreError};
use crate::use_cases::dispatch_council::{DispatchCouncilUseCase, DispatchError, DispatchInput};
use chrono::Utc;
use council_domain::{
    Attempt, ConsensusResult, NewAttempt, Quest, QuestStatus, SafetyClassification,
    SafetyClassifier, WarriorRegistry, aggregate, extract_action,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that can occur while running an attempt
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// What one engine pass over a quest produced.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    /// The quest with counters updated by this attempt
    pub quest: Quest,
    /// The persisted attempt
    pub attempt: Attempt,
    /// Terminal status if this attempt finalized the quest
    pub finalized: Option<QuestStatus>,
    /// Set when the consensus proposed an action the gate refused
    pub blocked_action: Option<SafetyClassification>,
}

/// The autonomous attempt loop for one quest at a time.
pub struct QuestEngine<G: CompletionGateway + 'static> {
    store: Arc<dyn QuestStore>,
    registry: Arc<WarriorRegistry>,
    dispatcher: DispatchCouncilUseCase<G>,
    executor: Option<Arc<dyn ActionExecutor>>,
    audit: Arc<dyn AttemptLogger>,
    params: EngineParams,
}

impl<G: CompletionGateway + 'static> QuestEngine<G> {
    pub fn new(
        store: Arc<dyn QuestStore>,
        registry: Arc<WarriorRegistry>,
        gateway: Arc<G>,
        params: EngineParams,
    ) -> Self {
        Self {
            store,
            registry,
            dispatcher: DispatchCouncilUseCase::new(gateway),
            executor: None,
            audit: Arc::new(NoAttemptLog),
            params,
        }
    }

    /// Attach an external executor for safety-cleared actions.
    pub fn with_executor(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Attach an audit sink for attempt events.
    pub fn with_audit(mut self, audit: Arc<dyn AttemptLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Run at most one attempt for the quest.
    ///
    /// Returns `Ok(None)` when the quest should not attempt (not running,
    /// budgets exhausted, or the token is already cancelled). Exhausted
    /// budgets finalize the quest as a side effect.
    pub async fn run_attempt(
        &self,
        quest_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<AttemptOutcome>, EngineError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let quest = self.store.quest(quest_id).await?;
        if !quest.should_continue(Utc::now()) {
            // Budgets may have run out while the quest was still running
            if quest.status == QuestStatus::Running {
                self.finalize(&quest).await?;
            }
            return Ok(None);
        }

        let history = self
            .store
            .history(quest_id, self.params.history_window)
            .await?;
        let approach = build_approach(&quest, &history);

        debug!("Quest {}: attempt {} starting", quest.id, quest.attempts_count + 1);
        let started = Instant::now();

        let input = DispatchInput::new(approach.clone(), self.registry.all().to_vec())
            .with_per_call_timeout(self.params.per_call_timeout)
            .with_max_retries(self.params.max_retries)
            .with_retry_backoff_base(self.params.retry_backoff_base);

        let results = self.dispatcher.execute(input, cancel).await?;
        let consensus = aggregate(&results);

        let score = consensus.score();
        let success = score >= self.params.success_threshold;

        let mut blocked_action = None;
        let mut execution_note = None;

        if success && let Some(action) = extract_action(&consensus.answer) {
            let classification = SafetyClassifier::classify(&action);
            if classification.allows_execution(self.params.auto_confirm) {
                execution_note = self.execute_action(&quest, &action).await;
            } else {
                info!(
                    "Quest {}: action refused at tier {} (pattern {})",
                    quest.id, classification.tier, classification.pattern
                );
                self.audit.log(AttemptEvent::new(
                    "action_blocked",
                    json!({
                        "quest_id": quest.id,
                        "action": action,
                        "tier": classification.tier,
                        "pattern": classification.pattern,
                    }),
                ));
                blocked_action = Some(classification);
            }
        }

        let new_attempt = NewAttempt::new(approach, score, success)
            .with_result_summary(result_summary(&consensus, &blocked_action, &execution_note))
            .with_execution_time_ms(started.elapsed().as_millis() as u64)
            .with_responses(results)
            .with_learned(learned_text(&consensus, success));

        let (updated_quest, attempt) = self.store.log_attempt(quest_id, new_attempt).await?;

        self.audit.log(AttemptEvent::new(
            "attempt_logged",
            json!({
                "quest_id": updated_quest.id,
                "attempt_number": attempt.attempt_number,
                "score": attempt.score,
                "success": attempt.success,
                "agreement": consensus.agreement,
                "answered": consensus.answered,
                "total": consensus.total,
            }),
        ));

        let finalized = if !updated_quest.should_continue(Utc::now()) {
            Some(self.finalize(&updated_quest).await?)
        } else {
            None
        };

        Ok(Some(AttemptOutcome {
            quest: updated_quest,
            attempt,
            finalized,
            blocked_action,
        }))
    }

    /// Terminate a running quest whose budgets ran out.
    async fn finalize(&self, quest: &Quest) -> Result<QuestStatus, EngineError> {
        // Manual stop/pause already moved the status; only Running finalizes here
        if quest.status != QuestStatus::Running {
            return Ok(quest.status);
        }
        let terminal = if quest.success_count > 0 {
            QuestStatus::Completed
        } else {
            QuestStatus::Failed
        };
        info!("Quest {}: finalizing as {}", quest.id, terminal);
        self.store.update_status(quest.id, terminal).await?;
        Ok(terminal)
    }

    async fn execute_action(&self, quest: &Quest, action: &str) -> Option<String> {
        let executor = self.executor.as_ref()?;
        match executor.execute(action).await {
            Ok(output) => {
                debug!("Quest {}: action executed", quest.id);
                Some(format!("executed `{}`: {}", action, output))
            }
            Err(e) => {
                warn!("Quest {}: action `{}` failed: {}", quest.id, action, e);
                Some(format!("execution of `{}` failed: {}", action, e))
            }
        }
    }
}

/// Build the attempt prompt from the goal, strategy, and recent history.
///
/// The history window is how the loop avoids repeating failed approaches:
/// each prior attempt appears with its outcome and learned text.
fn build_approach(quest: &Quest, history: &[Attempt]) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("Goal: {}\n", quest.goal));
    prompt.push_str(&format!("Strategy: {}\n", strategy_directive(&quest.strategy)));

    if history.is_empty() {
        prompt.push_str("\nThis is the first attempt.\n");
    } else {
        prompt.push_str("\nPrior attempts, most recent first:\n");
        for attempt in history {
            prompt.push_str(&format!(
                "- attempt {} ({}, score {:.2}): {}\n",
                attempt.attempt_number,
                if attempt.success { "succeeded" } else { "failed" },
                attempt.score,
                if attempt.learned.is_empty() {
                    "no notes"
                } else {
                    &attempt.learned
                },
            ));
        }
    }

    prompt.push_str(
        "\nPropose one concrete next approach toward the goal. Do not repeat an \
         approach that already failed. Start with a clear verdict (yes or no) on \
         whether the goal is achievable this way, then give specific steps.\n",
    );
    prompt
}

fn strategy_directive(strategy: &str) -> &str {
    match strategy {
        "adaptive" => "adapt to what previous attempts taught",
        "exploratory" => "favor angles no previous attempt has tried",
        "focused" => "refine the best-scoring previous approach",
        other => other,
    }
}

fn result_summary(
    consensus: &ConsensusResult,
    blocked: &Option<SafetyClassification>,
    execution_note: &Option<String>,
) -> String {
    if consensus.all_failed() {
        return "no warrior answered".to_string();
    }
    let mut summary = consensus.answer.clone();
    if let Some(classification) = blocked {
        summary.push_str(&format!(
            "\n[action blocked: {} tier, pattern {}]",
            classification.tier, classification.pattern
        ));
    }
    if let Some(note) = execution_note {
        summary.push_str(&format!("\n[{}]", note));
    }
    summary
}

fn learned_text(consensus: &ConsensusResult, success: bool) -> String {
    if consensus.all_failed() {
        return "dispatch failed: no warrior answered; check backend health".to_string();
    }
    if success {
        format!(
            "{} agreement ({}/{}); this direction works",
            consensus.agreement, consensus.answered, consensus.total
        )
    } else if consensus.conflicts.is_empty() {
        format!(
            "{} agreement ({}/{}); too few warriors aligned",
            consensus.agreement, consensus.answered, consensus.total
        )
    } else {
        format!(
            "{} agreement ({}/{}); objections: {}",
            consensus.agreement,
            consensus.answered,
            consensus.total,
            consensus.conflicts.join(" | ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::action_executor::ExecutorError;
    use crate::test_support::{MemoryQuestStore, StubGateway};
    use council_domain::{Goal, Model, NewQuest, Warrior};
    use std::sync::Mutex;

    fn registry() -> Arc<WarriorRegistry> {
        let warriors = (0..4)
            .map(|i| {
                Warrior::new(
                    format!("warrior-{i}"),
                    Model::ClaudeSonnet45,
                    "persona",
                    0.2 * i as f64,
                )
                .unwrap()
            })
            .collect();
        Arc::new(WarriorRegistry::new(warriors).unwrap())
    }

    fn fast_params() -> EngineParams {
        EngineParams::default()
            .with_per_call_timeout(std::time::Duration::from_millis(500))
            .with_max_retries(0)
            .with_retry_backoff_base(std::time::Duration::from_millis(1))
    }

    async fn running_quest(store: &MemoryQuestStore) -> Quest {
        let quest = store
            .create_quest(NewQuest::new(Goal::try_new("reach consensus").unwrap()))
            .await
            .unwrap();
        store
            .update_status(quest.id, QuestStatus::Running)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_successful_attempt_is_logged() {
        let store = Arc::new(MemoryQuestStore::new());
        let gateway = Arc::new(StubGateway::answering("Yes. 1. Do X\n2. Do Y\n3. Verify"));
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params());
        let quest = running_quest(&store).await;

        let outcome = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.attempt.success);
        assert_eq!(outcome.attempt.attempt_number, 1);
        assert_eq!(outcome.quest.attempts_count, 1);
        assert_eq!(outcome.quest.success_count, 1);
        assert!(outcome.quest.best_score > 0.0);
        assert!(outcome.finalized.is_none());
    }

    #[tokio::test]
    async fn test_all_failed_dispatch_logs_zero_score() {
        let store = Arc::new(MemoryQuestStore::new());
        let gateway = Arc::new(
            StubGateway::answering("unused")
                .failing_for("warrior-0")
                .failing_for("warrior-1")
                .failing_for("warrior-2")
                .failing_for("warrior-3"),
        );
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params());
        let quest = running_quest(&store).await;

        let outcome = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert!(!outcome.attempt.success);
        assert_eq!(outcome.attempt.score, 0.0);
        assert!(outcome.attempt.learned.contains("dispatch failed"));
        // The quest keeps going: an all-failed dispatch is not terminal
        assert!(outcome.finalized.is_none());
        assert_eq!(outcome.quest.status, QuestStatus::Running);
    }

    #[tokio::test]
    async fn test_attempt_numbers_are_gapless() {
        let store = Arc::new(MemoryQuestStore::new());
        let gateway = Arc::new(StubGateway::answering("Yes. Concrete plan: ```sh\nls\n```"));
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params());
        let quest = running_quest(&store).await;

        for expected in 1..=3u32 {
            let outcome = engine
                .run_attempt(quest.id, &CancellationToken::new())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(outcome.attempt.attempt_number, expected);
            assert_eq!(outcome.quest.attempts_count, expected);
        }
    }

    #[tokio::test]
    async fn test_history_feeds_next_approach() {
        let store = Arc::new(MemoryQuestStore::new());
        // A split council: four divergent answers score too low to succeed
        let gateway = Arc::new(
            StubGateway::answering("unused")
                .answer_for("warrior-0", "first idea")
                .answer_for("warrior-1", "second idea")
                .answer_for("warrior-2", "third idea")
                .answer_for("warrior-3", "fourth idea"),
        );
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params());
        let quest = running_quest(&store).await;

        engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        let second = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        // The second approach embeds the first attempt's outcome
        assert!(second.attempt.approach.contains("attempt 1"));
        assert!(second.attempt.approach.contains("failed"));
    }

    #[tokio::test]
    async fn test_max_attempts_finalizes_failed_without_success() {
        let store = Arc::new(MemoryQuestStore::new());
        // Unanimous dissent scores high agreement, but the tests below force
        // failure by splitting the council instead
        let gateway = Arc::new(
            StubGateway::answering("ship it")
                .answer_for("warrior-0", "alpha path")
                .answer_for("warrior-1", "beta path")
                .answer_for("warrior-2", "gamma path")
                .answer_for("warrior-3", "delta path"),
        );
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params());
        let quest = store
            .create_quest(
                NewQuest::new(Goal::try_new("impossible").unwrap()).with_max_attempts(2),
            )
            .await
            .unwrap();
        store
            .update_status(quest.id, QuestStatus::Running)
            .await
            .unwrap();

        let first = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert!(!first.attempt.success);
        assert!(first.finalized.is_none());

        let second = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert!(!second.attempt.success);
        // Attempt budget exhausted with zero successes: never Completed
        assert_eq!(second.finalized, Some(QuestStatus::Failed));

        let stored = store.quest(quest.id).await.unwrap();
        assert_eq!(stored.status, QuestStatus::Failed);
    }

    #[tokio::test]
    async fn test_max_attempts_finalizes_completed_with_success() {
        let store = Arc::new(MemoryQuestStore::new());
        let gateway = Arc::new(StubGateway::answering("Yes, proceed. ```sh\ngit status\n```"));
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params());
        let quest = store
            .create_quest(NewQuest::new(Goal::try_new("easy").unwrap()).with_max_attempts(1))
            .await
            .unwrap();
        store
            .update_status(quest.id, QuestStatus::Running)
            .await
            .unwrap();

        let outcome = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.finalized, Some(QuestStatus::Completed));
        let stored = store.quest(quest.id).await.unwrap();
        assert_eq!(stored.status, QuestStatus::Completed);
        assert_eq!(stored.success_count, 1);
    }

    #[tokio::test]
    async fn test_paused_quest_does_not_attempt() {
        let store = Arc::new(MemoryQuestStore::new());
        let gateway = Arc::new(StubGateway::answering("yes"));
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params());
        let quest = running_quest(&store).await;
        store
            .update_status(quest.id, QuestStatus::Paused)
            .await
            .unwrap();

        let outcome = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.is_none());

        // Pause is observed at the attempt boundary, not coerced to terminal
        let stored = store.quest(quest.id).await.unwrap();
        assert_eq!(stored.status, QuestStatus::Paused);
    }

    #[tokio::test]
    async fn test_best_score_non_decreasing() {
        let store = Arc::new(MemoryQuestStore::new());
        let strong = Arc::new(
            StubGateway::answering("Yes. 1. step\n2. step\n3. step")
                .failing_for("warrior-3"),
        );
        let engine = QuestEngine::new(store.clone(), registry(), strong, fast_params());
        let quest = running_quest(&store).await;

        let first = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        let best_after_first = first.quest.best_score;

        // Second attempt scores lower (one more warrior down)
        let weaker = Arc::new(
            StubGateway::answering("Yes. 1. step\n2. step\n3. step")
                .failing_for("warrior-2")
                .failing_for("warrior-3"),
        );
        let engine = QuestEngine::new(store.clone(), registry(), weaker, fast_params());
        let second = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert!(second.quest.best_score >= best_after_first);
        assert_eq!(second.quest.best_score, best_after_first);
    }

    struct RecordingExecutor {
        executed: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl ActionExecutor for RecordingExecutor {
        async fn execute(&self, action: &str) -> Result<String, ExecutorError> {
            self.executed.lock().unwrap().push(action.to_string());
            Ok("done".to_string())
        }
    }

    #[tokio::test]
    async fn test_dangerous_action_never_reaches_executor() {
        let store = Arc::new(MemoryQuestStore::new());
        let gateway = Arc::new(StubGateway::answering(
            "Yes, wipe it:\n```sh\nrm -rf /\n```",
        ));
        let executor = Arc::new(RecordingExecutor {
            executed: Mutex::new(Vec::new()),
        });
        // auto_confirm=true must not matter for DANGEROUS
        let engine = QuestEngine::new(
            store.clone(),
            registry(),
            gateway,
            fast_params().with_auto_confirm(true),
        )
        .with_executor(executor.clone());
        let quest = running_quest(&store).await;

        let outcome = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        let blocked = outcome.blocked_action.expect("action must be blocked");
        assert_eq!(blocked.tier, council_domain::SafetyTier::Dangerous);
        assert!(executor.executed.lock().unwrap().is_empty());
        // Blocked action is a result, not an error: the attempt is still logged
        assert_eq!(outcome.quest.attempts_count, 1);
    }

    #[tokio::test]
    async fn test_safe_action_reaches_executor() {
        let store = Arc::new(MemoryQuestStore::new());
        let gateway = Arc::new(StubGateway::answering(
            "Yes, check state first:\n```sh\ngit status\n```",
        ));
        let executor = Arc::new(RecordingExecutor {
            executed: Mutex::new(Vec::new()),
        });
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params())
            .with_executor(executor.clone());
        let quest = running_quest(&store).await;

        let outcome = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.blocked_action.is_none());
        assert_eq!(
            executor.executed.lock().unwrap().as_slice(),
            ["git status"]
        );
    }

    #[tokio::test]
    async fn test_moderate_action_blocked_without_confirmation() {
        let store = Arc::new(MemoryQuestStore::new());
        let gateway = Arc::new(StubGateway::answering(
            "Yes:\n```sh\nsystemctl restart nginx\n```",
        ));
        let executor = Arc::new(RecordingExecutor {
            executed: Mutex::new(Vec::new()),
        });
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params())
            .with_executor(executor.clone());
        let quest = running_quest(&store).await;

        let outcome = engine
            .run_attempt(quest.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.blocked_action.is_some());
        assert!(executor.executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_attempt() {
        let store = Arc::new(MemoryQuestStore::new());
        let gateway = Arc::new(StubGateway::answering("yes"));
        let engine = QuestEngine::new(store.clone(), registry(), gateway, fast_params());
        let quest = running_quest(&store).await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = engine.run_attempt(quest.id, &cancel).await.unwrap();
        assert!(outcome.is_none());

        let stored = store.quest(quest.id).await.unwrap();
        assert_eq!(stored.attempts_count, 0);
    }
}
