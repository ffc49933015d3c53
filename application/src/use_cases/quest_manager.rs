//! Quest manager — the cooperative polling loop.
//!
//! One manager iterates all running quests round-robin, executing at most
//! one attempt per quest per pass, then sleeps a fixed interval. Parallelism
//! lives inside a single dispatch, never across quests; a stop or pause is
//! observed at the next attempt boundary. A quest's failure never kills the
//! loop: each error is logged against that quest and the pass continues.

use crate::ports::completion_gateway::CompletionGateway;
use crate::ports::quest_store::QuestStore;
use crate::use_cases::quest_engine::QuestEngine;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Round-robin driver over all active quests.
pub struct QuestManager<G: CompletionGateway + 'static> {
    engine: Arc<QuestEngine<G>>,
    store: Arc<dyn QuestStore>,
    pass_interval: Duration,
    running: Arc<AtomicBool>,
}

impl<G: CompletionGateway + 'static> QuestManager<G> {
    pub fn new(
        engine: Arc<QuestEngine<G>>,
        store: Arc<dyn QuestStore>,
        pass_interval: Duration,
    ) -> Self {
        Self {
            engine,
            store,
            pass_interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag consumed by the service health report.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run passes until the token is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        self.running.store(true, Ordering::SeqCst);
        info!("Quest manager started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.run_pass(&cancel).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.pass_interval) => {}
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Quest manager stopped");
    }

    /// One pass: at most one attempt per active quest, in priority order.
    pub async fn run_pass(&self, cancel: &CancellationToken) {
        let quests = match self.store.active_quests().await {
            Ok(quests) => quests,
            Err(e) => {
                error!("Could not list active quests: {}", e);
                return;
            }
        };

        if quests.is_empty() {
            debug!("No active quests this pass");
            return;
        }

        for quest in quests {
            if cancel.is_cancelled() {
                break;
            }

            match self.engine.run_attempt(quest.id, cancel).await {
                Ok(Some(outcome)) => {
                    debug!(
                        "Quest {}: attempt {} scored {:.2}",
                        quest.id, outcome.attempt.attempt_number, outcome.attempt.score
                    );
                    self.checkpoint(&outcome.quest).await;
                }
                Ok(None) => {}
                // Isolation: this quest's error is logged, the pass goes on
                Err(e) => error!("Quest {}: attempt failed: {}", quest.id, e),
            }
        }
    }

    /// Best-effort crash-recovery snapshot of the manager's view of a quest.
    async fn checkpoint(&self, quest: &council_domain::Quest) {
        let blob = json!({
            "quest_id": quest.id,
            "status": quest.status,
            "attempts_count": quest.attempts_count,
            "success_count": quest.success_count,
            "best_score": quest.best_score,
        })
        .to_string();

        if let Err(e) = self
            .store
            .save_checkpoint(quest.id, blob.as_bytes())
            .await
        {
            warn!("Quest {}: checkpoint write failed: {}", quest.id, e);
        }
    }
}
