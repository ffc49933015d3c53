//! Council dispatch use case.
//!
//! Fans one prompt out to every warrior concurrently. Each call is bounded
//! by its own timeout and retried (with exponential backoff) on transient
//! failures, independently of the others. A warrior that exhausts retries
//! contributes a failed [`DispatchResult`]; only an empty warrior set is a
//! hard error. Cancellation aborts in-flight calls immediately and keeps
//! whatever already completed.

use crate::ports::completion_gateway::{CompletionGateway, CompletionRequest, GatewayError};
use crate::ports::progress::{DispatchProgress, NoProgress};
use council_domain::{DispatchResult, Warrior};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that can occur during a dispatch
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("No warriors to dispatch to")]
    NoWarriors,
}

/// Input for one council dispatch
#[derive(Debug, Clone)]
pub struct DispatchInput {
    /// The prompt every warrior receives
    pub prompt: String,
    /// The warriors to query
    pub warriors: Vec<Warrior>,
    /// Timeout for each individual call
    pub per_call_timeout: Duration,
    /// Retries per warrior after the first try
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries
    pub retry_backoff_base: Duration,
}

impl DispatchInput {
    pub fn new(prompt: impl Into<String>, warriors: Vec<Warrior>) -> Self {
        Self {
            prompt: prompt.into(),
            warriors,
            per_call_timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff_base: Duration::from_millis(500),
        }
    }

    pub fn with_per_call_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff_base(mut self, base: Duration) -> Self {
        self.retry_backoff_base = base;
        self
    }
}

/// Use case for dispatching one prompt to the whole council
pub struct DispatchCouncilUseCase<G: CompletionGateway + 'static> {
    gateway: Arc<G>,
}

impl<G: CompletionGateway + 'static> DispatchCouncilUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Execute the dispatch with default (no-op) progress.
    pub async fn execute(
        &self,
        input: DispatchInput,
        cancel: &CancellationToken,
    ) -> Result<Vec<DispatchResult>, DispatchError> {
        self.execute_with_progress(input, cancel, &NoProgress).await
    }

    /// Execute the dispatch with progress callbacks.
    pub async fn execute_with_progress(
        &self,
        input: DispatchInput,
        cancel: &CancellationToken,
        progress: &dyn DispatchProgress,
    ) -> Result<Vec<DispatchResult>, DispatchError> {
        if input.warriors.is_empty() {
            return Err(DispatchError::NoWarriors);
        }

        info!("Dispatching to {} warriors", input.warriors.len());
        progress.on_dispatch_start(input.warriors.len());

        let mut join_set = JoinSet::new();

        for warrior in &input.warriors {
            let gateway = Arc::clone(&self.gateway);
            let warrior = warrior.clone();
            let prompt = input.prompt.clone();
            let per_call_timeout = input.per_call_timeout;
            let max_retries = input.max_retries;
            let backoff_base = input.retry_backoff_base;
            let cancel = cancel.clone();

            join_set.spawn(async move {
                Self::query_warrior(
                    &gateway,
                    &warrior,
                    &prompt,
                    per_call_timeout,
                    max_retries,
                    backoff_base,
                    &cancel,
                )
                .await
            });
        }

        let mut results = Vec::new();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => {
                    if result.success {
                        debug!("Warrior {} answered in {}ms", result.warrior, result.latency_ms);
                    } else {
                        warn!(
                            "Warrior {} failed: {}",
                            result.warrior,
                            result.error.as_deref().unwrap_or("unknown")
                        );
                    }
                    progress.on_warrior_complete(&result.warrior, result.success);
                    results.push(result);
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        let answered = results.iter().filter(|r| r.success).count();
        progress.on_dispatch_complete(answered, results.len());
        Ok(results)
    }

    /// Query one warrior with timeout, bounded retry, and cancellation.
    async fn query_warrior(
        gateway: &G,
        warrior: &Warrior,
        prompt: &str,
        per_call_timeout: Duration,
        max_retries: u32,
        backoff_base: Duration,
        cancel: &CancellationToken,
    ) -> DispatchResult {
        let start = Instant::now();
        let request = CompletionRequest::new(prompt);
        let mut tries: u32 = 0;

        loop {
            tries += 1;

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    Err(GatewayError::Cancelled("dispatch cancelled".to_string()))
                }
                timed = tokio::time::timeout(per_call_timeout, gateway.complete(warrior, &request)) => {
                    match timed {
                        Ok(inner) => inner,
                        Err(_) => Err(GatewayError::Timeout),
                    }
                }
            };

            match outcome {
                Ok(content) => {
                    return DispatchResult::success(&warrior.name, warrior.temperature, content)
                        .with_latency(start.elapsed().as_millis() as u64)
                        .with_tries(tries);
                }
                Err(e) if e.is_transient() && tries <= max_retries => {
                    let backoff = backoff_base * 2u32.saturating_pow(tries - 1);
                    debug!(
                        "Warrior {} try {} failed ({}), retrying in {:?}",
                        warrior.name, tries, e, backoff
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return DispatchResult::failure(
                                &warrior.name,
                                warrior.temperature,
                                "dispatch cancelled during backoff",
                            )
                            .with_latency(start.elapsed().as_millis() as u64)
                            .with_tries(tries);
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(e) => {
                    return DispatchResult::failure(&warrior.name, warrior.temperature, e.to_string())
                        .with_latency(start.elapsed().as_millis() as u64)
                        .with_tries(tries);
                }
            }
        }
    }
}
