//! Engine parameters — quest loop control.
//!
//! [`EngineParams`] groups the static parameters that control dispatching
//! and the autonomous attempt loop. These are application-layer concerns,
//! not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quest engine control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParams {
    /// Timeout for each individual warrior call within a dispatch.
    pub per_call_timeout: Duration,
    /// Retries per warrior after the first try (transient failures only).
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_backoff_base: Duration,
    /// Attempt score at or above which an attempt counts as a success.
    pub success_threshold: f64,
    /// How many prior attempts feed into approach generation.
    pub history_window: usize,
    /// Sleep between manager passes over the active quests.
    pub pass_interval: Duration,
    /// Treat MODERATE-tier actions as confirmed. DANGEROUS actions are
    /// refused regardless of this setting.
    pub auto_confirm: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            per_call_timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff_base: Duration::from_millis(500),
            success_threshold: 0.7,
            history_window: 5,
            pass_interval: Duration::from_secs(10),
            auto_confirm: false,
        }
    }
}

impl EngineParams {
    // ==================== Builder Methods ====================

    pub fn with_per_call_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_retry_backoff_base(mut self, base: Duration) -> Self {
        self.retry_backoff_base = base;
        self
    }

    pub fn with_success_threshold(mut self, threshold: f64) -> Self {
        self.success_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_pass_interval(mut self, interval: Duration) -> Self {
        self.pass_interval = interval;
        self
    }

    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = EngineParams::default();
        assert_eq!(params.per_call_timeout, Duration::from_secs(60));
        assert_eq!(params.max_retries, 2);
        assert_eq!(params.success_threshold, 0.7);
        assert_eq!(params.history_window, 5);
        assert!(!params.auto_confirm);
    }

    #[test]
    fn test_threshold_clamped() {
        let params = EngineParams::default().with_success_threshold(1.4);
        assert_eq!(params.success_threshold, 1.0);
    }
}
