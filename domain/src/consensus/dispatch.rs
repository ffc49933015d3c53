//! Per-warrior dispatch outcomes

use serde::{Deserialize, Serialize};

/// Response from a single warrior in one council dispatch.
///
/// An unreachable warrior produces a failure entry, never an error that
/// aborts the dispatch. The temperature is captured so aggregation can pick
/// a deterministic representative without consulting the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    /// The warrior that produced this result
    pub warrior: String,
    /// Sampling temperature the warrior ran with
    pub temperature: f64,
    /// The answer text (empty on failure)
    pub content: String,
    /// Whether the call succeeded
    pub success: bool,
    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock latency of the call, including retries
    pub latency_ms: u64,
    /// Number of tries used (1 = no retries)
    pub tries: u32,
}

impl DispatchResult {
    /// Creates a successful result.
    pub fn success(
        warrior: impl Into<String>,
        temperature: f64,
        content: impl Into<String>,
    ) -> Self {
        Self {
            warrior: warrior.into(),
            temperature,
            content: content.into(),
            success: true,
            error: None,
            latency_ms: 0,
            tries: 1,
        }
    }

    /// Creates a failed result recording why the warrior could not answer.
    pub fn failure(
        warrior: impl Into<String>,
        temperature: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            warrior: warrior.into(),
            temperature,
            content: String::new(),
            success: false,
            error: Some(error.into()),
            latency_ms: 0,
            tries: 1,
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result = DispatchResult::success("sage", 0.3, "Use a cache.")
            .with_latency(420)
            .with_tries(1);

        assert!(result.is_success());
        assert_eq!(result.warrior, "sage");
        assert_eq!(result.latency_ms, 420);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_failure_result() {
        let result = DispatchResult::failure("scout", 0.1, "connection refused").with_tries(3);

        assert!(!result.is_success());
        assert!(result.content.is_empty());
        assert_eq!(result.error.as_deref(), Some("connection refused"));
        assert_eq!(result.tries, 3);
    }
}
