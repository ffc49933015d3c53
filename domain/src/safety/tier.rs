//! Safety tiers and the execution gate

use serde::{Deserialize, Serialize};

/// Risk tier of a proposed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyTier {
    /// Read-only diagnostics; auto-execution allowed
    Safe,
    /// State-changing but recoverable; requires explicit confirmation
    Moderate,
    /// Irreversible or destructive; never auto-executed
    Dangerous,
}

impl SafetyTier {
    pub fn as_str(&self) -> &str {
        match self {
            SafetyTier::Safe => "safe",
            SafetyTier::Moderate => "moderate",
            SafetyTier::Dangerous => "dangerous",
        }
    }

    /// The stricter of two tiers. Heuristics use this so a signal can only
    /// raise a tier, never lower it below a pattern match.
    pub fn max(self, other: SafetyTier) -> SafetyTier {
        std::cmp::max(self, other)
    }
}

impl std::fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying one action string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyClassification {
    /// The classified action string
    pub subject: String,
    /// Risk tier
    pub tier: SafetyTier,
    /// Name of the pattern that matched (or `unmatched-default`)
    pub pattern: String,
    /// Whether the free-text heuristic raised the tier above the pattern match
    pub raised_by_heuristic: bool,
}

impl SafetyClassification {
    /// The gating policy. SAFE runs unattended; MODERATE needs an explicit
    /// confirmation; DANGEROUS is refused no matter what the caller passes.
    pub fn allows_execution(&self, confirmed: bool) -> bool {
        match self.tier {
            SafetyTier::Safe => true,
            SafetyTier::Moderate => confirmed,
            SafetyTier::Dangerous => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(tier: SafetyTier) -> SafetyClassification {
        SafetyClassification {
            subject: "x".to_string(),
            tier,
            pattern: "test".to_string(),
            raised_by_heuristic: false,
        }
    }

    #[test]
    fn test_safe_always_executes() {
        assert!(classification(SafetyTier::Safe).allows_execution(false));
        assert!(classification(SafetyTier::Safe).allows_execution(true));
    }

    #[test]
    fn test_moderate_needs_confirmation() {
        assert!(!classification(SafetyTier::Moderate).allows_execution(false));
        assert!(classification(SafetyTier::Moderate).allows_execution(true));
    }

    #[test]
    fn test_dangerous_is_never_executed() {
        assert!(!classification(SafetyTier::Dangerous).allows_execution(false));
        // Confirmation flags do not override the gate
        assert!(!classification(SafetyTier::Dangerous).allows_execution(true));
    }

    #[test]
    fn test_max_raises_never_lowers() {
        assert_eq!(
            SafetyTier::Safe.max(SafetyTier::Moderate),
            SafetyTier::Moderate
        );
        assert_eq!(
            SafetyTier::Dangerous.max(SafetyTier::Safe),
            SafetyTier::Dangerous
        );
    }
}
