//! Agreement level classification.
//!
//! The agreement level is a deterministic function of how many warriors'
//! decision tokens landed in the majority bucket, over the total number of
//! warriors queried. It never introduces randomness of its own.

use serde::{Deserialize, Serialize};

/// How much the council's answers agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementLevel {
    /// Every queried warrior landed in the majority bucket
    Unanimous,
    /// At least three quarters agreed
    Strong,
    /// At least half agreed
    Majority,
    /// Some agreed, less than half
    Weak,
    /// Nobody answered, or no bucket formed
    None,
}

impl AgreementLevel {
    /// Classify from the majority-bucket size over the total queried.
    ///
    /// `total` is the number of warriors *queried*, not the number that
    /// answered — silence counts against agreement.
    pub fn classify(majority: usize, total: usize) -> Self {
        if total == 0 || majority == 0 {
            return AgreementLevel::None;
        }
        let fraction = majority as f64 / total as f64;
        if fraction >= 1.0 {
            AgreementLevel::Unanimous
        } else if fraction >= 0.75 {
            AgreementLevel::Strong
        } else if fraction >= 0.5 {
            AgreementLevel::Majority
        } else {
            AgreementLevel::Weak
        }
    }

    /// Numeric score used by the quest engine (1.0 down to 0.0).
    pub fn score(&self) -> f64 {
        match self {
            AgreementLevel::Unanimous => 1.0,
            AgreementLevel::Strong => 0.85,
            AgreementLevel::Majority => 0.6,
            AgreementLevel::Weak => 0.3,
            AgreementLevel::None => 0.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AgreementLevel::Unanimous => "unanimous",
            AgreementLevel::Strong => "strong",
            AgreementLevel::Majority => "majority",
            AgreementLevel::Weak => "weak",
            AgreementLevel::None => "none",
        }
    }
}

impl std::fmt::Display for AgreementLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
