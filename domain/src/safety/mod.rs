//! Safety classification for proposed actions.
//!
//! Any command or action string extracted from a council answer is tiered
//! before it can reach an executor. The gate is absolute for the top tier:
//! a DANGEROUS action is never executed, regardless of confirmation flags.

pub mod classifier;
pub mod tier;

pub use classifier::{SafetyClassifier, extract_action};
pub use tier::{SafetyClassification, SafetyTier};
