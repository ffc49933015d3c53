//! Domain layer for quest-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council is a fixed set of differently-personified model backends
//! ("warriors"). A single prompt is dispatched to all of them in parallel
//! and their answers are reduced into a consensus.
//!
//! ## Quest
//!
//! A quest is a long-lived, persisted goal pursued through repeated
//! autonomous attempts. Each attempt dispatches to the council, scores the
//! agreement, and feeds what was learned into the next attempt.

pub mod consensus;
pub mod core;
pub mod council;
pub mod quest;
pub mod safety;

// Re-export commonly used types
pub use consensus::{
    AgreementLevel, ConsensusResult, DispatchResult, aggregate, decision_token, is_actionable,
};
pub use core::{error::DomainError, goal::Goal, model::Model};
pub use council::{registry::WarriorRegistry, warrior::Warrior};
pub use quest::{
    entities::{Attempt, NewAttempt, NewQuest, Quest, QuestStats},
    status::QuestStatus,
};
pub use safety::{
    classifier::{SafetyClassifier, extract_action},
    tier::{SafetyClassification, SafetyTier},
};
