//! Quest entities and their status machine

pub mod entities;
pub mod status;

pub use entities::{Attempt, NewAttempt, NewQuest, Quest, QuestStats};
pub use status::QuestStatus;
