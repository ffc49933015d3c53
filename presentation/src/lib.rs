//! Presentation layer for quest-council
//!
//! This crate contains CLI definitions, output formatters, and
//! progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat, QuestCommand};
pub use output::formatter::ConsoleFormatter;
pub use progress::reporter::ProgressReporter;
