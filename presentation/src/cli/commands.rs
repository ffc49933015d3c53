//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Full formatted output with every warrior's response
    Full,
    /// Only the synthesized answer
    Answer,
    /// JSON output
    Json,
}

/// CLI arguments for quest-council
#[derive(Parser, Debug)]
#[command(name = "quest-council")]
#[command(version, about = "A council of warriors pursuing quests by consensus")]
#[command(long_about = r#"
quest-council dispatches questions to a council of differently-personified
model backends in parallel, reduces their answers to a consensus, and runs
long-lived quests: persisted goals pursued through repeated autonomous
attempts that learn from their own history.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./council.toml      Project-level config
3. ~/.config/quest-council/config.toml   Global config

Example:
  quest-council ask "Is sharding the right fix for this workload?"
  quest-council quest create "Make the test suite run under a minute" --start
  quest-council quest run
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask the council a one-shot question
    Ask {
        /// The question to dispatch
        question: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "answer")]
        output: OutputFormat,
    },

    /// Manage quests and run the autonomous loop
    Quest {
        #[command(subcommand)]
        command: QuestCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum QuestCommand {
    /// Create a new quest
    Create {
        /// The goal to pursue
        goal: String,

        /// Strategy tag (adaptive, exploratory, focused, or free text)
        #[arg(long)]
        strategy: Option<String>,

        /// Scheduling priority (higher runs first)
        #[arg(long)]
        priority: Option<i64>,

        /// Attempt budget (-1 = unbounded)
        #[arg(long)]
        max_attempts: Option<i64>,

        /// Wall-clock budget in minutes (-1 = unbounded)
        #[arg(long)]
        timeout_minutes: Option<i64>,

        /// Start the quest immediately
        #[arg(long)]
        start: bool,
    },

    /// List quests
    List {
        /// Filter by status (created, running, paused, completed, failed, stopped)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one quest with its recent attempts
    Show { id: i64 },

    /// Start (or resume) a quest
    Start { id: i64 },

    /// Pause a running quest
    Pause { id: i64 },

    /// Stop a quest for good
    Stop { id: i64 },

    /// Show a quest's attempt history, newest first
    History {
        id: i64,

        /// Maximum attempts to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Aggregate statistics across all quests
    Stats,

    /// Service liveness and manager state
    Health,

    /// Run the quest manager loop until interrupted
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["quest-council", "ask", "is this fine?"]).unwrap();
        match cli.command {
            Some(Command::Ask { question, .. }) => assert_eq!(question, "is this fine?"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_quest_create_with_flags() {
        let cli = Cli::try_parse_from([
            "quest-council",
            "quest",
            "create",
            "goal X",
            "--strategy",
            "focused",
            "--priority",
            "5",
            "--max-attempts",
            "10",
            "--start",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Quest {
                command:
                    QuestCommand::Create {
                        goal,
                        strategy,
                        priority,
                        max_attempts,
                        start,
                        ..
                    },
            }) => {
                assert_eq!(goal, "goal X");
                assert_eq!(strategy.as_deref(), Some("focused"));
                assert_eq!(priority, Some(5));
                assert_eq!(max_attempts, Some(10));
                assert!(start);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_is_global() {
        let cli = Cli::try_parse_from(["quest-council", "quest", "stats", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_show_config_without_subcommand() {
        let cli = Cli::try_parse_from(["quest-council", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }
}
