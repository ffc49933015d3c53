//! Console output formatting for consensus results and quests

use colored::Colorize;
use council_application::{
    HistoryResponse, QuestDetailResponse, QuestListResponse, StatsResponse,
};
use council_domain::{AgreementLevel, ConsensusResult, DispatchResult, Quest};

/// Formats results for console output
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Full view: every warrior's response, conflicts, and the consensus.
    pub fn format(results: &[DispatchResult], consensus: &ConsensusResult) -> String {
        let mut out = String::new();

        out.push_str(&format!("{}\n", "=== Warrior Responses ===".bold()));
        for result in results {
            let marker = if result.success {
                "[ok]".green().to_string()
            } else {
                "[failed]".red().to_string()
            };
            out.push_str(&format!(
                "\n{} {} ({}ms, {} tries)\n",
                marker,
                result.warrior.bold(),
                result.latency_ms,
                result.tries
            ));
            if result.success {
                out.push_str(&format!("{}\n", result.content));
            } else if let Some(error) = &result.error {
                out.push_str(&format!("{}\n", error.dimmed()));
            }
        }

        out.push('\n');
        out.push_str(&Self::format_consensus(consensus));
        out
    }

    /// Concise view: agreement line plus the synthesized answer.
    pub fn format_consensus(consensus: &ConsensusResult) -> String {
        let mut out = String::new();
        let agreement = match consensus.agreement {
            AgreementLevel::Unanimous | AgreementLevel::Strong => {
                consensus.agreement.to_string().green().to_string()
            }
            AgreementLevel::Majority => consensus.agreement.to_string().yellow().to_string(),
            AgreementLevel::Weak | AgreementLevel::None => {
                consensus.agreement.to_string().red().to_string()
            }
        };
        out.push_str(&format!(
            "{} {} ({}/{} answered, score {:.2})\n",
            "Agreement:".bold(),
            agreement,
            consensus.answered,
            consensus.total,
            consensus.score()
        ));

        if !consensus.conflicts.is_empty() {
            out.push_str(&format!("{}\n", "Conflicts:".bold()));
            for conflict in &consensus.conflicts {
                out.push_str(&format!("  - {}\n", conflict.dimmed()));
            }
        }

        if consensus.answer.is_empty() {
            out.push_str(&format!("{}\n", "No answer: every warrior failed.".red()));
        } else {
            if let Some(representative) = &consensus.representative {
                out.push_str(&format!(
                    "{} (via {})\n",
                    "Answer:".bold(),
                    representative
                ));
            }
            out.push_str(&format!("{}\n", consensus.answer));
        }
        out
    }

    /// JSON view of a dispatch.
    pub fn format_json(results: &[DispatchResult], consensus: &ConsensusResult) -> String {
        serde_json::to_string_pretty(&serde_json::json!({
            "responses": results,
            "consensus": consensus,
        }))
        .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    /// One-line-per-quest table.
    pub fn format_quest_list(response: &QuestListResponse) -> String {
        if response.quests.is_empty() {
            return "No quests.\n".to_string();
        }
        let mut out = format!(
            "{:<6} {:<10} {:<9} {:<9} {:<11} GOAL\n",
            "ID", "STATUS", "PRIORITY", "ATTEMPTS", "BEST"
        );
        for quest in &response.quests {
            out.push_str(&format!(
                "{:<6} {:<10} {:<9} {:<9} {:<11.2} {}\n",
                quest.id,
                Self::paint_status(quest),
                quest.priority,
                quest.attempts_count,
                quest.best_score,
                truncate(&quest.goal, 60),
            ));
        }
        out.push_str(&format!("{} quest(s)\n", response.count));
        out
    }

    /// Detail view with recent attempts.
    pub fn format_quest_detail(response: &QuestDetailResponse) -> String {
        let quest = &response.quest;
        let mut out = String::new();
        out.push_str(&format!("{} {}\n", "Quest".bold(), quest.id));
        out.push_str(&format!("  goal:      {}\n", quest.goal));
        out.push_str(&format!("  strategy:  {}\n", quest.strategy));
        out.push_str(&format!("  status:    {}\n", Self::paint_status(quest)));
        out.push_str(&format!("  priority:  {}\n", quest.priority));
        out.push_str(&format!(
            "  attempts:  {} ({} succeeded)\n",
            quest.attempts_count, quest.success_count
        ));
        out.push_str(&format!("  best:      {:.2}\n", quest.best_score));
        if let Some(best_solution) = &quest.best_solution {
            out.push_str(&format!("  solution:  {}\n", truncate(best_solution, 200)));
        }

        if !response.recent_attempts.is_empty() {
            out.push_str(&format!("\n{}\n", "Recent attempts:".bold()));
            for attempt in &response.recent_attempts {
                out.push_str(&Self::format_attempt_line(
                    attempt.attempt_number,
                    attempt.score,
                    attempt.success,
                    &attempt.learned,
                ));
            }
        }
        out
    }

    /// History listing, newest first.
    pub fn format_history(response: &HistoryResponse) -> String {
        if response.history.is_empty() {
            return "No attempts yet.\n".to_string();
        }
        let mut out = String::new();
        for attempt in &response.history {
            out.push_str(&Self::format_attempt_line(
                attempt.attempt_number,
                attempt.score,
                attempt.success,
                &attempt.learned,
            ));
        }
        out
    }

    /// Aggregate stats block.
    pub fn format_stats(response: &StatsResponse) -> String {
        let stats = &response.stats;
        format!(
            "quests:    {} total, {} active, {} completed, {} failed\n\
             attempts:  {} total, {} succeeded ({:.0}% success rate)\n",
            stats.total_quests,
            stats.active,
            stats.completed,
            stats.failed,
            stats.total_attempts,
            stats.total_successes,
            stats.success_rate * 100.0,
        )
    }

    fn format_attempt_line(number: u32, score: f64, success: bool, learned: &str) -> String {
        let marker = if success {
            "[ok]".green().to_string()
        } else {
            "[--]".red().to_string()
        };
        format!(
            "  {} #{:<3} score {:.2}  {}\n",
            marker,
            number,
            score,
            truncate(learned, 90)
        )
    }

    fn paint_status(quest: &Quest) -> String {
        let text = quest.status.to_string();
        match quest.status {
            council_domain::QuestStatus::Running => text.green().to_string(),
            council_domain::QuestStatus::Completed => text.cyan().to_string(),
            council_domain::QuestStatus::Failed => text.red().to_string(),
            council_domain::QuestStatus::Paused => text.yellow().to_string(),
            _ => text,
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= max_chars {
        flattened
    } else {
        let cut: String = flattened.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::aggregate;

    fn sample() -> (Vec<DispatchResult>, ConsensusResult) {
        let results = vec![
            DispatchResult::success("strategist", 0.2, "Yes, split the table."),
            DispatchResult::success("skeptic", 0.4, "Yes, but index first."),
            DispatchResult::failure("scholar", 0.5, "timeout"),
        ];
        let consensus = aggregate(&results);
        (results, consensus)
    }

    #[test]
    fn test_full_format_mentions_every_warrior() {
        let (results, consensus) = sample();
        let text = ConsoleFormatter::format(&results, &consensus);
        assert!(text.contains("strategist"));
        assert!(text.contains("skeptic"));
        assert!(text.contains("scholar"));
        assert!(text.contains("timeout"));
    }

    #[test]
    fn test_consensus_format_shows_counts_and_answer() {
        let (_, consensus) = sample();
        let text = ConsoleFormatter::format_consensus(&consensus);
        assert!(text.contains("2/3"));
        assert!(text.contains("split the table"));
    }

    #[test]
    fn test_json_format_roundtrips() {
        let (results, consensus) = sample();
        let text = ConsoleFormatter::format_json(&results, &consensus);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["responses"].as_array().unwrap().len(), 3);
        assert!(parsed["consensus"]["agreement"].is_string());
    }

    #[test]
    fn test_truncate_flattens_whitespace() {
        assert_eq!(truncate("a\nb\n  c", 10), "a b c");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
