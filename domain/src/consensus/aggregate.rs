//! Consensus aggregation — reducing dispatch results to one answer.
//!
//! [`aggregate`] is pure: the same results always yield the same
//! [`ConsensusResult`]. Decision tokens are a coarse heuristic (verdict
//! keywords with a fingerprint fallback), tuned rather than guaranteed.

use super::agreement::AgreementLevel;
use super::dispatch::DispatchResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum characters of a conflicting answer quoted verbatim
const CONFLICT_EXCERPT_CHARS: usize = 160;

/// How many leading tokens of an answer are scanned for a verdict keyword
const VERDICT_SCAN_TOKENS: usize = 40;

const AFFIRMATIVE: &[&str] = &[
    "yes", "approve", "approved", "agree", "agreed", "proceed", "feasible", "works", "correct",
    "viable",
];

const NEGATIVE: &[&str] = &[
    "no", "reject", "rejected", "disagree", "refuse", "impossible", "fail", "fails", "unsafe",
    "incorrect",
];

/// Reduced view of one council dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Full text of the representative majority answer (empty if nobody answered)
    pub answer: String,
    /// Warrior whose answer was chosen as representative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative: Option<String>,
    /// How much the council agreed
    pub agreement: AgreementLevel,
    /// Verbatim excerpts from warriors diverging from the majority
    pub conflicts: Vec<String>,
    /// Warriors that answered successfully
    pub answered: usize,
    /// Warriors queried in total
    pub total: usize,
}

impl ConsensusResult {
    /// Attempt score: the agreement score, boosted a step when the answer
    /// is specific and actionable, capped at 1.0.
    pub fn score(&self) -> f64 {
        let base = self.agreement.score();
        if is_actionable(&self.answer) {
            (base + 0.1).min(1.0)
        } else {
            base
        }
    }

    pub fn all_failed(&self) -> bool {
        self.answered == 0
    }
}

/// Extract a coarse decision token from one answer.
///
/// Scans the leading tokens for an explicit verdict keyword; when none is
/// found, falls back to a normalized fingerprint of the first line so that
/// textually-identical answers still bucket together.
pub fn decision_token(text: &str) -> String {
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .take(VERDICT_SCAN_TOKENS)
    {
        let lower = token.to_lowercase();
        if AFFIRMATIVE.contains(&lower.as_str()) {
            return "affirm".to_string();
        }
        if NEGATIVE.contains(&lower.as_str()) {
            return "dissent".to_string();
        }
    }

    // Fingerprint fallback: normalized first non-empty line
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut fingerprint: String = line
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    fingerprint.truncate(48);
    fingerprint
}

/// Whether an answer reads as specific and actionable: a code block, a
/// command line, or enumerated steps.
pub fn is_actionable(text: &str) -> bool {
    if text.contains("```") {
        return true;
    }
    let mut numbered = 0;
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("$ ") {
            return true;
        }
        if trimmed
            .split_once('.')
            .is_some_and(|(head, _)| !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()))
        {
            numbered += 1;
        }
    }
    numbered >= 2
}

/// Reduce per-warrior results into a consensus.
///
/// The synthesized answer is the full text of one representative majority
/// response (the lowest-temperature majority warrior, ties broken by name),
/// not a blended average.
pub fn aggregate(results: &[DispatchResult]) -> ConsensusResult {
    let total = results.len();
    let successes: Vec<&DispatchResult> = results.iter().filter(|r| r.success).collect();

    if successes.is_empty() {
        return ConsensusResult {
            answer: String::new(),
            representative: None,
            agreement: AgreementLevel::None,
            conflicts: Vec::new(),
            answered: 0,
            total,
        };
    }

    // Bucket the successful answers by decision token. BTreeMap keeps the
    // majority selection deterministic under ties.
    let mut buckets: BTreeMap<String, Vec<&DispatchResult>> = BTreeMap::new();
    for &result in &successes {
        buckets
            .entry(decision_token(&result.content))
            .or_default()
            .push(result);
    }

    let (majority_token, majority) = buckets
        .iter()
        .max_by(|a, b| a.1.len().cmp(&b.1.len()).then(b.0.cmp(a.0)))
        .map(|(token, members)| (token.clone(), members.clone()))
        .unwrap_or_default();

    let agreement = AgreementLevel::classify(majority.len(), total);

    let conflicts: Vec<String> = successes
        .iter()
        .filter(|r| decision_token(&r.content) != majority_token)
        .map(|r| format!("{}: {}", r.warrior, excerpt(&r.content)))
        .collect();

    let representative = majority
        .iter()
        .min_by(|a, b| {
            a.temperature
                .total_cmp(&b.temperature)
                .then_with(|| a.warrior.cmp(&b.warrior))
        })
        .copied();

    ConsensusResult {
        answer: representative.map(|r| r.content.clone()).unwrap_or_default(),
        representative: representative.map(|r| r.warrior.clone()),
        agreement,
        conflicts,
        answered: successes.len(),
        total,
    }
}

fn excerpt(text: &str) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= CONFLICT_EXCERPT_CHARS {
        flattened
    } else {
        let cut: String = flattened.chars().take(CONFLICT_EXCERPT_CHARS).collect();
        format!("{}...", cut)
    }
}
