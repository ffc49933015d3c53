//! Pattern-based command classifier.
//!
//! A first-match-wins ordered scan: DANGEROUS patterns first, then MODERATE,
//! then SAFE. Unmatched subjects default to MODERATE, never SAFE. A second
//! free-text pass looks for risk keywords and hedged phrasing; it can only
//! raise the tier a pattern produced.

use super::tier::{SafetyClassification, SafetyTier};
use once_cell::sync::Lazy;
use regex::Regex;

struct TierPattern {
    name: &'static str,
    regex: Regex,
}

fn patterns(table: &[(&'static str, &'static str)]) -> Vec<TierPattern> {
    table
        .iter()
        .map(|(name, pattern)| TierPattern {
            name,
            // Table entries are compile-time constants; an invalid one is a
            // programming error caught by the pattern tests below.
            regex: Regex::new(pattern).unwrap_or_else(|e| panic!("bad pattern {name}: {e}")),
        })
        .collect()
}

static DANGEROUS: Lazy<Vec<TierPattern>> = Lazy::new(|| {
    patterns(&[
        ("recursive-force-remove", r"(?i)\brm\s+(-\w*r\w*f|-\w*f\w*r)\b"),
        ("filesystem-format", r"(?i)\bmkfs(\.\w+)?\b"),
        ("raw-device-write", r"(?i)\bdd\s+.*\bof=/dev/"),
        ("device-redirect", r">\s*/dev/(sd|nvme|hd)"),
        ("system-power", r"(?i)\b(shutdown|reboot|halt|poweroff)\b"),
        ("fork-bomb", r":\(\)\s*\{"),
        ("world-writable-root", r"(?i)\bchmod\s+(-\w+\s+)*777\s+/(\s|$)"),
        ("privilege-escalation", r"(?i)\bsudo\s+(su|-i)\b"),
        ("pipe-to-shell", r"(?i)\b(curl|wget)\b.*\|\s*(ba|z)?sh\b"),
        ("sql-destruction", r"(?i)\b(drop\s+table|truncate\s+table|delete\s+from\s+\w+\s*;?\s*$)"),
        ("history-rewrite", r"(?i)\bgit\s+push\b.*(--force|-f)\b"),
        ("account-tampering", r"(?i)\b(userdel|passwd\s+root)\b"),
        ("firewall-flush", r"(?i)\biptables\s+(-F|--flush)\b"),
    ])
});

static MODERATE: Lazy<Vec<TierPattern>> = Lazy::new(|| {
    patterns(&[
        ("service-control", r"(?i)\b(systemctl|service)\s+\w*\s*(restart|stop|start|reload)\b"),
        ("package-install", r"(?i)\b(apt(-get)?|yum|dnf|pacman|brew)\s+(install|remove|upgrade)\b"),
        ("language-package-install", r"(?i)\b(pip3?|npm|cargo|gem)\s+(install|uninstall|add)\b"),
        ("file-creation", r"(?i)\b(mkdir|touch)\b"),
        ("file-move", r"(?i)\b(mv|cp)\s"),
        ("permission-change", r"(?i)\b(chmod|chown)\b"),
        ("vcs-mutation", r"(?i)\bgit\s+(commit|push|merge|rebase|reset|checkout)\b"),
        ("container-control", r"(?i)\bdocker\s+(run|rm|stop|kill|restart)\b"),
        ("process-kill", r"(?i)\b(kill|pkill|killall)\b"),
        ("plain-remove", r"(?i)\brm\s"),
    ])
});

static SAFE: Lazy<Vec<TierPattern>> = Lazy::new(|| {
    patterns(&[
        (
            "read-only-inspect",
            r"(?i)^\s*(ls|cat|head|tail|less|grep|find|wc|file|stat)\b",
        ),
        (
            "system-diagnostics",
            r"(?i)^\s*(ps|top|htop|df|du|free|uname|uptime|whoami|id|pwd|env|date|which|hostname)\b",
        ),
        ("vcs-inspect", r"(?i)^\s*git\s+(status|log|diff|show|branch)\b"),
        ("container-inspect", r"(?i)^\s*docker\s+(ps|images|inspect)\b"),
        ("service-inspect", r"(?i)^\s*systemctl\s+status\b"),
        ("echo", r"(?i)^\s*echo\b"),
    ])
});

static RISK_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(",
        // financial
        r"trade|trading|buy|sell|transfer|withdraw|payment|wallet|order",
        // credentials
        r"|password|passphrase|secret|credential|api[ _-]?key|token|private[ _-]?key",
        // operational blast radius
        r"|deploy|production|prod|restart|migrate|rollback",
        r")\b",
    ))
    .unwrap_or_else(|e| panic!("bad risk keyword pattern: {e}"))
});

static HEDGED_PHRASING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(maybe|probably|might|not sure|i think|i guess|could try|unsure)\b")
        .unwrap_or_else(|e| panic!("bad hedge pattern: {e}"))
});

/// Pattern name reported when nothing in the tables matched.
pub const UNMATCHED_PATTERN: &str = "unmatched-default";

/// First-match-wins command/action classifier.
pub struct SafetyClassifier;

impl SafetyClassifier {
    /// Classify an action string into a risk tier.
    ///
    /// Scan order is DANGEROUS, MODERATE, SAFE; the first hit wins. Subjects
    /// matching nothing default to [`SafetyTier::Moderate`]. The free-text
    /// heuristic then raises (never lowers) the tier when the subject talks
    /// about money, credentials, or deployments, or hedges its own claim.
    pub fn classify(subject: &str) -> SafetyClassification {
        let (mut tier, pattern) = Self::pattern_tier(subject);
        let mut raised = false;

        if tier < SafetyTier::Moderate && Self::has_risk_signal(subject) {
            tier = tier.max(SafetyTier::Moderate);
            raised = true;
        }

        SafetyClassification {
            subject: subject.to_string(),
            tier,
            pattern: pattern.to_string(),
            raised_by_heuristic: raised,
        }
    }

    fn pattern_tier(subject: &str) -> (SafetyTier, &'static str) {
        for p in DANGEROUS.iter() {
            if p.regex.is_match(subject) {
                return (SafetyTier::Dangerous, p.name);
            }
        }
        for p in MODERATE.iter() {
            if p.regex.is_match(subject) {
                return (SafetyTier::Moderate, p.name);
            }
        }
        for p in SAFE.iter() {
            if p.regex.is_match(subject) {
                return (SafetyTier::Safe, p.name);
            }
        }
        (SafetyTier::Moderate, UNMATCHED_PATTERN)
    }

    fn has_risk_signal(subject: &str) -> bool {
        RISK_KEYWORDS.is_match(subject) || HEDGED_PHRASING.is_match(subject)
    }
}

/// Pull a proposed shell action out of free-form answer text.
///
/// Looks for the first fenced code block (any shell-ish language tag), then
/// for a `$ `-prefixed command line. Returns `None` when the answer proposes
/// nothing executable.
pub fn extract_action(text: &str) -> Option<String> {
    let mut in_fence = false;
    let mut shell_fence = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("```") {
            if in_fence {
                in_fence = false;
                shell_fence = false;
            } else {
                in_fence = true;
                let tag = rest.trim();
                shell_fence =
                    tag.is_empty() || matches!(tag, "sh" | "bash" | "shell" | "console" | "zsh");
            }
            continue;
        }
        if in_fence {
            if shell_fence && !trimmed.is_empty() {
                return Some(trimmed.strip_prefix("$ ").unwrap_or(trimmed).to_string());
            }
            continue;
        }
        if let Some(command) = trimmed.strip_prefix("$ ")
            && !command.trim().is_empty()
        {
            return Some(command.trim().to_string());
        }
    }
    None
}
