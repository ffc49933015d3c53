//! Warrior — one persona-bound council member.
//!
//! A [`Warrior`] binds a model to a persona, a sampling temperature, and
//! context/output limits. Warriors are static value objects: once created,
//! they never change at runtime. Operational changes rebuild the registry.

use crate::core::error::DomainError;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Default context window when a warrior doesn't specify one
pub const DEFAULT_MAX_CONTEXT_TOKENS: u32 = 128_000;

/// Default output budget when a warrior doesn't specify one
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4_096;

/// One persona-bound model backend participating in consensus.
///
/// # Example
///
/// ```
/// use council_domain::{Model, Warrior};
///
/// let warrior = Warrior::new("skeptic", Model::ClaudeSonnet45, "You doubt everything.", 0.2)
///     .unwrap()
///     .with_limits(64_000, 2_048);
///
/// assert_eq!(warrior.name, "skeptic");
/// assert_eq!(warrior.max_output_tokens, 2_048);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warrior {
    /// Unique name within the council
    pub name: String,
    /// Model identifier this warrior queries
    pub model: Model,
    /// Persona text sent as the system message
    pub persona: String,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: f64,
    /// Maximum context tokens this warrior accepts
    pub max_context_tokens: u32,
    /// Maximum output tokens this warrior produces
    pub max_output_tokens: u32,
    /// Optional endpoint override; falls back to the gateway default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Warrior {
    /// Create a new warrior, validating name and temperature.
    pub fn new(
        name: impl Into<String>,
        model: Model,
        persona: impl Into<String>,
        temperature: f64,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidWarrior {
                name,
                reason: "name cannot be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&temperature) {
            return Err(DomainError::InvalidWarrior {
                name,
                reason: format!("temperature {} outside [0, 1]", temperature),
            });
        }
        Ok(Self {
            name,
            model,
            persona: persona.into(),
            temperature,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            endpoint: None,
        })
    }

    /// Re-run construction validation (used after deserializing from config).
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidWarrior {
                name: self.name.clone(),
                reason: "name cannot be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(DomainError::InvalidWarrior {
                name: self.name.clone(),
                reason: format!("temperature {} outside [0, 1]", self.temperature),
            });
        }
        Ok(())
    }

    // ==================== Builder Methods ====================

    pub fn with_limits(mut self, max_context_tokens: u32, max_output_tokens: u32) -> Self {
        self.max_context_tokens = max_context_tokens;
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// The built-in council: four personas with distinct temperaments.
    ///
    /// Used when no warriors are configured. Temperatures are deliberately
    /// spread so the representative-answer selection stays deterministic.
    pub fn default_council() -> Vec<Warrior> {
        vec![
            Warrior {
                name: "strategist".to_string(),
                model: Model::ClaudeSonnet45,
                persona: "You are a methodical strategist. Break the problem down, \
                          weigh trade-offs, and commit to one concrete plan."
                    .to_string(),
                temperature: 0.2,
                max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
                max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
                endpoint: None,
            },
            Warrior {
                name: "skeptic".to_string(),
                model: Model::Gpt52Codex,
                persona: "You are a ruthless skeptic. Hunt for flaws, failure modes, \
                          and hidden assumptions before agreeing to anything."
                    .to_string(),
                temperature: 0.3,
                max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
                max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
                endpoint: None,
            },
            Warrior {
                name: "scholar".to_string(),
                model: Model::Gemini3Pro,
                persona: "You are a careful scholar. Ground every claim in evidence \
                          and cite the reasoning chain explicitly."
                    .to_string(),
                temperature: 0.5,
                max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
                max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
                endpoint: None,
            },
            Warrior {
                name: "maverick".to_string(),
                model: Model::ClaudeOpus45,
                persona: "You are an inventive maverick. Propose the unconventional \
                          angle the others will miss."
                    .to_string(),
                temperature: 0.9,
                max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
                max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
                endpoint: None,
            },
        ]
    }
}
