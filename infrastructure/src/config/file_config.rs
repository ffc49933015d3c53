//! Configuration file format.
//!
//! Example configuration:
//!
//! ```toml
//! [gateway]
//! base_url = "http://localhost:11434/v1"
//! api_key_env = "COUNCIL_API_KEY"
//!
//! [engine]
//! per_call_timeout_secs = 60
//! max_retries = 2
//! success_threshold = 0.7
//! pass_interval_secs = 10
//!
//! [store]
//! path = "quests.db"
//!
//! [[council.warriors]]
//! name = "strategist"
//! model = "claude-sonnet-4.5"
//! persona = "You are a methodical strategist."
//! temperature = 0.2
//! ```

use council_application::EngineParams;
use council_domain::{DomainError, Model, Warrior, WarriorRegistry};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration merged from defaults, global and project files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub council: FileCouncilConfig,
    pub gateway: FileGatewayConfig,
    pub engine: FileEngineConfig,
    pub store: FileStoreConfig,
    pub logging: FileLoggingConfig,
}

/// Council roster (`[[council.warriors]]` entries)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    pub warriors: Vec<FileWarriorConfig>,
}

impl FileCouncilConfig {
    /// Build the validated registry; an empty roster falls back to the
    /// built-in default council.
    pub fn registry(&self) -> Result<WarriorRegistry, DomainError> {
        if self.warriors.is_empty() {
            return Ok(WarriorRegistry::default_council());
        }
        let warriors = self
            .warriors
            .iter()
            .map(FileWarriorConfig::to_warrior)
            .collect::<Result<Vec<_>, _>>()?;
        WarriorRegistry::new(warriors)
    }
}

/// One warrior entry in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWarriorConfig {
    pub name: String,
    pub model: String,
    pub persona: String,
    pub temperature: f64,
    pub max_context_tokens: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub endpoint: Option<String>,
}

impl Default for FileWarriorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            model: Model::default().to_string(),
            persona: String::new(),
            temperature: 0.7,
            max_context_tokens: None,
            max_output_tokens: None,
            endpoint: None,
        }
    }
}

impl FileWarriorConfig {
    pub fn to_warrior(&self) -> Result<Warrior, DomainError> {
        let model: Model = self.model.parse().unwrap_or_default();
        let mut warrior = Warrior::new(&self.name, model, &self.persona, self.temperature)?;
        if let Some(max_context) = self.max_context_tokens {
            warrior.max_context_tokens = max_context;
        }
        if let Some(max_output) = self.max_output_tokens {
            warrior.max_output_tokens = max_output;
        }
        if let Some(endpoint) = &self.endpoint {
            warrior = warrior.with_endpoint(endpoint);
        }
        Ok(warrior)
    }
}

/// Backend gateway configuration (`[gateway]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    /// Default endpoint for warriors without their own override
    pub base_url: String,
    /// Environment variable holding the bearer token, if any
    pub api_key_env: Option<String>,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key_env: Some("COUNCIL_API_KEY".to_string()),
        }
    }
}

impl FileGatewayConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
    }
}

/// Quest engine configuration (`[engine]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    pub per_call_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub success_threshold: f64,
    pub history_window: usize,
    pub pass_interval_secs: u64,
    pub auto_confirm: bool,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        let params = EngineParams::default();
        Self {
            per_call_timeout_secs: params.per_call_timeout.as_secs(),
            max_retries: params.max_retries,
            retry_backoff_ms: params.retry_backoff_base.as_millis() as u64,
            success_threshold: params.success_threshold,
            history_window: params.history_window,
            pass_interval_secs: params.pass_interval.as_secs(),
            auto_confirm: params.auto_confirm,
        }
    }
}

impl FileEngineConfig {
    pub fn engine_params(&self) -> EngineParams {
        EngineParams::default()
            .with_per_call_timeout(Duration::from_secs(self.per_call_timeout_secs))
            .with_max_retries(self.max_retries)
            .with_retry_backoff_base(Duration::from_millis(self.retry_backoff_ms))
            .with_success_threshold(self.success_threshold)
            .with_history_window(self.history_window)
            .with_pass_interval(Duration::from_secs(self.pass_interval_secs))
            .with_auto_confirm(self.auto_confirm)
    }
}

/// Quest store configuration (`[store]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Path to the sqlite database file
    pub path: String,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: "quests.db".to_string(),
        }
    }
}

/// Audit logging configuration (`[logging]` section)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL attempt audit log path; disabled when unset
    pub attempt_log: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileConfig::default();
        assert!(config.council.warriors.is_empty());
        assert_eq!(config.gateway.base_url, "http://localhost:11434/v1");
        assert_eq!(config.engine.success_threshold, 0.7);
        assert_eq!(config.store.path, "quests.db");
        assert!(config.logging.attempt_log.is_none());
    }

    #[test]
    fn test_empty_roster_falls_back_to_default_council() {
        let registry = FileConfig::default().council.registry().unwrap();
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[gateway]
base_url = "http://models.internal:8080/v1"

[engine]
per_call_timeout_secs = 30
max_retries = 1
success_threshold = 0.8
pass_interval_secs = 5
auto_confirm = true

[store]
path = "/var/lib/council/quests.db"

[logging]
attempt_log = "attempts.jsonl"

[[council.warriors]]
name = "strategist"
model = "claude-sonnet-4.5"
persona = "Plan carefully."
temperature = 0.2

[[council.warriors]]
name = "skeptic"
model = "gpt-5.2-codex"
persona = "Doubt everything."
temperature = 0.4
max_output_tokens = 2048
endpoint = "http://skeptic.internal/v1"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.gateway.base_url, "http://models.internal:8080/v1");
        assert_eq!(config.engine.max_retries, 1);
        assert!(config.engine.auto_confirm);
        assert_eq!(config.logging.attempt_log.as_deref(), Some("attempts.jsonl"));

        let registry = config.council.registry().unwrap();
        assert_eq!(registry.len(), 2);
        let skeptic = registry.get("skeptic").unwrap();
        assert_eq!(skeptic.model, Model::Gpt52Codex);
        assert_eq!(skeptic.max_output_tokens, 2048);
        assert_eq!(skeptic.endpoint.as_deref(), Some("http://skeptic.internal/v1"));

        let params = config.engine.engine_params();
        assert_eq!(params.per_call_timeout, Duration::from_secs(30));
        assert_eq!(params.success_threshold, 0.8);
    }

    #[test]
    fn test_invalid_warrior_rejected_at_registry_build() {
        let toml_str = r#"
[[council.warriors]]
name = "hot"
model = "gpt-5"
persona = "p"
temperature = 1.5
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.council.registry().is_err());
    }

    #[test]
    fn test_duplicate_warriors_rejected_at_registry_build() {
        let toml_str = r#"
[[council.warriors]]
name = "twin"
model = "gpt-5"
persona = "p"
temperature = 0.5

[[council.warriors]]
name = "twin"
model = "gpt-5"
persona = "p"
temperature = 0.5
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.council.registry().is_err());
    }

    #[test]
    fn test_unknown_model_passes_through_as_custom() {
        let warrior_config = FileWarriorConfig {
            name: "local".to_string(),
            model: "my-local-model".to_string(),
            persona: "p".to_string(),
            temperature: 0.5,
            ..Default::default()
        };
        let warrior = warrior_config.to_warrior().unwrap();
        assert_eq!(warrior.model, Model::Custom("my-local-model".to_string()));
    }
}
