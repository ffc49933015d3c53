//! Model value object representing an LLM model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Available LLM models (Value Object)
///
/// A domain concept naming the model a warrior is bound to. Unknown
/// identifiers pass through as `Custom` so the council is not limited to
/// the built-in list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    ClaudeSonnet45,
    ClaudeOpus45,
    ClaudeHaiku45,
    Gpt52Codex,
    Gpt5,
    Gpt41,
    Gemini3Pro,
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::ClaudeSonnet45 => "claude-sonnet-4.5",
            Model::ClaudeOpus45 => "claude-opus-4.5",
            Model::ClaudeHaiku45 => "claude-haiku-4.5",
            Model::Gpt52Codex => "gpt-5.2-codex",
            Model::Gpt5 => "gpt-5",
            Model::Gpt41 => "gpt-4.1",
            Model::Gemini3Pro => "gemini-3-pro-preview",
            Model::Custom(s) => s,
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::ClaudeSonnet45
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "claude-opus-4.5" => Model::ClaudeOpus45,
            "claude-haiku-4.5" => Model::ClaudeHaiku45,
            "gpt-5.2-codex" => Model::Gpt52Codex,
            "gpt-5" => Model::Gpt5,
            "gpt-4.1" => Model::Gpt41,
            "gemini-3-pro-preview" => Model::Gemini3Pro,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_roundtrip() {
        for model in [Model::ClaudeSonnet45, Model::Gpt52Codex, Model::Gemini3Pro] {
            let s = model.to_string();
            let parsed: Model = s.parse().unwrap();
            assert_eq!(model, parsed);
        }
    }

    #[test]
    fn test_custom_model() {
        let model: Model = "local-llama-70b".parse().unwrap();
        assert_eq!(model, Model::Custom("local-llama-70b".to_string()));
        assert_eq!(model.to_string(), "local-llama-70b");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Model::Gpt52Codex).unwrap();
        assert_eq!(json, "\"gpt-5.2-codex\"");
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Model::Gpt52Codex);
    }
}
