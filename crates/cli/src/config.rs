//! Configuration loading from skiff.toml.

use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

pub const CONFIG_FILE: &str = "skiff.toml";
pub const MODEL_VAR: &str = "SKIFF_MODEL";

/// LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Anthropic,
    #[value(name = "openai")]
    OpenAi,
}

impl Provider {
    /// Environment variable holding this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-3-7-sonnet-20250219",
            Provider::OpenAi => "o3-mini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Anthropic => f.write_str("anthropic"),
            Provider::OpenAi => f.write_str("openai"),
        }
    }
}

/// Top-level configuration. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend provider configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    /// Provider endpoint override, e.g. for a proxy.
    pub base_url: Option<String>,
    /// Falls back to the provider's environment variable when unset.
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    pub system_prompt: Option<String>,
    pub max_tool_rounds: Option<u32>,
}

/// Values given on the command line; they win over the file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub provider: Option<Provider>,
    pub model: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Clone)]
pub struct Settings {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
    pub system_prompt: Option<String>,
    pub max_tool_rounds: Option<u32>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .field("system_prompt", &self.system_prompt)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish()
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `path` if given, else `skiff.toml` in the working directory if it
    /// exists, else the empty configuration.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Combine file values with the environment and command-line overrides.
    pub fn resolve(
        self,
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, ConfigError> {
        let provider = overrides
            .provider
            .or(self.backend.provider)
            .unwrap_or_default();
        let model = overrides
            .model
            .or(self.backend.model)
            .or_else(|| env(MODEL_VAR))
            .unwrap_or_else(|| provider.default_model().to_string());
        let api_key = self
            .backend
            .api_key
            .or_else(|| env(provider.api_key_var()))
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey {
                var: provider.api_key_var(),
            })?;

        Ok(Settings {
            provider,
            model,
            api_key,
            max_tokens: self.backend.max_tokens,
            base_url: self.backend.base_url,
            system_prompt: self.session.system_prompt,
            max_tool_rounds: self.session.max_tool_rounds,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("no API key: set backend.api_key or {var}")]
    MissingApiKey { var: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn parses_full_file() {
        let config = Config::parse(
            r#"
            [backend]
            provider = "openai"
            model = "gpt-4o"
            max_tokens = 2000
            base_url = "http://localhost:8080/v1/chat/completions"
            api_key = "sk-test"

            [session]
            system_prompt = "Be brief."
            max_tool_rounds = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.provider, Some(Provider::OpenAi));
        assert_eq!(config.backend.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.backend.max_tokens, Some(2000));
        assert_eq!(
            config.backend.base_url.as_deref(),
            Some("http://localhost:8080/v1/chat/completions")
        );
        assert_eq!(config.session.max_tool_rounds, Some(4));
    }

    #[test]
    fn empty_file_is_valid() {
        let config = Config::parse("").unwrap();
        assert!(config.backend.provider.is_none());
        assert!(config.session.system_prompt.is_none());
    }

    #[test]
    fn rejects_unknown_keys_and_providers() {
        assert!(Config::parse("[backend]\nprovider = \"mistral\"").is_err());
        assert!(Config::parse("[backend]\noauth_token = \"x\"").is_err());
    }

    #[test]
    fn defaults_come_from_provider_and_env() {
        let settings = Config::default()
            .resolve(
                Overrides::default(),
                env(&[("ANTHROPIC_API_KEY", "sk-ant")]),
            )
            .unwrap();
        assert_eq!(settings.provider, Provider::Anthropic);
        assert_eq!(settings.model, "claude-3-7-sonnet-20250219");
        assert_eq!(settings.api_key, "sk-ant");
    }

    #[test]
    fn overrides_beat_file_beats_env() {
        let config = Config::parse("[backend]\nmodel = \"from-file\"").unwrap();
        let settings = config
            .resolve(
                Overrides::default(),
                env(&[("SKIFF_MODEL", "from-env"), ("ANTHROPIC_API_KEY", "k")]),
            )
            .unwrap();
        assert_eq!(settings.model, "from-file");

        let config = Config::parse("[backend]\nmodel = \"from-file\"").unwrap();
        let settings = config
            .resolve(
                Overrides {
                    provider: Some(Provider::OpenAi),
                    model: Some("from-flag".into()),
                },
                env(&[("OPENAI_API_KEY", "k")]),
            )
            .unwrap();
        assert_eq!(settings.provider, Provider::OpenAi);
        assert_eq!(settings.model, "from-flag");
    }

    #[test]
    fn missing_key_names_the_variable() {
        let err = Config::default()
            .resolve(
                Overrides {
                    provider: Some(Provider::OpenAi),
                    model: None,
                },
                env(&[("ANTHROPIC_API_KEY", "wrong-provider")]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingApiKey {
                var: "OPENAI_API_KEY"
            }
        ));
    }

    #[test]
    fn settings_debug_hides_key() {
        let settings = Config::default()
            .resolve(Overrides::default(), env(&[("ANTHROPIC_API_KEY", "secret")]))
            .unwrap();
        assert!(!format!("{settings:?}").contains("secret"));
    }
}
