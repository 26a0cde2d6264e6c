//! Configuration for the SDR agent service
//!
//! Loaded from a TOML file. Every section is optional; a missing file means
//! built-in defaults. API keys never live in the file itself, only the names
//! of the environment variables that hold them.

use crate::agents::AGENT_IDS;
use crate::llm::registry::{ModelSpec, KNOWN_PROVIDERS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Config files tried, in order, when no path is given
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["sdr-agents.toml", "config/sdr-agents.toml"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub providers: ProvidersSection,
    /// Per-agent overrides keyed by agent id
    #[serde(default)]
    pub agents: BTreeMap<String, AgentOverride>,
}

/// HTTP host settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3500
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Hosted model providers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProvidersSection {
    #[serde(default = "default_openai")]
    pub openai: ProviderSection,
    #[serde(default = "default_groq")]
    pub groq: ProviderSection,
}

fn default_openai() -> ProviderSection {
    ProviderSection::from_env_var("OPENAI_API_KEY")
}

fn default_groq() -> ProviderSection {
    ProviderSection::from_env_var("GROQ_API_KEY")
}

impl Default for ProvidersSection {
    fn default() -> Self {
        Self {
            openai: default_openai(),
            groq: default_groq(),
        }
    }
}

/// One provider client's settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProviderSection {
    /// Environment variable containing the API key
    pub api_key_env: String,
    /// Override the provider's default API base URL
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl ProviderSection {
    pub fn from_env_var(api_key_env: &str) -> Self {
        Self {
            api_key_env: api_key_env.to_string(),
            base_url: None,
            timeout_secs: None,
            max_retries: None,
        }
    }

    /// API key from the environment; empty values count as missing
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Per-agent model overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentOverride {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model for the agent's (final) generation call
    pub model: Option<ModelSpec>,
    /// Model for the fit classification call (fit-analysis agent only)
    pub classify_model: Option<ModelSpec>,
}

fn default_enabled() -> bool {
    true
}

impl Default for AgentOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
            classify_model: None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Unknown agent id: {0}")]
    UnknownAgent(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration: an explicit path must exist; otherwise the
    /// default locations are tried and built-in defaults used if none exist.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!("Loaded configuration from {}", path.display());
            return Ok((config, Some(path.to_path_buf())));
        }

        for candidate in DEFAULT_CONFIG_PATHS {
            let path = Path::new(candidate);
            if path.is_file() {
                let config = Self::load_from_file(path)?;
                info!("Loaded configuration from {}", path.display());
                return Ok((config, Some(path.to_path_buf())));
            }
        }

        info!("No configuration file found, using defaults");
        Ok((Self::default(), None))
    }

    /// Check ports, URLs, model specs and agent ids
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "server.host must not be empty".to_string(),
            ));
        }

        for (name, provider) in [
            ("openai", &self.providers.openai),
            ("groq", &self.providers.groq),
        ] {
            validate_provider(name, provider)?;
        }

        for (agent_id, agent) in &self.agents {
            if !AGENT_IDS.contains(&agent_id.as_str()) {
                return Err(ConfigError::UnknownAgent(agent_id.clone()));
            }

            for spec in agent.model.iter().chain(agent.classify_model.iter()) {
                validate_model_spec(agent_id, spec)?;
            }

            if agent.classify_model.is_some() && agent_id != "agent-sdr-analysis" {
                return Err(ConfigError::InvalidConfig(format!(
                    "agents.{agent_id}.classify_model only applies to agent-sdr-analysis"
                )));
            }
        }

        Ok(())
    }

    /// Overrides for one agent (defaults when the agent has no section)
    pub fn agent(&self, agent_id: &str) -> AgentOverride {
        self.agents.get(agent_id).cloned().unwrap_or_default()
    }

    /// Render as TOML for `config --show`
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }
}

fn validate_provider(name: &str, provider: &ProviderSection) -> Result<(), ConfigError> {
    if provider.api_key_env.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(format!(
            "providers.{name}.api_key_env must not be empty"
        )));
    }

    if let Some(base_url) = &provider.base_url {
        let parsed = url::Url::parse(base_url).map_err(|e| {
            ConfigError::InvalidConfig(format!("providers.{name}.base_url '{base_url}': {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidConfig(format!(
                "providers.{name}.base_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
    }

    if provider.timeout_secs == Some(0) {
        return Err(ConfigError::InvalidConfig(format!(
            "providers.{name}.timeout_secs must be non-zero"
        )));
    }

    Ok(())
}

fn validate_model_spec(agent_id: &str, spec: &ModelSpec) -> Result<(), ConfigError> {
    if !KNOWN_PROVIDERS.contains(&spec.provider.as_str()) {
        return Err(ConfigError::InvalidConfig(format!(
            "agents.{agent_id}: unknown provider '{}' in model '{spec}' (expected one of {})",
            spec.provider,
            KNOWN_PROVIDERS.join(", ")
        )));
    }
    Ok(())
}
