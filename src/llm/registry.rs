//! Provider registry and `provider:model` specs
//!
//! Agents name their models as `provider:model` (for example
//! `groq:llama-3.3-70b-versatile`). The registry maps the provider half of
//! that spec to a live client.

use crate::config::{ProviderSection, ProvidersSection};
use crate::llm::provider::{LlmError, LlmProvider};
use crate::llm::providers::{GroqConfig, GroqProvider, OpenAiConfig, OpenAiProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Provider names understood by [`ProviderRegistry::from_config`]
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "groq"];

/// A model reference of the form `provider:model`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelSpec {
    pub provider: String,
    pub model: String,
}

impl ModelSpec {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl FromStr for ModelSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model) = s
            .split_once(':')
            .ok_or_else(|| format!("Model spec '{s}' must have the form provider:model"))?;

        let provider = provider.trim();
        let model = model.trim();
        if provider.is_empty() || model.is_empty() {
            return Err(format!(
                "Model spec '{s}' must name both a provider and a model"
            ));
        }

        Ok(Self::new(provider, model))
    }
}

impl TryFrom<String> for ModelSpec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelSpec> for String {
    fn from(spec: ModelSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// Named collection of provider clients shared by every agent
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        let name = provider.name().to_string();
        self.register_as(name, provider);
    }

    /// Register a provider under an explicit name
    pub fn register_as(&mut self, name: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Builder-style registration, handy in tests
    pub fn with_provider(mut self, name: &str, provider: Arc<dyn LlmProvider>) -> Self {
        self.register_as(name, provider);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn LlmProvider>, LlmError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| LlmError::NotConfigured(format!("No provider registered as '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run every provider's health check
    pub async fn health_check_all(&self) -> Vec<(String, Result<(), LlmError>)> {
        let mut results = Vec::with_capacity(self.providers.len());
        for name in self.names() {
            if let Some(provider) = self.providers.get(&name) {
                results.push((name, provider.health_check().await));
            }
        }
        results
    }

    /// Build clients for every provider whose API key is present in the environment.
    ///
    /// A provider without a key is skipped with a warning; requests that need
    /// it fail with [`LlmError::NotConfigured`].
    pub fn from_config(providers: &ProvidersSection) -> Self {
        let mut registry = Self::new();

        match openai_config(&providers.openai) {
            Some(config) => match OpenAiProvider::new(config) {
                Ok(provider) => registry.register(Arc::new(provider)),
                Err(e) => warn!("OpenAI provider unavailable: {}", e),
            },
            None => warn!(
                "OpenAI provider unavailable: {} is not set",
                providers.openai.api_key_env
            ),
        }

        match groq_config(&providers.groq) {
            Some(config) => match GroqProvider::new(config) {
                Ok(provider) => registry.register(Arc::new(provider)),
                Err(e) => warn!("Groq provider unavailable: {}", e),
            },
            None => warn!(
                "Groq provider unavailable: {} is not set",
                providers.groq.api_key_env
            ),
        }

        info!("Registered LLM providers: {:?}", registry.names());
        registry
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

fn openai_config(section: &ProviderSection) -> Option<OpenAiConfig> {
    let api_key = section.api_key()?;
    let mut config = OpenAiConfig {
        api_key,
        ..OpenAiConfig::default()
    };
    if let Some(base_url) = &section.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = section.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = section.max_retries {
        config.max_retries = retries;
    }
    Some(config)
}

fn groq_config(section: &ProviderSection) -> Option<GroqConfig> {
    let api_key = section.api_key()?;
    let mut config = GroqConfig {
        api_key,
        ..GroqConfig::default()
    };
    if let Some(base_url) = &section.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = section.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = section.max_retries {
        config.max_retries = retries;
    }
    Some(config)
}
