//! Provider configuration.
//!
//! Every adapter has a plain config struct with a `Default` and an
//! environment loader. [`ProviderConfig`] is the closed set of adapters a
//! deployment can enable; [`ProvidersConfig`] holds the enabled set plus the
//! registry time bounds.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use provider_core::{Provider, ProviderError, ProviderKind};
use tracing::info;

use crate::anthropic::AnthropicProvider;
use crate::health::DEFAULT_HEALTH_TTL;
use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::registry::{ProviderRegistry, DEFAULT_GENERATE_TIMEOUT, DEFAULT_HEALTH_TIMEOUT};

/// Configuration for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Server URL.
    pub base_url: String,
    /// Default model.
    pub model: String,
    /// Models to advertise. Empty means any installed model.
    pub models: Vec<String>,
    /// Chain priority.
    pub priority: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            models: Vec::new(),
            priority: ProviderKind::Local.default_priority(),
        }
    }
}

impl OllamaConfig {
    /// Create configuration from environment variables.
    ///
    /// - `OLLAMA_BASE_URL` - Server URL (default: http://localhost:11434)
    /// - `OLLAMA_MODEL` - Default model (default: llama3.2)
    /// - `OLLAMA_PRIORITY` - Chain priority (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("OLLAMA_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            models: Vec::new(),
            priority: env_parse("OLLAMA_PRIORITY").unwrap_or(defaults.priority),
        }
    }
}

/// Configuration for any OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Registry key.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Local or remote.
    pub kind: ProviderKind,
    /// API base URL (without `/v1`).
    pub api_url: String,
    /// Bearer token. Local servers usually need none.
    pub api_key: Option<String>,
    /// Default model.
    pub model: String,
    /// Models to advertise.
    pub models: Vec<String>,
    /// Chain priority.
    pub priority: u32,
}

impl OpenAiCompatConfig {
    /// OpenAI's hosted API.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            id: "openai".to_string(),
            name: "OpenAI".to_string(),
            kind: ProviderKind::Remote,
            api_url: "https://api.openai.com".to_string(),
            api_key: Some(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            models: vec!["gpt-4o-mini".to_string(), "gpt-4o".to_string()],
            priority: 100,
        }
    }

    /// A local LM Studio server.
    pub fn lm_studio(api_url: impl Into<String>) -> Self {
        Self {
            id: "lmstudio".to_string(),
            name: "LM Studio".to_string(),
            kind: ProviderKind::Local,
            api_url: api_url.into(),
            api_key: None,
            model: "local-model".to_string(),
            models: Vec::new(),
            priority: 20,
        }
    }

    /// xAI's Grok API.
    pub fn grok(api_key: impl Into<String>) -> Self {
        Self {
            id: "grok".to_string(),
            name: "xAI Grok".to_string(),
            kind: ProviderKind::Remote,
            api_url: "https://api.x.ai".to_string(),
            api_key: Some(api_key.into()),
            model: "grok-4-1-fast".to_string(),
            models: vec!["grok-4-1-fast".to_string(), "grok-3-mini".to_string()],
            priority: 120,
        }
    }

    /// Set the API URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the default model, advertising it if not listed yet.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !self.models.is_empty() && !self.models.contains(&model) {
            self.models.insert(0, model.clone());
        }
        self.model = model;
        self
    }

    /// Set the chain priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

/// Configuration for Anthropic's messages API.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API base URL.
    pub api_url: String,
    /// API key.
    pub api_key: String,
    /// Default model.
    pub model: String,
    /// Models to advertise.
    pub models: Vec<String>,
    /// `anthropic-version` header value.
    pub api_version: String,
    /// Chain priority.
    pub priority: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com".to_string(),
            api_key: String::new(),
            model: "claude-3-5-haiku-latest".to_string(),
            models: vec![
                "claude-3-5-haiku-latest".to_string(),
                "claude-sonnet-4-0".to_string(),
            ],
            api_version: "2023-06-01".to_string(),
            priority: 110,
        }
    }
}

/// One enabled provider. The set of variants is closed.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Ollama(OllamaConfig),
    OpenAiCompat(OpenAiCompatConfig),
    Anthropic(AnthropicConfig),
}

impl ProviderConfig {
    /// Registry key of the provider this config builds.
    pub fn id(&self) -> &str {
        match self {
            Self::Ollama(_) => "ollama",
            Self::OpenAiCompat(config) => &config.id,
            Self::Anthropic(_) => "anthropic",
        }
    }

    /// Build the adapter.
    pub fn build(&self) -> Result<Arc<dyn Provider>, ProviderError> {
        let provider: Arc<dyn Provider> = match self {
            Self::Ollama(config) => Arc::new(OllamaProvider::new(config.clone())?),
            Self::OpenAiCompat(config) => Arc::new(OpenAiCompatProvider::new(config.clone())?),
            Self::Anthropic(config) => Arc::new(AnthropicProvider::new(config.clone())?),
        };
        Ok(provider)
    }
}

/// The enabled providers and registry settings.
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    /// Enabled providers.
    pub providers: Vec<ProviderConfig>,
    /// How long a health probe result is trusted.
    pub health_ttl: Duration,
    /// Bound on one health probe.
    pub health_timeout: Duration,
    /// Bound on one generate call.
    pub generate_timeout: Duration,
    /// Default max tokens for requests that set none.
    pub max_tokens: Option<u32>,
    /// Default temperature for requests that set none.
    pub temperature: Option<f32>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            providers: vec![ProviderConfig::Ollama(OllamaConfig::default())],
            health_ttl: DEFAULT_HEALTH_TTL,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            generate_timeout: DEFAULT_GENERATE_TIMEOUT,
            max_tokens: Some(1024),
            temperature: Some(0.7),
        }
    }
}

impl ProvidersConfig {
    /// Create configuration from environment variables.
    ///
    /// Local providers:
    /// - Ollama is enabled unless `OLLAMA_DISABLED` is true (see [`OllamaConfig::from_env`])
    /// - `LMSTUDIO_BASE_URL` - Enables LM Studio; `LMSTUDIO_MODEL` sets its model
    ///
    /// Remote providers (enabled when their key is set):
    /// - `OPENAI_API_KEY`, `OPENAI_API_URL`, `OPENAI_MODEL`
    /// - `ANTHROPIC_API_KEY`, `ANTHROPIC_API_URL`, `ANTHROPIC_MODEL`
    /// - `GROK_API_KEY`, `GROK_API_URL`, `GROK_MODEL`
    ///
    /// Registry settings:
    /// - `PROVIDER_HEALTH_TTL_SECS` (default: 45)
    /// - `PROVIDER_HEALTH_TIMEOUT_SECS` (default: 5)
    /// - `PROVIDER_GENERATE_TIMEOUT_SECS` (default: 20)
    /// - `PROVIDER_MAX_TOKENS` (default: 1024)
    /// - `PROVIDER_TEMPERATURE` (default: 0.7)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut providers = Vec::new();

        if !env_flag("OLLAMA_DISABLED") {
            providers.push(ProviderConfig::Ollama(OllamaConfig::from_env()));
        }

        if let Ok(url) = env::var("LMSTUDIO_BASE_URL") {
            let mut config = OpenAiCompatConfig::lm_studio(url);
            if let Ok(model) = env::var("LMSTUDIO_MODEL") {
                config = config.with_model(model);
            }
            providers.push(ProviderConfig::OpenAiCompat(config));
        }

        if let Some(key) = env_non_empty("OPENAI_API_KEY") {
            let mut config = OpenAiCompatConfig::openai(key);
            if let Ok(url) = env::var("OPENAI_API_URL") {
                config = config.with_api_url(url);
            }
            if let Ok(model) = env::var("OPENAI_MODEL") {
                config = config.with_model(model);
            }
            providers.push(ProviderConfig::OpenAiCompat(config));
        }

        if let Some(key) = env_non_empty("ANTHROPIC_API_KEY") {
            let mut config = AnthropicConfig {
                api_key: key,
                ..Default::default()
            };
            if let Ok(url) = env::var("ANTHROPIC_API_URL") {
                config.api_url = url;
            }
            if let Ok(model) = env::var("ANTHROPIC_MODEL") {
                if !config.models.contains(&model) {
                    config.models.insert(0, model.clone());
                }
                config.model = model;
            }
            providers.push(ProviderConfig::Anthropic(config));
        }

        if let Some(key) = env_non_empty("GROK_API_KEY") {
            let mut config = OpenAiCompatConfig::grok(key);
            if let Ok(url) = env::var("GROK_API_URL") {
                config = config.with_api_url(url);
            }
            if let Ok(model) = env::var("GROK_MODEL") {
                config = config.with_model(model);
            }
            providers.push(ProviderConfig::OpenAiCompat(config));
        }

        Self {
            providers,
            health_ttl: env_parse("PROVIDER_HEALTH_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.health_ttl),
            health_timeout: env_parse("PROVIDER_HEALTH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.health_timeout),
            generate_timeout: env_parse("PROVIDER_GENERATE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.generate_timeout),
            max_tokens: env_parse("PROVIDER_MAX_TOKENS").or(defaults.max_tokens),
            temperature: env_parse("PROVIDER_TEMPERATURE").or(defaults.temperature),
        }
    }

    /// Build every enabled adapter and register it.
    pub fn build_registry(&self) -> Result<ProviderRegistry, ProviderError> {
        let mut registry = ProviderRegistry::new()
            .with_health_ttl(self.health_ttl)
            .with_health_timeout(self.health_timeout)
            .with_generate_timeout(self.generate_timeout)
            .with_defaults(self.max_tokens, self.temperature);

        for config in &self.providers {
            registry.register(config.build()?);
        }

        info!(
            "Provider registry built with {} providers (ttl: {:?}, generate timeout: {:?})",
            registry.len(),
            self.health_ttl,
            self.generate_timeout
        );

        Ok(registry)
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_local_only() {
        let config = ProvidersConfig::default();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].id(), "ollama");
        assert_eq!(config.health_ttl, DEFAULT_HEALTH_TTL);
    }

    #[test]
    fn test_with_model_advertises_model() {
        let config = OpenAiCompatConfig::openai("sk-test").with_model("gpt-4.1");
        assert_eq!(config.model, "gpt-4.1");
        assert_eq!(config.models[0], "gpt-4.1");

        let local = OpenAiCompatConfig::lm_studio("http://localhost:1234").with_model("qwen");
        assert!(local.models.is_empty());
        assert_eq!(local.model, "qwen");
    }

    #[test]
    fn test_local_before_remote_priorities() {
        let lm = OpenAiCompatConfig::lm_studio("http://localhost:1234");
        let openai = OpenAiCompatConfig::openai("k");
        let anthropic = AnthropicConfig::default();
        let ollama = OllamaConfig::default();
        assert!(ollama.priority < lm.priority);
        assert!(lm.priority < openai.priority);
        assert!(openai.priority < anthropic.priority);
    }

    #[test]
    fn test_build_registry_orders_by_priority() {
        let config = ProvidersConfig {
            providers: vec![
                ProviderConfig::OpenAiCompat(OpenAiCompatConfig::openai("k")),
                ProviderConfig::Ollama(OllamaConfig::default()),
            ],
            ..Default::default()
        };
        let registry = config.build_registry().unwrap();
        let ids: Vec<_> = registry.infos().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["ollama", "openai"]);
    }
}
