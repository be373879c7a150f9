//! Provider capability traits.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{GenerateRequest, Generation};

/// Where a provider runs. Local providers are tried before remote ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Self-hosted (Ollama, LM Studio). No metering, data stays on the host.
    Local,
    /// Metered remote API.
    Remote,
}

impl ProviderKind {
    /// Default chain priority for this kind. Lower runs first.
    pub fn default_priority(&self) -> u32 {
        match self {
            Self::Local => 10,
            Self::Remote => 100,
        }
    }
}

/// Static description of a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Registry key.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Local or remote.
    pub kind: ProviderKind,
    /// Models this provider serves. Empty means "whatever the backend has".
    pub models: Vec<String>,
    /// Model used when a request names none.
    pub default_model: String,
    /// Chain priority; lower runs first.
    pub priority: u32,
}

impl ProviderInfo {
    /// Create provider metadata with the kind's default priority.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            models: Vec::new(),
            default_model: String::new(),
            priority: kind.default_priority(),
        }
    }

    /// Set the served models. The first one becomes the default model if none is set.
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        if self.default_model.is_empty() {
            if let Some(first) = self.models.first() {
                self.default_model = first.clone();
            }
        }
        self
    }

    /// Set the default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the chain priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether this provider can serve the given model.
    pub fn serves(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.iter().any(|m| m == model)
    }

    /// Pick the model for a request: the requested one if served, else the default.
    pub fn resolve_model(&self, requested: Option<&str>) -> String {
        match requested {
            Some(model) if self.serves(model) => model.to_string(),
            _ => self.default_model.clone(),
        }
    }
}

/// Liveness probe capability.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Probe the backend once. Returns the probe latency on success.
    async fn health_check(&self) -> Result<Duration, ProviderError>;
}

/// Single-shot generation capability.
#[async_trait]
pub trait Generate: Send + Sync {
    /// Issue exactly one generation call. Callers bound it with a timeout.
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ProviderError>;
}

/// A language-model backend usable in a failover chain.
pub trait Provider: HealthCheck + Generate {
    /// Static metadata.
    fn info(&self) -> &ProviderInfo;

    /// Registry key.
    fn id(&self) -> &str {
        &self.info().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_defaults() {
        let info = ProviderInfo::new("ollama", "Ollama", ProviderKind::Local)
            .with_models(["llama3.2", "mistral"]);
        assert_eq!(info.priority, 10);
        assert_eq!(info.default_model, "llama3.2");
        assert!(info.serves("mistral"));
        assert!(!info.serves("gpt-4o"));
    }

    #[test]
    fn test_resolve_model() {
        let info = ProviderInfo::new("openai", "OpenAI", ProviderKind::Remote)
            .with_models(["gpt-4o-mini", "gpt-4o"]);
        assert_eq!(info.resolve_model(Some("gpt-4o")), "gpt-4o");
        assert_eq!(info.resolve_model(Some("llama3.2")), "gpt-4o-mini");
        assert_eq!(info.resolve_model(None), "gpt-4o-mini");

        let open = ProviderInfo::new("lmstudio", "LM Studio", ProviderKind::Local)
            .with_default_model("local-model");
        assert_eq!(open.resolve_model(Some("anything")), "anything");
    }
}
