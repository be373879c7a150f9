//! Echo provider - answers with the last user message.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use provider_core::{
    Generate, GenerateRequest, Generation, HealthCheck, Provider, ProviderError, ProviderInfo,
    ProviderKind,
};

use crate::counts::ProviderCounts;

/// A provider that echoes the last user message back.
///
/// Useful for testing the chain and the orchestrator without a backend.
#[derive(Debug)]
pub struct EchoProvider {
    info: ProviderInfo,
    prefix: Option<String>,
    counts: ProviderCounts,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl EchoProvider {
    /// Create an echo provider of the given kind.
    pub fn new(id: impl Into<String>, kind: ProviderKind) -> Self {
        let id = id.into();
        Self {
            info: ProviderInfo::new(id.clone(), id, kind).with_default_model("echo"),
            prefix: None,
            counts: ProviderCounts::default(),
            last_request: Mutex::new(None),
        }
    }

    /// A local echo provider (priority 10).
    pub fn local(id: impl Into<String>) -> Self {
        Self::new(id, ProviderKind::Local)
    }

    /// A remote echo provider (priority 100).
    pub fn remote(id: impl Into<String>) -> Self {
        Self::new(id, ProviderKind::Remote)
    }

    /// Prefix every answer.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_provider::EchoProvider;
    ///
    /// let provider = EchoProvider::local("ollama").with_prefix("Echo: ");
    /// // Will respond with "Echo: <last user message>"
    /// ```
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Declare served models. The first becomes the default.
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models.into_iter().map(Into::into).collect();
        let default = models.first().cloned().unwrap_or_else(|| "echo".to_string());
        self.info = self
            .info
            .with_models(models)
            .with_default_model(default);
        self
    }

    /// Override the chain priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.info = self.info.with_priority(priority);
        self
    }

    /// Call counters.
    pub fn counts(&self) -> &ProviderCounts {
        &self.counts
    }

    /// The last request received by `generate`.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl HealthCheck for EchoProvider {
    async fn health_check(&self) -> Result<Duration, ProviderError> {
        self.counts.probe();
        Ok(Duration::ZERO)
    }
}

#[async_trait]
impl Generate for EchoProvider {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ProviderError> {
        self.counts.generate();
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let message = request.last_user_message().unwrap_or_default();
        let text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, message),
            None => message.to_string(),
        };

        Ok(Generation::new(
            &self.info.id,
            self.info.resolve_model(request.model.as_deref()),
            text,
        ))
    }
}

impl Provider for EchoProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_no_prefix() {
        let provider = EchoProvider::local("ollama");
        let generation = provider
            .generate(&GenerateRequest::from_prompt("Hello!"))
            .await
            .unwrap();

        assert_eq!(generation.text, "Hello!");
        assert_eq!(generation.provider_id, "ollama");
        assert_eq!(generation.model, "echo");
        assert_eq!(provider.counts().generates(), 1);
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let provider = EchoProvider::remote("openai").with_prefix("Echo: ");
        let generation = provider
            .generate(&GenerateRequest::from_prompt("Hello!"))
            .await
            .unwrap();
        assert_eq!(generation.text, "Echo: Hello!");
    }

    #[tokio::test]
    async fn test_models_and_probe() {
        let provider = EchoProvider::remote("openai").with_models(["gpt-4o-mini", "gpt-4o"]);
        assert_eq!(provider.info().default_model, "gpt-4o-mini");
        assert_eq!(provider.info().priority, 100);

        provider.health_check().await.unwrap();
        assert_eq!(provider.counts().probes(), 1);
    }
}
