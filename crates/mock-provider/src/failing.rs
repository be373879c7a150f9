//! Failing provider - simulates a backend that is down or misbehaving.

use std::time::Duration;

use async_trait::async_trait;
use provider_core::{
    Generate, GenerateRequest, Generation, HealthCheck, Provider, ProviderError, ProviderInfo,
    ProviderKind,
};

use crate::counts::ProviderCounts;

type ErrorFactory = Box<dyn Fn() -> ProviderError + Send + Sync>;

/// A provider whose calls fail.
///
/// By default both the probe and the generate call fail with
/// [`ProviderError::Unavailable`]. Use [`FailingProvider::failing_generate`]
/// for a provider that passes its probe and then fails the call.
pub struct FailingProvider {
    info: ProviderInfo,
    probe_fails: bool,
    error: ErrorFactory,
    counts: ProviderCounts,
}

impl FailingProvider {
    /// Create a failing provider of the given kind.
    pub fn new(id: impl Into<String>, kind: ProviderKind) -> Self {
        let id = id.into();
        let message = format!("{} is down", id);
        Self {
            info: ProviderInfo::new(id.clone(), id, kind).with_default_model("none"),
            probe_fails: true,
            error: Box::new(move || ProviderError::Unavailable(message.clone())),
            counts: ProviderCounts::default(),
        }
    }

    /// A local failing provider.
    pub fn local(id: impl Into<String>) -> Self {
        Self::new(id, ProviderKind::Local)
    }

    /// A remote failing provider.
    pub fn remote(id: impl Into<String>) -> Self {
        Self::new(id, ProviderKind::Remote)
    }

    /// Pass the health probe; fail only the generate call.
    pub fn failing_generate(mut self) -> Self {
        self.probe_fails = false;
        self
    }

    /// Choose the error returned by failing calls.
    pub fn with_error<F>(mut self, error: F) -> Self
    where
        F: Fn() -> ProviderError + Send + Sync + 'static,
    {
        self.error = Box::new(error);
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
}

#[async_trait]
impl HealthCheck for FailingProvider {
    async fn health_check(&self) -> Result<Duration, ProviderError> {
        self.counts.probe();
        if self.probe_fails {
            Err((self.error)())
        } else {
            Ok(Duration::ZERO)
        }
    }
}

#[async_trait]
impl Generate for FailingProvider {
    async fn generate(&self, _request: &GenerateRequest) -> Result<Generation, ProviderError> {
        self.counts.generate();
        Err((self.error)())
    }
}

impl Provider for FailingProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fails_by_default() {
        let provider = FailingProvider::local("ollama");
        assert!(provider.health_check().await.is_err());
        assert!(matches!(
            provider.generate(&GenerateRequest::from_prompt("hi")).await,
            Err(ProviderError::Unavailable(_))
        ));
        assert_eq!(provider.counts().probes(), 1);
        assert_eq!(provider.counts().generates(), 1);
    }

    #[tokio::test]
    async fn test_failing_generate_passes_probe() {
        let provider = FailingProvider::remote("openai")
            .failing_generate()
            .with_error(|| ProviderError::EmptyResponse);

        assert!(provider.health_check().await.is_ok());
        assert!(matches!(
            provider.generate(&GenerateRequest::from_prompt("hi")).await,
            Err(ProviderError::EmptyResponse)
        ));
    }
}
