//! Delayed provider - wraps another provider with artificial delay.

use std::time::Duration;

use async_trait::async_trait;
use provider_core::{
    Generate, GenerateRequest, Generation, HealthCheck, Provider, ProviderError, ProviderInfo,
};
use tokio::time::sleep;

use crate::echo::EchoProvider;

/// A provider that wraps another provider and adds artificial delay.
///
/// Useful for testing timeout handling and simulating slow backends. The
/// delay applies to generate calls; probes can be slowed separately.
pub struct DelayedProvider<P: Provider> {
    inner: P,
    delay: Duration,
    probe_delay: Duration,
}

impl<P: Provider> DelayedProvider<P> {
    /// Wrap a provider, delaying its generate calls.
    pub fn new(inner: P, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            probe_delay: Duration::ZERO,
        }
    }

    /// Also delay health probes.
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl DelayedProvider<EchoProvider> {
    /// A slow local echo provider.
    pub fn local(id: impl Into<String>, delay: Duration) -> Self {
        Self::new(EchoProvider::local(id), delay)
    }

    /// A slow remote echo provider.
    pub fn remote(id: impl Into<String>, delay: Duration) -> Self {
        Self::new(EchoProvider::remote(id), delay)
    }
}

#[async_trait]
impl<P: Provider> HealthCheck for DelayedProvider<P> {
    async fn health_check(&self) -> Result<Duration, ProviderError> {
        sleep(self.probe_delay).await;
        self.inner.health_check().await
    }
}

#[async_trait]
impl<P: Provider> Generate for DelayedProvider<P> {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ProviderError> {
        sleep(self.delay).await;
        self.inner.generate(request).await
    }
}

impl<P: Provider> Provider for DelayedProvider<P> {
    fn info(&self) -> &ProviderInfo {
        self.inner.info()
    }
}
