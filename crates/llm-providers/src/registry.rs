//! Provider registry: priority ordering, availability detection and probing.

use std::sync::Arc;
use std::time::Duration;

use provider_core::{Provider, ProviderError, ProviderInfo, ProviderKind};
use serde::Serialize;
use thiserror::Error;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::health::{HealthCache, DEFAULT_HEALTH_TTL};

/// Default bound on one health probe.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on one generate call.
pub const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors from registry lookups.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No provider with this id is registered.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The provider is registered but its probe failed.
    #[error("provider '{id}' failed health check: {source}")]
    ProbeFailed {
        id: String,
        #[source]
        source: ProviderError,
    },

    /// A direct call to the provider failed.
    #[error("provider '{id}' failed: {source}")]
    Failed {
        id: String,
        #[source]
        source: ProviderError,
    },
}

/// Reportable view of one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub id: String,
    pub name: String,
    pub kind: ProviderKind,
    pub models: Vec<String>,
    pub default_model: String,
    pub priority: u32,
    /// `None` until the provider has been probed or called.
    pub available: Option<bool>,
    pub latency_ms: Option<u64>,
    /// Seconds since the cached result was written.
    pub checked_secs_ago: Option<u64>,
    pub last_error: Option<String>,
}

/// Priority-ordered set of providers with a shared health cache.
///
/// Providers are kept sorted by ascending priority; equal priorities keep
/// registration order. Build the registry at startup, then share it in an
/// `Arc`; only the health cache changes afterwards.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    pub(crate) health: HealthCache,
    pub(crate) health_timeout: Duration,
    pub(crate) generate_timeout: Duration,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) temperature: Option<f32>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Create an empty registry with default time bounds.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            health: HealthCache::new(DEFAULT_HEALTH_TTL),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            generate_timeout: DEFAULT_GENERATE_TIMEOUT,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the health cache TTL. Resets the cache.
    pub fn with_health_ttl(mut self, ttl: Duration) -> Self {
        self.health = HealthCache::new(ttl);
        self
    }

    /// Set the bound on one health probe.
    pub fn with_health_timeout(mut self, bound: Duration) -> Self {
        self.health_timeout = bound;
        self
    }

    /// Set the bound on one generate call.
    pub fn with_generate_timeout(mut self, bound: Duration) -> Self {
        self.generate_timeout = bound;
        self
    }

    /// Set generation defaults applied to requests that leave them unset.
    pub fn with_defaults(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Register a provider.
    ///
    /// If a provider with the same id already exists, it will be replaced.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let id = provider.id().to_string();
        info!(
            "Registering provider: {} (priority {}, {:?})",
            id,
            provider.info().priority,
            provider.info().kind
        );

        match self.providers.iter().position(|p| p.id() == id) {
            Some(index) => self.providers[index] = provider,
            None => self.providers.push(provider),
        }
        // Stable sort keeps registration order among equal priorities.
        self.providers.sort_by_key(|p| p.info().priority);
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers in chain order.
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Metadata of every provider in chain order.
    pub fn infos(&self) -> Vec<ProviderInfo> {
        self.providers.iter().map(|p| p.info().clone()).collect()
    }

    /// Get a provider by id.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Check if a provider is registered.
    pub fn has_provider(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The shared health cache.
    pub fn health(&self) -> &HealthCache {
        &self.health
    }

    /// Bound on one generate call.
    pub fn generate_timeout(&self) -> Duration {
        self.generate_timeout
    }

    /// Bound on one health probe.
    pub fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    /// Longest a full walk of the failover chain can take: one probe and
    /// one generate call per provider.
    pub fn chain_budget(&self) -> Duration {
        let count = u32::try_from(self.providers.len()).unwrap_or(u32::MAX);
        (self.health_timeout + self.generate_timeout).saturating_mul(count)
    }

    /// Probe a provider now, bounded by the health timeout, and cache the result.
    pub async fn probe(&self, provider: &dyn Provider) -> Result<Duration, ProviderError> {
        let id = provider.id();
        let started = Instant::now();

        let result = match timeout(self.health_timeout, provider.health_check()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.health_timeout)),
        };

        match result {
            Ok(_) => {
                let latency = started.elapsed();
                debug!("Provider {} healthy ({} ms)", id, latency.as_millis());
                self.health.record_success(id, latency).await;
                Ok(latency)
            }
            Err(e) => {
                warn!("Provider {} failed health check: {}", id, e);
                self.health.record_failure(id, e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Whether a provider is available, using the cache when it is fresh.
    pub async fn is_available(&self, id: &str) -> bool {
        match self.get(id) {
            Some(provider) => self.check(provider.as_ref()).await,
            None => false,
        }
    }

    /// Cached answer if fresh, else a live probe.
    pub(crate) async fn check(&self, provider: &dyn Provider) -> bool {
        if let Some(entry) = self.health.fresh(provider.id()).await {
            return entry.available;
        }
        self.probe(provider).await.is_ok()
    }

    /// The first available provider in priority order.
    pub async fn best_available(&self) -> Option<ProviderInfo> {
        for provider in &self.providers {
            if self.check(provider.as_ref()).await {
                return Some(provider.info().clone());
            }
        }
        None
    }

    /// Force a fresh probe and report the result.
    pub async fn test_provider(&self, id: &str) -> Result<ProviderStatus, RegistryError> {
        let provider = self
            .get(id)
            .ok_or_else(|| RegistryError::UnknownProvider(id.to_string()))?;

        info!("Testing provider {}", id);
        self.probe(provider.as_ref())
            .await
            .map_err(|source| RegistryError::ProbeFailed {
                id: id.to_string(),
                source,
            })?;

        Ok(self.status_of(provider.as_ref()).await)
    }

    /// Report one provider from the cache without probing.
    pub async fn status(&self, id: &str) -> Option<ProviderStatus> {
        match self.get(id) {
            Some(provider) => Some(self.status_of(provider.as_ref()).await),
            None => None,
        }
    }

    /// Report every provider from the cache without probing.
    pub async fn statuses(&self) -> Vec<ProviderStatus> {
        let mut statuses = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            statuses.push(self.status_of(provider.as_ref()).await);
        }
        statuses
    }

    /// Probe every provider now and report.
    pub async fn refresh_all(&self) -> Vec<ProviderStatus> {
        for provider in &self.providers {
            let _ = self.probe(provider.as_ref()).await;
        }
        self.statuses().await
    }

    async fn status_of(&self, provider: &dyn Provider) -> ProviderStatus {
        let info = provider.info();
        let entry = self.health.get(&info.id).await;

        ProviderStatus {
            id: info.id.clone(),
            name: info.name.clone(),
            kind: info.kind,
            models: info.models.clone(),
            default_model: info.default_model.clone(),
            priority: info.priority,
            available: entry.as_ref().map(|e| e.available),
            latency_ms: entry
                .as_ref()
                .and_then(|e| e.latency)
                .map(|l| l.as_millis() as u64),
            checked_secs_ago: entry.as_ref().map(|e| e.checked_at.elapsed().as_secs()),
            last_error: entry.and_then(|e| e.last_error),
        }
    }
}
