//! Failover chain walk.

use std::fmt;
use std::sync::Arc;

use provider_core::{GenerateRequest, Generation, Provider, ProviderError};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::registry::{ProviderRegistry, RegistryError};

/// Why one provider in the chain did not produce the answer.
#[derive(Debug)]
pub enum AttemptFailure {
    /// The cache said the provider was down; it was not contacted.
    SkippedUnavailable,
    /// The provider failed its health probe.
    ProbeFailed(ProviderError),
    /// The provider was called and failed or timed out.
    GenerateFailed(ProviderError),
}

impl AttemptFailure {
    /// The underlying provider error. A skip reports as `Unavailable`.
    pub fn into_error(self) -> ProviderError {
        match self {
            Self::SkippedUnavailable => {
                ProviderError::Unavailable("marked unavailable by a recent check".to_string())
            }
            Self::ProbeFailed(e) | Self::GenerateFailed(e) => e,
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedUnavailable => write!(f, "skipped (marked unavailable)"),
            Self::ProbeFailed(e) => write!(f, "probe failed: {}", e),
            Self::GenerateFailed(e) => write!(f, "generate failed: {}", e),
        }
    }
}

/// One failed step of the chain.
#[derive(Debug)]
pub struct ProviderAttempt {
    pub provider_id: String,
    /// Model that would have been requested.
    pub model: String,
    pub failure: AttemptFailure,
}

/// Result of walking the chain. Exhaustion is an outcome, not an error.
#[derive(Debug)]
pub enum ChainOutcome {
    /// A provider produced text. `attempts` lists the providers tried before it.
    Completed {
        generation: Generation,
        attempts: Vec<ProviderAttempt>,
    },
    /// Every provider failed or was skipped.
    Exhausted { attempts: Vec<ProviderAttempt> },
}

impl ChainOutcome {
    /// Whether a provider produced text.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The generation, if any.
    pub fn generation(&self) -> Option<&Generation> {
        match self {
            Self::Completed { generation, .. } => Some(generation),
            Self::Exhausted { .. } => None,
        }
    }

    /// Failed attempts in chain order.
    pub fn attempts(&self) -> &[ProviderAttempt] {
        match self {
            Self::Completed { attempts, .. } | Self::Exhausted { attempts } => attempts,
        }
    }

    /// One-line description of the failed attempts, for logs.
    pub fn summary(&self) -> String {
        if self.attempts().is_empty() {
            return match self {
                Self::Completed { .. } => "first provider answered".to_string(),
                Self::Exhausted { .. } => "no providers registered".to_string(),
            };
        }
        self.attempts()
            .iter()
            .map(|a| format!("{}: {}", a.provider_id, a.failure))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Convert into a result, reporting exhaustion as `Unavailable`.
    pub fn into_result(self) -> Result<Generation, ProviderError> {
        match self {
            Self::Completed { generation, .. } => Ok(generation),
            exhausted @ Self::Exhausted { .. } => Err(ProviderError::Unavailable(format!(
                "all providers failed ({})",
                exhausted.summary()
            ))),
        }
    }
}

impl ProviderRegistry {
    /// Providers in the order a chain walk visits them.
    ///
    /// A registered preferred provider goes first; the rest follow in
    /// priority order. An unknown preference is ignored.
    pub fn chain_order(&self, preferred: Option<&str>) -> Vec<Arc<dyn Provider>> {
        let mut order: Vec<Arc<dyn Provider>> = Vec::with_capacity(self.len());

        if let Some(first) = preferred.and_then(|id| self.get(id)) {
            order.push(first.clone());
        }
        for provider in self.providers() {
            if Some(provider.id()) != preferred {
                order.push(provider.clone());
            }
        }
        order
    }

    /// Walk the chain once and return the first successful generation.
    ///
    /// Each provider gets at most one probe and one generate call. The
    /// request's model goes to the preferred provider and to providers that
    /// list it explicitly; every other provider uses its default model.
    pub async fn generate(
        &self,
        mut request: GenerateRequest,
        preferred_provider: Option<&str>,
    ) -> ChainOutcome {
        self.apply_defaults(&mut request);
        let requested_model = request.model.take();

        let mut attempts = Vec::new();

        for provider in self.chain_order(preferred_provider) {
            let info = provider.info();
            let is_preferred = Some(info.id.as_str()) == preferred_provider;

            let mut call = request.clone();
            call.model = requested_model
                .as_ref()
                .filter(|m| is_preferred || info.models.iter().any(|listed| listed == *m))
                .cloned();
            let model = info.resolve_model(call.model.as_deref());

            match self.attempt(provider.as_ref(), &call).await {
                Ok(generation) => {
                    info!(
                        "Generated with {} (model: {}, {} ms, {} earlier attempts)",
                        generation.provider_id,
                        generation.model,
                        generation.latency_ms,
                        attempts.len()
                    );
                    return ChainOutcome::Completed {
                        generation,
                        attempts,
                    };
                }
                Err(failure) => attempts.push(ProviderAttempt {
                    provider_id: info.id.clone(),
                    model,
                    failure,
                }),
            }
        }

        warn!("All providers failed: {}", attempts_summary(&attempts));
        ChainOutcome::Exhausted { attempts }
    }

    /// Call one provider directly, with the same cache and time bounds as the chain.
    pub async fn generate_with(
        &self,
        id: &str,
        mut request: GenerateRequest,
    ) -> Result<Generation, RegistryError> {
        let provider = self
            .get(id)
            .ok_or_else(|| RegistryError::UnknownProvider(id.to_string()))?
            .clone();

        self.apply_defaults(&mut request);

        self.attempt(provider.as_ref(), &request)
            .await
            .map_err(|failure| RegistryError::Failed {
                id: id.to_string(),
                source: failure.into_error(),
            })
    }

    fn apply_defaults(&self, request: &mut GenerateRequest) {
        if request.max_tokens.is_none() {
            request.max_tokens = self.max_tokens;
        }
        if request.temperature.is_none() {
            request.temperature = self.temperature;
        }
    }

    /// One chain step: consult the cache, probe if needed, then generate once.
    async fn attempt(
        &self,
        provider: &dyn Provider,
        request: &GenerateRequest,
    ) -> Result<Generation, AttemptFailure> {
        let id = provider.id();

        match self.health.fresh(id).await {
            Some(entry) if !entry.available => {
                debug!("Skipping {} (cached unavailable)", id);
                return Err(AttemptFailure::SkippedUnavailable);
            }
            Some(_) => {}
            None => {
                self.probe(provider)
                    .await
                    .map_err(AttemptFailure::ProbeFailed)?;
            }
        }

        let started = Instant::now();
        let result = match timeout(self.generate_timeout, provider.generate(request)).await {
            Ok(Ok(generation)) if generation.text.trim().is_empty() => {
                Err(ProviderError::EmptyResponse)
            }
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.generate_timeout)),
        };

        match result {
            Ok(mut generation) => {
                let latency = started.elapsed();
                generation.latency_ms = latency.as_millis() as u64;
                self.health.record_success(id, latency).await;
                Ok(generation)
            }
            Err(e) => {
                warn!("Provider {} failed: {}", id, e);
                if e.is_connectivity() {
                    self.health.record_failure(id, e.to_string()).await;
                }
                Err(AttemptFailure::GenerateFailed(e))
            }
        }
    }
}

fn attempts_summary(attempts: &[ProviderAttempt]) -> String {
    if attempts.is_empty() {
        return "no providers registered".to_string();
    }
    attempts
        .iter()
        .map(|a| a.provider_id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
