//! Language-model provider adapters with health checking and failover.
//!
//! This crate turns a set of backends into one dependable generation
//! service. It provides:
//!
//! - Adapters for a closed set of backends: [`OllamaProvider`],
//!   [`OpenAiCompatProvider`] (OpenAI, LM Studio, xAI Grok) and
//!   [`AnthropicProvider`]
//! - [`HealthCache`] - TTL-bounded availability results shared by all callers
//! - [`ProviderRegistry`] - Priority-ordered detection of the best available
//!   provider and the failover chain walk
//! - [`ChainOutcome`] - The chain result as a value: completed or exhausted
//! - [`ProxyRequest`] - The JSON boundary a thin HTTP proxy can forward
//!
//! # Failover
//!
//! ```text
//!  request ──► preferred provider? ──► priority order (local → remote)
//!                 │
//!                 ▼ for each provider
//!   cached down? ──yes──► skip (no probe)
//!        │ no / unknown
//!        ▼
//!   probe if cache expired ──fail──► next
//!        │ ok
//!        ▼
//!   generate (bounded) ──error/timeout──► next
//!        │ ok
//!        ▼
//!   Completed                    all failed ──► Exhausted
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use llm_providers::ProvidersConfig;
//! use provider_core::GenerateRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ProvidersConfig::from_env().build_registry()?;
//!
//!     let outcome = registry
//!         .generate(GenerateRequest::from_prompt("Say hello"), None)
//!         .await;
//!
//!     match outcome.generation() {
//!         Some(generation) => println!("{}: {}", generation.provider_id, generation.text),
//!         None => println!("all providers failed: {}", outcome.summary()),
//!     }
//!     Ok(())
//! }
//! ```

mod anthropic;
mod api_types;
mod chain;
mod config;
mod health;
mod http;
mod ollama;
mod openai_compat;
mod proxy;
mod registry;

pub use anthropic::AnthropicProvider;
pub use chain::{AttemptFailure, ChainOutcome, ProviderAttempt};
pub use config::{
    AnthropicConfig, OllamaConfig, OpenAiCompatConfig, ProviderConfig, ProvidersConfig,
};
pub use health::{HealthCache, HealthEntry, DEFAULT_HEALTH_TTL};
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use proxy::{ProxyAction, ProxyRequest, ProxyResponse, AUTO_PROVIDER};
pub use registry::{
    ProviderRegistry, ProviderStatus, RegistryError, DEFAULT_GENERATE_TIMEOUT,
    DEFAULT_HEALTH_TIMEOUT,
};

// Re-export provider-core types for convenience
pub use provider_core::{
    async_trait, ChatMessage, ChatRole, Generate, GenerateRequest, Generation, HealthCheck,
    Provider, ProviderError, ProviderInfo, ProviderKind,
};
