//! Core traits and types for language-model provider adapters.
//!
//! This crate provides the shared interface for every provider adapter in
//! Switchboard. It defines:
//!
//! - [`HealthCheck`] / [`Generate`] - The two capabilities a backend exposes
//! - [`Provider`] - A backend with both capabilities plus static metadata
//! - [`ChatMessage`] / [`GenerateRequest`] / [`Generation`] - Request and result types
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use provider_core::{
//!     async_trait, Generate, GenerateRequest, Generation, HealthCheck, Provider,
//!     ProviderError, ProviderInfo, ProviderKind,
//! };
//!
//! struct StaticProvider {
//!     info: ProviderInfo,
//! }
//!
//! #[async_trait]
//! impl HealthCheck for StaticProvider {
//!     async fn health_check(&self) -> Result<Duration, ProviderError> {
//!         Ok(Duration::ZERO)
//!     }
//! }
//!
//! #[async_trait]
//! impl Generate for StaticProvider {
//!     async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ProviderError> {
//!         Ok(Generation::new(&self.info.id, "static-1", "Hello!"))
//!     }
//! }
//!
//! impl Provider for StaticProvider {
//!     fn info(&self) -> &ProviderInfo {
//!         &self.info
//!     }
//! }
//!
//! let provider = StaticProvider {
//!     info: ProviderInfo::new("static", "Static", ProviderKind::Local),
//! };
//! assert_eq!(provider.id(), "static");
//! ```

mod error;
mod message;
mod prompt;
mod provider;

pub use error::ProviderError;
pub use message::{ChatMessage, ChatRole, GenerateRequest, Generation};
pub use prompt::hash_prompt;
pub use provider::{Generate, HealthCheck, Provider, ProviderInfo, ProviderKind};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
