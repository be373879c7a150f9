//! Mock language-model providers for testing.
//!
//! - [`EchoProvider`] - Answers with the last user message
//! - [`FailingProvider`] - Fails its probe, its generate call, or both
//! - [`DelayedProvider`] - Wraps another provider and sleeps before answering
//!
//! Every mock counts its probes and generate calls in [`ProviderCounts`] so
//! tests can assert how often the chain contacted it.

mod counts;
mod delayed;
mod echo;
mod failing;

pub use counts::ProviderCounts;
pub use delayed::DelayedProvider;
pub use echo::EchoProvider;
pub use failing::FailingProvider;

pub use provider_core::{Provider, ProviderError, ProviderInfo, ProviderKind};
