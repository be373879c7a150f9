//! Error types for orchestrator operations.

use llm_providers::RegistryError;
use provider_core::ProviderError;
use thiserror::Error;

/// Errors that can occur during orchestration.
///
/// Only [`OrchestratorError::EmptyMessage`] and
/// [`OrchestratorError::InvalidSession`] are returned by message processing;
/// every other failure there degrades into a fallback response.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The message text was empty or whitespace.
    #[error("message text is empty")]
    EmptyMessage,

    /// The session id was empty.
    #[error("session id is empty")]
    InvalidSession,

    /// No agent with this id is registered.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    /// No template with this id is registered.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// An agent with this id exists and the collision policy rejects duplicates.
    #[error("agent already exists: {0}")]
    AgentExists(String),

    /// No provider with this id is registered.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// A provider call failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Invalid orchestrator configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<RegistryError> for OrchestratorError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownProvider(id) => Self::UnknownProvider(id),
            RegistryError::ProbeFailed { source, .. } | RegistryError::Failed { source, .. } => {
                Self::Provider(source)
            }
        }
    }
}
