//! Error types for provider operations.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while probing or calling a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider failed its health probe or is known to be down.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within its time bound.
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider answered but the body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request never reached the provider.
    #[error("network error: {0}")]
    Network(String),

    /// The adapter is misconfigured (missing key, bad URL).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The provider returned no text.
    #[error("empty response from provider")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether this error says the provider itself is unreachable.
    ///
    /// Connectivity failures mark the provider unavailable in the health
    /// cache; request-level failures (bad status, unparsable body) do not.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout(_) | Self::Network(_) | Self::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_classification() {
        assert!(ProviderError::Unavailable("down".into()).is_connectivity());
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_connectivity());
        assert!(ProviderError::Network("refused".into()).is_connectivity());
        assert!(!ProviderError::EmptyResponse.is_connectivity());
        assert!(!ProviderError::Api {
            status: 429,
            message: "slow down".into()
        }
        .is_connectivity());
    }

    #[test]
    fn test_display() {
        let err = ProviderError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "API error (500): boom");
    }
}
