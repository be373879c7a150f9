//! JSON boundary for a thin HTTP proxy in front of the registry.
//!
//! Two request shapes are accepted:
//!
//! ```json
//! { "action": "health" }
//! { "provider": "ollama", "payload": { "messages": [...], "model": "llama3.2" } }
//! ```
//!
//! A `provider` of `"auto"` walks the failover chain instead of calling one
//! provider directly.

use provider_core::{GenerateRequest, Generation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::registry::{ProviderRegistry, ProviderStatus};

/// Provider name that selects the failover chain.
pub const AUTO_PROVIDER: &str = "auto";

/// Non-generation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyAction {
    /// Probe every provider and report.
    Health,
}

/// A request arriving at the proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProxyRequest {
    Action { action: ProxyAction },
    Generate {
        provider: String,
        payload: GenerateRequest,
    },
}

/// The proxy's answer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProxyResponse {
    Generation(Generation),
    Health {
        providers: Vec<ProviderStatus>,
        best: Option<String>,
    },
    Error {
        message: String,
    },
}

impl ProxyResponse {
    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl ProviderRegistry {
    /// Serve one proxy request.
    pub async fn handle_proxy(&self, request: ProxyRequest) -> ProxyResponse {
        match request {
            ProxyRequest::Action {
                action: ProxyAction::Health,
            } => {
                let providers = self.refresh_all().await;
                let best = providers
                    .iter()
                    .find(|p| p.available == Some(true))
                    .map(|p| p.id.clone());
                ProxyResponse::Health { providers, best }
            }
            ProxyRequest::Generate { provider, payload } if provider == AUTO_PROVIDER => {
                match self.generate(payload, None).await.into_result() {
                    Ok(generation) => ProxyResponse::Generation(generation),
                    Err(e) => ProxyResponse::error(e.to_string()),
                }
            }
            ProxyRequest::Generate { provider, payload } => {
                debug!("Proxy generate via {}", provider);
                match self.generate_with(&provider, payload).await {
                    Ok(generation) => ProxyResponse::Generation(generation),
                    Err(e) => {
                        warn!("Proxy request failed: {}", e);
                        ProxyResponse::error(e.to_string())
                    }
                }
            }
        }
    }

    /// Serve one proxy request given as JSON text.
    pub async fn handle_proxy_json(&self, body: &str) -> ProxyResponse {
        match serde_json::from_str::<ProxyRequest>(body) {
            Ok(request) => self.handle_proxy(request).await,
            Err(e) => ProxyResponse::error(format!("invalid request: {}", e)),
        }
    }
}
