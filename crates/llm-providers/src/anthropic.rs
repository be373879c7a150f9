//! Anthropic messages API adapter.

use std::time::{Duration, Instant};

use provider_core::{
    async_trait, ChatRole, Generate, GenerateRequest, Generation, HealthCheck, Provider,
    ProviderError, ProviderInfo, ProviderKind,
};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::api_types::{AnthropicMessage, AnthropicRequest, AnthropicResponse};
use crate::config::AnthropicConfig;
use crate::http::{build_client, join_url, map_request_error, read_json};

/// The messages API requires `max_tokens`.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Provider backed by Anthropic's messages API.
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
    info: ProviderInfo,
}

impl AnthropicProvider {
    /// Create a new adapter.
    pub fn new(config: AnthropicConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "Anthropic requires an API key".to_string(),
            ));
        }

        let info = ProviderInfo::new("anthropic", "Anthropic", ProviderKind::Remote)
            .with_models(config.models.clone())
            .with_default_model(config.model.clone())
            .with_priority(config.priority);

        Ok(Self {
            client: build_client()?,
            config,
            info,
        })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
    }
}

#[async_trait]
impl HealthCheck for AnthropicProvider {
    async fn health_check(&self) -> Result<Duration, ProviderError> {
        let started = Instant::now();
        let response = self
            .authorize(self.client.get(join_url(&self.config.api_url, "/v1/models")))
            .send()
            .await
            .map_err(map_request_error)?;

        let _: Value = read_json(response).await?;
        Ok(started.elapsed())
    }
}

#[async_trait]
impl Generate for AnthropicProvider {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ProviderError> {
        let model = self.info.resolve_model(request.model.as_deref());

        // System text goes in its own field; the rest alternate user/assistant.
        let system = request.system_prompt();
        let messages: Vec<AnthropicMessage<'_>> = request
            .messages
            .iter()
            .filter_map(|m| match m.role {
                ChatRole::System => None,
                ChatRole::User => Some(AnthropicMessage {
                    role: "user",
                    content: &m.content,
                }),
                ChatRole::Assistant => Some(AnthropicMessage {
                    role: "assistant",
                    content: &m.content,
                }),
            })
            .collect();

        let body = AnthropicRequest {
            model: &model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages,
            temperature: request.temperature,
        };

        debug!("Sending request to Anthropic (model: {})", model);

        let response = self
            .authorize(
                self.client
                    .post(join_url(&self.config.api_url, "/v1/messages"))
                    .json(&body),
            )
            .send()
            .await
            .map_err(map_request_error)?;

        let parsed: AnthropicResponse = read_json(response).await?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(Generation::new(
            &self.info.id,
            parsed.model.unwrap_or(model),
            text,
        ))
    }
}

impl Provider for AnthropicProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_key() {
        assert!(AnthropicProvider::new(AnthropicConfig::default()).is_err());

        let provider = AnthropicProvider::new(AnthropicConfig {
            api_key: "key".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(provider.id(), "anthropic");
        assert_eq!(provider.info().priority, 110);
    }
}
