//! Ollama adapter (local).

use std::time::{Duration, Instant};

use provider_core::{
    async_trait, Generate, GenerateRequest, Generation, HealthCheck, Provider, ProviderError,
    ProviderInfo, ProviderKind,
};
use reqwest::Client;
use tracing::debug;

use crate::api_types::{OllamaChatRequest, OllamaChatResponse, OllamaOptions, OllamaTags};
use crate::config::OllamaConfig;
use crate::http::{build_client, join_url, map_request_error, read_json};

/// Provider backed by a local Ollama server.
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
    info: ProviderInfo,
}

impl OllamaProvider {
    /// Create a new Ollama adapter.
    pub fn new(config: OllamaConfig) -> Result<Self, ProviderError> {
        let info = ProviderInfo::new("ollama", "Ollama", ProviderKind::Local)
            .with_models(config.models.clone())
            .with_default_model(config.model.clone())
            .with_priority(config.priority);

        Ok(Self {
            client: build_client()?,
            config,
            info,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// List installed models.
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .get(join_url(&self.config.base_url, "/api/tags"))
            .send()
            .await
            .map_err(map_request_error)?;

        let tags: OllamaTags = read_json(response).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl HealthCheck for OllamaProvider {
    async fn health_check(&self) -> Result<Duration, ProviderError> {
        let started = Instant::now();
        let models = self.list_models().await?;
        debug!("Ollama reachable with {} installed models", models.len());
        Ok(started.elapsed())
    }
}

#[async_trait]
impl Generate for OllamaProvider {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ProviderError> {
        let model = self.info.resolve_model(request.model.as_deref());
        let options = (request.temperature.is_some() || request.max_tokens.is_some()).then(|| {
            OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            }
        });

        let body = OllamaChatRequest {
            model: &model,
            messages: &request.messages,
            stream: false,
            options,
        };

        debug!("Sending request to Ollama (model: {})", model);

        let response = self
            .client
            .post(join_url(&self.config.base_url, "/api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let chat: OllamaChatResponse = read_json(response).await?;

        let text = chat
            .message
            .map(|m| m.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(Generation::new(
            &self.info.id,
            chat.model.unwrap_or(model),
            text,
        ))
    }
}

impl Provider for OllamaProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_from_config() {
        let provider = OllamaProvider::new(OllamaConfig {
            model: "mistral".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(provider.id(), "ollama");
        assert_eq!(provider.info().kind, ProviderKind::Local);
        assert_eq!(provider.info().default_model, "mistral");
    }
}
