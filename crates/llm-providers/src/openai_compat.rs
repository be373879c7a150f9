//! Adapter for OpenAI-compatible chat completions APIs.

use std::time::{Duration, Instant};

use provider_core::{
    async_trait, Generate, GenerateRequest, Generation, HealthCheck, Provider, ProviderError,
    ProviderInfo,
};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api_types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::config::OpenAiCompatConfig;
use crate::http::{build_client, join_url, map_request_error, read_json};

/// Provider for OpenAI, LM Studio, xAI Grok and other `/v1/chat/completions` servers.
pub struct OpenAiCompatProvider {
    client: Client,
    config: OpenAiCompatConfig,
    info: ProviderInfo,
}

impl OpenAiCompatProvider {
    /// Create a new adapter.
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, ProviderError> {
        if config.kind == provider_core::ProviderKind::Remote
            && config.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(ProviderError::Configuration(format!(
                "{} requires an API key",
                config.name
            )));
        }

        let info = ProviderInfo::new(config.id.clone(), config.name.clone(), config.kind)
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
    pub fn config(&self) -> &OpenAiCompatConfig {
        &self.config
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => builder.bearer_auth(key),
            _ => builder,
        }
    }
}

#[async_trait]
impl HealthCheck for OpenAiCompatProvider {
    async fn health_check(&self) -> Result<Duration, ProviderError> {
        let started = Instant::now();

        let response = self
            .authorize(self.client.get(join_url(&self.config.api_url, "/v1/models")))
            .send()
            .await
            .map_err(map_request_error)?;

        let listing: Value = read_json(response).await?;
        let count = listing
            .get("data")
            .and_then(Value::as_array)
            .map(|models| models.len())
            .unwrap_or(0);
        debug!("{} reachable, {} models listed", self.config.name, count);

        Ok(started.elapsed())
    }
}

#[async_trait]
impl Generate for OpenAiCompatProvider {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ProviderError> {
        let model = self.info.resolve_model(request.model.as_deref());

        let body = ChatCompletionRequest {
            model: &model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!("Sending request to {} (model: {})", self.config.name, model);

        let response = self
            .authorize(
                self.client
                    .post(join_url(&self.config.api_url, "/v1/chat/completions"))
                    .json(&body),
            )
            .send()
            .await
            .map_err(map_request_error)?;

        let completion: ChatCompletionResponse = read_json(response).await?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty());

        match text {
            Some(text) => Ok(Generation::new(
                &self.info.id,
                completion.model.unwrap_or(model),
                text,
            )),
            None => {
                warn!("{} returned no content", self.config.name);
                Err(ProviderError::EmptyResponse)
            }
        }
    }
}

impl Provider for OpenAiCompatProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }
}
