//! HTTP adapter tests against a local mock server.

use std::sync::Arc;

use llm_providers::{
    AnthropicConfig, AnthropicProvider, Generate, GenerateRequest, HealthCheck, OllamaConfig,
    OllamaProvider, OpenAiCompatConfig, OpenAiCompatProvider, ProviderError, ProviderRegistry,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ollama(server: &MockServer) -> OllamaProvider {
    OllamaProvider::new(OllamaConfig {
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn ollama_probe_and_generate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "llama3.2:latest"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "llama3.2", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2",
            "message": {"role": "assistant", "content": "Hello from Ollama"},
            "done": true
        })))
        .mount(&server)
        .await;

    let provider = ollama(&server);
    assert!(provider.health_check().await.is_ok());
    assert_eq!(
        provider.list_models().await.unwrap(),
        vec!["llama3.2:latest".to_string()]
    );

    let generation = provider
        .generate(&GenerateRequest::from_prompt("hi"))
        .await
        .unwrap();
    assert_eq!(generation.text, "Hello from Ollama");
    assert_eq!(generation.provider_id, "ollama");
}

#[tokio::test]
async fn ollama_error_body_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "model 'x' not found"})),
        )
        .mount(&server)
        .await;

    let err = ollama(&server)
        .generate(&GenerateRequest::from_prompt("hi"))
        .await
        .unwrap_err();

    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "model 'x' not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn openai_compat_sends_bearer_and_model() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o",
            "choices": [{"message": {"role": "assistant", "content": "Hi there"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        })))
        .mount(&server)
        .await;

    let provider =
        OpenAiCompatProvider::new(OpenAiCompatConfig::openai("sk-test").with_api_url(server.uri()))
            .unwrap();

    let generation = provider
        .generate(&GenerateRequest::from_prompt("hello").with_model("gpt-4o"))
        .await
        .unwrap();
    assert_eq!(generation.text, "Hi there");
    assert_eq!(generation.model, "gpt-4o");
}

#[tokio::test]
async fn openai_compat_empty_choice_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "   "}}]
        })))
        .mount(&server)
        .await;

    let provider = OpenAiCompatProvider::new(OpenAiCompatConfig::lm_studio(server.uri())).unwrap();
    let err = provider
        .generate(&GenerateRequest::from_prompt("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResponse));
}

#[tokio::test]
async fn anthropic_splits_system_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "system": "Be brief.",
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "claude-3-5-haiku-latest",
            "content": [{"type": "text", "text": "Hi!"}]
        })))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(AnthropicConfig {
        api_url: server.uri(),
        api_key: "ak-test".to_string(),
        ..Default::default()
    })
    .unwrap();

    let request = GenerateRequest::new(vec![
        llm_providers::ChatMessage::system("Be brief."),
        llm_providers::ChatMessage::user("hello"),
    ]);
    let generation = provider.generate(&request).await.unwrap();
    assert_eq!(generation.text, "Hi!");
}

#[tokio::test]
async fn chain_fails_over_from_unreachable_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "from lm studio"}}]
        })))
        .mount(&server)
        .await;

    let mut registry = ProviderRegistry::new();
    // Nothing listens on port 9 locally; the connection is refused.
    registry.register(Arc::new(
        OllamaProvider::new(OllamaConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap(),
    ));
    registry.register(Arc::new(
        OpenAiCompatProvider::new(OpenAiCompatConfig::lm_studio(server.uri())).unwrap(),
    ));

    let outcome = registry
        .generate(GenerateRequest::from_prompt("hello"), None)
        .await;

    let generation = outcome.generation().unwrap();
    assert_eq!(generation.provider_id, "lmstudio");
    assert_eq!(generation.text, "from lm studio");
    assert_eq!(outcome.attempts().len(), 1);
    assert!(!registry.health().get("ollama").await.unwrap().available);
}
