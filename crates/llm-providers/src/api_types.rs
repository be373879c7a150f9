//! Wire types for the supported provider APIs.

use provider_core::ChatMessage;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions (OpenAI, LM Studio, xAI)
// ---------------------------------------------------------------------------

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// A completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

/// Message inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

/// `POST /api/chat` request.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

/// Sampling options for Ollama.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// `POST /api/chat` response (non-streaming).
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub message: Option<OllamaMessage>,
}

/// Message in an Ollama response.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaMessage {
    #[serde(default)]
    pub content: String,
}

/// `GET /api/tags` response.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaTags {
    #[serde(default)]
    pub models: Vec<OllamaModel>,
}

/// A locally installed Ollama model.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Anthropic messages
// ---------------------------------------------------------------------------

/// `POST /v1/messages` request.
#[derive(Debug, Clone, Serialize)]
pub struct AnthropicRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    pub messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A non-system message for Anthropic.
#[derive(Debug, Clone, Serialize)]
pub struct AnthropicMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// `POST /v1/messages` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<AnthropicContent>,
}

/// A content block.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicContent {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl AnthropicResponse {
    /// Concatenate all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_completion_request_skips_empty_options() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            max_tokens: None,
            temperature: Some(0.2),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_anthropic_text_joins_blocks() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{"model":"claude","content":[{"type":"text","text":"Hello "},{"type":"tool_use"},{"type":"text","text":"there"}]}"#,
        )
        .unwrap();
        assert_eq!(response.text(), "Hello there");
    }
}
