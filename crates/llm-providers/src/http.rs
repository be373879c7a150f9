//! HTTP helpers shared by the adapters.

use provider_core::ProviderError;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Build the HTTP client used by an adapter.
///
/// No client-level timeout: every call is bounded by the registry.
pub(crate) fn build_client() -> Result<Client, ProviderError> {
    Client::builder()
        .build()
        .map_err(|e| ProviderError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Map a transport error. Connection failures mean the backend is down.
pub(crate) fn map_request_error(err: reqwest::Error) -> ProviderError {
    if err.is_connect() {
        ProviderError::Unavailable(format!("connection failed: {}", err))
    } else {
        ProviderError::Network(format!("Failed to send request: {}", err))
    }
}

/// Turn a non-success response into an error, or parse the JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message: extract_error_message(&body),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

/// Pull a readable message out of an error body.
///
/// Handles `{"error": {"message": ..}}` (OpenAI, Anthropic, xAI) and
/// `{"error": ".."}` (Ollama); anything else is returned as-is.
pub(crate) fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        None => body.trim().to_string(),
    }
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_shapes() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"bad key","type":"auth"}}"#),
            "bad key"
        );
        assert_eq!(
            extract_error_message(r#"{"error":"model 'x' not found"}"#),
            "model 'x' not found"
        );
        assert_eq!(extract_error_message("gateway timeout\n"), "gateway timeout");
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:11434/", "/api/tags"),
            "http://localhost:11434/api/tags"
        );
        assert_eq!(join_url("https://api.x.ai", "v1/models"), "https://api.x.ai/v1/models");
    }
}
