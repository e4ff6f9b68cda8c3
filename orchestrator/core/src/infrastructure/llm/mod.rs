// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain `LLMProvider` contract and one
// external backend: the local model runner (subprocess) or a cloud
// chat-completion API (HTTPS).

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod registry;

pub use anthropic::AnthropicAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAIAdapter;
pub use registry::ProviderRegistry;

use std::time::Duration;

use crate::domain::llm::LLMError;

/// HTTP client with a whole-request timeout
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, LLMError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LLMError::Provider(format!("Failed to build HTTP client: {}", e)))
}

/// Classify a reqwest failure that happened before a status was received
pub(crate) fn map_request_error(err: reqwest::Error) -> LLMError {
    if err.is_timeout() {
        LLMError::Timeout(err.to_string())
    } else if err.is_connect() {
        LLMError::Network(err.to_string())
    } else {
        LLMError::Transport(err.to_string())
    }
}

/// Classify a non-success HTTP status from a cloud provider
pub(crate) fn map_status_error(status: reqwest::StatusCode, body: String, model: &str) -> LLMError {
    match status.as_u16() {
        401 | 403 => LLMError::Authentication(body),
        429 => LLMError::RateLimit,
        408 => LLMError::Timeout(format!("HTTP 408: {}", body)),
        404 => LLMError::ModelNotFound(model.to_string()),
        code if status.is_server_error() => LLMError::Server {
            status: code,
            message: body,
        },
        _ => LLMError::Provider(format!("HTTP {}: {}", status, body)),
    }
}

/// A usable API key, or an authentication failure raised before any I/O
pub(crate) fn require_api_key<'a>(key: &'a Option<String>, var: &str) -> Result<&'a str, LLMError> {
    key.as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| LLMError::Authentication(format!("{} is not configured", var)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::FailureCategory;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        let category = |code: u16| {
            map_status_error(StatusCode::from_u16(code).unwrap(), String::new(), "m").category()
        };
        assert_eq!(category(401), FailureCategory::ProviderAuth);
        assert_eq!(category(403), FailureCategory::ProviderAuth);
        assert_eq!(category(429), FailureCategory::ProviderTransient);
        assert_eq!(category(408), FailureCategory::ProviderTransient);
        assert_eq!(category(500), FailureCategory::ProviderTransient);
        assert_eq!(category(529), FailureCategory::ProviderTransient);
        assert_eq!(category(404), FailureCategory::Internal);
        assert_eq!(category(400), FailureCategory::Internal);
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            require_api_key(&None, "OPENAI_API_KEY"),
            Err(LLMError::Authentication(_))
        ));
        assert!(require_api_key(&Some("  ".to_string()), "X").is_err());
        assert_eq!(require_api_key(&Some("sk-1".to_string()), "X").unwrap(), "sk-1");
    }
}
