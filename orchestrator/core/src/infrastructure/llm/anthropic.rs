// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Anthropic LLM Provider Adapter
//
// Anti-Corruption Layer for the Anthropic Messages API

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_http_client, map_request_error, map_status_error, require_api_key};
use crate::domain::gateway_config::CloudProviderConfig;
use crate::domain::llm::{
    FinishReason, GenerationOptions, GenerationResponse, LLMError, LLMProvider, TokenUsage,
};
use crate::domain::persona::Persona;
use crate::domain::provider::ProviderKind;

pub const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_PERSONA: Persona = Persona::GeneralAssistant;
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The Messages API requires `max_tokens` on every request
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

const TEMPERATURE_RANGE: (f32, f32) = (0.0, 1.0);

pub struct AnthropicAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    system_prompt: String,
    default_max_tokens: u32,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: Option<String>,
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicAdapter {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LLMError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint: endpoint.into(),
            api_key,
            system_prompt: DEFAULT_ANTHROPIC_PERSONA.system_prompt().to_string(),
            default_max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Build from the `providers.anthropic` section; `api_key` is already resolved.
    pub fn from_config(config: &CloudProviderConfig, api_key: Option<String>) -> Result<Self, LLMError> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ANTHROPIC_ENDPOINT.to_string());
        let mut adapter = Self::new(
            endpoint,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )?
        .with_persona(config.persona.unwrap_or(DEFAULT_ANTHROPIC_PERSONA));
        if let Some(max_tokens) = config.max_tokens {
            adapter.default_max_tokens = max_tokens;
        }
        Ok(adapter)
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.system_prompt = persona.system_prompt().to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.endpoint.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LLMProvider for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let api_key = require_api_key(&self.api_key, "ANTHROPIC_API_KEY")?;

        let request = AnthropicRequest {
            model,
            max_tokens: options.max_tokens.unwrap_or(self.default_max_tokens),
            system: options.resolve_system_prompt(Some(&self.system_prompt)),
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.clamped_temperature(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1),
        };

        let url = self.url("messages");
        debug!(%url, model, "Sending messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, error_text, model));
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LLMError::Provider(format!("Failed to parse response: {}", e)))?;

        let text: String = anthropic_response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        Ok(GenerationResponse {
            text,
            usage: anthropic_response
                .usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens)),
            provider: ProviderKind::Anthropic,
            model: anthropic_response.model.unwrap_or_else(|| model.to_string()),
            finish_reason: match anthropic_response.stop_reason.as_deref() {
                Some("max_tokens") => FinishReason::Length,
                _ => FinishReason::Stop,
            },
        })
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        let api_key = require_api_key(&self.api_key, "ANTHROPIC_API_KEY")?;

        let response = self
            .client
            .get(self.url("models"))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            Err(map_status_error(status, String::new(), "models"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::FailureCategory;
    use mockito::Matcher;
    use serde_json::json;

    fn adapter(server: &mockito::ServerGuard) -> AnthropicAdapter {
        AnthropicAdapter::new(server.url(), Some("sk-ant".into()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_messages_request_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-ant")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-3-5-haiku-latest",
                "max_tokens": 1024,
                "system": Persona::TechnicalSupport.system_prompt(),
                "temperature": 1.0,
                "messages": [{"role": "user", "content": "My laptop will not boot"}]
            })))
            .with_status(200)
            .with_body(
                json!({
                    "model": "claude-3-5-haiku-20241022",
                    "content": [
                        {"type": "text", "text": "Try a hard reset. "},
                        {"type": "text", "text": "Then check the charger."}
                    ],
                    "stop_reason": "end_turn",
                    "usage": {"input_tokens": 20, "output_tokens": 9}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let options = GenerationOptions {
            temperature: Some(1.7),
            persona: Some(Persona::TechnicalSupport),
            ..Default::default()
        };
        let response = adapter(&server)
            .generate("claude-3-5-haiku-latest", "My laptop will not boot", &options)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.text, "Try a hard reset. Then check the charger.");
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(29));
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn test_overloaded_is_transient() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let err = adapter(&server)
            .generate("claude-3-5-haiku-latest", "hello there", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::Server { status: 529, .. }));
        assert_eq!(err.category(), FailureCategory::ProviderTransient);
    }

    #[tokio::test]
    async fn test_empty_content_yields_empty_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[],"stop_reason":"max_tokens"}"#)
            .create_async()
            .await;

        let response = adapter(&server)
            .generate("claude-3-5-haiku-latest", "hello there", &GenerationOptions::default())
            .await
            .unwrap();
        assert!(response.text.is_empty());
        assert!(response.usage.is_none());
        assert_eq!(response.finish_reason, FinishReason::Length);
    }

    #[tokio::test]
    async fn test_huge_usage_counts_saturate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(
                json!({
                    "content": [{"type": "text", "text": "ok"}],
                    "stop_reason": "end_turn",
                    "usage": {"input_tokens": 4294967295u64, "output_tokens": 1}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let response = adapter(&server)
            .generate("claude-3-5-haiku-latest", "hello there", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(u32::MAX));
    }

    #[tokio::test]
    async fn test_missing_key_is_auth_failure() {
        let adapter =
            AnthropicAdapter::new(DEFAULT_ANTHROPIC_ENDPOINT, None, Duration::from_secs(1)).unwrap();
        let err = adapter.health_check().await.unwrap_err();
        assert_eq!(err.category(), FailureCategory::ProviderAuth);
    }
}
