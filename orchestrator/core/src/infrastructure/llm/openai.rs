// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI LLM Provider Adapter
//
// Anti-Corruption Layer for the OpenAI Chat Completions API.
// Also works with OpenAI-compatible APIs (LM Studio, vLLM, etc.)

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

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_PERSONA: Persona = Persona::TravelAssistant;

const TEMPERATURE_RANGE: (f32, f32) = (0.0, 2.0);

pub struct OpenAIAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    system_prompt: String,
    default_max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: Option<u32>,
}

impl OpenAIAdapter {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LLMError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint: endpoint.into(),
            api_key,
            system_prompt: DEFAULT_OPENAI_PERSONA.system_prompt().to_string(),
            default_max_tokens: None,
        })
    }

    /// Build from the `providers.openai` section; `api_key` is already resolved.
    pub fn from_config(config: &CloudProviderConfig, api_key: Option<String>) -> Result<Self, LLMError> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_ENDPOINT.to_string());
        let adapter = Self::new(
            endpoint,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )?
        .with_persona(config.persona.unwrap_or(DEFAULT_OPENAI_PERSONA))
        .with_default_max_tokens(config.max_tokens);
        Ok(adapter)
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.system_prompt = persona.system_prompt().to_string();
        self
    }

    pub fn with_default_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }
}

fn finish_reason(raw: Option<&str>) -> FinishReason {
    match raw {
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

#[async_trait]
impl LLMProvider for OpenAIAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let api_key = require_api_key(&self.api_key, "OPENAI_API_KEY")?;

        // Translate our domain types to OpenAI's types
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.resolve_system_prompt(Some(&self.system_prompt)) {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: Some(system.to_string()),
            });
        }
        messages.push(OpenAIMessage {
            role: "user".to_string(),
            content: Some(prompt.to_string()),
        });

        let request = OpenAIRequest {
            model,
            messages,
            max_tokens: options.max_tokens.or(self.default_max_tokens),
            temperature: options.clamped_temperature(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1),
        };

        let url = self.url("chat/completions");
        debug!(%url, model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, error_text, model));
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LLMError::Provider(format!("Failed to parse response: {}", e)))?;

        // Translate OpenAI's response to our domain types
        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::Provider("No response from model".into()))?;

        Ok(GenerationResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: openai_response.usage.map(|u| {
                let mut usage = TokenUsage::new(u.prompt_tokens, u.completion_tokens);
                if let Some(total) = u.total_tokens {
                    usage.total_tokens = total;
                }
                usage
            }),
            provider: ProviderKind::OpenAI,
            model: openai_response.model.unwrap_or_else(|| model.to_string()),
            finish_reason: finish_reason(choice.finish_reason.as_deref()),
        })
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        let api_key = require_api_key(&self.api_key, "OPENAI_API_KEY")?;

        // Simple check - try to list models endpoint
        let response = self
            .client
            .get(self.url("models"))
            .bearer_auth(api_key)
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
