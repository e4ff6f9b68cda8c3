// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Provider-neutral contract every LLM backend adapter implements.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption layer between query orchestration and vendor APIs

// LLM Provider Domain Interface (Anti-Corruption Layer)
//
// The local model runner (subprocess) and the cloud chat-completion APIs
// (HTTPS) are normalized behind `LLMProvider`. Adapters classify every
// failure into a `FailureCategory`; nothing downstream reinterprets it.
//
// Implementations in infrastructure/llm/ directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::persona::Persona;
use crate::domain::provider::ProviderKind;

/// Domain interface for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Which backend this adapter talks to
    fn kind(&self) -> ProviderKind;

    /// Generate a completion for an already-validated prompt.
    ///
    /// `model` is opaque to the caller and forwarded verbatim.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError>;

    /// Check if provider is healthy and accessible
    async fn health_check(&self) -> Result<(), LLMError>;
}

/// Options for LLM generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature, clamped to the provider's accepted range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Streaming requested by the caller. No adapter streams; the full
    /// answer is always returned.
    #[serde(default)]
    pub stream: bool,

    /// Replaces the adapter's configured system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Canned system prompt, used when `system_prompt` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
}

impl GenerationOptions {
    /// System prompt for this request: explicit override, then persona,
    /// then the adapter's own default.
    pub fn resolve_system_prompt<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.persona.map(|p| p.system_prompt()))
            .or(fallback)
    }

    /// Temperature clamped to `[min, max]`
    pub fn clamped_temperature(&self, min: f32, max: f32) -> Option<f32> {
        self.temperature.map(|t| t.clamp(min, max))
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Generated text, untrimmed
    pub text: String,

    /// Token usage, only when the provider reports it
    pub usage: Option<TokenUsage>,

    pub provider: ProviderKind,

    /// Model used (e.g., "gpt-4o", "llama3.1")
    pub model: String,

    /// Why generation stopped
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Reason why generation stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural completion (model decided to stop)
    Stop,

    /// Hit max_tokens limit
    Length,

    /// Blocked by content filter
    ContentFilter,
}

/// Failure taxonomy shared by the validator, the adapters and the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCategory {
    /// Bad input. Never retried.
    Validation,
    /// Credentials missing or rejected. Never retried.
    ProviderAuth,
    /// Backend cannot be reached at all. Never retried.
    ProviderUnavailable,
    /// Rate limit, timeout or server-side error. Retried.
    ProviderTransient,
    /// Anything unexpected.
    Internal,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ProviderAuth => "provider-auth",
            Self::ProviderUnavailable => "provider-unavailable",
            Self::ProviderTransient => "provider-transient",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during LLM operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum LLMError {
    /// Connection refused, DNS failure, runner process could not be spawned
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Connection dropped mid-request or similar transport hiccup
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LLMError {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Authentication(_) => FailureCategory::ProviderAuth,
            Self::Network(_) => FailureCategory::ProviderUnavailable,
            Self::RateLimit | Self::Timeout(_) | Self::Server { .. } | Self::Transport(_) => {
                FailureCategory::ProviderTransient
            }
            Self::ModelNotFound(_) | Self::Provider(_) | Self::InvalidInput(_) => {
                FailureCategory::Internal
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == FailureCategory::ProviderTransient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            LLMError::Authentication("bad key".into()).category(),
            FailureCategory::ProviderAuth
        );
        assert_eq!(
            LLMError::Network("refused".into()).category(),
            FailureCategory::ProviderUnavailable
        );
        assert_eq!(LLMError::RateLimit.category(), FailureCategory::ProviderTransient);
        assert_eq!(
            LLMError::Server { status: 503, message: "overloaded".into() }.category(),
            FailureCategory::ProviderTransient
        );
        assert_eq!(
            LLMError::ModelNotFound("nope".into()).category(),
            FailureCategory::Internal
        );
    }

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(LLMError::Timeout("30s".into()).is_retryable());
        assert!(LLMError::Transport("reset".into()).is_retryable());
        assert!(!LLMError::Authentication("x".into()).is_retryable());
        assert!(!LLMError::Network("x".into()).is_retryable());
        assert!(!LLMError::Provider("x".into()).is_retryable());
    }

    #[test]
    fn test_token_usage_total_saturates() {
        assert_eq!(TokenUsage::new(20, 9).total_tokens, 29);
        assert_eq!(TokenUsage::new(u32::MAX, 1).total_tokens, u32::MAX);
        assert_eq!(TokenUsage::new(u32::MAX, u32::MAX).total_tokens, u32::MAX);
    }

    #[test]
    fn test_failure_category_serializes_kebab_case() {
        let json = serde_json::to_string(&FailureCategory::ProviderUnavailable).unwrap();
        assert_eq!(json, "\"provider-unavailable\"");
        assert_eq!(FailureCategory::ProviderAuth.to_string(), "provider-auth");
    }

    #[test]
    fn test_system_prompt_resolution_order() {
        let mut options = GenerationOptions::default();
        assert_eq!(options.resolve_system_prompt(Some("default")), Some("default"));

        options.persona = Some(Persona::TechnicalSupport);
        assert_eq!(
            options.resolve_system_prompt(Some("default")),
            Some(Persona::TechnicalSupport.system_prompt())
        );

        options.system_prompt = Some("You answer in haiku.".to_string());
        assert_eq!(
            options.resolve_system_prompt(Some("default")),
            Some("You answer in haiku.")
        );

        options.system_prompt = Some("   ".to_string());
        assert_eq!(
            options.resolve_system_prompt(None),
            Some(Persona::TechnicalSupport.system_prompt())
        );
    }

    #[test]
    fn test_temperature_clamping() {
        let options = GenerationOptions {
            temperature: Some(1.7),
            ..Default::default()
        };
        assert_eq!(options.clamped_temperature(0.0, 1.0), Some(1.0));
        assert_eq!(options.clamped_temperature(0.0, 2.0), Some(1.7));
        assert_eq!(GenerationOptions::default().clamped_temperature(0.0, 1.0), None);
    }
}
