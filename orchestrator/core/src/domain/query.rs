// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Request and response envelopes for the question-answering flow.
//!
//! One canonical shape per entity; optional fields carry everything a given
//! provider may or may not report.

use serde::{Deserialize, Serialize};

use crate::domain::llm::{FailureCategory, GenerationOptions};
use crate::domain::persona::Persona;
use crate::domain::provider::{ModelSelector, ProviderKind};

/// Inbound question as received by the HTTP boundary or the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,

    pub model: String,

    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub stream: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>, provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            model: model.into(),
            provider,
            temperature: None,
            max_tokens: None,
            stream: false,
            system_prompt: None,
            persona: None,
        }
    }

    pub fn selector(&self) -> ModelSelector {
        ModelSelector::new(self.provider, self.model.clone())
    }

    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: self.stream,
            system_prompt: self.system_prompt.clone(),
            persona: self.persona,
        }
    }
}

/// Uniform success envelope, whatever provider answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,

    pub model: String,

    pub provider: ProviderKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,

    /// Seconds from dispatch to answer
    pub processing_time: f64,

    /// RFC 3339, UTC
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    pub request_id: String,
}

/// Uniform failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_category: FailureCategory,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            error_category,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"question": "What is Rust?", "model": "llama3.1"}"#).unwrap();
        assert_eq!(request.provider, ProviderKind::Ollama);
        assert!(!request.stream);
        assert_eq!(request.options(), GenerationOptions::default());
        assert_eq!(request.selector().to_string(), "ollama/llama3.1");
    }

    #[test]
    fn test_request_carries_options() {
        let request: QueryRequest = serde_json::from_value(serde_json::json!({
            "question": "Explain borrowing",
            "model": "gpt-4o",
            "provider": "openai",
            "temperature": 0.2,
            "max_tokens": 256,
            "stream": true,
            "persona": "technical-support"
        }))
        .unwrap();

        let options = request.options();
        assert_eq!(options.temperature, Some(0.2));
        assert_eq!(options.max_tokens, Some(256));
        assert!(options.stream);
        assert_eq!(options.persona, Some(Persona::TechnicalSupport));
    }

    #[test]
    fn test_response_omits_absent_optionals() {
        let response = QueryResponse {
            answer: "Yes.".to_string(),
            model: "llama3.1".to_string(),
            provider: ProviderKind::Ollama,
            tokens_used: None,
            processing_time: 0.42,
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            warning: None,
            request_id: "r-1".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("tokens_used").is_none());
        assert!(json.get("warning").is_none());
        assert_eq!(json["provider"], "ollama");
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_value(ErrorResponse::new(
            FailureCategory::Validation,
            "empty question",
        ))
        .unwrap();
        assert_eq!(json["error_category"], "validation");
        assert_eq!(json["message"], "empty question");
    }
}
