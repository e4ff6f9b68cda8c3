// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Query Service
//!
//! Application service answering one question end to end.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Orchestrate validation, provider dispatch and envelope shaping
//! - **Collaborators:**
//!   - Domain: Question, ValidationPolicy, LLMProvider
//!   - Application: RetryPolicy
//!   - Infrastructure: ProviderRegistry
//!
//! # Flow
//!
//! 1. Validate the question (rejection never reaches a provider)
//! 2. Resolve the adapter for the requested provider
//! 3. Call `generate` through the retry policy, bounded by the request timeout
//! 4. Trim the answer; an empty answer is an internal failure
//! 5. Build the `QueryResponse` envelope
//!
//! # Error Handling
//!
//! Returns [`QueryError`]. Its [`QueryError::public_message`] is what callers
//! see; provider detail is only logged.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::retry::RetryPolicy;
use crate::domain::gateway_config::GatewayConfig;
use crate::domain::llm::{FailureCategory, FinishReason, GenerationOptions, LLMError};
use crate::domain::provider::{ModelSelector, ProviderKind};
use crate::domain::query::{ErrorResponse, QueryRequest, QueryResponse};
use crate::domain::question::{Question, ValidationError, ValidationPolicy};
use crate::infrastructure::llm::ProviderRegistry;

pub const STREAMING_WARNING: &str =
    "Streaming is not supported; the complete answer is returned in a single response.";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("provider '{0}' is not configured")]
    ProviderNotConfigured(ProviderKind),

    #[error("provider '{provider}' failed: {source}")]
    Provider {
        provider: ProviderKind,
        #[source]
        source: LLMError,
    },

    #[error("provider '{0}' returned an empty response")]
    EmptyResponse(ProviderKind),
}

impl QueryError {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Validation(_) => FailureCategory::Validation,
            Self::ProviderNotConfigured(_) | Self::EmptyResponse(_) => FailureCategory::Internal,
            Self::Provider { source, .. } => source.category(),
        }
    }

    /// Caller-visible text. Never includes provider output or credentials.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::ProviderNotConfigured(_) => "provider not configured".to_string(),
            Self::EmptyResponse(_) => "empty response".to_string(),
            Self::Provider { source, .. } => match source.category() {
                FailureCategory::ProviderAuth => {
                    "The model provider rejected the gateway's credentials.".to_string()
                }
                FailureCategory::ProviderUnavailable => {
                    "The model provider is currently unreachable.".to_string()
                }
                FailureCategory::ProviderTransient => {
                    "The model provider is temporarily unavailable. Please try again later."
                        .to_string()
                }
                FailureCategory::Validation | FailureCategory::Internal => {
                    "An internal error occurred while generating the answer.".to_string()
                }
            },
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.category(), self.public_message())
    }
}

/// Question answering use case
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Answer a raw question with the selected provider and model
    async fn answer(
        &self,
        question: &str,
        selector: &ModelSelector,
        options: &GenerationOptions,
    ) -> Result<QueryResponse, QueryError>;

    /// Answer an inbound request
    async fn ask(&self, request: QueryRequest) -> Result<QueryResponse, QueryError> {
        let selector = request.selector();
        let options = request.options();
        self.answer(&request.question, &selector, &options).await
    }
}

/// Standard implementation of QueryService
pub struct StandardQueryService {
    registry: Arc<ProviderRegistry>,
    policy: ValidationPolicy,
    retry: RetryPolicy,
    request_timeout: Option<Duration>,
}

impl StandardQueryService {
    pub fn new(registry: Arc<ProviderRegistry>, policy: ValidationPolicy, retry: RetryPolicy) -> Self {
        Self {
            registry,
            policy,
            retry,
            request_timeout: None,
        }
    }

    pub fn from_config(registry: Arc<ProviderRegistry>, config: &GatewayConfig) -> Self {
        Self::new(
            registry,
            config.spec.validation.policy(),
            RetryPolicy::from_config(&config.spec.retry),
        )
        .with_request_timeout(
            config
                .spec
                .server
                .request_timeout_secs
                .map(Duration::from_secs),
        )
    }

    /// Wall-clock bound on the whole retry sequence
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn record_outcome(provider: ProviderKind, outcome: &'static str) {
        metrics::counter!(
            "pawa_queries_total",
            "provider" => provider.as_str(),
            "outcome" => outcome
        )
        .increment(1);
    }

    async fn dispatch(
        &self,
        request_id: String,
        question: &str,
        selector: &ModelSelector,
        options: &GenerationOptions,
    ) -> Result<QueryResponse, QueryError> {
        let question = match Question::parse(question, &self.policy) {
            Ok(q) => q,
            Err(e) => {
                info!(reason = %e, "Question rejected");
                Self::record_outcome(selector.provider, FailureCategory::Validation.as_str());
                return Err(e.into());
            }
        };

        let provider = self.registry.get(selector.provider).ok_or_else(|| {
            error!("Provider is not configured");
            Self::record_outcome(selector.provider, FailureCategory::Internal.as_str());
            QueryError::ProviderNotConfigured(selector.provider)
        })?;

        let started = Instant::now();

        let adapter = provider.as_ref();
        let model = selector.model.as_str();
        let prompt = question.content();
        let call = self
            .retry
            .execute(move |attempt| {
                tracing::debug!(attempt, "Calling provider");
                adapter.generate(model, prompt, options)
            });

        let outcome = match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(LLMError::Timeout(format!(
                    "request exceeded {}s",
                    limit.as_secs()
                ))),
            },
            None => call.await,
        };

        let generated = match outcome {
            Ok(generated) => generated,
            Err(source) => {
                let category = source.category();
                if category == FailureCategory::Internal {
                    error!(error = %source, "Provider call failed");
                } else {
                    warn!(error = %source, category = %category, "Provider call failed");
                }
                Self::record_outcome(selector.provider, category.as_str());
                return Err(QueryError::Provider {
                    provider: selector.provider,
                    source,
                });
            }
        };

        let answer = generated.text.trim();
        if answer.is_empty() {
            error!(model = %generated.model, "Provider returned an empty answer");
            Self::record_outcome(selector.provider, FailureCategory::Internal.as_str());
            return Err(QueryError::EmptyResponse(selector.provider));
        }

        if generated.finish_reason == FinishReason::Length {
            warn!(model = %generated.model, "Answer was cut off at the token limit");
            metrics::counter!(
                "pawa_truncated_answers_total",
                "provider" => selector.provider.as_str()
            )
            .increment(1);
        }

        let processing_time = started.elapsed().as_secs_f64();
        metrics::histogram!(
            "pawa_query_duration_seconds",
            "provider" => selector.provider.as_str()
        )
        .record(processing_time);
        Self::record_outcome(selector.provider, "success");

        info!(processing_time, tokens = ?generated.usage.map(|u| u.total_tokens), "Question answered");

        Ok(QueryResponse {
            answer: answer.to_string(),
            model: generated.model,
            provider: selector.provider,
            tokens_used: generated.usage.map(|u| u.total_tokens),
            processing_time,
            timestamp: chrono::Utc::now().to_rfc3339(),
            warning: options.stream.then(|| STREAMING_WARNING.to_string()),
            request_id,
        })
    }
}

#[async_trait]
impl QueryService for StandardQueryService {
    async fn answer(
        &self,
        question: &str,
        selector: &ModelSelector,
        options: &GenerationOptions,
    ) -> Result<QueryResponse, QueryError> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "query",
            request_id = %request_id,
            provider = %selector.provider,
            model = %selector.model
        );

        self.dispatch(request_id, question, selector, options)
            .instrument(span)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_messages_hide_provider_detail() {
        let err = QueryError::Provider {
            provider: ProviderKind::OpenAI,
            source: LLMError::Authentication("invalid key sk-live-1234".into()),
        };
        assert_eq!(err.category(), FailureCategory::ProviderAuth);
        assert!(!err.public_message().contains("sk-live"));

        let err = QueryError::Provider {
            provider: ProviderKind::Ollama,
            source: LLMError::ModelNotFound("ghost".into()),
        };
        assert_eq!(err.category(), FailureCategory::Internal);
        assert!(!err.public_message().contains("ghost"));
    }

    #[test]
    fn test_error_response_mapping() {
        let response = QueryError::from(ValidationError::Empty).to_response();
        assert_eq!(response.error_category, FailureCategory::Validation);
        assert_eq!(response.message, "empty question");

        let response = QueryError::EmptyResponse(ProviderKind::Anthropic).to_response();
        assert_eq!(response.error_category, FailureCategory::Internal);
        assert_eq!(response.message, "empty response");
    }
}
