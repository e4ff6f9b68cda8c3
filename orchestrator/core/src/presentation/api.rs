// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, SemaphorePermit};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::application::model_service::ModelService;
use crate::application::query_service::QueryService;
use crate::domain::llm::FailureCategory;
use crate::domain::query::{ErrorResponse, QueryRequest};
use crate::infrastructure::llm::ProviderRegistry;

pub struct AppState {
    pub query_service: Arc<dyn QueryService>,
    pub model_service: Arc<dyn ModelService>,
    pub registry: Arc<ProviderRegistry>,
    limiter: Semaphore,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        query_service: Arc<dyn QueryService>,
        model_service: Arc<dyn ModelService>,
        registry: Arc<ProviderRegistry>,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            query_service,
            model_service,
            registry,
            limiter: Semaphore::new(max_concurrent_requests),
            started_at: Instant::now(),
        }
    }

    /// Non-blocking admission; `None` when the gateway is saturated
    fn admit(&self) -> Option<SemaphorePermit<'_>> {
        self.limiter.try_acquire().ok()
    }
}

pub fn app(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health))
        .route("/api/qna/ask", post(ask))
        .route("/api/models", get(list_models))
        .route("/api/models/install", post(install_model))
        .route("/api/models/{name}", delete(remove_model))
        .route("/api/providers/status", get(provider_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP status for a failure category
pub fn status_for(category: FailureCategory) -> StatusCode {
    match category {
        FailureCategory::Validation => StatusCode::BAD_REQUEST,
        FailureCategory::ProviderAuth
        | FailureCategory::ProviderUnavailable
        | FailureCategory::ProviderTransient
        | FailureCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: ErrorResponse) -> Response {
    (status_for(error.error_category), Json(error)).into_response()
}

fn saturated() -> Response {
    warn!("Rejecting request: concurrency limit reached");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new(
            FailureCategory::ProviderTransient,
            "The gateway is busy. Please try again later.",
        )),
    )
        .into_response()
}

fn bad_body(rejection: JsonRejection) -> Response {
    error_response(ErrorResponse::new(
        FailureCategory::Validation,
        format!("invalid request body: {}", rejection.body_text()),
    ))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_body(rejection),
    };

    let Some(_permit) = state.admit() else {
        return saturated();
    };

    match state.query_service.ask(request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e.to_response()),
    }
}

async fn list_models(State(state): State<Arc<AppState>>) -> Response {
    match state.model_service.list_models().await {
        Ok(models) => Json(json!({ "models": models })).into_response(),
        Err(e) => {
            warn!(error = %e, "Listing models failed");
            error_response(e.to_response())
        }
    }
}

#[derive(Deserialize)]
pub struct InstallModelRequest {
    pub model_name: String,
}

async fn install_model(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InstallModelRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_body(rejection),
    };

    let Some(_permit) = state.admit() else {
        return saturated();
    };

    match state.model_service.install_model(&request.model_name).await {
        Ok(operation) => Json(operation).into_response(),
        Err(e) => {
            warn!(error = %e, "Installing model failed");
            error_response(e.to_response())
        }
    }
}

async fn remove_model(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    match state.model_service.remove_model(&name).await {
        Ok(operation) => Json(operation).into_response(),
        Err(e) => {
            warn!(error = %e, "Removing model failed");
            error_response(e.to_response())
        }
    }
}

async fn provider_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let providers: BTreeMap<_, _> = state.registry.health_check_all().await.into_iter().collect();
    Json(json!({ "providers": providers }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::model_service::StandardModelService;
    use crate::application::query_service::StandardQueryService;
    use crate::application::retry::RetryPolicy;
    use crate::domain::llm::{
        FinishReason, GenerationOptions, GenerationResponse, LLMError, LLMProvider,
    };
    use crate::domain::provider::ProviderKind;
    use crate::domain::question::ValidationPolicy;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl LLMProvider for EchoProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Ollama
        }

        async fn generate(
            &self,
            model: &str,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<GenerationResponse, LLMError> {
            Ok(GenerationResponse {
                text: format!("  You asked: {}  ", prompt),
                usage: None,
                provider: ProviderKind::Ollama,
                model: model.to_string(),
                finish_reason: FinishReason::Stop,
            })
        }

        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    fn test_app(max_concurrent: usize) -> Router {
        let registry = Arc::new(ProviderRegistry::new().with_provider(Arc::new(EchoProvider)));
        let query_service = Arc::new(StandardQueryService::new(
            registry.clone(),
            ValidationPolicy::lenient(),
            RetryPolicy::none(),
        ));
        let model_service = Arc::new(StandardModelService::new(None));
        app(AppState::new(query_service, model_service, registry, max_concurrent))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app(4)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ask_success() {
        let response = test_app(4)
            .oneshot(post_json(
                "/api/qna/ask",
                json!({"question": "What is Rust?", "model": "llama3.1", "stream": true}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["answer"], "You asked: What is Rust?");
        assert_eq!(body["provider"], "ollama");
        assert!(body["warning"].is_string());
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_ask_validation_is_bad_request() {
        let response = test_app(4)
            .oneshot(post_json("/api/qna/ask", json!({"question": "hi", "model": "llama3.1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error_category"], "validation");
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_server_error() {
        let response = test_app(4)
            .oneshot(post_json(
                "/api/qna/ask",
                json!({"question": "What is Rust?", "model": "gpt-4o", "provider": "openai"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error_category"], "internal");
        assert_eq!(body["message"], "provider not configured");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = test_app(4)
            .oneshot(post_json("/api/qna/ask", json!({"model": "llama3.1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_saturation_is_service_unavailable() {
        let response = test_app(0)
            .oneshot(post_json(
                "/api/qna/ask",
                json!({"question": "What is Rust?", "model": "llama3.1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_model_routes_without_runner() {
        let response = test_app(4)
            .oneshot(Request::get("/api/models").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = test_app(4)
            .oneshot(
                Request::delete("/api/models/--all")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_provider_status() {
        let response = test_app(4)
            .oneshot(
                Request::get("/api/providers/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["providers"]["ollama"], true);
        assert_eq!(body["providers"]["anthropic"], false);
    }
}
