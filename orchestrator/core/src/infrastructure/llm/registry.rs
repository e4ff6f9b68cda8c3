// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry - Provider Construction and Resolution
//
// Builds one adapter per enabled provider from the gateway configuration and
// resolves a `ProviderKind` to its adapter. Built once at startup and shared
// read-only behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use super::anthropic::AnthropicAdapter;
use super::ollama::OllamaAdapter;
use super::openai::OpenAIAdapter;
use crate::domain::gateway_config::GatewayConfig;
use crate::domain::llm::LLMProvider;
use crate::domain::model::ModelManager;
use crate::domain::provider::ProviderKind;

/// Registry of configured LLM providers
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn LLMProvider>>,
    model_manager: Option<Arc<dyn ModelManager>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own `kind()`, replacing any previous one
    pub fn with_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    pub fn with_model_manager(mut self, manager: Arc<dyn ModelManager>) -> Self {
        self.model_manager = Some(manager);
        self
    }

    /// Create provider registry from gateway configuration
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let providers = &config.spec.providers;
        let mut registry = Self::new();

        info!("Initializing LLM provider registry");

        if providers.is_enabled(ProviderKind::Ollama) {
            let adapter = Arc::new(OllamaAdapter::from_config(&providers.ollama));
            info!(command = ?providers.ollama.command, "Local model runner enabled");
            registry = registry
                .with_provider(adapter.clone())
                .with_model_manager(adapter);
        } else {
            info!("Provider 'ollama' disabled, skipping");
        }

        if providers.is_enabled(ProviderKind::OpenAI) {
            let api_key = Self::resolve_api_key(&providers.openai.api_key);
            match OpenAIAdapter::from_config(&providers.openai, api_key) {
                Ok(adapter) => registry = registry.with_provider(Arc::new(adapter)),
                // Continue with other providers
                Err(e) => warn!("Failed to initialize provider 'openai': {}", e),
            }
        } else {
            info!("Provider 'openai' disabled, skipping");
        }

        if providers.is_enabled(ProviderKind::Anthropic) {
            let api_key = Self::resolve_api_key(&providers.anthropic.api_key);
            match AnthropicAdapter::from_config(&providers.anthropic, api_key) {
                Ok(adapter) => registry = registry.with_provider(Arc::new(adapter)),
                Err(e) => warn!("Failed to initialize provider 'anthropic': {}", e),
            }
        } else {
            info!("Provider 'anthropic' disabled, skipping");
        }

        if registry.providers.is_empty() {
            warn!("No LLM providers configured - every question will fail");
        }

        Ok(registry)
    }

    /// Resolve API key from config (supports "env:VAR_NAME" syntax).
    /// An unset variable yields `None`; the adapter then reports an
    /// authentication failure when called.
    pub fn resolve_api_key(key: &Option<String>) -> Option<String> {
        match key.as_deref() {
            Some(k) => match k.strip_prefix("env:") {
                Some(var_name) => match std::env::var(var_name) {
                    Ok(value) if !value.trim().is_empty() => Some(value),
                    _ => {
                        warn!("Environment variable not set: {}", var_name);
                        None
                    }
                },
                None => Some(k.to_string()),
            },
            None => None,
        }
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn LLMProvider>> {
        self.providers.get(&kind).cloned()
    }

    pub fn model_manager(&self) -> Option<Arc<dyn ModelManager>> {
        self.model_manager.clone()
    }

    /// Configured kinds, in `ProviderKind::ALL` order
    pub fn configured(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .collect()
    }

    /// Health of every known provider; unconfigured ones report `false`.
    pub async fn health_check_all(&self) -> HashMap<ProviderKind, bool> {
        let checks = self.providers.iter().map(|(kind, provider)| async move {
            info!("Health checking provider: {}", kind);
            let healthy = match provider.health_check().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(provider = %kind, error = %e, "Provider health check failed");
                    false
                }
            };
            (*kind, healthy)
        });

        let mut results: HashMap<ProviderKind, bool> =
            ProviderKind::ALL.into_iter().map(|k| (k, false)).collect();
        results.extend(join_all(checks).await);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateway_config::GatewayConfigManifest;

    #[test]
    fn test_registry_from_default_config() {
        let registry = ProviderRegistry::from_config(&GatewayConfigManifest::default()).unwrap();
        assert_eq!(registry.configured(), ProviderKind::ALL.to_vec());
        assert!(registry.get(ProviderKind::Ollama).is_some());
        assert!(registry.model_manager().is_some());
    }

    #[test]
    fn test_disabled_providers_are_skipped() {
        let mut config = GatewayConfigManifest::default();
        config.spec.providers.ollama.enabled = false;
        config.spec.providers.anthropic.enabled = false;

        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(registry.configured(), vec![ProviderKind::OpenAI]);
        assert!(registry.get(ProviderKind::Anthropic).is_none());
        assert!(registry.model_manager().is_none());
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(
            ProviderRegistry::resolve_api_key(&Some("sk-literal".to_string())),
            Some("sk-literal".to_string())
        );
        assert_eq!(
            ProviderRegistry::resolve_api_key(&Some("env:PAWA_TEST_SURELY_UNSET_KEY".to_string())),
            None
        );
        assert_eq!(ProviderRegistry::resolve_api_key(&None), None);
    }

    #[tokio::test]
    async fn test_health_reports_every_kind() {
        let registry = ProviderRegistry::new().with_provider(Arc::new(
            OllamaAdapter::new(vec!["sh".into(), "-c".into(), "exit 0".into()]),
        ));
        let health = registry.health_check_all().await;
        assert_eq!(health.len(), 3);
        assert!(health[&ProviderKind::Ollama]);
        assert!(!health[&ProviderKind::OpenAI]);
    }
}
