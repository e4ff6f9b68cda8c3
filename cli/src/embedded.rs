// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Embedded gateway services
//!
//! Builds the provider registry and application services in-process from the
//! resolved configuration. Shared by `pawa serve` and the one-shot commands.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use pawa_core::{
    application::{
        model_service::{ModelService, StandardModelService},
        query_service::{QueryService, StandardQueryService},
    },
    domain::gateway_config::GatewayConfig,
    infrastructure::llm::registry::ProviderRegistry,
};

pub struct EmbeddedGateway {
    pub config: GatewayConfig,
    pub registry: Arc<ProviderRegistry>,
    pub query_service: Arc<dyn QueryService>,
    pub model_service: Arc<dyn ModelService>,
}

impl EmbeddedGateway {
    /// Discover, validate and wire everything up
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = load_config(config_path)?;
        Self::from_config(config)
    }

    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        let registry = Arc::new(
            ProviderRegistry::from_config(&config).context("Failed to initialize LLM providers")?,
        );

        let query_service: Arc<dyn QueryService> =
            Arc::new(StandardQueryService::from_config(registry.clone(), &config));
        let model_service: Arc<dyn ModelService> =
            Arc::new(StandardModelService::new(registry.model_manager()));

        Ok(Self {
            config,
            registry,
            query_service,
            model_service,
        })
    }
}

/// Load configuration with discovery and validate it
pub fn load_config(config_path: Option<PathBuf>) -> Result<GatewayConfig> {
    let config = GatewayConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawa_core::domain::provider::ProviderKind;

    #[test]
    fn test_from_default_config() {
        let gateway = EmbeddedGateway::from_config(GatewayConfig::default()).unwrap();
        assert!(gateway.registry.get(ProviderKind::Ollama).is_some());
        assert_eq!(gateway.config.spec.server.port, 8000);
    }

    #[test]
    fn test_invalid_explicit_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pawa-config.yaml");
        std::fs::write(
            &path,
            "apiVersion: pawa.ai/v1\nkind: GatewayConfig\nmetadata:\n  name: test\nspec:\n  retry:\n    max_attempts: 0\n",
        )
        .unwrap();

        assert!(load_config(Some(path)).is_err());
    }
}
