// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Model Management Service
//!
//! List, install and remove models hosted by the local runner. Names are
//! checked here so a bad name is reported as a validation failure rather
//! than reaching the runner.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::llm::{FailureCategory, LLMError};
use crate::domain::model::{is_valid_model_name, InstalledModel, ModelManager, ModelOperation};
use crate::domain::query::ErrorResponse;

#[derive(Debug, Error)]
pub enum ModelServiceError {
    #[error("invalid model name '{0}'")]
    InvalidName(String),

    #[error("no local model runner is configured")]
    NotConfigured,

    #[error(transparent)]
    Runner(#[from] LLMError),
}

impl ModelServiceError {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::InvalidName(_) => FailureCategory::Validation,
            Self::NotConfigured => FailureCategory::Internal,
            Self::Runner(e) => e.category(),
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidName(_) | Self::NotConfigured => self.to_string(),
            Self::Runner(LLMError::ModelNotFound(name)) => format!("model '{}' not found", name),
            Self::Runner(e) => match e.category() {
                FailureCategory::ProviderUnavailable => {
                    "The local model runner is unreachable.".to_string()
                }
                FailureCategory::ProviderTransient => {
                    "The local model runner failed. Please try again later.".to_string()
                }
                _ => "An internal error occurred while managing models.".to_string(),
            },
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.category(), self.public_message())
    }
}

#[async_trait]
pub trait ModelService: Send + Sync {
    async fn list_models(&self) -> Result<Vec<InstalledModel>, ModelServiceError>;

    /// Blocks until the download completes
    async fn install_model(&self, name: &str) -> Result<ModelOperation, ModelServiceError>;

    async fn remove_model(&self, name: &str) -> Result<ModelOperation, ModelServiceError>;
}

/// Standard implementation of ModelService
pub struct StandardModelService {
    manager: Option<Arc<dyn ModelManager>>,
}

impl StandardModelService {
    /// `None` when the local runner is disabled
    pub fn new(manager: Option<Arc<dyn ModelManager>>) -> Self {
        Self { manager }
    }

    fn manager(&self) -> Result<&Arc<dyn ModelManager>, ModelServiceError> {
        self.manager.as_ref().ok_or(ModelServiceError::NotConfigured)
    }

    fn checked<'a>(&self, name: &'a str) -> Result<&'a str, ModelServiceError> {
        let name = name.trim();
        if is_valid_model_name(name) {
            Ok(name)
        } else {
            warn!(model = name, "Rejected model name");
            Err(ModelServiceError::InvalidName(name.to_string()))
        }
    }
}

#[async_trait]
impl ModelService for StandardModelService {
    async fn list_models(&self) -> Result<Vec<InstalledModel>, ModelServiceError> {
        let models = self.manager()?.list_models().await?;
        info!(count = models.len(), "Listed local models");
        Ok(models)
    }

    async fn install_model(&self, name: &str) -> Result<ModelOperation, ModelServiceError> {
        let name = self.checked(name)?;
        let manager = self.manager()?;
        info!(model = name, "Installing model");
        let operation = manager.install_model(name).await?;
        info!(model = name, "Model installed");
        Ok(operation)
    }

    async fn remove_model(&self, name: &str) -> Result<ModelOperation, ModelServiceError> {
        let name = self.checked(name)?;
        let manager = self.manager()?;
        info!(model = name, "Removing model");
        Ok(manager.remove_model(name).await?)
    }
}
