// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Locally installed models and the lifecycle operations on them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::llm::LLMError;

/// One row of the local runner's model list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable, as printed by the runner (e.g. "4.7 GB")
    pub size: String,
    /// Human-readable, as printed by the runner (e.g. "2 days ago")
    pub modified: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelOperationStatus {
    Installed,
    Removed,
}

/// Result of a completed install or remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOperation {
    pub model: String,
    pub status: ModelOperationStatus,
    /// Captured standard output of the runner
    pub output: String,
}

/// Lifecycle operations on models hosted by the local runner.
#[async_trait]
pub trait ModelManager: Send + Sync {
    async fn list_models(&self) -> Result<Vec<InstalledModel>, LLMError>;

    /// Blocks the calling task until the download finishes.
    async fn install_model(&self, name: &str) -> Result<ModelOperation, LLMError>;

    async fn remove_model(&self, name: &str) -> Result<ModelOperation, LLMError>;
}

/// Model names end up on a command line: allow registry-style names only
/// (`llama3.1`, `library/mistral:7b-instruct`) and nothing that could be read
/// as a flag.
pub fn is_valid_model_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 200
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '/' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_rules() {
        assert!(is_valid_model_name("llama3.1"));
        assert!(is_valid_model_name("library/mistral:7b-instruct_q4"));
        assert!(!is_valid_model_name(""));
        assert!(!is_valid_model_name("--help"));
        assert!(!is_valid_model_name("llama3; rm -rf /"));
        assert!(!is_valid_model_name("model name"));
    }

    #[test]
    fn test_operation_status_serialization() {
        let op = ModelOperation {
            model: "llama3.1".to_string(),
            status: ModelOperationStatus::Removed,
            output: "deleted 'llama3.1'".to_string(),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["status"], "removed");
    }
}
