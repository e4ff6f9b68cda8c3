// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provider identity and model selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The enumerated set of LLM backends the gateway can dispatch to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Locally-hosted model runner, driven as a subprocess
    #[default]
    #[serde(alias = "local", alias = "local-runner")]
    Ollama,
    /// OpenAI chat completions API
    #[serde(alias = "gpt")]
    OpenAI,
    /// Anthropic Messages API
    #[serde(alias = "claude")]
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Ollama, Self::OpenAI, Self::Anthropic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Whether the provider runs on this host
    pub fn is_local(self) -> bool {
        matches!(self, Self::Ollama)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" | "local" | "local-runner" => Ok(Self::Ollama),
            "openai" | "gpt" => Ok(Self::OpenAI),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(format!(
                "unknown provider '{}' (expected one of: ollama, openai, anthropic)",
                other
            )),
        }
    }
}

/// Which backend handles a request and which model it should run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelector {
    pub provider: ProviderKind,
    pub model: String,
}

impl ModelSelector {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert_eq!("Local-Runner".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert_eq!("OPENAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert!("huggingface".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_serde() {
        assert_eq!(serde_json::to_string(&ProviderKind::OpenAI).unwrap(), "\"openai\"");
        let parsed: ProviderKind = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(parsed, ProviderKind::Ollama);
    }

    #[test]
    fn test_selector_display() {
        let selector = ModelSelector::new(ProviderKind::Ollama, "llama3.1");
        assert_eq!(selector.to_string(), "ollama/llama3.1");
        assert!(selector.provider.is_local());
    }
}
