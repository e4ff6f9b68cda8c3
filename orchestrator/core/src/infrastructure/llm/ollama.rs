// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Ollama LLM Provider Adapter
//
// Anti-Corruption Layer for the local model runner CLI.
// Every operation is one subprocess invocation of the configured runner
// command (`ollama list`, `ollama run <model> <prompt>`, ...), so air-gapped
// deployments need nothing but the runner binary.

use std::process::{Output, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::gateway_config::OllamaConfig;
use crate::domain::llm::{FinishReason, GenerationOptions, GenerationResponse, LLMError, LLMProvider};
use crate::domain::model::{
    is_valid_model_name, InstalledModel, ModelManager, ModelOperation, ModelOperationStatus,
};
use crate::domain::provider::ProviderKind;

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

pub struct OllamaAdapter {
    command: Vec<String>,
    host: Option<String>,
    run_timeout: Duration,
    install_timeout: Duration,
    list_timeout: Duration,
}

impl OllamaAdapter {
    pub fn new(command: Vec<String>) -> Self {
        let defaults = OllamaConfig::default();
        Self {
            command,
            host: None,
            run_timeout: Duration::from_secs(defaults.run_timeout_secs),
            install_timeout: Duration::from_secs(defaults.install_timeout_secs),
            list_timeout: Duration::from_secs(defaults.list_timeout_secs),
        }
    }

    pub fn from_config(config: &OllamaConfig) -> Self {
        Self {
            command: config.command.clone(),
            host: config.host.clone(),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
            install_timeout: Duration::from_secs(config.install_timeout_secs),
            list_timeout: Duration::from_secs(config.list_timeout_secs),
        }
    }

    /// Exported to the runner as OLLAMA_HOST
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_timeouts(mut self, run: Duration, install: Duration, list: Duration) -> Self {
        self.run_timeout = run;
        self.install_timeout = install;
        self.list_timeout = list;
        self
    }

    /// `<runner> list` exits 0
    pub async fn check_connection(&self) -> bool {
        self.ensure_connection().await.is_ok()
    }

    async fn ensure_connection(&self) -> Result<(), LLMError> {
        let output = self
            .execute(&["list"], self.list_timeout)
            .await
            .map_err(|e| LLMError::Network(format!("Local model runner unreachable: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(LLMError::Network(format!(
                "Local model runner unreachable: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    /// Run the runner with `args`; the child is killed if `timeout` fires or
    /// the returned future is dropped.
    async fn execute(&self, args: &[&str], timeout: Duration) -> Result<Output, LLMError> {
        let (program, prefix) = self
            .command
            .split_first()
            .ok_or_else(|| LLMError::Provider("Runner command is empty".into()))?;

        let mut cmd = Command::new(program);
        cmd.args(prefix)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(host) = &self.host {
            cmd.env("OLLAMA_HOST", host);
        }

        let operation = args.first().copied().unwrap_or_default();
        debug!(program = %program, operation, "Invoking local model runner");

        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(LLMError::Network(format!(
                "Failed to run '{}': {}",
                program, e
            ))),
            Err(_) => Err(LLMError::Timeout(format!(
                "'{} {}' exceeded {}s",
                program,
                operation,
                timeout.as_secs()
            ))),
        }
    }

    fn check_name(name: &str) -> Result<(), LLMError> {
        if is_valid_model_name(name) {
            Ok(())
        } else {
            Err(LLMError::InvalidInput(format!("Invalid model name '{}'", name)))
        }
    }
}

/// Map a non-zero runner exit to an error. `Server.status` carries the exit
/// code. "not found" only means an unknown model when stderr names the model;
/// any other missing resource keeps its stderr.
fn classify_failure(output: &Output, model: &str) -> LLMError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let lowered = stderr.to_lowercase();

    if lowered.contains("connection refused")
        || lowered.contains("could not connect")
        || lowered.contains("is ollama running")
    {
        LLMError::Network(stderr)
    } else if lowered.contains("not found")
        && (lowered.contains("model") || lowered.contains(&model.to_lowercase()))
    {
        warn!(model, stderr = %stderr, "Runner reported unknown model");
        LLMError::ModelNotFound(model.to_string())
    } else {
        let status = output
            .status
            .code()
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(0);
        LLMError::Server {
            status,
            message: stderr,
        }
    }
}

fn compose_prompt(prompt: &str, system: Option<&str>) -> String {
    let composed = match system {
        Some(system) => format!("{}\n\n{}", system, prompt),
        None => prompt.to_string(),
    };
    // a leading dash would be parsed as a flag by the runner
    if composed.starts_with('-') {
        format!(" {}", composed)
    } else {
        composed
    }
}

fn column_separator() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\t+|\s{2,}").expect("static pattern compiles"))
}

/// Parse `<runner> list` output. The first line is the header; malformed
/// lines are skipped.
pub fn parse_model_list(output: &str) -> Vec<InstalledModel> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parsed = parse_model_line(line);
            if parsed.is_none() && !line.trim().is_empty() {
                warn!(line, "Skipping unparseable model list line");
            }
            parsed
        })
        .collect()
}

fn parse_model_line(line: &str) -> Option<InstalledModel> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let columns: Vec<&str> = column_separator()
        .split(line)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    match columns.as_slice() {
        [name, id, size, modified, ..] => Some(InstalledModel {
            name: name.to_string(),
            id: Some(id.to_string()),
            size: size.to_string(),
            modified: modified.to_string(),
        }),
        [name, size, modified] if is_size(size) => Some(InstalledModel {
            name: name.to_string(),
            id: None,
            size: size.to_string(),
            modified: modified.to_string(),
        }),
        _ => parse_single_spaced(line),
    }
}

fn is_size(column: &str) -> bool {
    let mut parts = column.split_whitespace();
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(value), Some(unit), None) if value.parse::<f64>().is_ok() && SIZE_UNITS.contains(&unit)
    )
}

/// Single-space fallback: locate `<number> <unit>` and split around it.
fn parse_single_spaced(line: &str) -> Option<InstalledModel> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let unit_at = tokens.iter().enumerate().skip(2).find_map(|(i, token)| {
        (SIZE_UNITS.contains(token) && tokens[i - 1].parse::<f64>().is_ok()).then_some(i)
    })?;

    let modified = tokens[unit_at + 1..].join(" ");
    if modified.is_empty() {
        return None;
    }

    Some(InstalledModel {
        name: tokens[0].to_string(),
        id: (unit_at > 2).then(|| tokens[1].to_string()),
        size: format!("{} {}", tokens[unit_at - 1], tokens[unit_at]),
        modified,
    })
}

#[async_trait]
impl LLMProvider for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        Self::check_name(model)?;

        // Fail fast with provider-unavailable before a long run timeout
        self.ensure_connection().await?;

        if options.temperature.is_some() || options.max_tokens.is_some() {
            debug!(
                temperature = ?options.temperature,
                max_tokens = ?options.max_tokens,
                "Runner CLI does not support sampling options; ignoring"
            );
        }

        let prompt = compose_prompt(prompt, options.resolve_system_prompt(None));
        let output = self
            .execute(&["run", model, &prompt], self.run_timeout)
            .await?;

        if !output.status.success() {
            return Err(classify_failure(&output, model));
        }

        Ok(GenerationResponse {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
            usage: None,
            provider: ProviderKind::Ollama,
            model: model.to_string(),
            finish_reason: FinishReason::Stop,
        })
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        self.ensure_connection().await
    }
}

#[async_trait]
impl ModelManager for OllamaAdapter {
    async fn list_models(&self) -> Result<Vec<InstalledModel>, LLMError> {
        let output = self.execute(&["list"], self.list_timeout).await?;
        if !output.status.success() {
            return Err(classify_failure(&output, ""));
        }
        Ok(parse_model_list(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn install_model(&self, name: &str) -> Result<ModelOperation, LLMError> {
        Self::check_name(name)?;
        let output = self.execute(&["pull", name], self.install_timeout).await?;
        if !output.status.success() {
            return Err(classify_failure(&output, name));
        }
        Ok(ModelOperation {
            model: name.to_string(),
            status: ModelOperationStatus::Installed,
            output: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        })
    }

    async fn remove_model(&self, name: &str) -> Result<ModelOperation, LLMError> {
        Self::check_name(name)?;
        let output = self.execute(&["rm", name], self.list_timeout).await?;
        if !output.status.success() {
            return Err(classify_failure(&output, name));
        }
        Ok(ModelOperation {
            model: name.to_string(),
            status: ModelOperationStatus::Removed,
            output: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        })
    }
}
