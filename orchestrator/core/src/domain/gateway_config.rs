// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gateway Configuration Types
//
// Defines the configuration schema for a PAWA gateway node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP server settings
// - LLM provider configuration (local runner + cloud APIs)
// - Retry policy and question validation profile
// - Logging and metrics settings
//
// Loaded once at startup, then passed around immutably.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::persona::Persona;
use crate::domain::provider::ProviderKind;
use crate::domain::question::{
    ValidationPolicy, ValidationProfile, DEFAULT_MAX_LENGTH, DEFAULT_MAX_REPEAT, LENIENT_MIN_LENGTH,
    STRICT_MIN_LENGTH,
};

pub const API_VERSION: &str = "pawa.ai/v1";
pub const KIND: &str = "GatewayConfig";
pub const CONFIG_PATH_ENV: &str = "PAWA_CONFIG_PATH";

/// Top-level Kubernetes-style gateway configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigManifest {
    /// API version (must be "pawa.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "GatewayConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: GatewayConfigSpec,
}

pub type GatewayConfig = GatewayConfigManifest;

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// In-flight request ceiling enforced at the HTTP boundary
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Wall-clock bound on one question, retries included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub openai: CloudProviderConfig,

    #[serde(default)]
    pub anthropic: CloudProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Runner command line prefix, e.g. ["ollama"] or
    /// ["docker", "exec", "ollama", "ollama"]
    #[serde(default = "default_runner_command")]
    pub command: Vec<String>,

    /// Exported to the runner as OLLAMA_HOST
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,

    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,

    /// Bound for list/rm and the connectivity check
    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// API base URL; provider default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Persona used when the request brings no system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_cloud_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, first call included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    #[serde(default)]
    pub jitter: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub profile: ValidationProfile,

    /// Overrides the profile's minimum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default = "default_max_repeat")]
    pub max_repeat: usize,

    /// Added to the profile's built-in list
    #[serde(default)]
    pub banned_terms: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Expose a Prometheus scrape endpoint
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_max_concurrent_requests() -> usize {
    64
}

fn default_request_timeout() -> Option<u64> {
    Some(120)
}

fn default_runner_command() -> Vec<String> {
    vec!["ollama".to_string()]
}

fn default_run_timeout() -> u64 {
    300
}

fn default_install_timeout() -> u64 {
    3600
}

fn default_list_timeout() -> u64 {
    30
}

fn default_cloud_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    4000
}

fn default_max_delay() -> u64 {
    10_000
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_max_repeat() -> usize {
    DEFAULT_MAX_REPEAT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_runner_command(),
            host: None,
            default_model: None,
            run_timeout_secs: default_run_timeout(),
            install_timeout_secs: default_install_timeout(),
            list_timeout_secs: default_list_timeout(),
        }
    }
}

impl Default for CloudProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            api_key: None,
            persona: None,
            default_model: None,
            max_tokens: None,
            request_timeout_secs: default_cloud_timeout(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            jitter: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            profile: ValidationProfile::default(),
            min_length: None,
            max_length: default_max_length(),
            max_repeat: default_max_repeat(),
            banned_terms: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl ValidationConfig {
    /// Build the active policy: profile first, then explicit overrides.
    pub fn policy(&self) -> ValidationPolicy {
        let mut policy = ValidationPolicy::for_profile(self.profile)
            .with_banned_terms(&self.banned_terms);
        if let Some(min) = self.min_length {
            policy.min_length = min;
        }
        policy.max_length = self.max_length;
        policy.max_repeat = self.max_repeat;
        policy
    }
}

impl ProvidersConfig {
    pub fn is_enabled(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Ollama => self.ollama.enabled,
            ProviderKind::OpenAI => self.openai.enabled,
            ProviderKind::Anthropic => self.anthropic.enabled,
        }
    }

    pub fn default_model(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Ollama => self.ollama.default_model.as_deref(),
            ProviderKind::OpenAI => self.openai.default_model.as_deref(),
            ProviderKind::Anthropic => self.anthropic.default_model.as_deref(),
        }
    }
}

impl Default for GatewayConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "pawa-gateway".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: GatewayConfigSpec::default(),
        }
    }
}

impl GatewayConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Candidate locations, in precedence order
    /// 1. PAWA_CONFIG_PATH environment variable
    /// 2. ./pawa-config.yaml (working directory)
    /// 3. ~/.pawa/config.yaml (user home)
    /// 4. /etc/pawa/config.yaml (system, Unix) or C:\ProgramData\Pawa\config.yaml (Windows)
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }

        paths.push(PathBuf::from("./pawa-config.yaml"));

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".pawa").join("config.yaml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/pawa/config.yaml"));
        #[cfg(windows)]
        paths.push(PathBuf::from("C:\\ProgramData\\Pawa\\config.yaml"));

        paths
    }

    /// First existing file among [`Self::search_paths`]
    pub fn discover_config() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home -> System)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to override config via env vars
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Self::apply_env_overrides`] with an injectable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("OLLAMA_HOST").filter(|v| !v.is_empty()) {
            tracing::info!("Environment override: OLLAMA_HOST={}", host);
            self.spec.providers.ollama.host = Some(host);
        }

        // Keys are never logged; only whether they were picked up.
        if self.spec.providers.openai.api_key.is_none() && lookup("OPENAI_API_KEY").is_some() {
            tracing::info!("Environment override: OPENAI_API_KEY");
            self.spec.providers.openai.api_key = Some("env:OPENAI_API_KEY".to_string());
        }
        if self.spec.providers.anthropic.api_key.is_none() && lookup("ANTHROPIC_API_KEY").is_some() {
            tracing::info!("Environment override: ANTHROPIC_API_KEY");
            self.spec.providers.anthropic.api_key = Some("env:ANTHROPIC_API_KEY".to_string());
        }

        if let Some(val) = lookup("PAWA_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: PAWA_PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for PAWA_PORT: '{}'. Expected a port number. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("PAWA_VALIDATION_PROFILE") {
            match val.parse::<ValidationProfile>() {
                Ok(profile) => {
                    tracing::info!("Environment override: PAWA_VALIDATION_PROFILE={:?}", profile);
                    self.spec.validation.profile = profile;
                }
                Err(e) => tracing::warn!("{}. Ignoring PAWA_VALIDATION_PROFILE.", e),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let spec = &self.spec;

        if spec.server.port == 0 {
            anyhow::bail!("spec.server.port cannot be 0");
        }
        if spec.server.max_concurrent_requests == 0 {
            anyhow::bail!("spec.server.max_concurrent_requests must be at least 1");
        }
        if spec.server.request_timeout_secs == Some(0) {
            anyhow::bail!("spec.server.request_timeout_secs must be positive when set");
        }

        let ollama = &spec.providers.ollama;
        if ollama.enabled && ollama.command.iter().all(|part| part.trim().is_empty()) {
            anyhow::bail!("spec.providers.ollama.command cannot be empty");
        }
        if ollama.run_timeout_secs == 0 || ollama.list_timeout_secs == 0 {
            anyhow::bail!("spec.providers.ollama timeouts must be positive");
        }

        for (name, cloud) in [
            ("openai", &spec.providers.openai),
            ("anthropic", &spec.providers.anthropic),
        ] {
            if matches!(cloud.endpoint.as_deref(), Some(e) if e.trim().is_empty()) {
                anyhow::bail!("spec.providers.{}.endpoint cannot be empty", name);
            }
            if cloud.request_timeout_secs == 0 {
                anyhow::bail!("spec.providers.{}.request_timeout_secs must be positive", name);
            }
        }

        if spec.retry.max_attempts == 0 {
            anyhow::bail!("spec.retry.max_attempts must be at least 1");
        }
        if spec.retry.base_delay_ms > spec.retry.max_delay_ms {
            anyhow::bail!(
                "spec.retry.base_delay_ms ({}) exceeds max_delay_ms ({})",
                spec.retry.base_delay_ms,
                spec.retry.max_delay_ms
            );
        }

        // Config may tighten the question rules, never loosen them
        let policy = spec.validation.policy();
        if !(LENIENT_MIN_LENGTH..=STRICT_MIN_LENGTH).contains(&policy.min_length) {
            anyhow::bail!(
                "spec.validation.min_length must be between {} and {}, got {}",
                LENIENT_MIN_LENGTH,
                STRICT_MIN_LENGTH,
                policy.min_length
            );
        }
        if policy.max_length > DEFAULT_MAX_LENGTH || policy.max_length < policy.min_length {
            anyhow::bail!(
                "spec.validation.max_length must be between min_length ({}) and {}, got {}",
                policy.min_length,
                DEFAULT_MAX_LENGTH,
                policy.max_length
            );
        }
        if policy.max_repeat == 0 || policy.max_repeat > DEFAULT_MAX_REPEAT {
            anyhow::bail!(
                "spec.validation.max_repeat must be between 1 and {}, got {}",
                DEFAULT_MAX_REPEAT,
                policy.max_repeat
            );
        }

        Ok(())
    }
}
