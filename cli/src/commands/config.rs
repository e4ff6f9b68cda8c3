// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use pawa_core::domain::gateway_config::{CloudProviderConfig, GatewayConfig, CONFIG_PATH_ENV};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./pawa-config.yaml)
        #[arg(short, long, default_value = "./pawa-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GatewayConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./pawa-config.yaml");
        println!("  4. ~/.pawa/config.yaml");
        println!("  5. /etc/pawa/config.yaml");
        println!();
    }

    let spec = &config.spec;

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", spec.server.bind_address, spec.server.port);
    println!("  Max concurrent requests: {}", spec.server.max_concurrent_requests);
    match spec.server.request_timeout_secs {
        Some(secs) => println!("  Request timeout: {}s", secs),
        None => println!("  Request timeout: {}", "(none)".dimmed()),
    }
    println!();

    println!("{}", "LLM Providers:".bold());
    let ollama = &spec.providers.ollama;
    println!("  {} ({})", "ollama".bold(), enabled_label(ollama.enabled));
    println!("    Command: {}", ollama.command.join(" "));
    println!(
        "    Host: {}",
        ollama.host.as_deref().unwrap_or("(runner default)")
    );
    println!("    Run timeout: {}s", ollama.run_timeout_secs);
    print_cloud("openai", &spec.providers.openai);
    print_cloud("anthropic", &spec.providers.anthropic);
    println!();

    println!("{}", "Retry:".bold());
    println!(
        "  {} attempts, {}ms base, {}ms max{}",
        spec.retry.max_attempts,
        spec.retry.base_delay_ms,
        spec.retry.max_delay_ms,
        if spec.retry.jitter { ", jitter" } else { "" }
    );
    println!();

    let policy = spec.validation.policy();
    println!("{}", "Validation:".bold());
    println!("  Profile: {:?}", spec.validation.profile);
    println!("  Length: {}..={}", policy.min_length, policy.max_length);
    println!("  Banned terms: {}", policy.banned_terms().len());
    println!();

    Ok(())
}

fn enabled_label(enabled: bool) -> colored::ColoredString {
    if enabled {
        "enabled".green()
    } else {
        "disabled".dimmed()
    }
}

fn print_cloud(name: &str, provider: &CloudProviderConfig) {
    println!("  {} ({})", name.bold(), enabled_label(provider.enabled));
    println!(
        "    Endpoint: {}",
        provider.endpoint.as_deref().unwrap_or("(provider default)")
    );
    // Only env: references are safe to echo
    let key = match provider.api_key.as_deref() {
        Some(k) if k.starts_with("env:") => k.to_string(),
        Some(_) => "(inline, hidden)".to_string(),
        None => "(not set)".to_string(),
    };
    println!("    API key: {}", key);
    if let Some(persona) = provider.persona {
        println!("    Persona: {:?}", persona);
    }
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GatewayConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
