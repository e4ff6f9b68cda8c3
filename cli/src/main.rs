// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Pawa Gateway CLI
//!
//! The `pawa` binary runs the question-answering gateway and offers
//! one-shot access to the same services from the terminal.
//!
//! ## Commands
//!
//! - `pawa serve` - Run the HTTP API
//! - `pawa ask "<question>"` - Answer one question
//! - `pawa models list|pull|rm` - Manage local runner models
//! - `pawa providers status` - Probe configured providers
//! - `pawa config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod embedded;
mod server;

use commands::{AskArgs, ConfigCommand, ModelsCommand, ProvidersCommand};
use pawa_core::domain::gateway_config::GatewayConfig;

/// Pawa - LLM question-answering gateway
#[derive(Parser)]
#[command(name = "pawa")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "PAWA_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: from config, else info]
    #[arg(long, global = true, env = "PAWA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format (text, json) [default: from config, else text]
    #[arg(long, global = true, env = "PAWA_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    #[command(name = "serve")]
    Serve {
        /// Bind address (overrides spec.server.bind_address)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides spec.server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Ask a single question
    #[command(name = "ask")]
    Ask(AskArgs),

    /// Local model management
    #[command(name = "models")]
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },

    /// Provider health
    #[command(name = "providers")]
    Providers {
        #[command(subcommand)]
        command: ProvidersCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logging settings from the file apply unless a flag overrides them.
    // The subscriber is not up yet, so discovery runs silently here.
    let logging = GatewayConfig::load_or_default(cli.config.clone())
        .map(|c| c.spec.observability.logging)
        .unwrap_or_default();
    init_logging(
        cli.log_level.as_deref().unwrap_or(&logging.level),
        cli.log_format.as_deref().unwrap_or(&logging.format),
    )?;

    match cli.command {
        Commands::Serve { host, port } => server::serve(cli.config, host, port).await,
        Commands::Ask(args) => commands::ask::handle_command(args, cli.config).await,
        Commands::Models { command } => {
            commands::models::handle_command(command, cli.config).await
        }
        Commands::Providers { command } => {
            commands::providers::handle_command(command, cli.config).await
        }
        Commands::Config { command } => {
            commands::config::handle_command(command, cli.config).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        "json" => builder.json().init(),
        "text" => builder.compact().init(),
        other => anyhow::bail!("Unknown log format '{}'. Expected 'text' or 'json'", other),
    }

    Ok(())
}
