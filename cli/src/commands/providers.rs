// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provider status commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use pawa_core::domain::provider::ProviderKind;

use crate::embedded::EmbeddedGateway;

#[derive(Subcommand)]
pub enum ProvidersCommand {
    /// Check connectivity of every provider
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(
    command: ProvidersCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    let gateway = EmbeddedGateway::new(config_override)?;

    match command {
        ProvidersCommand::Status { json } => {
            let health = gateway.registry.health_check_all().await;
            let configured = gateway.registry.configured();

            if json {
                let ordered: std::collections::BTreeMap<_, _> = health.into_iter().collect();
                println!("{}", serde_json::to_string_pretty(&ordered)?);
                return Ok(());
            }

            println!("{}", "Provider status:".bold());
            for kind in ProviderKind::ALL {
                let place = if kind.is_local() { "local" } else { "cloud" };
                let line = if !configured.contains(&kind) {
                    format!("  - {} [{}] (disabled)", kind, place).dimmed()
                } else if health.get(&kind).copied().unwrap_or(false) {
                    format!("  ✓ {} [{}]", kind, place).green()
                } else {
                    format!("  ✗ {} [{}]", kind, place).red()
                };
                println!("{}", line);
            }
        }
    }

    Ok(())
}
