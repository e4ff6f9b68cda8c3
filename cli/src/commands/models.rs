// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local model management commands
//!
//! Commands: list, pull, rm

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use pawa_core::application::model_service::ModelServiceError;
use pawa_core::domain::model::InstalledModel;

use crate::embedded::EmbeddedGateway;

#[derive(Subcommand)]
pub enum ModelsCommand {
    /// List models installed on the local runner
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a model (blocks until complete)
    Pull {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Remove an installed model
    Rm {
        #[arg(value_name = "NAME")]
        name: String,
    },
}

pub async fn handle_command(command: ModelsCommand, config_override: Option<PathBuf>) -> Result<()> {
    let gateway = EmbeddedGateway::new(config_override)?;
    let service = gateway.model_service;

    match command {
        ModelsCommand::List { json } => {
            let models = service.list_models().await.map_err(report)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&models)?);
            } else {
                print_models(&models);
            }
        }
        ModelsCommand::Pull { name } => {
            println!("Pulling {}...", name.bold());
            let operation = service.install_model(&name).await.map_err(report)?;
            if !operation.output.is_empty() {
                println!("{}", operation.output.dimmed());
            }
            println!("{}", format!("✓ Installed {}", operation.model).green());
        }
        ModelsCommand::Rm { name } => {
            let operation = service.remove_model(&name).await.map_err(report)?;
            println!("{}", format!("✓ Removed {}", operation.model).green());
        }
    }

    Ok(())
}

fn report(e: ModelServiceError) -> anyhow::Error {
    eprintln!("{} {}", format!("[{}]", e.category()).red(), e.public_message());
    anyhow::Error::new(e)
}

fn print_models(models: &[InstalledModel]) {
    if models.is_empty() {
        println!("{}", "No models installed".yellow());
        return;
    }

    let width = models.iter().map(|m| m.name.len()).max().unwrap_or(4).max(4);
    println!(
        "{:<width$}  {:<14}  {:<10}  {}",
        "NAME".bold(),
        "ID".bold(),
        "SIZE".bold(),
        "MODIFIED".bold(),
        width = width
    );
    for model in models {
        println!(
            "{:<width$}  {:<14}  {:<10}  {}",
            model.name,
            model.id.as_deref().unwrap_or("-"),
            model.size,
            model.modified,
            width = width
        );
    }
}
