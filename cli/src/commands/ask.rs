// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One-shot question through the embedded query service

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use pawa_core::domain::persona::Persona;
use pawa_core::domain::provider::ProviderKind;
use pawa_core::domain::query::{QueryRequest, QueryResponse};

use crate::embedded::EmbeddedGateway;

#[derive(Args)]
pub struct AskArgs {
    /// Question to ask
    #[arg(value_name = "QUESTION")]
    pub question: String,

    /// Provider (ollama, openai, anthropic)
    #[arg(short, long, default_value = "ollama")]
    pub provider: ProviderKind,

    /// Model name (default: the provider's configured default_model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// System prompt override
    #[arg(long, conflicts_with = "persona")]
    pub system_prompt: Option<String>,

    /// Canned system prompt (travel, support, research, general)
    #[arg(long)]
    pub persona: Option<Persona>,

    /// Print the response envelope as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_command(args: AskArgs, config_override: Option<PathBuf>) -> Result<()> {
    let gateway = EmbeddedGateway::new(config_override)?;

    let model = match args.model {
        Some(model) => model,
        None => gateway
            .config
            .spec
            .providers
            .default_model(args.provider)
            .map(str::to_string)
            .with_context(|| {
                format!(
                    "No --model given and spec.providers.{}.default_model is not set",
                    args.provider
                )
            })?,
    };

    let mut request = QueryRequest::new(args.question, args.provider, model);
    request.temperature = args.temperature;
    request.max_tokens = args.max_tokens;
    request.system_prompt = args.system_prompt;
    request.persona = args.persona;

    match gateway.query_service.ask(request).await {
        Ok(response) if args.json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Ok(response) => {
            print_response(&response);
            Ok(())
        }
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e.to_response())?);
            } else {
                eprintln!("{} {}", format!("[{}]", e.category()).red(), e.public_message());
            }
            anyhow::bail!("Question failed: {}", e)
        }
    }
}

fn print_response(response: &QueryResponse) {
    println!("{}", response.answer);
    println!();

    let mut footer = format!(
        "{}/{} · {:.2}s",
        response.provider, response.model, response.processing_time
    );
    if let Some(tokens) = response.tokens_used {
        footer.push_str(&format!(" · {} tokens", tokens));
    }
    footer.push_str(&format!(" · {}", response.request_id));
    println!("{}", footer.dimmed());

    if let Some(warning) = &response.warning {
        println!("{}", warning.yellow());
    }
}
