// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for PAWA CLI

pub mod ask;
pub mod config;
pub mod models;
pub mod providers;

pub use self::ask::AskArgs;
pub use self::config::ConfigCommand;
pub use self::models::ModelsCommand;
pub use self::providers::ProvidersCommand;
