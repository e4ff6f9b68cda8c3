// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # pawa-core
//!
//! Question-answering gateway over local and cloud LLM providers.
//!
//! # Architecture
//!
//! - **domain:** validation rules, provider port, envelopes, configuration
//! - **application:** retry policy, query orchestration, model lifecycle
//! - **infrastructure:** local runner and cloud API adapters, provider registry
//! - **presentation:** HTTP API (Axum)

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
