// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer (`pawa-core`)
//!
//! Pure types and rules with no I/O: questions and their validation,
//! provider identities, the provider port, and gateway configuration.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`question`] | `Question` value object, `ValidationPolicy` and profiles |
//! | [`llm`] | `LLMProvider` port, `GenerationOptions`, `LLMError`, `FailureCategory` |
//! | [`provider`] | `ProviderKind`, `ModelSelector` |
//! | [`persona`] | Canned system prompts |
//! | [`query`] | Request, response and error envelopes |
//! | [`model`] | Installed models and the `ModelManager` port |
//! | [`gateway_config`] | YAML manifest, discovery, env overrides |

pub mod gateway_config;
pub mod llm;
pub mod model;
pub mod persona;
pub mod provider;
pub mod query;
pub mod question;
