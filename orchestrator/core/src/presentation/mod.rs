// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`pawa-core`)
//!
//! HTTP surface that translates external requests into application
//! service calls. **No business logic lives here**: all real work is
//! delegated to application services in `crate::application`.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /health` | Liveness, version and uptime |
//! | `POST /api/qna/ask` | Answer a question |
//! | `GET /api/models` | Models installed on the local runner |
//! | `POST /api/models/install` | Pull a model |
//! | `DELETE /api/models/{name}` | Remove a model |
//! | `GET /api/providers/status` | Health of each provider |

pub mod api;
