// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod model_service;
pub mod query_service;
pub mod retry;

// Re-export use cases for convenience
pub use model_service::{ModelService, ModelServiceError, StandardModelService};
pub use query_service::{QueryError, QueryService, StandardQueryService};
pub use retry::RetryPolicy;
