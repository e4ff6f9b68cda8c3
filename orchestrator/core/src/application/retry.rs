// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Retry Policy
//!
//! Bounded exponential backoff around one provider call. The delay before
//! retry `n` (1-based) is `min(base * 2^(n-1), max)`; with the defaults that
//! is 4s then 8s, for at most three attempts. Only errors the `retryable`
//! predicate accepts are retried; anything else, and the error of the final
//! attempt, is returned unchanged.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::domain::gateway_config::RetryConfig;
use crate::domain::llm::LLMError;

/// Maximum share of the computed delay added when jitter is on
const JITTER_RATIO: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first call included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
    pub retryable: fn(&LLMError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter,
            retryable: LLMError::is_retryable,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), without jitter
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Jitter never pushes the wait past `max_delay`
    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter {
            return delay;
        }
        let extra = rand::rng().random_range(0.0..=JITTER_RATIO);
        delay.mul_f64(1.0 + extra).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    /// `op` receives the 1-based attempt number.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T, LLMError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LLMError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts && (self.retryable)(&e) => {
                    let delay = self.jittered(self.delay_for(attempt));
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Provider call failed, retrying"
                    );
                    metrics::counter!("pawa_provider_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
