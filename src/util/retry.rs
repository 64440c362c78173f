//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::CounselError;

/// Retry policy for calls to remote collaborators.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T, CounselError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CounselError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            if !error.is_retryable() || attempt >= attempts {
                return Err(error);
            }

            tracing::warn!(
                operation = operation_name,
                attempt,
                max_attempts = attempts,
                error = %error,
                "retrying after error"
            );

            // 75%..125% of the nominal backoff
            let jitter = 0.75 + jitter_factor() * 0.5;
            tokio::time::sleep(backoff.mul_f64(jitter)).await;
            backoff = backoff.mul_f64(self.multiplier).min(self.max_backoff);
        }
    }
}

/// A factor in `[0, 1)` drawn from the random bits of a v4 UUID.
fn jitter_factor() -> f64 {
    let bits = uuid::Uuid::new_v4().as_u128() as u64;
    (bits % 10_000) as f64 / 10_000.0
}
