//! Backoff policy for transient embedding API failures.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// How often and how patiently a failed embedding call is repeated.
///
/// Delays are kept in milliseconds so the policy reads naturally in YAML.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub factor: f64,
    /// Spread each delay uniformly over ±25%.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 200,
            max_delay_ms: 2_000,
            factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Pause before retry `n` (1-based).
    pub fn delay(&self, n: u32) -> Duration {
        if n == 0 {
            return Duration::ZERO;
        }
        let grown = self.initial_delay_ms as f64 * self.factor.powi(n as i32 - 1);
        let capped = grown.min(self.max_delay_ms as f64).max(0.0) as u64;
        if !self.jitter || capped < 4 {
            return Duration::from_millis(capped);
        }
        let spread = capped / 4;
        Duration::from_millis(capped - spread + fastrand::u64(0..=spread * 2))
    }

    /// Run `call` until it succeeds, returns an error `transient` rejects,
    /// or the retry budget is spent. Also returns the number of attempts.
    pub async fn run<T, E, F, Fut>(&self, transient: impl Fn(&E) -> bool, mut call: F) -> (Result<T, E>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = call(attempt).await;
            attempt += 1;
            match outcome {
                Err(err) if attempt <= self.max_retries && transient(&err) => {
                    tokio::time::sleep(self.delay(attempt)).await;
                }
                settled => return (settled, attempt),
            }
        }
    }
}
