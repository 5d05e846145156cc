//! Fail-fast guard for the embedding API.
//!
//! Consecutive failures open the circuit. While open, calls are refused
//! without touching the network until the cooldown passes; the next call is
//! a trial, and enough successful trials close the circuit again.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
    /// Successful trial calls needed to close it.
    pub trial_successes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_secs: 30,
            trial_successes: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen { successes: u32 },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    phase: Mutex<Phase>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            phase: Mutex::new(Phase::Closed { failures: 0 }),
        }
    }

    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cooldown(&self) -> Duration {
        Duration::from_secs(self.config.cooldown_secs)
    }

    /// Whether a call may go out now. An expired open circuit turns
    /// half-open and lets the call through as a trial.
    pub fn try_acquire(&self) -> bool {
        let mut phase = self.phase();
        match *phase {
            Phase::Open { since } if since.elapsed() < self.cooldown() => false,
            Phase::Open { .. } => {
                *phase = Phase::HalfOpen { successes: 0 };
                tracing::info!("embedding circuit half-open");
                true
            }
            _ => true,
        }
    }

    pub fn on_success(&self) {
        let mut phase = self.phase();
        *phase = match *phase {
            Phase::HalfOpen { successes } if successes + 1 >= self.config.trial_successes => {
                tracing::info!("embedding circuit closed");
                Phase::Closed { failures: 0 }
            }
            Phase::HalfOpen { successes } => Phase::HalfOpen {
                successes: successes + 1,
            },
            Phase::Closed { .. } => Phase::Closed { failures: 0 },
            open => open,
        };
    }

    pub fn on_failure(&self) {
        let mut phase = self.phase();
        *phase = match *phase {
            Phase::Closed { failures } if failures + 1 < self.config.failure_threshold => {
                Phase::Closed {
                    failures: failures + 1,
                }
            }
            Phase::Closed { failures } => {
                tracing::warn!(failures = failures + 1, "embedding circuit opened");
                Phase::Open { since: Instant::now() }
            }
            Phase::HalfOpen { .. } => {
                tracing::warn!("embedding trial call failed, circuit re-opened");
                Phase::Open { since: Instant::now() }
            }
            open => open,
        };
    }

    pub fn state(&self) -> CircuitState {
        match *self.phase() {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
