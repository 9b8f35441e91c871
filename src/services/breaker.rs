//! Circuit Breaker pattern implementation.
//!
//! Stops hammering the API once it is clearly unavailable: after a run
//! of consecutive failed requests every further call fails fast until a
//! cooldown has passed.
//!
//! 404 responses are deliberately not recorded here; a missing resource
//! says nothing about the health of the service.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{AppError, Result};

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit. Default: 3
    pub threshold: u32,
    /// How long the circuit stays open before the next call is allowed
    /// through again. Default: 60s
    pub reset_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

/// Current breaker state.
#[derive(Debug, Clone, Copy)]
enum BreakerState {
    /// Requests flow; `failures` consecutive failures seen so far.
    Closed { failures: u32 },
    /// Requests fail fast until `reset_at`.
    Open { reset_at: Instant },
}

/// Consecutive-failure circuit breaker shared by all requests.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a breaker that opens after `threshold` consecutive failures.
    pub fn new(threshold: u32) -> Self {
        Self::with_config(BreakerConfig {
            threshold,
            ..BreakerConfig::default()
        })
    }

    /// Create a breaker with custom configuration.
    pub fn with_config(config: BreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState::Closed { failures: 0 }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check whether a request may go out. The first check after the
    /// cooldown closes the circuit again.
    pub fn check(&self) -> Result<()> {
        let mut state = self.lock();
        match *state {
            BreakerState::Closed { .. } => Ok(()),
            BreakerState::Open { reset_at } => {
                let now = Instant::now();
                if now >= reset_at {
                    log::info!("circuit closed again after cooldown");
                    *state = BreakerState::Closed { failures: 0 };
                    Ok(())
                } else {
                    Err(AppError::CircuitOpen {
                        retry_after_secs: (reset_at - now).as_secs().max(1),
                    })
                }
            }
        }
    }

    /// Record a successful request; resets the failure run.
    pub fn record_success(&self) {
        *self.lock() = BreakerState::Closed { failures: 0 };
    }

    /// Record a failed request attempt. Call sites skip this for 404s.
    pub fn record_failure(&self) {
        let mut state = self.lock();
        if let BreakerState::Closed { failures } = *state {
            let failures = failures + 1;
            if failures >= self.config.threshold {
                log::error!(
                    "circuit opened after {failures} consecutive failures, pausing requests for {}s",
                    self.config.reset_timeout.as_secs()
                );
                *state = BreakerState::Open {
                    reset_at: Instant::now() + self.config.reset_timeout,
                };
            } else {
                *state = BreakerState::Closed { failures };
            }
        }
    }

    /// Whether the circuit is currently open.
    pub fn is_open(&self) -> bool {
        matches!(
            *self.lock(),
            BreakerState::Open { reset_at } if Instant::now() < reset_at
        )
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::with_config(BreakerConfig::default())
    }
}
