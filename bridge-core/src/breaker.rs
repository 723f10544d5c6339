// bridge-core/src/breaker.rs
// ====================================================================
// Circuit breaker: fail fast after repeated transport failures
// ====================================================================
//
// Closed --threshold failures in a row--> Open
// Open --recovery window elapsed--> HalfOpen
// HalfOpen --success--> Closed
// HalfOpen --failure--> Open
//
// Only transport outcomes count. A terminal-side rejection arrives over a
// healthy channel and leaves the breaker alone. Nothing is retried; an
// open breaker only refuses attempts.

use crate::config::BreakerSettings;
use bridge_common::errors::{codes, TerminalError};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    /// The recovery window passed; the next attempt decides.
    HalfOpen,
}

/// Snapshot for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerStatus {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    /// Zero unless the breaker is open.
    pub retry_in_ms: u64,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    state: BreakerState,
    tripped_at: Option<Instant>,
    failures: u32,
    threshold: u32,
    recovery: Duration,
}

impl CircuitBreaker {
    pub fn new(settings: &BreakerSettings) -> Self {
        Self {
            state: BreakerState::Closed,
            tripped_at: None,
            failures: 0,
            threshold: settings.failure_threshold.max(1),
            recovery: settings.recovery(),
        }
    }

    fn remaining(&self) -> Duration {
        match (self.state, self.tripped_at) {
            (BreakerState::Open, Some(at)) => self.recovery.saturating_sub(at.elapsed()),
            _ => Duration::ZERO,
        }
    }

    /// Current state, counting an expired recovery window as half-open.
    pub fn state(&self) -> BreakerState {
        if self.state == BreakerState::Open && self.remaining().is_zero() {
            return BreakerState::HalfOpen;
        }
        self.state
    }

    /// Whether an attempt may go out now.
    pub fn allows(&mut self) -> bool {
        match self.state() {
            BreakerState::Open => false,
            BreakerState::HalfOpen if self.state == BreakerState::Open => {
                info!("circuit breaker half-open, letting one attempt through");
                self.state = BreakerState::HalfOpen;
                true
            }
            _ => true,
        }
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
        if self.state != BreakerState::Closed {
            info!("circuit breaker closed");
            self.state = BreakerState::Closed;
            self.tripped_at = None;
        }
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        if self.state == BreakerState::HalfOpen || self.failures >= self.threshold {
            if self.state != BreakerState::Open {
                warn!(failures = self.failures, "circuit breaker open");
            }
            self.state = BreakerState::Open;
            self.tripped_at = Some(Instant::now());
        }
    }

    pub fn reset(&mut self) {
        if self.state != BreakerState::Closed || self.failures > 0 {
            info!("circuit breaker reset");
        }
        self.state = BreakerState::Closed;
        self.tripped_at = None;
        self.failures = 0;
    }

    pub fn status(&self) -> BreakerStatus {
        BreakerStatus {
            state: self.state(),
            consecutive_failures: self.failures,
            failure_threshold: self.threshold,
            retry_in_ms: self.remaining().as_millis() as u64,
        }
    }

    /// What a refused attempt leaves for `last_error`.
    pub fn rejection(&self) -> TerminalError {
        TerminalError::new(
            codes::RES_E_INTERNAL_FAIL_CONNECT,
            format!(
                "Circuit breaker open after {} transport failures, retry in {} ms",
                self.failures,
                self.remaining().as_millis()
            ),
        )
    }
}
