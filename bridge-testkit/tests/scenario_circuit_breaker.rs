//! Scenario: Circuit Breaker
//!
//! # Invariant under test
//! After `failure_threshold` transport failures in a row the facade stops
//! dialing and answers calls with their absent result and a `-10004`
//! connect error. Once the recovery window passed a single attempt goes
//! out: success closes the breaker, failure opens it again. Nothing is
//! retried on the caller's behalf.

use bridge_common::errors::codes;
use bridge_core::{
    AsyncBridgeControl, AsyncTerminal, AsyncTerminalApi, BreakerSettings, BreakerState,
    BridgeControl, Settings, Terminal,
};
use bridge_testkit::{fast_settings, FakeDialer, FakeTerminal};
use std::sync::Arc;
use std::time::Duration;

const RECOVERY_MS: u64 = 100;

fn settings(failure_threshold: u32) -> Settings {
    Settings {
        breaker: BreakerSettings {
            failure_threshold,
            recovery_ms: RECOVERY_MS,
        },
        ..fast_settings(1_000)
    }
}

fn async_pair(failure_threshold: u32) -> (AsyncTerminal, FakeDialer) {
    let dialer = FakeDialer::new(FakeTerminal::new().initialized());
    let terminal = AsyncTerminal::with_dialer(settings(failure_threshold), Arc::new(dialer.clone()));
    (terminal, dialer)
}

async fn wait_out_recovery() {
    tokio::time::sleep(Duration::from_millis(RECOVERY_MS + 50)).await;
}

// ---------------------------------------------------------------------------
// Open -> half-open -> closed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn breaker_opens_then_recovers() {
    let (terminal, dialer) = async_pair(2);
    dialer.refuse(true);

    assert!(!terminal.connect().await.unwrap());
    assert_eq!(terminal.breaker_status().await.state, BreakerState::Closed);
    assert!(!terminal.connect().await.unwrap());
    let status = terminal.breaker_status().await;
    assert_eq!(status.state, BreakerState::Open);
    assert_eq!(status.consecutive_failures, 2);
    assert!(status.retry_in_ms > 0);

    // Open: no dial, no wire traffic, absent results.
    dialer.refuse(false);
    assert!(!terminal.connect().await.unwrap());
    assert_eq!(terminal.account_info().await.unwrap(), None);
    assert_eq!(terminal.positions_total().await.unwrap(), 0);
    let err = terminal.last_error().await;
    assert_eq!(err.code, codes::RES_E_INTERNAL_FAIL_CONNECT);
    assert!(err.message.contains("Circuit breaker"), "got {}", err.message);
    assert_eq!(dialer.dials(), 2);
    assert!(dialer.terminal().lock().handled().is_empty());

    wait_out_recovery().await;
    assert_eq!(terminal.breaker_status().await.state, BreakerState::HalfOpen);
    assert!(terminal.connect().await.unwrap());
    assert_eq!(dialer.dials(), 3);

    let status = terminal.breaker_status().await;
    assert_eq!(status.state, BreakerState::Closed);
    assert_eq!(status.consecutive_failures, 0);
    assert!(terminal.account_info().await.unwrap().is_some());
}

#[tokio::test]
async fn failed_half_open_attempt_reopens() {
    let (terminal, dialer) = async_pair(1);
    dialer.refuse(true);
    assert!(!terminal.connect().await.unwrap());
    assert_eq!(terminal.breaker_status().await.state, BreakerState::Open);

    wait_out_recovery().await;
    assert!(!terminal.connect().await.unwrap());
    assert_eq!(dialer.dials(), 2, "one attempt in half-open");
    assert_eq!(terminal.breaker_status().await.state, BreakerState::Open);

    assert!(!terminal.connect().await.unwrap());
    assert_eq!(dialer.dials(), 2);
}

// ---------------------------------------------------------------------------
// What counts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn terminal_rejections_do_not_count() {
    let (terminal, _dialer) = async_pair(1);
    assert!(terminal.connect().await.unwrap());

    assert_eq!(terminal.symbol_info("NOPE").await.unwrap(), None);
    assert_eq!(terminal.last_error().await.code, codes::RES_E_INVALID_PARAMS);
    assert_eq!(terminal.breaker_status().await.state, BreakerState::Closed);
}

#[tokio::test]
async fn lost_transport_counts() {
    let (terminal, dialer) = async_pair(1);
    assert!(terminal.connect().await.unwrap());

    dialer.drop_connection(true);
    assert_eq!(terminal.terminal_info().await.unwrap(), None);
    assert_eq!(terminal.breaker_status().await.state, BreakerState::Open);

    dialer.drop_connection(false);
    assert!(!terminal.connect().await.unwrap());
    assert_eq!(dialer.dials(), 1);
}

// ---------------------------------------------------------------------------
// Manual reset, blocking facade
// ---------------------------------------------------------------------------

#[test]
fn blocking_reset_closes_the_breaker() {
    let dialer = FakeDialer::new(FakeTerminal::new().initialized());
    let terminal = Terminal::with_dialer(settings(1), Arc::new(dialer.clone())).unwrap();
    dialer.refuse(true);

    assert!(!terminal.connect().unwrap());
    assert_eq!(terminal.breaker_status().state, BreakerState::Open);

    dialer.refuse(false);
    terminal.reset_breaker();
    let status = terminal.breaker_status();
    assert_eq!(status.state, BreakerState::Closed);
    assert_eq!(status.retry_in_ms, 0);
    assert!(terminal.connect().unwrap());
    terminal.disconnect();
}
