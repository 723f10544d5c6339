//! Scenario: Connection Lifecycle
//!
//! # Invariant under test
//! `connect` is idempotent, `disconnect` always leaves the handle
//! unconnected (also when called twice or before any connect), and a
//! refused dial answers `false` instead of raising.
//!
//! All tests are in-process; the terminal is a `FakeTerminal`.

use bridge_core::{AsyncBridgeControl, AsyncTerminalApi, BridgeControl};
use bridge_testkit::{async_terminal, blocking_terminal, FakeTerminal};

// ---------------------------------------------------------------------------
// Suspending facade
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_twice_dials_once() {
    let (terminal, dialer) = async_terminal(FakeTerminal::new());
    assert!(!terminal.is_connected());

    assert!(terminal.connect().await.unwrap());
    assert!(terminal.connect().await.unwrap());
    assert!(terminal.is_connected());
    assert_eq!(dialer.dials(), 1, "second connect must reuse the channel");
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let (terminal, _dialer) = async_terminal(FakeTerminal::new());

    // Before any connect.
    terminal.disconnect().await;
    assert!(!terminal.is_connected());

    terminal.connect().await.unwrap();
    terminal.disconnect().await;
    terminal.disconnect().await;
    assert!(!terminal.is_connected());
}

#[tokio::test]
async fn refused_connect_is_false_with_connect_error() {
    let (terminal, dialer) = async_terminal(FakeTerminal::new());
    dialer.refuse(true);

    assert!(!terminal.connect().await.unwrap());
    assert!(!terminal.is_connected());
    assert_eq!(terminal.last_error().await.code, -10004);

    // The endpoint comes back; a later connect succeeds on the same facade.
    dialer.refuse(false);
    assert!(terminal.connect().await.unwrap());
    assert!(terminal.last_error().await.is_ok());
}

#[tokio::test]
async fn health_check_tracks_the_channel() {
    let (terminal, dialer) = async_terminal(FakeTerminal::new());
    assert!(!terminal.health_check().await, "unconnected handle is unhealthy");

    terminal.connect().await.unwrap();
    assert!(terminal.health_check().await);

    dialer.drop_connection(true);
    assert!(!terminal.health_check().await);
    assert!(!terminal.is_connected(), "a failed probe is a lost transport");
}

#[tokio::test]
async fn disconnect_does_not_shut_the_terminal_down() {
    let (terminal, dialer) = async_terminal(FakeTerminal::new().initialized());
    terminal.connect().await.unwrap();
    terminal.disconnect().await;

    let fake = dialer.terminal();
    assert!(fake.lock().is_initialized());
    assert!(!fake.lock().handled().iter().any(|m| m == "shutdown"));
}

// ---------------------------------------------------------------------------
// Blocking facade
// ---------------------------------------------------------------------------

#[test]
fn blocking_lifecycle_matches_suspending() {
    let (terminal, dialer) = blocking_terminal(FakeTerminal::new()).unwrap();

    terminal.disconnect();
    assert!(!terminal.is_connected());

    assert!(terminal.connect().unwrap());
    assert!(terminal.connect().unwrap());
    assert!(terminal.health_check());
    assert_eq!(dialer.dials(), 1);

    terminal.disconnect();
    terminal.disconnect();
    assert!(!terminal.is_connected());
    assert!(!terminal.health_check());
}
