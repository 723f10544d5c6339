//! Scenario: Session Login
//!
//! # Invariant under test
//! Terminal-side failures never raise. `initialize` and `login` answer
//! `false` on bad credentials and the reason is available through
//! `last_error`; a good login yields account data.

use bridge_common::errors::codes;
use bridge_common::options::InitializeOptions;
use bridge_core::{AsyncBridgeControl, AsyncTerminalApi, BridgeControl, TerminalApi};
use bridge_testkit::{
    async_terminal, blocking_terminal, FakeTerminal, DEMO_LOGIN, DEMO_PASSWORD, DEMO_SERVER,
};

// ---------------------------------------------------------------------------
// initialize
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_with_credentials_opens_a_session() {
    let (terminal, _dialer) = async_terminal(FakeTerminal::new());
    terminal.connect().await.unwrap();

    let ok = terminal
        .initialize(
            None,
            Some(DEMO_LOGIN),
            Some(DEMO_PASSWORD),
            Some(DEMO_SERVER),
            None,
            InitializeOptions::default(),
        )
        .await
        .unwrap();
    assert!(ok);

    let account = terminal.account_info().await.unwrap().expect("account record");
    assert_eq!(account.login, DEMO_LOGIN);
    assert_eq!(account.server, DEMO_SERVER);
    assert_eq!(account.currency, "USD");
    assert!(terminal.last_error().await.is_ok());
}

#[tokio::test]
async fn initialize_on_a_fresh_facade_opens_the_transport() {
    let (terminal, dialer) = async_terminal(FakeTerminal::new());
    assert!(!terminal.is_connected());

    let ok = terminal
        .initialize(
            None,
            Some(DEMO_LOGIN),
            Some(DEMO_PASSWORD),
            Some(DEMO_SERVER),
            None,
            InitializeOptions::default(),
        )
        .await
        .unwrap();
    assert!(ok);
    assert!(terminal.is_connected());
    assert_eq!(dialer.dials(), 1);
}

#[tokio::test]
async fn initialize_against_unreachable_terminal_is_false() {
    let (terminal, dialer) = async_terminal(FakeTerminal::new());
    dialer.refuse(true);

    let ok = terminal
        .initialize(None, None, None, None, None, InitializeOptions::default())
        .await
        .unwrap();
    assert!(!ok);
    assert_eq!(terminal.last_error().await.code, codes::RES_E_INTERNAL_FAIL_CONNECT);
}

#[tokio::test]
async fn wrong_password_is_false_not_an_error() {
    let (terminal, _dialer) = async_terminal(FakeTerminal::new());
    terminal.connect().await.unwrap();

    let ok = terminal
        .initialize(
            None,
            Some(DEMO_LOGIN),
            Some("wrong"),
            Some(DEMO_SERVER),
            None,
            InitializeOptions::default(),
        )
        .await
        .unwrap();
    assert!(!ok);

    let err = terminal.last_error().await;
    assert_eq!(err.code, codes::RES_E_AUTH_FAILED);
    assert!(!err.message.is_empty());

    // No session, so account data is absent.
    assert_eq!(terminal.account_info().await.unwrap(), None);
}

#[tokio::test]
async fn initialize_without_credentials_attaches_to_running_terminal() {
    let (terminal, _dialer) = async_terminal(FakeTerminal::new());
    terminal.connect().await.unwrap();

    let ok = terminal
        .initialize(None, None, None, None, None, InitializeOptions::default())
        .await
        .unwrap();
    assert!(ok);

    let version = terminal.version().await.unwrap().expect("version");
    assert_eq!(version.major, 500);
    assert_eq!(version.minor, 3815);
}

// ---------------------------------------------------------------------------
// login & shutdown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_after_initialize() {
    let (terminal, _dialer) = async_terminal(FakeTerminal::new());
    terminal.connect().await.unwrap();
    terminal
        .initialize(None, None, None, None, None, InitializeOptions::default())
        .await
        .unwrap();

    assert!(terminal
        .login(DEMO_LOGIN, Some(DEMO_PASSWORD), Some(DEMO_SERVER), None)
        .await
        .unwrap());
    assert!(!terminal.login(99, Some("nope"), None, None).await.unwrap());
    assert_eq!(terminal.last_error().await.code, codes::RES_E_AUTH_FAILED);
}

#[tokio::test]
async fn shutdown_ends_the_terminal_session_only() {
    let (terminal, dialer) = async_terminal(FakeTerminal::new().initialized());
    terminal.connect().await.unwrap();

    terminal.shutdown().await.unwrap();
    assert!(!dialer.terminal().lock().is_initialized());
    // The bridge channel itself stays open.
    assert!(terminal.is_connected());
    assert_eq!(terminal.terminal_info().await.unwrap(), None);
    assert_eq!(terminal.last_error().await.code, codes::RES_E_INTERNAL_FAIL_INIT);
}

#[test]
fn blocking_initialize_and_account_info() {
    let (terminal, _dialer) = blocking_terminal(FakeTerminal::new()).unwrap();
    terminal.connect().unwrap();

    assert!(terminal
        .initialize(
            None,
            Some(DEMO_LOGIN),
            Some(DEMO_PASSWORD),
            Some(DEMO_SERVER),
            Some(60_000),
            InitializeOptions { portable: true },
        )
        .unwrap());
    let info = terminal.terminal_info().unwrap().expect("terminal record");
    assert!(info.connected);
    assert_eq!(info.build, 3815);
    terminal.disconnect();
}
