//! Scenario: WebSocket End To End
//!
//! # Invariant under test
//! Both facades reach a real socket endpoint, survive health probes
//! (WebSocket ping/pong), and notice when the terminal process goes away.

use bridge_common::constants::{OrderType, Timeframe};
use bridge_common::options::InitializeOptions;
use bridge_core::{
    AsyncBridgeControl, AsyncTerminal, AsyncTerminalApi, BridgeControl, Terminal, TerminalApi,
};
use bridge_testkit::{
    market_order, FakeTerminal, LoopbackServer, DEMO_LOGIN, DEMO_PASSWORD, DEMO_SERVER,
};

// ---------------------------------------------------------------------------
// Suspending facade over a socket
// ---------------------------------------------------------------------------

#[tokio::test]
async fn suspending_session_over_websocket() {
    let server = LoopbackServer::start(FakeTerminal::new()).unwrap();
    let terminal = AsyncTerminal::new(server.settings());

    assert!(terminal.connect().await.unwrap());
    assert!(terminal.health_check().await);
    assert!(terminal
        .initialize(
            None,
            Some(DEMO_LOGIN),
            Some(DEMO_PASSWORD),
            Some(DEMO_SERVER),
            None,
            InitializeOptions::default(),
        )
        .await
        .unwrap());

    let rates = terminal
        .copy_rates_from_pos("EURUSD", Timeframe::M15, 0, 50)
        .await
        .unwrap()
        .expect("rates");
    assert_eq!(rates.len(), 50);

    let sent = terminal
        .order_send(&market_order("XAUUSD", OrderType::Buy, 0.1))
        .await
        .unwrap()
        .expect("result");
    assert!(sent.deal > 0);
    assert_eq!(server.terminal().lock().positions().len(), 1);

    terminal.disconnect().await;
    assert!(!terminal.is_connected());
}

#[tokio::test]
async fn terminal_going_away_is_noticed() {
    let mut server = LoopbackServer::start(FakeTerminal::new().initialized()).unwrap();
    let terminal = AsyncTerminal::new(server.settings());
    assert!(terminal.connect().await.unwrap());
    assert_eq!(terminal.symbols_total().await.unwrap(), 4);

    server.stop();

    assert_eq!(terminal.account_info().await.unwrap(), None);
    assert!(!terminal.is_connected());
    assert!(terminal.last_error().await.is_connection_error());
    assert!(!terminal.connect().await.unwrap(), "nothing listens any more");
}

// ---------------------------------------------------------------------------
// Blocking facade over a socket
// ---------------------------------------------------------------------------

#[test]
fn blocking_session_over_websocket() {
    let server = LoopbackServer::start(FakeTerminal::new().initialized()).unwrap();
    let terminal = Terminal::new(server.settings()).unwrap();

    assert!(terminal.connect().unwrap());
    assert!(terminal.health_check());
    let account = terminal.account_info().unwrap().expect("account");
    assert_eq!(account.login, DEMO_LOGIN);
    assert_eq!(terminal.positions_total().unwrap(), 0);

    terminal.disconnect();
    assert!(!terminal.is_connected());
}
