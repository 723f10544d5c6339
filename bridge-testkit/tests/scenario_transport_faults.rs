//! Scenario: Transport Faults
//!
//! # Invariant under test
//! Calls on an unconnected handle answer their absent sentinel without
//! touching the wire. A call that exceeds its deadline raises `Timeout`
//! and leaves the handle unconnected. A lost or garbled channel never
//! leaves the facade believing it is connected.

use bridge_common::constants::{OrderType, Timeframe};
use bridge_common::errors::{codes, BridgeError};
use bridge_common::options::{HistoryFilter, SymbolSelectOptions, SymbolsFilter, TradeFilter};
use bridge_core::{
    AsyncBridgeControl, AsyncTerminal, AsyncTerminalApi, BridgeControl, Terminal, TerminalApi,
};
use bridge_testkit::{at, fast_settings, market_order, FakeDialer, FakeTerminal, FAKE_NOW};
use std::sync::Arc;
use std::time::Duration;

fn fast_async(dialer: &FakeDialer) -> AsyncTerminal {
    AsyncTerminal::with_dialer(fast_settings(100), Arc::new(dialer.clone()))
}

// ---------------------------------------------------------------------------
// Unconnected handle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unconnected_calls_answer_sentinels() {
    let dialer = FakeDialer::new(FakeTerminal::new().initialized());
    let terminal = fast_async(&dialer);
    let day = (at(FAKE_NOW - 86_400), at(FAKE_NOW));

    assert_eq!(terminal.version().await.unwrap(), None);
    assert_eq!(terminal.account_info().await.unwrap(), None);
    assert_eq!(terminal.symbols_total().await.unwrap(), 0);
    assert_eq!(terminal.symbols_get(SymbolsFilter::default()).await.unwrap(), None);
    assert!(!terminal
        .symbol_select("EURUSD", SymbolSelectOptions::default())
        .await
        .unwrap());
    assert_eq!(
        terminal
            .copy_rates_from_pos("EURUSD", Timeframe::M1, 0, 10)
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        terminal
            .order_send(&market_order("EURUSD", OrderType::Buy, 1.0))
            .await
            .unwrap(),
        None
    );
    assert_eq!(terminal.positions_total().await.unwrap(), 0);
    assert_eq!(terminal.orders_get(TradeFilter::default()).await.unwrap(), None);
    assert_eq!(terminal.history_deals_total(day.0, day.1).await.unwrap(), None);
    assert_eq!(
        terminal
            .history_orders_get(HistoryFilter::range(day.0, day.1))
            .await
            .unwrap(),
        None
    );
    assert!(!terminal.market_book_add("EURUSD").await.unwrap());

    let err = terminal.last_error().await;
    assert_eq!(err.code, codes::RES_E_INTERNAL_FAIL_CONNECT);
    assert!(err.is_connection_error());
    assert_eq!(dialer.dials(), 0, "no call may dial on its own");
    assert!(dialer.terminal().lock().handled().is_empty());
}

// ---------------------------------------------------------------------------
// Timeout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timeout_raises_and_marks_unconnected() {
    let dialer = FakeDialer::new(FakeTerminal::new().initialized());
    let terminal = fast_async(&dialer);
    assert!(terminal.connect().await.unwrap());

    dialer.delay(Duration::from_millis(500));
    let err = terminal.symbols_total().await.unwrap_err();
    assert!(matches!(err, BridgeError::Timeout { .. }), "got {:?}", err);
    assert!(!terminal.is_connected());
    assert_eq!(terminal.last_error().await.code, codes::RES_E_INTERNAL_FAIL_TIMEOUT);

    // Recovery is an explicit reconnect.
    dialer.delay(Duration::ZERO);
    assert!(terminal.connect().await.unwrap());
    assert_eq!(terminal.symbols_total().await.unwrap(), 4);
    assert_eq!(dialer.dials(), 2);
}

#[test]
fn blocking_timeout_behaves_the_same() {
    let dialer = FakeDialer::new(FakeTerminal::new().initialized());
    let terminal = Terminal::with_dialer(fast_settings(100), Arc::new(dialer.clone())).unwrap();
    assert!(terminal.connect().unwrap());

    dialer.delay(Duration::from_millis(500));
    assert!(matches!(
        terminal.account_info(),
        Err(BridgeError::Timeout { .. })
    ));
    assert!(!terminal.is_connected());
    assert_eq!(terminal.last_error().code, codes::RES_E_INTERNAL_FAIL_TIMEOUT);
}

// ---------------------------------------------------------------------------
// Lost and garbled channels
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lost_transport_is_absent_and_unconnected() {
    let dialer = FakeDialer::new(FakeTerminal::new().initialized());
    let terminal = fast_async(&dialer);
    terminal.connect().await.unwrap();

    dialer.drop_connection(true);
    assert_eq!(terminal.terminal_info().await.unwrap(), None);
    assert!(!terminal.is_connected());
    assert!(terminal.last_error().await.is_connection_error());
}

#[tokio::test]
async fn malformed_answer_raises_serialization_but_keeps_channel() {
    let dialer = FakeDialer::new(FakeTerminal::new().initialized());
    let terminal = fast_async(&dialer);
    terminal.connect().await.unwrap();

    dialer.malformed(true);
    assert!(matches!(
        terminal.account_info().await,
        Err(BridgeError::Serialization(_))
    ));
    assert!(terminal.is_connected());

    dialer.malformed(false);
    assert!(terminal.account_info().await.unwrap().is_some());
}
