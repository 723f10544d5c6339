//! Scenario: Market Depth Subscription
//!
//! # Invariant under test
//! A book can only be read between `market_book_add` and
//! `market_book_release`. Reads outside that window are absent and carry
//! an error; subscriptions die with the connection.

use bridge_common::constants::BookType;
use bridge_core::{AsyncBridgeControl, AsyncTerminalApi};
use bridge_testkit::{async_terminal, FakeTerminal};

// ---------------------------------------------------------------------------
// add / get / release
// ---------------------------------------------------------------------------

#[tokio::test]
async fn book_readable_only_while_subscribed() {
    let (terminal, dialer) = async_terminal(FakeTerminal::new().initialized());
    terminal.connect().await.unwrap();

    // Before subscribing: absent, and no wire call is made.
    assert_eq!(terminal.market_book_get("EURUSD").await.unwrap(), None);
    assert_ne!(terminal.last_error().await.code, 1);
    assert!(!dialer
        .terminal()
        .lock()
        .handled()
        .iter()
        .any(|m| m == "marketBookGet"));

    assert!(terminal.market_book_add("EURUSD").await.unwrap());
    let book = terminal
        .market_book_get("EURUSD")
        .await
        .unwrap()
        .expect("book");
    assert_eq!(book.len(), 10);

    let sells: Vec<f64> = book
        .iter()
        .filter(|e| e.entry_type == BookType::Sell.code())
        .map(|e| e.price)
        .collect();
    let buys: Vec<f64> = book
        .iter()
        .filter(|e| e.entry_type == BookType::Buy.code())
        .map(|e| e.price)
        .collect();
    assert_eq!(sells.len(), 5);
    assert_eq!(buys.len(), 5);
    let best_ask = sells.iter().cloned().fold(f64::INFINITY, f64::min);
    let best_bid = buys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert!(best_ask > best_bid, "book must not be crossed");

    assert!(terminal.market_book_release("EURUSD").await.unwrap());
    assert_eq!(terminal.market_book_get("EURUSD").await.unwrap(), None);
    assert!(dialer.terminal().lock().subscribed_books().is_empty());
}

#[tokio::test]
async fn unknown_symbol_cannot_be_subscribed() {
    let (terminal, _dialer) = async_terminal(FakeTerminal::new().initialized());
    terminal.connect().await.unwrap();

    assert!(!terminal.market_book_add("NOPE").await.unwrap());
    assert_eq!(terminal.last_error().await.code, -4);
    assert_eq!(terminal.market_book_get("NOPE").await.unwrap(), None);
}

#[tokio::test]
async fn reconnect_drops_subscriptions() {
    let (terminal, _dialer) = async_terminal(FakeTerminal::new().initialized());
    terminal.connect().await.unwrap();
    assert!(terminal.market_book_add("GBPUSD").await.unwrap());

    terminal.disconnect().await;
    terminal.connect().await.unwrap();
    assert_eq!(terminal.market_book_get("GBPUSD").await.unwrap(), None);
}
