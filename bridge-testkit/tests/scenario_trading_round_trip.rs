//! Scenario: Trading Round Trip
//!
//! # Invariant under test
//! Trade requests reach the terminal with their keys in the caller's
//! order, results echo the request unchanged, and the positions, orders
//! and history views reflect what was sent.

use bridge_common::constants::{retcode, OrderType, TradeAction};
use bridge_common::options::{HistoryFilter, TradeFilter};
use bridge_common::request::TradeRequest;
use bridge_common::value::OrderRequest;
use bridge_core::{AsyncBridgeControl, AsyncTerminal, AsyncTerminalApi};
use bridge_testkit::{
    async_terminal, at, market_order, pending_order, FakeDialer, FakeTerminal, FAKE_NOW,
};

async fn session() -> (AsyncTerminal, FakeDialer) {
    let (terminal, dialer) = async_terminal(FakeTerminal::new().initialized());
    assert!(terminal.connect().await.unwrap());
    (terminal, dialer)
}

// ---------------------------------------------------------------------------
// Calculations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn margin_and_profit() {
    let (terminal, _dialer) = session().await;

    let margin = terminal
        .order_calc_margin(OrderType::Buy, "EURUSD", 1.0, 1.1)
        .await
        .unwrap()
        .expect("margin");
    assert!((margin - 1100.0).abs() < 1e-6, "contract 100k at 1:100, got {}", margin);

    let long = terminal
        .order_calc_profit(OrderType::Buy, "EURUSD", 1.0, 1.1000, 1.1010)
        .await
        .unwrap()
        .expect("profit");
    let short = terminal
        .order_calc_profit(OrderType::Sell, "EURUSD", 1.0, 1.1000, 1.1010)
        .await
        .unwrap()
        .expect("profit");
    assert!((long - 100.0).abs() < 1e-6);
    assert!((short + 100.0).abs() < 1e-6);

    assert_eq!(
        terminal
            .order_calc_margin(OrderType::Buy, "NOPE", 1.0, 1.1)
            .await
            .unwrap(),
        None
    );
}

// ---------------------------------------------------------------------------
// Check & send
// ---------------------------------------------------------------------------

#[tokio::test]
async fn order_check_echoes_request_in_key_order() {
    let (terminal, _dialer) = session().await;
    let request = market_order("EURUSD", OrderType::Buy, 0.1);

    let check = terminal.order_check(&request).await.unwrap().expect("check");
    assert_eq!(check.retcode, 0);
    assert!(check.margin > 0.0);
    assert_eq!(check.request, request);
    let keys: Vec<&str> = check.request.keys().collect();
    assert_eq!(
        keys,
        vec!["action", "symbol", "volume", "type", "deviation", "magic", "comment", "type_filling"]
    );
}

#[tokio::test]
async fn open_and_close_a_position() {
    let (terminal, _dialer) = session().await;

    let opened = terminal
        .order_send(&market_order("EURUSD", OrderType::Buy, 0.5))
        .await
        .unwrap()
        .expect("result");
    assert_eq!(opened.retcode, retcode::DONE);
    assert!(opened.deal > 0 && opened.order > 0);
    assert_eq!(opened.request.get("volume").and_then(|v| v.as_f64()), Some(0.5));

    assert_eq!(terminal.positions_total().await.unwrap(), 1);
    let positions = terminal
        .positions_get(TradeFilter::symbol("EURUSD"))
        .await
        .unwrap()
        .expect("positions");
    assert_eq!(positions.len(), 1);
    let ticket = positions[0].ticket;
    assert_eq!(positions[0].volume, 0.5);
    assert!(terminal
        .positions_get(TradeFilter::symbol("GBPUSD"))
        .await
        .unwrap()
        .expect("positions")
        .is_empty());

    let close = market_order("EURUSD", OrderType::Sell, 0.5).with("position", ticket as i64);
    let closed = terminal.order_send(&close).await.unwrap().expect("result");
    assert_eq!(closed.retcode, retcode::DONE);
    assert_eq!(terminal.positions_total().await.unwrap(), 0);

    // Both deals belong to the same position.
    let deals = terminal
        .history_deals_get(HistoryFilter::position(ticket))
        .await
        .unwrap()
        .expect("deals");
    assert_eq!(deals.len(), 2);
    assert_eq!(deals[0].entry, 0);
    assert_eq!(deals[1].entry, 1);

    let day = (at(FAKE_NOW - 86_400), at(FAKE_NOW + 1));
    assert_eq!(terminal.history_deals_total(day.0, day.1).await.unwrap(), Some(2));
    assert_eq!(terminal.history_orders_total(day.0, day.1).await.unwrap(), Some(2));
    let orders = terminal
        .history_orders_get(HistoryFilter::range(day.0, day.1))
        .await
        .unwrap()
        .expect("orders");
    assert_eq!(orders.len(), 2);
}

#[tokio::test]
async fn pending_order_place_and_remove() {
    let (terminal, _dialer) = session().await;

    let placed = terminal
        .order_send(&pending_order("GBPUSD", OrderType::BuyLimit, 1.0, 1.2000))
        .await
        .unwrap()
        .expect("result");
    assert_eq!(placed.retcode, retcode::PLACED);
    assert_eq!(terminal.orders_total().await.unwrap(), 1);

    let orders = terminal
        .orders_get(TradeFilter::ticket(placed.order))
        .await
        .unwrap()
        .expect("orders");
    assert_eq!(orders[0].order_type, OrderType::BuyLimit.code());
    assert_eq!(orders[0].price_open, 1.2);

    let remove = OrderRequest::new()
        .with("action", TradeAction::Remove.code())
        .with("order", placed.order as i64)
        .with("symbol", "GBPUSD")
        .with("volume", 1.0);
    let removed = terminal.order_send(&remove).await.unwrap().expect("result");
    assert_eq!(removed.retcode, retcode::DONE);
    assert_eq!(terminal.orders_total().await.unwrap(), 0);
}

#[tokio::test]
async fn rejected_trade_is_a_result_not_an_error() {
    let (terminal, _dialer) = session().await;

    let result = terminal
        .order_send(&market_order("EURUSD", OrderType::Buy, 0.0))
        .await
        .unwrap()
        .expect("result");
    assert_eq!(result.retcode, retcode::INVALID_VOLUME);
    assert_eq!(terminal.positions_total().await.unwrap(), 0);
}

#[tokio::test]
async fn typed_request_builder_reaches_the_terminal() {
    let (terminal, dialer) = session().await;

    let request = TradeRequest::market("USDJPY", OrderType::Sell, 0.2)
        .with_magic(42)
        .with_comment("typed")
        .to_request()
        .unwrap();
    let result = terminal.order_send(&request).await.unwrap().expect("result");
    assert!(result.is_success());
    assert_eq!(result.request, request);

    let fake = dialer.terminal();
    let fake = fake.lock();
    let position = &fake.positions()[0];
    assert_eq!(position.symbol, "USDJPY");
    assert_eq!(position.magic, 42);
    assert_eq!(position.comment, "typed");
    assert_eq!(position.position_type, 1);
}
