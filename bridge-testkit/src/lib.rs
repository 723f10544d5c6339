//! Test doubles for the bridge: an in-process fake terminal, an in-memory
//! dialer with fault knobs, and a loopback WebSocket server.

use bridge_common::constants::{OrderFilling, OrderType, TradeAction};
use bridge_common::errors::BridgeResult;
use bridge_common::value::OrderRequest;
use bridge_core::config::{Settings, TimeoutSettings};
use bridge_core::facade::{AsyncTerminal, Terminal};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod channel;
pub mod fake;
pub mod server;

pub use channel::{FakeDialer, SharedTerminal};
pub use fake::{group_matches, FakeTerminal, FAKE_NOW};
pub use server::LoopbackServer;

/// Credentials the default [`FakeTerminal`] accepts.
pub const DEMO_LOGIN: u64 = 12345;
pub const DEMO_PASSWORD: &str = "x";
pub const DEMO_SERVER: &str = "Demo";

/// Short deadlines so timeout scenarios finish quickly.
pub fn fast_settings(timeout_ms: u64) -> Settings {
    Settings {
        timeouts: TimeoutSettings::uniform(timeout_ms),
        ..Settings::default()
    }
}

/// Suspending facade wired to `terminal` through a [`FakeDialer`].
pub fn async_terminal(terminal: FakeTerminal) -> (AsyncTerminal, FakeDialer) {
    let dialer = FakeDialer::new(terminal);
    let facade = AsyncTerminal::with_dialer(Settings::default(), Arc::new(dialer.clone()));
    (facade, dialer)
}

/// Blocking facade wired to `terminal` through a [`FakeDialer`].
pub fn blocking_terminal(terminal: FakeTerminal) -> BridgeResult<(Terminal, FakeDialer)> {
    let dialer = FakeDialer::new(terminal);
    let facade = Terminal::with_dialer(Settings::default(), Arc::new(dialer.clone()))?;
    Ok((facade, dialer))
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Market order request in the key order a script would write it.
pub fn market_order(symbol: &str, order_type: OrderType, volume: f64) -> OrderRequest {
    OrderRequest::new()
        .with("action", TradeAction::Deal.code())
        .with("symbol", symbol)
        .with("volume", volume)
        .with("type", order_type.code())
        .with("deviation", 10)
        .with("magic", 234000)
        .with("comment", "bridge test")
        .with("type_filling", OrderFilling::Ioc.code())
}

/// Pending order at `price`.
pub fn pending_order(symbol: &str, order_type: OrderType, volume: f64, price: f64) -> OrderRequest {
    OrderRequest::new()
        .with("action", TradeAction::Pending.code())
        .with("symbol", symbol)
        .with("volume", volume)
        .with("type", order_type.code())
        .with("price", price)
        .with("magic", 234000)
}
