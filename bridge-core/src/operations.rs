// bridge-core/src/operations.rs
// ====================================================================
// Operation bodies shared by both facades
// ====================================================================
//
// Every contract operation is written once here against a
// `ConnectionHandle`. The blocking facade drives these futures to
// completion on the calling thread, the suspending facade awaits them.
// Every declared parameter goes on the wire, defaults included.

use crate::connection::ConnectionHandle;
use crate::transport::wire::WireCall;
use bridge_common::constants::{OrderType, Timeframe};
use bridge_common::errors::{BridgeError, BridgeResult, TerminalError};
use bridge_common::marshal::{self, Series};
use bridge_common::options::{
    defaults, HistoryFilter, InitializeOptions, SymbolSelectOptions, SymbolsFilter, TradeFilter,
};
use bridge_common::types::*;
use bridge_common::value::OrderRequest;
use chrono::{DateTime, Utc};
use tracing::debug;

// ====================================================================
// BRIDGE-ONLY
// ====================================================================

pub async fn connect(conn: &mut ConnectionHandle) -> BridgeResult<bool> {
    conn.open().await
}

pub async fn disconnect(conn: &mut ConnectionHandle) {
    conn.close().await
}

pub async fn health_check(conn: &mut ConnectionHandle) -> bool {
    conn.probe().await
}

// ====================================================================
// TERMINAL
// ====================================================================

/// Opens the transport if needed, then initializes the terminal session.
pub async fn initialize(
    conn: &mut ConnectionHandle,
    path: Option<&str>,
    login: Option<u64>,
    password: Option<&str>,
    server: Option<&str>,
    timeout: Option<u64>,
    options: InitializeOptions,
) -> BridgeResult<bool> {
    if !conn.open().await? {
        return Ok(false);
    }
    let call = WireCall::new("initialize")
        .arg("path", path)
        .arg("login", login)
        .arg("password", password)
        .arg("server", server)
        .arg("timeout", timeout)
        .kwarg("portable", options.portable);
    marshal::decode_bool(conn.call(call).await?)
}

pub async fn login(
    conn: &mut ConnectionHandle,
    login: u64,
    password: Option<&str>,
    server: Option<&str>,
    timeout: Option<u64>,
) -> BridgeResult<bool> {
    let call = WireCall::new("login")
        .arg("login", login)
        .arg("password", password)
        .arg("server", server)
        .arg("timeout", timeout.unwrap_or(defaults::LOGIN_TIMEOUT_MS));
    marshal::decode_bool(conn.call(call).await?)
}

pub async fn shutdown(conn: &mut ConnectionHandle) -> BridgeResult<()> {
    let raw = conn.call(WireCall::new("shutdown")).await?;
    conn.clear_books();
    marshal::decode_unit(raw)
}

pub async fn version(conn: &mut ConnectionHandle) -> BridgeResult<Option<TerminalVersion>> {
    marshal::decode_version(conn.call(WireCall::new("version")).await?)
}

/// Local failures (no connection, timeout, missing subscription) win over
/// the terminal's own state. Never fails.
pub async fn last_error(conn: &mut ConnectionHandle) -> TerminalError {
    if let Some(err) = conn.pending_error() {
        return err.clone();
    }
    if !conn.is_connected() {
        return TerminalError::none();
    }
    let outcome = conn.call(WireCall::new("lastError")).await;
    if let Some(err) = conn.pending_error() {
        return err.clone();
    }
    match outcome.and_then(marshal::decode_last_error) {
        Ok(err) => err,
        Err(e) => {
            debug!(error = %e, "undecodable lastError reply");
            TerminalError::new(
                bridge_common::errors::codes::RES_E_INTERNAL_FAIL_RECEIVE,
                e.to_string(),
            )
        }
    }
}

pub async fn terminal_info(conn: &mut ConnectionHandle) -> BridgeResult<Option<TerminalInfo>> {
    marshal::decode_record(conn.call(WireCall::new("terminalInfo")).await?)
}

pub async fn account_info(conn: &mut ConnectionHandle) -> BridgeResult<Option<AccountInfo>> {
    marshal::decode_record(conn.call(WireCall::new("accountInfo")).await?)
}

// ====================================================================
// SYMBOLS
// ====================================================================

/// Absent on the wire reads as zero.
pub async fn symbols_total(conn: &mut ConnectionHandle) -> BridgeResult<i64> {
    Ok(marshal::decode_int(conn.call(WireCall::new("symbolsTotal")).await?)?.unwrap_or(0))
}

pub async fn symbols_get(
    conn: &mut ConnectionHandle,
    filter: SymbolsFilter,
) -> BridgeResult<Option<Vec<SymbolInfo>>> {
    let call = WireCall::new("symbolsGet").kwarg("group", filter.group);
    marshal::decode_records(conn.call(call).await?)
}

pub async fn symbol_info(conn: &mut ConnectionHandle, symbol: &str) -> BridgeResult<Option<SymbolInfo>> {
    let call = WireCall::new("symbolInfo").arg("symbol", symbol);
    marshal::decode_record(conn.call(call).await?)
}

pub async fn symbol_info_tick(conn: &mut ConnectionHandle, symbol: &str) -> BridgeResult<Option<Tick>> {
    let call = WireCall::new("symbolInfoTick").arg("symbol", symbol);
    marshal::decode_record(conn.call(call).await?)
}

pub async fn symbol_select(
    conn: &mut ConnectionHandle,
    symbol: &str,
    options: SymbolSelectOptions,
) -> BridgeResult<bool> {
    let call = WireCall::new("symbolSelect")
        .arg("symbol", symbol)
        .kwarg("enable", options.enable);
    marshal::decode_bool(conn.call(call).await?)
}

// ====================================================================
// MARKET DATA
// ====================================================================

pub async fn copy_rates_from(
    conn: &mut ConnectionHandle,
    symbol: &str,
    timeframe: Timeframe,
    date_from: DateTime<Utc>,
    count: i64,
) -> BridgeResult<Option<Series<Rate>>> {
    let call = WireCall::new("copyRatesFrom")
        .arg("symbol", symbol)
        .arg("timeframe", timeframe)
        .arg("date_from", date_from)
        .arg("count", count);
    marshal::decode_series(conn.call(call).await?)
}

pub async fn copy_rates_from_pos(
    conn: &mut ConnectionHandle,
    symbol: &str,
    timeframe: Timeframe,
    start_pos: i64,
    count: i64,
) -> BridgeResult<Option<Series<Rate>>> {
    let call = WireCall::new("copyRatesFromPos")
        .arg("symbol", symbol)
        .arg("timeframe", timeframe)
        .arg("start_pos", start_pos)
        .arg("count", count);
    marshal::decode_series(conn.call(call).await?)
}

pub async fn copy_rates_range(
    conn: &mut ConnectionHandle,
    symbol: &str,
    timeframe: Timeframe,
    date_from: DateTime<Utc>,
    date_to: DateTime<Utc>,
) -> BridgeResult<Option<Series<Rate>>> {
    let call = WireCall::new("copyRatesRange")
        .arg("symbol", symbol)
        .arg("timeframe", timeframe)
        .arg("date_from", date_from)
        .arg("date_to", date_to);
    marshal::decode_series(conn.call(call).await?)
}

pub async fn copy_ticks_from(
    conn: &mut ConnectionHandle,
    symbol: &str,
    date_from: DateTime<Utc>,
    count: i64,
    flags: i32,
) -> BridgeResult<Option<Series<Tick>>> {
    let call = WireCall::new("copyTicksFrom")
        .arg("symbol", symbol)
        .arg("date_from", date_from)
        .arg("count", count)
        .arg("flags", flags);
    marshal::decode_series(conn.call(call).await?)
}

pub async fn copy_ticks_range(
    conn: &mut ConnectionHandle,
    symbol: &str,
    date_from: DateTime<Utc>,
    date_to: DateTime<Utc>,
    flags: i32,
) -> BridgeResult<Option<Series<Tick>>> {
    let call = WireCall::new("copyTicksRange")
        .arg("symbol", symbol)
        .arg("date_from", date_from)
        .arg("date_to", date_to)
        .arg("flags", flags);
    marshal::decode_series(conn.call(call).await?)
}

// ====================================================================
// TRADING
// ====================================================================

pub async fn order_calc_margin(
    conn: &mut ConnectionHandle,
    action: OrderType,
    symbol: &str,
    volume: f64,
    price: f64,
) -> BridgeResult<Option<f64>> {
    let call = WireCall::new("orderCalcMargin")
        .arg("action", action)
        .arg("symbol", symbol)
        .arg("volume", volume)
        .arg("price", price);
    marshal::decode_float(conn.call(call).await?)
}

pub async fn order_calc_profit(
    conn: &mut ConnectionHandle,
    action: OrderType,
    symbol: &str,
    volume: f64,
    price_open: f64,
    price_close: f64,
) -> BridgeResult<Option<f64>> {
    let call = WireCall::new("orderCalcProfit")
        .arg("action", action)
        .arg("symbol", symbol)
        .arg("volume", volume)
        .arg("price_open", price_open)
        .arg("price_close", price_close);
    marshal::decode_float(conn.call(call).await?)
}

/// The request is checked for representability before anything is sent,
/// so a bad payload fails even on an unconnected handle.
fn encode_request(request: &OrderRequest) -> BridgeResult<serde_json::Value> {
    request.encode().map_err(|e| match e {
        BridgeError::Serialization(msg) => BridgeError::Serialization(format!("order request: {}", msg)),
        other => other,
    })
}

pub async fn order_check(
    conn: &mut ConnectionHandle,
    request: &OrderRequest,
) -> BridgeResult<Option<OrderCheckResult>> {
    let encoded = encode_request(request)?;
    let call = WireCall::new("orderCheck").arg("request", encoded);
    marshal::decode_record(conn.call(call).await?)
}

pub async fn order_send(
    conn: &mut ConnectionHandle,
    request: &OrderRequest,
) -> BridgeResult<Option<OrderResult>> {
    let encoded = encode_request(request)?;
    let call = WireCall::new("orderSend").arg("request", encoded);
    marshal::decode_record(conn.call(call).await?)
}

// ====================================================================
// POSITIONS & ORDERS
// ====================================================================

pub async fn positions_total(conn: &mut ConnectionHandle) -> BridgeResult<i64> {
    Ok(marshal::decode_int(conn.call(WireCall::new("positionsTotal")).await?)?.unwrap_or(0))
}

fn trade_filter(call: WireCall, filter: TradeFilter) -> WireCall {
    call.kwarg("symbol", filter.symbol)
        .kwarg("group", filter.group)
        .kwarg("ticket", filter.ticket)
}

pub async fn positions_get(
    conn: &mut ConnectionHandle,
    filter: TradeFilter,
) -> BridgeResult<Option<Vec<Position>>> {
    let call = trade_filter(WireCall::new("positionsGet"), filter);
    marshal::decode_records(conn.call(call).await?)
}

pub async fn orders_total(conn: &mut ConnectionHandle) -> BridgeResult<i64> {
    Ok(marshal::decode_int(conn.call(WireCall::new("ordersTotal")).await?)?.unwrap_or(0))
}

pub async fn orders_get(
    conn: &mut ConnectionHandle,
    filter: TradeFilter,
) -> BridgeResult<Option<Vec<Order>>> {
    let call = trade_filter(WireCall::new("ordersGet"), filter);
    marshal::decode_records(conn.call(call).await?)
}

// ====================================================================
// HISTORY
// ====================================================================

fn history_filter(call: WireCall, filter: HistoryFilter) -> WireCall {
    call.kwarg("date_from", filter.date_from)
        .kwarg("date_to", filter.date_to)
        .kwarg("group", filter.group)
        .kwarg("ticket", filter.ticket)
        .kwarg("position", filter.position)
}

pub async fn history_orders_total(
    conn: &mut ConnectionHandle,
    date_from: DateTime<Utc>,
    date_to: DateTime<Utc>,
) -> BridgeResult<Option<i64>> {
    let call = WireCall::new("historyOrdersTotal")
        .arg("date_from", date_from)
        .arg("date_to", date_to);
    marshal::decode_int(conn.call(call).await?)
}

pub async fn history_orders_get(
    conn: &mut ConnectionHandle,
    filter: HistoryFilter,
) -> BridgeResult<Option<Vec<Order>>> {
    let call = history_filter(WireCall::new("historyOrdersGet"), filter);
    marshal::decode_records(conn.call(call).await?)
}

pub async fn history_deals_total(
    conn: &mut ConnectionHandle,
    date_from: DateTime<Utc>,
    date_to: DateTime<Utc>,
) -> BridgeResult<Option<i64>> {
    let call = WireCall::new("historyDealsTotal")
        .arg("date_from", date_from)
        .arg("date_to", date_to);
    marshal::decode_int(conn.call(call).await?)
}

pub async fn history_deals_get(
    conn: &mut ConnectionHandle,
    filter: HistoryFilter,
) -> BridgeResult<Option<Vec<Deal>>> {
    let call = history_filter(WireCall::new("historyDealsGet"), filter);
    marshal::decode_records(conn.call(call).await?)
}

// ====================================================================
// MARKET DEPTH
// ====================================================================

pub async fn market_book_add(conn: &mut ConnectionHandle, symbol: &str) -> BridgeResult<bool> {
    let call = WireCall::new("marketBookAdd").arg("symbol", symbol);
    let subscribed = marshal::decode_bool(conn.call(call).await?)?;
    if subscribed {
        conn.subscribe(symbol);
    }
    Ok(subscribed)
}

/// Absent without a wire call when this handle holds no subscription.
pub async fn market_book_get(
    conn: &mut ConnectionHandle,
    symbol: &str,
) -> BridgeResult<Option<Vec<BookEntry>>> {
    if !conn.is_subscribed(symbol) {
        debug!(symbol, "market book read without subscription");
        conn.record(TerminalError::book_not_subscribed(symbol));
        return Ok(None);
    }
    let call = WireCall::new("marketBookGet").arg("symbol", symbol);
    marshal::decode_records(conn.call(call).await?)
}

/// The local subscription ends whatever the terminal answers.
pub async fn market_book_release(conn: &mut ConnectionHandle, symbol: &str) -> BridgeResult<bool> {
    let call = WireCall::new("marketBookRelease").arg("symbol", symbol);
    let outcome = conn.call(call).await;
    conn.unsubscribe(symbol);
    marshal::decode_bool(outcome?)
}
