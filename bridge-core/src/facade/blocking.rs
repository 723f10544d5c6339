// facade/blocking.rs
// ====================================================================
// Blocking facade
// ====================================================================
//
// Owns a current-thread runtime and drives each operation to completion
// on the calling thread. Calls from several threads are serialized by the
// session mutex. Must not be called or dropped from inside an async
// runtime; use `AsyncTerminal` there.

use crate::breaker::BreakerStatus;
use crate::config::Settings;
use crate::connection::ConnectionHandle;
use crate::facade::traits::{BridgeControl, TerminalApi};
use crate::operations;
use crate::transport::traits::Dialer;
use crate::transport::ws::WsDialer;
use bridge_common::constants::{OrderType, Timeframe};
use bridge_common::errors::{BridgeError, BridgeResult, TerminalError};
use bridge_common::marshal::Series;
use bridge_common::options::{
    HistoryFilter, InitializeOptions, SymbolSelectOptions, SymbolsFilter, TradeFilter,
};
use bridge_common::types::*;
use bridge_common::value::OrderRequest;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::{Builder, Runtime};
use tracing::warn;

/// Locks the session and blocks on one operation future.
macro_rules! blocking {
    ($self:ident, |$conn:ident| $body:expr) => {{
        if Terminal::in_async_context() {
            return Err(Terminal::nested_runtime());
        }
        let mut guard = $self.lock();
        let $conn: &mut ConnectionHandle = &mut guard;
        $self.runtime.block_on($body)
    }};
}

pub struct Terminal {
    // Declared before the runtime so the channel is dropped first.
    session: Mutex<ConnectionHandle>,
    liveness: Arc<AtomicBool>,
    runtime: Runtime,
}

impl Terminal {
    /// WebSocket transport to `settings.endpoint`.
    pub fn new(settings: Settings) -> BridgeResult<Self> {
        Self::with_dialer(settings, Arc::new(WsDialer))
    }

    pub fn with_dialer(settings: Settings, dialer: Arc<dyn Dialer>) -> BridgeResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BridgeError::Connection(format!("cannot start bridge runtime: {}", e)))?;
        let handle = ConnectionHandle::new(settings.endpoint, dialer, settings.timeouts)
            .with_breaker(&settings.breaker);
        Ok(Self {
            liveness: handle.liveness(),
            session: Mutex::new(handle),
            runtime,
        })
    }

    fn in_async_context() -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }

    fn nested_runtime() -> BridgeError {
        warn!("blocking facade called from inside an async runtime");
        BridgeError::Connection("blocking facade called from inside an async runtime".into())
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionHandle> {
        // Handle fields are updated by single assignments, so a poisoned
        // lock still guards a consistent handle.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BridgeControl for Terminal {
    fn connect(&self) -> BridgeResult<bool> {
        blocking!(self, |conn| operations::connect(conn))
    }

    fn disconnect(&self) {
        let mut conn = self.lock();
        if Self::in_async_context() {
            conn.abandon();
            return;
        }
        self.runtime.block_on(operations::disconnect(&mut conn))
    }

    fn health_check(&self) -> bool {
        if Self::in_async_context() {
            return false;
        }
        let mut conn = self.lock();
        self.runtime.block_on(operations::health_check(&mut conn))
    }

    fn is_connected(&self) -> bool {
        self.liveness.load(Ordering::SeqCst)
    }

    fn breaker_status(&self) -> BreakerStatus {
        self.lock().breaker_status()
    }

    fn reset_breaker(&self) {
        self.lock().reset_breaker()
    }
}

impl TerminalApi for Terminal {
    fn initialize(
        &self,
        path: Option<&str>,
        login: Option<u64>,
        password: Option<&str>,
        server: Option<&str>,
        timeout: Option<u64>,
        options: InitializeOptions,
    ) -> BridgeResult<bool> {
        blocking!(self, |conn| operations::initialize(
            conn, path, login, password, server, timeout, options
        ))
    }

    fn login(
        &self,
        login: u64,
        password: Option<&str>,
        server: Option<&str>,
        timeout: Option<u64>,
    ) -> BridgeResult<bool> {
        blocking!(self, |conn| operations::login(conn, login, password, server, timeout))
    }

    fn shutdown(&self) -> BridgeResult<()> {
        blocking!(self, |conn| operations::shutdown(conn))
    }

    fn version(&self) -> BridgeResult<Option<TerminalVersion>> {
        blocking!(self, |conn| operations::version(conn))
    }

    fn last_error(&self) -> TerminalError {
        let mut conn = self.lock();
        if Self::in_async_context() {
            return conn.pending_error().cloned().unwrap_or_default();
        }
        self.runtime.block_on(operations::last_error(&mut conn))
    }

    fn terminal_info(&self) -> BridgeResult<Option<TerminalInfo>> {
        blocking!(self, |conn| operations::terminal_info(conn))
    }

    fn account_info(&self) -> BridgeResult<Option<AccountInfo>> {
        blocking!(self, |conn| operations::account_info(conn))
    }

    fn symbols_total(&self) -> BridgeResult<i64> {
        blocking!(self, |conn| operations::symbols_total(conn))
    }

    fn symbols_get(&self, filter: SymbolsFilter) -> BridgeResult<Option<Vec<SymbolInfo>>> {
        blocking!(self, |conn| operations::symbols_get(conn, filter))
    }

    fn symbol_info(&self, symbol: &str) -> BridgeResult<Option<SymbolInfo>> {
        blocking!(self, |conn| operations::symbol_info(conn, symbol))
    }

    fn symbol_info_tick(&self, symbol: &str) -> BridgeResult<Option<Tick>> {
        blocking!(self, |conn| operations::symbol_info_tick(conn, symbol))
    }

    fn symbol_select(&self, symbol: &str, options: SymbolSelectOptions) -> BridgeResult<bool> {
        blocking!(self, |conn| operations::symbol_select(conn, symbol, options))
    }

    fn copy_rates_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date_from: DateTime<Utc>,
        count: i64,
    ) -> BridgeResult<Option<Series<Rate>>> {
        blocking!(self, |conn| operations::copy_rates_from(
            conn, symbol, timeframe, date_from, count
        ))
    }

    fn copy_rates_from_pos(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_pos: i64,
        count: i64,
    ) -> BridgeResult<Option<Series<Rate>>> {
        blocking!(self, |conn| operations::copy_rates_from_pos(
            conn, symbol, timeframe, start_pos, count
        ))
    }

    fn copy_rates_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<Series<Rate>>> {
        blocking!(self, |conn| operations::copy_rates_range(
            conn, symbol, timeframe, date_from, date_to
        ))
    }

    fn copy_ticks_from(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        count: i64,
        flags: i32,
    ) -> BridgeResult<Option<Series<Tick>>> {
        blocking!(self, |conn| operations::copy_ticks_from(
            conn, symbol, date_from, count, flags
        ))
    }

    fn copy_ticks_range(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
        flags: i32,
    ) -> BridgeResult<Option<Series<Tick>>> {
        blocking!(self, |conn| operations::copy_ticks_range(
            conn, symbol, date_from, date_to, flags
        ))
    }

    fn order_calc_margin(
        &self,
        action: OrderType,
        symbol: &str,
        volume: f64,
        price: f64,
    ) -> BridgeResult<Option<f64>> {
        blocking!(self, |conn| operations::order_calc_margin(
            conn, action, symbol, volume, price
        ))
    }

    fn order_calc_profit(
        &self,
        action: OrderType,
        symbol: &str,
        volume: f64,
        price_open: f64,
        price_close: f64,
    ) -> BridgeResult<Option<f64>> {
        blocking!(self, |conn| operations::order_calc_profit(
            conn,
            action,
            symbol,
            volume,
            price_open,
            price_close
        ))
    }

    fn order_check(&self, request: &OrderRequest) -> BridgeResult<Option<OrderCheckResult>> {
        blocking!(self, |conn| operations::order_check(conn, request))
    }

    fn order_send(&self, request: &OrderRequest) -> BridgeResult<Option<OrderResult>> {
        blocking!(self, |conn| operations::order_send(conn, request))
    }

    fn positions_total(&self) -> BridgeResult<i64> {
        blocking!(self, |conn| operations::positions_total(conn))
    }

    fn positions_get(&self, filter: TradeFilter) -> BridgeResult<Option<Vec<Position>>> {
        blocking!(self, |conn| operations::positions_get(conn, filter))
    }

    fn orders_total(&self) -> BridgeResult<i64> {
        blocking!(self, |conn| operations::orders_total(conn))
    }

    fn orders_get(&self, filter: TradeFilter) -> BridgeResult<Option<Vec<Order>>> {
        blocking!(self, |conn| operations::orders_get(conn, filter))
    }

    fn history_orders_total(
        &self,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<i64>> {
        blocking!(self, |conn| operations::history_orders_total(conn, date_from, date_to))
    }

    fn history_orders_get(&self, filter: HistoryFilter) -> BridgeResult<Option<Vec<Order>>> {
        blocking!(self, |conn| operations::history_orders_get(conn, filter))
    }

    fn history_deals_total(
        &self,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<i64>> {
        blocking!(self, |conn| operations::history_deals_total(conn, date_from, date_to))
    }

    fn history_deals_get(&self, filter: HistoryFilter) -> BridgeResult<Option<Vec<Deal>>> {
        blocking!(self, |conn| operations::history_deals_get(conn, filter))
    }

    fn market_book_add(&self, symbol: &str) -> BridgeResult<bool> {
        blocking!(self, |conn| operations::market_book_add(conn, symbol))
    }

    fn market_book_get(&self, symbol: &str) -> BridgeResult<Option<Vec<BookEntry>>> {
        blocking!(self, |conn| operations::market_book_get(conn, symbol))
    }

    fn market_book_release(&self, symbol: &str) -> BridgeResult<bool> {
        blocking!(self, |conn| operations::market_book_release(conn, symbol))
    }
}
