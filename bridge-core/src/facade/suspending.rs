// facade/suspending.rs
// ====================================================================
// Suspending facade
// ====================================================================
//
// Calls on one instance are serialized: the handle sits behind an async
// mutex and a second caller waits until the first round trip finished.
// Instances never share a handle.

use crate::breaker::BreakerStatus;
use crate::config::Settings;
use crate::connection::ConnectionHandle;
use crate::facade::traits::{AsyncBridgeControl, AsyncTerminalApi};
use crate::operations;
use crate::transport::traits::Dialer;
use crate::transport::ws::WsDialer;
use async_trait::async_trait;
use bridge_common::constants::{OrderType, Timeframe};
use bridge_common::errors::{BridgeResult, TerminalError};
use bridge_common::marshal::Series;
use bridge_common::options::{
    HistoryFilter, InitializeOptions, SymbolSelectOptions, SymbolsFilter, TradeFilter,
};
use bridge_common::types::*;
use bridge_common::value::OrderRequest;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AsyncTerminal {
    session: Mutex<ConnectionHandle>,
    liveness: Arc<AtomicBool>,
}

impl AsyncTerminal {
    /// WebSocket transport to `settings.endpoint`.
    pub fn new(settings: Settings) -> Self {
        Self::with_dialer(settings, Arc::new(WsDialer))
    }

    pub fn with_dialer(settings: Settings, dialer: Arc<dyn Dialer>) -> Self {
        let handle = ConnectionHandle::new(settings.endpoint, dialer, settings.timeouts)
            .with_breaker(&settings.breaker);
        Self {
            liveness: handle.liveness(),
            session: Mutex::new(handle),
        }
    }
}

#[async_trait]
impl AsyncBridgeControl for AsyncTerminal {
    async fn connect(&self) -> BridgeResult<bool> {
        operations::connect(&mut *self.session.lock().await).await
    }

    async fn disconnect(&self) {
        operations::disconnect(&mut *self.session.lock().await).await
    }

    async fn health_check(&self) -> bool {
        operations::health_check(&mut *self.session.lock().await).await
    }

    fn is_connected(&self) -> bool {
        self.liveness.load(Ordering::SeqCst)
    }

    async fn breaker_status(&self) -> BreakerStatus {
        self.session.lock().await.breaker_status()
    }

    async fn reset_breaker(&self) {
        self.session.lock().await.reset_breaker()
    }
}

#[async_trait]
impl AsyncTerminalApi for AsyncTerminal {
    async fn initialize(
        &self,
        path: Option<&str>,
        login: Option<u64>,
        password: Option<&str>,
        server: Option<&str>,
        timeout: Option<u64>,
        options: InitializeOptions,
    ) -> BridgeResult<bool> {
        let mut conn = self.session.lock().await;
        operations::initialize(&mut conn, path, login, password, server, timeout, options).await
    }

    async fn login(
        &self,
        login: u64,
        password: Option<&str>,
        server: Option<&str>,
        timeout: Option<u64>,
    ) -> BridgeResult<bool> {
        let mut conn = self.session.lock().await;
        operations::login(&mut conn, login, password, server, timeout).await
    }

    async fn shutdown(&self) -> BridgeResult<()> {
        operations::shutdown(&mut *self.session.lock().await).await
    }

    async fn version(&self) -> BridgeResult<Option<TerminalVersion>> {
        operations::version(&mut *self.session.lock().await).await
    }

    async fn last_error(&self) -> TerminalError {
        operations::last_error(&mut *self.session.lock().await).await
    }

    async fn terminal_info(&self) -> BridgeResult<Option<TerminalInfo>> {
        operations::terminal_info(&mut *self.session.lock().await).await
    }

    async fn account_info(&self) -> BridgeResult<Option<AccountInfo>> {
        operations::account_info(&mut *self.session.lock().await).await
    }

    async fn symbols_total(&self) -> BridgeResult<i64> {
        operations::symbols_total(&mut *self.session.lock().await).await
    }

    async fn symbols_get(&self, filter: SymbolsFilter) -> BridgeResult<Option<Vec<SymbolInfo>>> {
        operations::symbols_get(&mut *self.session.lock().await, filter).await
    }

    async fn symbol_info(&self, symbol: &str) -> BridgeResult<Option<SymbolInfo>> {
        operations::symbol_info(&mut *self.session.lock().await, symbol).await
    }

    async fn symbol_info_tick(&self, symbol: &str) -> BridgeResult<Option<Tick>> {
        operations::symbol_info_tick(&mut *self.session.lock().await, symbol).await
    }

    async fn symbol_select(&self, symbol: &str, options: SymbolSelectOptions) -> BridgeResult<bool> {
        operations::symbol_select(&mut *self.session.lock().await, symbol, options).await
    }

    async fn copy_rates_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date_from: DateTime<Utc>,
        count: i64,
    ) -> BridgeResult<Option<Series<Rate>>> {
        let mut conn = self.session.lock().await;
        operations::copy_rates_from(&mut conn, symbol, timeframe, date_from, count).await
    }

    async fn copy_rates_from_pos(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_pos: i64,
        count: i64,
    ) -> BridgeResult<Option<Series<Rate>>> {
        let mut conn = self.session.lock().await;
        operations::copy_rates_from_pos(&mut conn, symbol, timeframe, start_pos, count).await
    }

    async fn copy_rates_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<Series<Rate>>> {
        let mut conn = self.session.lock().await;
        operations::copy_rates_range(&mut conn, symbol, timeframe, date_from, date_to).await
    }

    async fn copy_ticks_from(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        count: i64,
        flags: i32,
    ) -> BridgeResult<Option<Series<Tick>>> {
        let mut conn = self.session.lock().await;
        operations::copy_ticks_from(&mut conn, symbol, date_from, count, flags).await
    }

    async fn copy_ticks_range(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
        flags: i32,
    ) -> BridgeResult<Option<Series<Tick>>> {
        let mut conn = self.session.lock().await;
        operations::copy_ticks_range(&mut conn, symbol, date_from, date_to, flags).await
    }

    async fn order_calc_margin(
        &self,
        action: OrderType,
        symbol: &str,
        volume: f64,
        price: f64,
    ) -> BridgeResult<Option<f64>> {
        let mut conn = self.session.lock().await;
        operations::order_calc_margin(&mut conn, action, symbol, volume, price).await
    }

    async fn order_calc_profit(
        &self,
        action: OrderType,
        symbol: &str,
        volume: f64,
        price_open: f64,
        price_close: f64,
    ) -> BridgeResult<Option<f64>> {
        let mut conn = self.session.lock().await;
        operations::order_calc_profit(&mut conn, action, symbol, volume, price_open, price_close)
            .await
    }

    async fn order_check(&self, request: &OrderRequest) -> BridgeResult<Option<OrderCheckResult>> {
        operations::order_check(&mut *self.session.lock().await, request).await
    }

    async fn order_send(&self, request: &OrderRequest) -> BridgeResult<Option<OrderResult>> {
        operations::order_send(&mut *self.session.lock().await, request).await
    }

    async fn positions_total(&self) -> BridgeResult<i64> {
        operations::positions_total(&mut *self.session.lock().await).await
    }

    async fn positions_get(&self, filter: TradeFilter) -> BridgeResult<Option<Vec<Position>>> {
        operations::positions_get(&mut *self.session.lock().await, filter).await
    }

    async fn orders_total(&self) -> BridgeResult<i64> {
        operations::orders_total(&mut *self.session.lock().await).await
    }

    async fn orders_get(&self, filter: TradeFilter) -> BridgeResult<Option<Vec<Order>>> {
        operations::orders_get(&mut *self.session.lock().await, filter).await
    }

    async fn history_orders_total(
        &self,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<i64>> {
        operations::history_orders_total(&mut *self.session.lock().await, date_from, date_to).await
    }

    async fn history_orders_get(&self, filter: HistoryFilter) -> BridgeResult<Option<Vec<Order>>> {
        operations::history_orders_get(&mut *self.session.lock().await, filter).await
    }

    async fn history_deals_total(
        &self,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<i64>> {
        operations::history_deals_total(&mut *self.session.lock().await, date_from, date_to).await
    }

    async fn history_deals_get(&self, filter: HistoryFilter) -> BridgeResult<Option<Vec<Deal>>> {
        operations::history_deals_get(&mut *self.session.lock().await, filter).await
    }

    async fn market_book_add(&self, symbol: &str) -> BridgeResult<bool> {
        operations::market_book_add(&mut *self.session.lock().await, symbol).await
    }

    async fn market_book_get(&self, symbol: &str) -> BridgeResult<Option<Vec<BookEntry>>> {
        operations::market_book_get(&mut *self.session.lock().await, symbol).await
    }

    async fn market_book_release(&self, symbol: &str) -> BridgeResult<bool> {
        operations::market_book_release(&mut *self.session.lock().await, symbol).await
    }
}
