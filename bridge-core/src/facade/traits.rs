// facade/traits.rs
//
// The 32 contract operations, once per calling convention. Parameter order
// follows the contract; positional parameters with a default are `Option`s
// (None = contract default), name-only parameters live in option structs.

use crate::breaker::BreakerStatus;
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

/// Blocking calling convention: every call returns once the round trip
/// completed or timed out.
pub trait TerminalApi: Send + Sync {
    // --- terminal ---
    #[allow(clippy::too_many_arguments)]
    fn initialize(
        &self,
        path: Option<&str>,
        login: Option<u64>,
        password: Option<&str>,
        server: Option<&str>,
        timeout: Option<u64>,
        options: InitializeOptions,
    ) -> BridgeResult<bool>;
    fn login(
        &self,
        login: u64,
        password: Option<&str>,
        server: Option<&str>,
        timeout: Option<u64>,
    ) -> BridgeResult<bool>;
    fn shutdown(&self) -> BridgeResult<()>;
    fn version(&self) -> BridgeResult<Option<TerminalVersion>>;
    fn last_error(&self) -> TerminalError;
    fn terminal_info(&self) -> BridgeResult<Option<TerminalInfo>>;
    fn account_info(&self) -> BridgeResult<Option<AccountInfo>>;

    // --- symbols ---
    fn symbols_total(&self) -> BridgeResult<i64>;
    fn symbols_get(&self, filter: SymbolsFilter) -> BridgeResult<Option<Vec<SymbolInfo>>>;
    fn symbol_info(&self, symbol: &str) -> BridgeResult<Option<SymbolInfo>>;
    fn symbol_info_tick(&self, symbol: &str) -> BridgeResult<Option<Tick>>;
    fn symbol_select(&self, symbol: &str, options: SymbolSelectOptions) -> BridgeResult<bool>;

    // --- market data ---
    fn copy_rates_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date_from: DateTime<Utc>,
        count: i64,
    ) -> BridgeResult<Option<Series<Rate>>>;
    fn copy_rates_from_pos(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_pos: i64,
        count: i64,
    ) -> BridgeResult<Option<Series<Rate>>>;
    fn copy_rates_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<Series<Rate>>>;
    fn copy_ticks_from(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        count: i64,
        flags: i32,
    ) -> BridgeResult<Option<Series<Tick>>>;
    fn copy_ticks_range(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
        flags: i32,
    ) -> BridgeResult<Option<Series<Tick>>>;

    // --- trading ---
    fn order_calc_margin(
        &self,
        action: OrderType,
        symbol: &str,
        volume: f64,
        price: f64,
    ) -> BridgeResult<Option<f64>>;
    fn order_calc_profit(
        &self,
        action: OrderType,
        symbol: &str,
        volume: f64,
        price_open: f64,
        price_close: f64,
    ) -> BridgeResult<Option<f64>>;
    fn order_check(&self, request: &OrderRequest) -> BridgeResult<Option<OrderCheckResult>>;
    fn order_send(&self, request: &OrderRequest) -> BridgeResult<Option<OrderResult>>;

    // --- positions ---
    fn positions_total(&self) -> BridgeResult<i64>;
    fn positions_get(&self, filter: TradeFilter) -> BridgeResult<Option<Vec<Position>>>;

    // --- orders ---
    fn orders_total(&self) -> BridgeResult<i64>;
    fn orders_get(&self, filter: TradeFilter) -> BridgeResult<Option<Vec<Order>>>;

    // --- history ---
    fn history_orders_total(
        &self,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<i64>>;
    fn history_orders_get(&self, filter: HistoryFilter) -> BridgeResult<Option<Vec<Order>>>;
    fn history_deals_total(
        &self,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<i64>>;
    fn history_deals_get(&self, filter: HistoryFilter) -> BridgeResult<Option<Vec<Deal>>>;

    // --- market depth ---
    fn market_book_add(&self, symbol: &str) -> BridgeResult<bool>;
    fn market_book_get(&self, symbol: &str) -> BridgeResult<Option<Vec<BookEntry>>>;
    fn market_book_release(&self, symbol: &str) -> BridgeResult<bool>;
}

/// Bridge-only operations of the blocking facade.
pub trait BridgeControl: Send + Sync {
    fn connect(&self) -> BridgeResult<bool>;
    fn disconnect(&self);
    fn health_check(&self) -> bool;
    fn is_connected(&self) -> bool;
    fn breaker_status(&self) -> BreakerStatus;
    /// Closes the breaker and forgets past failures.
    fn reset_breaker(&self);
}

/// Suspending calling convention: same operations, same parameters.
#[async_trait]
pub trait AsyncTerminalApi: Send + Sync {
    // --- terminal ---
    #[allow(clippy::too_many_arguments)]
    async fn initialize(
        &self,
        path: Option<&str>,
        login: Option<u64>,
        password: Option<&str>,
        server: Option<&str>,
        timeout: Option<u64>,
        options: InitializeOptions,
    ) -> BridgeResult<bool>;
    async fn login(
        &self,
        login: u64,
        password: Option<&str>,
        server: Option<&str>,
        timeout: Option<u64>,
    ) -> BridgeResult<bool>;
    async fn shutdown(&self) -> BridgeResult<()>;
    async fn version(&self) -> BridgeResult<Option<TerminalVersion>>;
    async fn last_error(&self) -> TerminalError;
    async fn terminal_info(&self) -> BridgeResult<Option<TerminalInfo>>;
    async fn account_info(&self) -> BridgeResult<Option<AccountInfo>>;

    // --- symbols ---
    async fn symbols_total(&self) -> BridgeResult<i64>;
    async fn symbols_get(&self, filter: SymbolsFilter) -> BridgeResult<Option<Vec<SymbolInfo>>>;
    async fn symbol_info(&self, symbol: &str) -> BridgeResult<Option<SymbolInfo>>;
    async fn symbol_info_tick(&self, symbol: &str) -> BridgeResult<Option<Tick>>;
    async fn symbol_select(&self, symbol: &str, options: SymbolSelectOptions) -> BridgeResult<bool>;

    // --- market data ---
    async fn copy_rates_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date_from: DateTime<Utc>,
        count: i64,
    ) -> BridgeResult<Option<Series<Rate>>>;
    async fn copy_rates_from_pos(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_pos: i64,
        count: i64,
    ) -> BridgeResult<Option<Series<Rate>>>;
    async fn copy_rates_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<Series<Rate>>>;
    async fn copy_ticks_from(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        count: i64,
        flags: i32,
    ) -> BridgeResult<Option<Series<Tick>>>;
    async fn copy_ticks_range(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
        flags: i32,
    ) -> BridgeResult<Option<Series<Tick>>>;

    // --- trading ---
    async fn order_calc_margin(
        &self,
        action: OrderType,
        symbol: &str,
        volume: f64,
        price: f64,
    ) -> BridgeResult<Option<f64>>;
    async fn order_calc_profit(
        &self,
        action: OrderType,
        symbol: &str,
        volume: f64,
        price_open: f64,
        price_close: f64,
    ) -> BridgeResult<Option<f64>>;
    async fn order_check(&self, request: &OrderRequest) -> BridgeResult<Option<OrderCheckResult>>;
    async fn order_send(&self, request: &OrderRequest) -> BridgeResult<Option<OrderResult>>;

    // --- positions ---
    async fn positions_total(&self) -> BridgeResult<i64>;
    async fn positions_get(&self, filter: TradeFilter) -> BridgeResult<Option<Vec<Position>>>;

    // --- orders ---
    async fn orders_total(&self) -> BridgeResult<i64>;
    async fn orders_get(&self, filter: TradeFilter) -> BridgeResult<Option<Vec<Order>>>;

    // --- history ---
    async fn history_orders_total(
        &self,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<i64>>;
    async fn history_orders_get(&self, filter: HistoryFilter) -> BridgeResult<Option<Vec<Order>>>;
    async fn history_deals_total(
        &self,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> BridgeResult<Option<i64>>;
    async fn history_deals_get(&self, filter: HistoryFilter) -> BridgeResult<Option<Vec<Deal>>>;

    // --- market depth ---
    async fn market_book_add(&self, symbol: &str) -> BridgeResult<bool>;
    async fn market_book_get(&self, symbol: &str) -> BridgeResult<Option<Vec<BookEntry>>>;
    async fn market_book_release(&self, symbol: &str) -> BridgeResult<bool>;
}

/// Bridge-only operations of the suspending facade. `is_connected` reads a
/// flag and never waits for an in-flight call.
#[async_trait]
pub trait AsyncBridgeControl: Send + Sync {
    async fn connect(&self) -> BridgeResult<bool>;
    async fn disconnect(&self);
    async fn health_check(&self) -> bool;
    fn is_connected(&self) -> bool;
    async fn breaker_status(&self) -> BreakerStatus;
    async fn reset_breaker(&self);
}
