//! In-process terminal that answers request frames.
//!
//! Deterministic: prices and bar times derive from a fixed clock and the
//! bar index, tickets are sequential. Failures follow the terminal's own
//! convention: a null or `false` result plus a code retrievable through
//! `lastError`.

use bridge_common::constants::{tick_flag, retcode, BookType, OrderType, Timeframe, TradeAction};
use bridge_common::errors::{codes, TerminalError};
use bridge_common::marshal::{Series, SeriesRow};
use bridge_common::types::*;
use bridge_common::value::OrderRequest;
use bridge_core::transport::wire::{RequestFrame, ResponseFrame};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;

/// 2023-11-14 22:13:20 UTC, the fake terminal's "now".
pub const FAKE_NOW: i64 = 1_700_000_000;

/// Most bars a single copy call returns.
const MAX_BARS: i64 = 100_000;

pub struct FakeTerminal {
    account: AccountInfo,
    password: String,
    initialized: bool,
    symbols: Vec<SymbolInfo>,
    positions: Vec<Position>,
    orders: Vec<Order>,
    history_orders: Vec<Order>,
    deals: Vec<Deal>,
    books: HashSet<String>,
    last_error: TerminalError,
    next_ticket: u64,
    handled: Vec<String>,
}

impl Default for FakeTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTerminal {
    /// Demo account 12345 / "x" on "Demo" with four symbols.
    pub fn new() -> Self {
        let account = AccountInfo {
            login: 12345,
            trade_mode: 0,
            leverage: 100,
            limit_orders: 200,
            trade_allowed: true,
            trade_expert: true,
            currency_digits: 2,
            balance: 10_000.0,
            equity: 10_000.0,
            margin_free: 10_000.0,
            name: "Test Trader".into(),
            server: "Demo".into(),
            currency: "USD".into(),
            company: "Fake Markets Ltd".into(),
            ..Default::default()
        };
        Self {
            account,
            password: "x".into(),
            initialized: false,
            symbols: vec![
                symbol("EURUSD", 5, 1.08500, 100_000.0),
                symbol("GBPUSD", 5, 1.26500, 100_000.0),
                symbol("USDJPY", 3, 149.500, 100_000.0),
                symbol("XAUUSD", 2, 1950.00, 100.0),
            ],
            positions: Vec::new(),
            orders: Vec::new(),
            history_orders: Vec::new(),
            deals: Vec::new(),
            books: HashSet::new(),
            last_error: TerminalError::new(codes::RES_S_OK, "Success"),
            next_ticket: 1000,
            handled: Vec::new(),
        }
    }

    pub fn with_credentials(mut self, login: u64, password: &str, server: &str) -> Self {
        self.account.login = login;
        self.password = password.to_string();
        self.account.server = server.to_string();
        self
    }

    pub fn with_symbol(mut self, info: SymbolInfo) -> Self {
        self.symbols.push(info);
        self
    }

    /// Starts with an initialized session, as if a previous client had
    /// logged in.
    pub fn initialized(mut self) -> Self {
        self.initialized = true;
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Methods handled so far, in order.
    pub fn handled(&self) -> &[String] {
        &self.handled
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn subscribed_books(&self) -> &HashSet<String> {
        &self.books
    }

    // ====================================================================
    // DISPATCH
    // ====================================================================

    pub fn handle(&mut self, frame: &RequestFrame) -> ResponseFrame {
        self.handled.push(frame.method.clone());
        if frame.method != "lastError" {
            self.last_error = TerminalError::new(codes::RES_S_OK, "Success");
        }
        let args = Args(frame);

        let result = match frame.method.as_str() {
            "initialize" => self.initialize(&args),
            "login" => self.login(&args),
            "shutdown" => {
                self.initialized = false;
                self.books.clear();
                Value::Null
            }
            "version" => self.session(|_| json!([500, 3815, "01 Dec 2023"])),
            "lastError" => json!([self.last_error.code, self.last_error.message]),
            "terminalInfo" => self.session(|t| t.terminal_info()),
            "accountInfo" => self.session(|t| to_json(&t.account)),
            "symbolsTotal" => self.session(|t| json!(t.symbols.len())),
            "symbolsGet" => self.session(|t| t.symbols_get(&args)),
            "symbolInfo" => self.session(|t| t.with_symbol_arg(&args, |_, s| to_json(s))),
            "symbolInfoTick" => self.session(|t| {
                t.with_symbol_arg(&args, |_, s| to_json(&tick_at(s, FAKE_NOW, 0)))
            }),
            "symbolSelect" => self.flag(|t| t.with_symbol_arg(&args, |_, _| json!(true))),
            "copyRatesFrom" => self.session(|t| t.copy_rates_from(&args)),
            "copyRatesFromPos" => self.session(|t| t.copy_rates_from_pos(&args)),
            "copyRatesRange" => self.session(|t| t.copy_rates_range(&args)),
            "copyTicksFrom" => self.session(|t| t.copy_ticks_from(&args)),
            "copyTicksRange" => self.session(|t| t.copy_ticks_range(&args)),
            "orderCalcMargin" => self.session(|t| t.order_calc_margin(&args)),
            "orderCalcProfit" => self.session(|t| t.order_calc_profit(&args)),
            "orderCheck" => self.session(|t| t.order_check(&args)),
            "orderSend" => self.session(|t| t.order_send(&args)),
            "positionsTotal" => self.session(|t| json!(t.positions.len())),
            "positionsGet" => self.session(|t| t.positions_get(&args)),
            "ordersTotal" => self.session(|t| json!(t.orders.len())),
            "ordersGet" => self.session(|t| t.orders_get(&args)),
            "historyOrdersTotal" => self.session(|t| t.history_total(&args, HistoryKind::Orders)),
            "historyOrdersGet" => self.session(|t| t.history_get(&args, HistoryKind::Orders)),
            "historyDealsTotal" => self.session(|t| t.history_total(&args, HistoryKind::Deals)),
            "historyDealsGet" => self.session(|t| t.history_get(&args, HistoryKind::Deals)),
            "marketBookAdd" => self.flag(|t| t.market_book_add(&args)),
            "marketBookGet" => self.session(|t| t.market_book_get(&args)),
            "marketBookRelease" => self.flag(|t| t.market_book_release(&args)),
            other => {
                return ResponseFrame::fault(
                    frame.id,
                    codes::RES_E_UNSUPPORTED,
                    format!("unknown method {}", other),
                )
            }
        };
        ResponseFrame::ok(frame.id, result)
    }

    /// Runs `f` only on an initialized session.
    fn session(&mut self, f: impl FnOnce(&mut Self) -> Value) -> Value {
        if !self.initialized {
            return self.reject(codes::RES_E_INTERNAL_FAIL_INIT, "Terminal: Call initialize first");
        }
        f(self)
    }

    /// Like [`session`](Self::session) for calls whose result is a flag.
    fn flag(&mut self, f: impl FnOnce(&mut Self) -> Value) -> Value {
        match self.session(f) {
            Value::Null => json!(false),
            other => other,
        }
    }

    fn reject(&mut self, code: i32, message: &str) -> Value {
        self.last_error = TerminalError::new(code, message);
        Value::Null
    }

    // ====================================================================
    // TERMINAL
    // ====================================================================

    fn credentials_match(&self, args: &Args<'_>) -> bool {
        let login_ok = args.u64("login") == Some(self.account.login);
        let password_ok = args.str("password").map_or(true, |p| p == self.password);
        let server_ok = args.str("server").map_or(true, |s| s == self.account.server);
        login_ok && password_ok && server_ok
    }

    fn initialize(&mut self, args: &Args<'_>) -> Value {
        if !args.is_null("login") && !self.credentials_match(args) {
            self.initialized = false;
            self.reject(codes::RES_E_AUTH_FAILED, "Terminal: Authorization failed");
            return json!(false);
        }
        self.initialized = true;
        json!(true)
    }

    fn login(&mut self, args: &Args<'_>) -> Value {
        if !self.initialized {
            self.reject(codes::RES_E_INTERNAL_FAIL_INIT, "Terminal: Call initialize first");
            return json!(false);
        }
        if !self.credentials_match(args) {
            self.reject(codes::RES_E_AUTH_FAILED, "Terminal: Authorization failed");
            return json!(false);
        }
        json!(true)
    }

    fn terminal_info(&self) -> Value {
        to_json(&TerminalInfo {
            connected: true,
            trade_allowed: true,
            build: 3815,
            maxbars: 100_000,
            company: self.account.company.clone(),
            name: "Fake Terminal".into(),
            language: "English".into(),
            path: "C:\\Program Files\\Fake Terminal".into(),
            ..Default::default()
        })
    }

    // ====================================================================
    // SYMBOLS
    // ====================================================================

    fn find_symbol(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.iter().find(|s| s.name == name)
    }

    fn with_symbol_arg(&mut self, args: &Args<'_>, f: impl FnOnce(&Self, &SymbolInfo) -> Value) -> Value {
        let name = args.str("symbol").unwrap_or_default().to_string();
        match self.symbols.iter().position(|s| s.name == name) {
            Some(idx) => {
                let info = self.symbols[idx].clone();
                f(self, &info)
            }
            None => self.reject(codes::RES_E_INVALID_PARAMS, "Terminal: Invalid params"),
        }
    }

    fn symbols_get(&self, args: &Args<'_>) -> Value {
        let group = args.str("group");
        let matching: Vec<&SymbolInfo> = self
            .symbols
            .iter()
            .filter(|s| group.map_or(true, |g| group_matches(g, &s.name)))
            .collect();
        to_json(&matching)
    }

    // ====================================================================
    // MARKET DATA
    // ====================================================================

    fn series_args(&mut self, args: &Args<'_>) -> Option<(SymbolInfo, Timeframe)> {
        let symbol = args.str("symbol").and_then(|n| self.find_symbol(n)).cloned();
        let timeframe = args.i64("timeframe").and_then(Timeframe::from_code);
        match (symbol, timeframe) {
            (Some(s), Some(tf)) => Some((s, tf)),
            _ => {
                self.reject(codes::RES_E_INVALID_PARAMS, "Terminal: Invalid params");
                None
            }
        }
    }

    /// Rows as bare arrays.
    fn copy_rates_from(&mut self, args: &Args<'_>) -> Value {
        let Some((symbol, tf)) = self.series_args(args) else {
            return Value::Null;
        };
        let end = args.i64("date_from").unwrap_or(FAKE_NOW).min(FAKE_NOW) / tf.seconds();
        let count = args.i64("count").unwrap_or(0).clamp(0, MAX_BARS);
        let rows: Vec<Value> = (end - count + 1..=end)
            .map(|i| Value::Array(bar(&symbol, tf, i).to_cells()))
            .collect();
        Value::Array(rows)
    }

    /// Columns and rows.
    fn copy_rates_from_pos(&mut self, args: &Args<'_>) -> Value {
        let Some((symbol, tf)) = self.series_args(args) else {
            return Value::Null;
        };
        let latest = FAKE_NOW / tf.seconds() - args.i64("start_pos").unwrap_or(0).max(0);
        let count = args.i64("count").unwrap_or(0).clamp(0, MAX_BARS);
        let bars = (latest - count + 1..=latest).map(|i| bar(&symbol, tf, i)).collect();
        Series::new(bars).encode()
    }

    /// Rows as objects.
    fn copy_rates_range(&mut self, args: &Args<'_>) -> Value {
        let Some((symbol, tf)) = self.series_args(args) else {
            return Value::Null;
        };
        let secs = tf.seconds();
        let from = (args.i64("date_from").unwrap_or(0) + secs - 1) / secs;
        let to = args.i64("date_to").unwrap_or(0).min(FAKE_NOW) / secs;
        let to = to.min(from + MAX_BARS - 1);
        let bars: Vec<Rate> = (from..=to).map(|i| bar(&symbol, tf, i)).collect();
        to_json(&bars)
    }

    fn copy_ticks_from(&mut self, args: &Args<'_>) -> Value {
        let Some(symbol) = args.str("symbol").and_then(|n| self.find_symbol(n)).cloned() else {
            return self.reject(codes::RES_E_INVALID_PARAMS, "Terminal: Invalid params");
        };
        let from = args.i64("date_from").unwrap_or(FAKE_NOW);
        let count = args.i64("count").unwrap_or(0).clamp(0, MAX_BARS);
        let ticks: Vec<Value> = (0..count)
            .map(|k| Value::Array(tick_at(&symbol, from + k, k).to_cells()))
            .collect();
        Value::Array(ticks)
    }

    fn copy_ticks_range(&mut self, args: &Args<'_>) -> Value {
        let Some(symbol) = args.str("symbol").and_then(|n| self.find_symbol(n)).cloned() else {
            return self.reject(codes::RES_E_INVALID_PARAMS, "Terminal: Invalid params");
        };
        let from = args.i64("date_from").unwrap_or(0);
        let to = args.i64("date_to").unwrap_or(0).min(from + MAX_BARS - 1);
        let ticks = (from..=to).map(|t| tick_at(&symbol, t, t - from)).collect();
        Series::new(ticks).encode()
    }

    // ====================================================================
    // TRADING
    // ====================================================================

    fn order_calc_margin(&mut self, args: &Args<'_>) -> Value {
        let contract = self.contract_size(args);
        let (Some(contract), Some(volume), Some(price)) =
            (contract, args.f64("volume"), args.f64("price"))
        else {
            return self.reject(codes::RES_E_INVALID_PARAMS, "Terminal: Invalid params");
        };
        let leverage = f64::from(self.account.leverage.max(1));
        json!(contract * volume * price / leverage)
    }

    fn order_calc_profit(&mut self, args: &Args<'_>) -> Value {
        let action = args.i64("action").and_then(OrderType::from_code);
        let (Some(action), Some(contract), Some(volume), Some(open), Some(close)) = (
            action,
            self.contract_size(args),
            args.f64("volume"),
            args.f64("price_open"),
            args.f64("price_close"),
        ) else {
            return self.reject(codes::RES_E_INVALID_PARAMS, "Terminal: Invalid params");
        };
        let direction = if action.is_buy() { 1.0 } else { -1.0 };
        json!((close - open) * direction * volume * contract)
    }

    fn contract_size(&self, args: &Args<'_>) -> Option<f64> {
        args.str("symbol")
            .and_then(|n| self.find_symbol(n))
            .map(|s| s.trade_contract_size)
    }

    fn request_arg(&mut self, args: &Args<'_>) -> Option<OrderRequest> {
        match OrderRequest::from_json(args.value("request").clone()) {
            Ok(request) => Some(request),
            Err(_) => {
                self.reject(codes::RES_E_INVALID_PARAMS, "Terminal: Invalid params");
                None
            }
        }
    }

    /// `(retcode, comment)` for a request the fake cannot execute.
    fn screen(&self, request: &OrderRequest) -> Option<(u32, &'static str)> {
        let symbol = request.get("symbol").and_then(|v| v.as_str());
        if symbol.and_then(|s| self.find_symbol(s)).is_none() {
            return Some((retcode::INVALID, "Invalid request"));
        }
        let volume = request.get("volume").and_then(|v| v.as_f64()).unwrap_or(0.0);
        if volume <= 0.0 {
            return Some((retcode::INVALID_VOLUME, "Invalid volume"));
        }
        None
    }

    fn order_check(&mut self, args: &Args<'_>) -> Value {
        let Some(request) = self.request_arg(args) else {
            return Value::Null;
        };
        let (code, comment) = self.screen(&request).unwrap_or((0, "Done"));
        let margin = self.margin_for(&request);
        to_json(&OrderCheckResult {
            retcode: code,
            balance: self.account.balance,
            equity: self.account.equity,
            margin,
            margin_free: self.account.margin_free - margin,
            margin_level: if margin > 0.0 { self.account.equity / margin * 100.0 } else { 0.0 },
            comment: comment.into(),
            request,
            ..Default::default()
        })
    }

    fn margin_for(&self, request: &OrderRequest) -> f64 {
        let symbol = request.get("symbol").and_then(|v| v.as_str()).and_then(|s| self.find_symbol(s));
        let volume = request.get("volume").and_then(|v| v.as_f64()).unwrap_or(0.0);
        match symbol {
            Some(s) => s.trade_contract_size * volume * s.ask / f64::from(self.account.leverage.max(1)),
            None => 0.0,
        }
    }

    fn order_send(&mut self, args: &Args<'_>) -> Value {
        let Some(request) = self.request_arg(args) else {
            return Value::Null;
        };
        self.next_ticket += 1;
        let request_id = self.next_ticket;

        let mut result = OrderResult {
            request_id,
            ..Default::default()
        };
        if let Some((code, comment)) = self.screen(&request) {
            result.retcode = code;
            result.comment = comment.into();
            result.request = request;
            return to_json(&result);
        }

        let symbol = request.get("symbol").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let info = self.find_symbol(&symbol).cloned().unwrap_or_default();
        let volume = request.get("volume").and_then(|v| v.as_f64()).unwrap_or(0.0);
        let order_type = request
            .get("type")
            .and_then(|v| v.as_i64())
            .and_then(OrderType::from_code)
            .unwrap_or(OrderType::Buy);
        let action = request
            .get("action")
            .and_then(|v| v.as_i64())
            .and_then(TradeAction::from_code);
        let magic = request.get("magic").and_then(|v| v.as_i64()).unwrap_or(0);
        let comment = request.get("comment").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let market_price = if order_type.is_buy() { info.ask } else { info.bid };

        result.volume = volume;
        result.bid = info.bid;
        result.ask = info.ask;

        match action {
            Some(TradeAction::Deal) => {
                let order = self.record_order(&symbol, order_type, volume, market_price, magic, &comment);
                let closing = request.get("position").and_then(|v| v.as_i64()).map(|p| p as u64);
                let position_id = match closing {
                    Some(ticket) => {
                        self.positions.retain(|p| p.ticket != ticket);
                        ticket
                    }
                    None => {
                        self.positions.push(Position {
                            ticket: order,
                            time: FAKE_NOW,
                            time_msc: FAKE_NOW * 1000,
                            position_type: if order_type.is_buy() { 0 } else { 1 },
                            magic,
                            identifier: order,
                            volume,
                            price_open: market_price,
                            price_current: market_price,
                            symbol: symbol.clone(),
                            comment: comment.clone(),
                            ..Default::default()
                        });
                        order
                    }
                };
                self.next_ticket += 1;
                let deal = self.next_ticket;
                self.deals.push(Deal {
                    ticket: deal,
                    order,
                    time: FAKE_NOW,
                    time_msc: FAKE_NOW * 1000,
                    deal_type: if order_type.is_buy() { 0 } else { 1 },
                    entry: if closing.is_some() { 1 } else { 0 },
                    magic,
                    position_id,
                    volume,
                    price: market_price,
                    symbol,
                    comment,
                    ..Default::default()
                });
                result.retcode = retcode::DONE;
                result.order = order;
                result.deal = deal;
                result.price = market_price;
                result.comment = "Request executed".into();
            }
            Some(TradeAction::Pending) => {
                let price = request.get("price").and_then(|v| v.as_f64()).unwrap_or(market_price);
                self.next_ticket += 1;
                let ticket = self.next_ticket;
                self.orders.push(Order {
                    ticket,
                    time_setup: FAKE_NOW,
                    time_setup_msc: FAKE_NOW * 1000,
                    order_type: order_type.code(),
                    state: 1,
                    magic,
                    volume_initial: volume,
                    volume_current: volume,
                    price_open: price,
                    price_current: market_price,
                    symbol,
                    comment,
                    ..Default::default()
                });
                result.retcode = retcode::PLACED;
                result.order = ticket;
                result.price = price;
                result.comment = "Request executed".into();
            }
            Some(TradeAction::Remove) => {
                let ticket = request.get("order").and_then(|v| v.as_i64()).unwrap_or(0) as u64;
                let before = self.orders.len();
                self.orders.retain(|o| o.ticket != ticket);
                if self.orders.len() == before {
                    result.retcode = retcode::INVALID_ORDER;
                    result.comment = "Invalid order".into();
                } else {
                    result.retcode = retcode::DONE;
                    result.order = ticket;
                    result.comment = "Request executed".into();
                }
            }
            _ => {
                result.retcode = retcode::INVALID;
                result.comment = "Unsupported trade action".into();
            }
        }
        result.request = request;
        to_json(&result)
    }

    /// Appends a filled order to the history and returns its ticket.
    fn record_order(
        &mut self,
        symbol: &str,
        order_type: OrderType,
        volume: f64,
        price: f64,
        magic: i64,
        comment: &str,
    ) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.history_orders.push(Order {
            ticket,
            time_setup: FAKE_NOW,
            time_setup_msc: FAKE_NOW * 1000,
            time_done: FAKE_NOW,
            time_done_msc: FAKE_NOW * 1000,
            order_type: order_type.code(),
            state: 4,
            magic,
            position_id: ticket,
            volume_initial: volume,
            price_open: price,
            price_current: price,
            symbol: symbol.to_string(),
            comment: comment.to_string(),
            ..Default::default()
        });
        ticket
    }

    // ====================================================================
    // POSITIONS, ORDERS, HISTORY
    // ====================================================================

    fn positions_get(&self, args: &Args<'_>) -> Value {
        let filter = TradeArgs::from(args);
        let matching: Vec<&Position> = self
            .positions
            .iter()
            .filter(|p| filter.matches(&p.symbol, p.ticket))
            .collect();
        to_json(&matching)
    }

    fn orders_get(&self, args: &Args<'_>) -> Value {
        let filter = TradeArgs::from(args);
        let matching: Vec<&Order> = self
            .orders
            .iter()
            .filter(|o| filter.matches(&o.symbol, o.ticket))
            .collect();
        to_json(&matching)
    }

    fn history_total(&mut self, args: &Args<'_>, kind: HistoryKind) -> Value {
        let (Some(from), Some(to)) = (args.i64("date_from"), args.i64("date_to")) else {
            return self.reject(codes::RES_E_INVALID_PARAMS, "Terminal: Invalid params");
        };
        let count = match kind {
            HistoryKind::Orders => self
                .history_orders
                .iter()
                .filter(|o| (from..=to).contains(&o.time_setup))
                .count(),
            HistoryKind::Deals => self.deals.iter().filter(|d| (from..=to).contains(&d.time)).count(),
        };
        json!(count)
    }

    /// By ticket, by position, or by date range; the group filter applies
    /// on top.
    fn history_get(&mut self, args: &Args<'_>, kind: HistoryKind) -> Value {
        let ticket = args.u64("ticket");
        let position = args.u64("position");
        let range = match (args.i64("date_from"), args.i64("date_to")) {
            (Some(from), Some(to)) => Some(from..=to),
            _ => None,
        };
        if ticket.is_none() && position.is_none() && range.is_none() {
            return self.reject(codes::RES_E_INVALID_PARAMS, "Terminal: Invalid params");
        }
        let group = args.str("group");
        let keep = |symbol: &str, tkt: u64, pos: u64, time: i64| {
            ticket.map_or(true, |t| t == tkt)
                && position.map_or(true, |p| p == pos)
                && range.as_ref().map_or(true, |r| r.contains(&time))
                && group.map_or(true, |g| group_matches(g, symbol))
        };
        match kind {
            HistoryKind::Orders => {
                let matching: Vec<&Order> = self
                    .history_orders
                    .iter()
                    .filter(|o| keep(&o.symbol, o.ticket, o.position_id, o.time_setup))
                    .collect();
                to_json(&matching)
            }
            HistoryKind::Deals => {
                let matching: Vec<&Deal> = self
                    .deals
                    .iter()
                    .filter(|d| keep(&d.symbol, d.ticket, d.position_id, d.time))
                    .collect();
                to_json(&matching)
            }
        }
    }

    // ====================================================================
    // MARKET DEPTH
    // ====================================================================

    fn market_book_add(&mut self, args: &Args<'_>) -> Value {
        let name = args.str("symbol").unwrap_or_default().to_string();
        if self.find_symbol(&name).is_none() {
            self.reject(codes::RES_E_NOT_FOUND, "Terminal: Symbol not found");
            return json!(false);
        }
        self.books.insert(name);
        json!(true)
    }

    fn market_book_get(&mut self, args: &Args<'_>) -> Value {
        let name = args.str("symbol").unwrap_or_default().to_string();
        if !self.books.contains(&name) {
            return self.reject(codes::RES_E_NOT_FOUND, "Terminal: Market book not subscribed");
        }
        let Some(info) = self.find_symbol(&name) else {
            return self.reject(codes::RES_E_NOT_FOUND, "Terminal: Symbol not found");
        };
        let mut entries = Vec::new();
        for level in (1..=5).rev() {
            entries.push(book_entry(BookType::Sell, info.ask + info.point * level as f64, level));
        }
        for level in 1..=5 {
            entries.push(book_entry(BookType::Buy, info.bid - info.point * level as f64, level));
        }
        to_json(&entries)
    }

    fn market_book_release(&mut self, args: &Args<'_>) -> Value {
        let name = args.str("symbol").unwrap_or_default();
        json!(self.books.remove(name))
    }
}

// ====================================================================
// HELPERS
// ====================================================================

#[derive(Debug, Clone, Copy)]
enum HistoryKind {
    Orders,
    Deals,
}

/// Typed access to a frame's parameters, positional or name-only.
struct Args<'a>(&'a RequestFrame);

impl Args<'_> {
    fn value(&self, name: &str) -> &Value {
        self.0.arg(name).unwrap_or(&Value::Null)
    }

    fn is_null(&self, name: &str) -> bool {
        self.value(name).is_null()
    }

    fn str(&self, name: &str) -> Option<&str> {
        self.value(name).as_str()
    }

    fn i64(&self, name: &str) -> Option<i64> {
        self.value(name).as_i64()
    }

    fn u64(&self, name: &str) -> Option<u64> {
        self.value(name).as_u64()
    }

    fn f64(&self, name: &str) -> Option<f64> {
        self.value(name).as_f64()
    }
}

struct TradeArgs<'a> {
    symbol: Option<&'a str>,
    group: Option<&'a str>,
    ticket: Option<u64>,
}

impl<'a> From<&'a Args<'a>> for TradeArgs<'a> {
    fn from(args: &'a Args<'a>) -> Self {
        Self {
            symbol: args.str("symbol"),
            group: args.str("group"),
            ticket: args.u64("ticket"),
        }
    }
}

impl TradeArgs<'_> {
    fn matches(&self, symbol: &str, ticket: u64) -> bool {
        self.symbol.map_or(true, |s| s == symbol)
            && self.group.map_or(true, |g| group_matches(g, symbol))
            && self.ticket.map_or(true, |t| t == ticket)
    }
}

/// Terminal group syntax: comma-separated `*` patterns, `!` excludes.
pub fn group_matches(group: &str, name: &str) -> bool {
    let mut included = false;
    for pattern in group.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(excluded) = pattern.strip_prefix('!') {
            if glob(excluded, name) {
                return false;
            }
        } else if glob(pattern, name) {
            included = true;
        }
    }
    included
}

fn glob(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }
    let mut rest = name;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(at) => rest = &rest[at + part.len()..],
                None => return false,
            }
        }
    }
    true
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn symbol(name: &str, digits: u32, mid: f64, contract_size: f64) -> SymbolInfo {
    let point = 10f64.powi(-(digits as i32));
    SymbolInfo {
        name: name.into(),
        path: format!("Forex\\{}", name),
        description: format!("{} fake quote", name),
        visible: true,
        select: true,
        time: FAKE_NOW,
        digits,
        spread: 10,
        spread_float: true,
        trade_mode: 4,
        bid: mid - 5.0 * point,
        ask: mid + 5.0 * point,
        point,
        trade_tick_value: 1.0,
        trade_tick_size: point,
        trade_contract_size: contract_size,
        volume_min: 0.01,
        volume_max: 100.0,
        volume_step: 0.01,
        currency_base: name.get(..3).unwrap_or_default().into(),
        currency_profit: name.get(3..).unwrap_or_default().into(),
        currency_margin: name.get(..3).unwrap_or_default().into(),
        ..Default::default()
    }
}

/// Bar `index` of the timeframe grid; prices oscillate around the mid.
fn bar(symbol: &SymbolInfo, tf: Timeframe, index: i64) -> Rate {
    let step = symbol.point * 10.0;
    let base = (symbol.bid + symbol.ask) / 2.0;
    let open = base + step * (index.rem_euclid(50) - 25) as f64;
    let close = if index % 2 == 0 { open + step * 5.0 } else { open - step * 3.0 };
    Rate {
        time: index * tf.seconds(),
        open,
        high: open.max(close) + step * 2.0,
        low: open.min(close) - step * 2.0,
        close,
        tick_volume: 100 + index.rem_euclid(30) as u64,
        spread: symbol.spread as i32,
        real_volume: 0,
    }
}

fn tick_at(symbol: &SymbolInfo, time: i64, seq: i64) -> Tick {
    let drift = symbol.point * (seq.rem_euclid(7) - 3) as f64;
    Tick {
        time,
        bid: symbol.bid + drift,
        ask: symbol.ask + drift,
        last: 0.0,
        volume: 0,
        time_msc: time * 1000 + seq.rem_euclid(1000),
        flags: tick_flag::BID | tick_flag::ASK,
        volume_real: 0.0,
    }
}

fn book_entry(kind: BookType, price: f64, level: i64) -> BookEntry {
    BookEntry {
        entry_type: kind.code(),
        price,
        volume: (level * 10) as u64,
        volume_dbl: (level * 10) as f64,
    }
}
