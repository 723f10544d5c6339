// bridge-common/src/types.rs
// Domain records returned by the terminal. Field names follow the terminal's
// own naming so wire objects deserialize without renames.

use crate::constants::{retcode, OrderType, PositionType};
use crate::value::OrderRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn epoch(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// `(major, minor, build)` as returned by `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalVersion {
    pub major: i64,
    pub minor: i64,
    pub build: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalInfo {
    pub community_account: bool,
    pub community_connection: bool,
    pub connected: bool,
    pub dlls_allowed: bool,
    pub trade_allowed: bool,
    pub tradeapi_disabled: bool,
    pub email_enabled: bool,
    pub ftp_enabled: bool,
    pub notifications_enabled: bool,
    pub mqid: bool,
    pub build: u32,
    pub maxbars: u64,
    pub codepage: u32,
    pub ping_last: u64,
    pub community_balance: f64,
    pub retransmission: f64,
    pub company: String,
    pub name: String,
    pub language: String,
    pub path: String,
    pub data_path: String,
    pub commondata_path: String,
}

impl TerminalInfo {
    pub fn can_trade(&self) -> bool {
        self.connected && self.trade_allowed && !self.tradeapi_disabled
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
    pub login: u64,
    pub trade_mode: i32,
    pub leverage: u32,
    pub limit_orders: u32,
    pub margin_so_mode: i32,
    pub trade_allowed: bool,
    pub trade_expert: bool,
    pub margin_mode: i32,
    pub currency_digits: u32,
    pub fifo_close: bool,
    pub balance: f64,
    pub credit: f64,
    pub profit: f64,
    pub equity: f64,
    pub margin: f64,
    pub margin_free: f64,
    pub margin_level: f64,
    pub margin_so_call: f64,
    pub margin_so_so: f64,
    pub margin_initial: f64,
    pub margin_maintenance: f64,
    pub assets: f64,
    pub liabilities: f64,
    pub commission_blocked: f64,
    pub name: String,
    pub server: String,
    pub currency: String,
    pub company: String,
}

impl AccountInfo {
    /// ACCOUNT_TRADE_MODE_DEMO
    pub fn is_demo(&self) -> bool {
        self.trade_mode == 0
    }

    /// Used margin as a share of equity, in percent.
    pub fn margin_usage_percent(&self) -> f64 {
        if self.equity <= 0.0 {
            return 0.0;
        }
        self.margin / self.equity * 100.0
    }

    pub fn can_trade(&self) -> bool {
        self.trade_allowed && self.trade_expert && self.margin_free > 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolInfo {
    pub name: String,
    pub path: String,
    pub description: String,
    pub visible: bool,
    pub select: bool,
    pub custom: bool,
    pub time: i64,
    pub digits: u32,
    pub spread: u32,
    pub spread_float: bool,
    pub trade_mode: i32,
    pub trade_exemode: i32,
    pub filling_mode: i32,
    pub order_mode: i32,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub point: f64,
    pub trade_tick_value: f64,
    pub trade_tick_size: f64,
    pub trade_contract_size: f64,
    pub volume_min: f64,
    pub volume_max: f64,
    pub volume_step: f64,
    pub swap_long: f64,
    pub swap_short: f64,
    pub currency_base: String,
    pub currency_profit: String,
    pub currency_margin: String,
}

impl SymbolInfo {
    /// Spread in price units (`spread` points times `point`).
    pub fn spread_value(&self) -> f64 {
        self.spread as f64 * self.point
    }

    pub fn mid_price(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

/// One price/volume observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tick {
    pub time: i64,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: u64,
    pub time_msc: i64,
    pub flags: i32,
    pub volume_real: f64,
}

impl Tick {
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    pub fn mid_price(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    pub fn has_flag(&self, flag: i32) -> bool {
        self.flags & flag != 0
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time_msc).or_else(|| epoch(self.time))
    }
}

/// One OHLCV bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rate {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub tick_volume: u64,
    pub spread: i32,
    pub real_volume: u64,
}

impl Rate {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        epoch(self.time)
    }
}

// ====================================================================
// TRADING RESULTS
// ====================================================================

/// Dry-run outcome of `order_check`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderCheckResult {
    pub retcode: u32,
    pub balance: f64,
    pub equity: f64,
    pub profit: f64,
    pub margin: f64,
    pub margin_free: f64,
    pub margin_level: f64,
    pub comment: String,
    /// Echo of the submitted request.
    pub request: OrderRequest,
}

/// Outcome of `order_send`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderResult {
    pub retcode: u32,
    pub deal: u64,
    pub order: u64,
    pub volume: f64,
    pub price: f64,
    pub bid: f64,
    pub ask: f64,
    pub comment: String,
    pub request_id: u64,
    pub retcode_external: i32,
    /// Echo of the submitted request.
    pub request: OrderRequest,
}

impl OrderResult {
    pub fn is_success(&self) -> bool {
        retcode::is_success(self.retcode)
    }
}

// ====================================================================
// OPEN STATE & HISTORY
// ====================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub ticket: u64,
    pub time: i64,
    pub time_msc: i64,
    pub time_update: i64,
    pub time_update_msc: i64,
    #[serde(rename = "type")]
    pub position_type: i32,
    pub magic: i64,
    pub identifier: u64,
    pub reason: i32,
    pub volume: f64,
    pub price_open: f64,
    pub sl: f64,
    pub tp: f64,
    pub price_current: f64,
    pub swap: f64,
    pub profit: f64,
    pub symbol: String,
    pub comment: String,
    pub external_id: String,
}

impl Position {
    pub fn is_buy(&self) -> bool {
        PositionType::from_code(self.position_type as i64) == Some(PositionType::Buy)
    }

    pub fn is_profitable(&self) -> bool {
        self.profit > 0.0
    }

    pub fn net_profit(&self) -> f64 {
        self.profit + self.swap
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub ticket: u64,
    pub time_setup: i64,
    pub time_setup_msc: i64,
    pub time_done: i64,
    pub time_done_msc: i64,
    pub time_expiration: i64,
    #[serde(rename = "type")]
    pub order_type: i32,
    pub type_time: i32,
    pub type_filling: i32,
    pub state: i32,
    pub magic: i64,
    pub position_id: u64,
    pub position_by_id: u64,
    pub reason: i32,
    pub volume_initial: f64,
    pub volume_current: f64,
    pub price_open: f64,
    pub sl: f64,
    pub tp: f64,
    pub price_current: f64,
    pub price_stoplimit: f64,
    pub symbol: String,
    pub comment: String,
    pub external_id: String,
}

impl Order {
    pub fn kind(&self) -> Option<OrderType> {
        OrderType::from_code(self.order_type as i64)
    }

    pub fn is_pending(&self) -> bool {
        self.kind().map(OrderType::is_pending).unwrap_or(false)
    }
}

/// A historical execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deal {
    pub ticket: u64,
    pub order: u64,
    pub time: i64,
    pub time_msc: i64,
    #[serde(rename = "type")]
    pub deal_type: i32,
    pub entry: i32,
    pub magic: i64,
    pub reason: i32,
    pub position_id: u64,
    pub volume: f64,
    pub price: f64,
    pub commission: f64,
    pub swap: f64,
    pub profit: f64,
    pub fee: f64,
    pub symbol: String,
    pub comment: String,
    pub external_id: String,
}

impl Deal {
    pub fn net_profit(&self) -> f64 {
        self.profit + self.swap + self.commission + self.fee
    }
}

/// One market-depth level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookEntry {
    #[serde(rename = "type")]
    pub entry_type: i32,
    pub price: f64,
    pub volume: u64,
    pub volume_dbl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let info: AccountInfo =
            serde_json::from_value(serde_json::json!({"login": 12345, "equity": 1000.0})).unwrap();
        assert_eq!(info.login, 12345);
        assert_eq!(info.currency, "");
        assert_eq!(info.margin_usage_percent(), 0.0);
    }

    #[test]
    fn test_rate_helpers() {
        let bar = Rate {
            time: 1_700_000_000,
            open: 1.10,
            high: 1.12,
            low: 1.09,
            close: 1.11,
            ..Default::default()
        };
        assert!(bar.is_bullish());
        assert!((bar.range() - 0.03).abs() < 1e-9);
        assert!((bar.body_size() - 0.01).abs() < 1e-9);
        assert!(bar.datetime().is_some());
    }

    #[test]
    fn test_order_result_keeps_request_order() {
        let raw = serde_json::json!({
            "retcode": 10009,
            "request": {"symbol": "EURUSD", "action": 1, "volume": 0.1, "magic": 7}
        });
        let result: OrderResult = serde_json::from_value(raw).unwrap();
        assert!(result.is_success());
        assert_eq!(
            result.request.keys().collect::<Vec<_>>(),
            vec!["symbol", "action", "volume", "magic"]
        );
    }

    #[test]
    fn test_book_entry_type_field() {
        let entry: BookEntry =
            serde_json::from_value(serde_json::json!({"type": 2, "price": 1.1, "volume": 5}))
                .unwrap();
        assert_eq!(entry.entry_type, 2);
    }
}
