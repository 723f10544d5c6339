// bridge-common/src/options.rs
// Name-only parameters. Each struct's Default carries the contract default,
// so call sites have to spell out the field they want to change.

use chrono::{DateTime, Utc};

pub mod defaults {
    /// `login(.., timeout=60000)`
    pub const LOGIN_TIMEOUT_MS: u64 = 60_000;
    pub const INITIALIZE_PORTABLE: bool = false;
    pub const SYMBOL_SELECT_ENABLE: bool = true;
}

/// Name-only part of `initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeOptions {
    pub portable: bool,
}

impl Default for InitializeOptions {
    fn default() -> Self {
        Self {
            portable: defaults::INITIALIZE_PORTABLE,
        }
    }
}

/// Name-only part of `symbol_select`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolSelectOptions {
    pub enable: bool,
}

impl Default for SymbolSelectOptions {
    fn default() -> Self {
        Self {
            enable: defaults::SYMBOL_SELECT_ENABLE,
        }
    }
}

/// Filter for `symbols_get`. Patterns such as `"*USD*"` go to the terminal as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolsFilter {
    pub group: Option<String>,
}

impl SymbolsFilter {
    pub fn group(pattern: impl Into<String>) -> Self {
        Self {
            group: Some(pattern.into()),
        }
    }
}

/// Filter for `positions_get` / `orders_get`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeFilter {
    pub symbol: Option<String>,
    pub group: Option<String>,
    pub ticket: Option<u64>,
}

impl TradeFilter {
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Default::default()
        }
    }

    pub fn ticket(ticket: u64) -> Self {
        Self {
            ticket: Some(ticket),
            ..Default::default()
        }
    }
}

/// Filter for `history_orders_get` / `history_deals_get`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub group: Option<String>,
    pub ticket: Option<u64>,
    pub position: Option<u64>,
}

impl HistoryFilter {
    pub fn range(date_from: DateTime<Utc>, date_to: DateTime<Utc>) -> Self {
        Self {
            date_from: Some(date_from),
            date_to: Some(date_to),
            ..Default::default()
        }
    }

    pub fn position(position: u64) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }
}
