// bridge-common/src/request.rs

use crate::constants::{OrderFilling, OrderTime, OrderType, TradeAction};
use crate::errors::{BridgeError, BridgeResult};
use crate::value::OrderRequest;

/// Typed convenience over [`OrderRequest`].
///
/// Only fields that were set (or carry a non-zero value) end up in the
/// mapping; the terminal fills in the rest and performs all validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRequest {
    pub action: TradeAction,
    pub symbol: String,
    pub volume: f64,
    pub order_type: OrderType,
    pub price: f64,
    pub stoplimit: f64,
    pub sl: f64,
    pub tp: f64,
    pub deviation: u32,
    pub type_filling: Option<OrderFilling>,
    pub type_time: Option<OrderTime>,
    pub expiration: i64,
    pub magic: u64,
    pub order: u64,
    pub position: u64,
    pub position_by: u64,
    pub comment: String,
}

impl TradeRequest {
    /// Market deal with the terminal's customary 20-point deviation.
    pub fn market(symbol: impl Into<String>, order_type: OrderType, volume: f64) -> Self {
        Self {
            action: TradeAction::Deal,
            symbol: symbol.into(),
            volume,
            order_type,
            price: 0.0,
            stoplimit: 0.0,
            sl: 0.0,
            tp: 0.0,
            deviation: 20,
            type_filling: None,
            type_time: None,
            expiration: 0,
            magic: 0,
            order: 0,
            position: 0,
            position_by: 0,
            comment: String::new(),
        }
    }

    pub fn pending(symbol: impl Into<String>, order_type: OrderType, volume: f64, price: f64) -> Self {
        Self {
            action: TradeAction::Pending,
            price,
            ..Self::market(symbol, order_type, volume)
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_stops(mut self, sl: f64, tp: f64) -> Self {
        self.sl = sl;
        self.tp = tp;
        self
    }

    pub fn with_magic(mut self, magic: u64) -> Self {
        self.magic = magic;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_filling(mut self, filling: OrderFilling) -> Self {
        self.type_filling = Some(filling);
        self
    }

    pub fn closing(mut self, position: u64) -> Self {
        self.position = position;
        self
    }

    /// Builds the wire mapping. Tickets beyond `i64` cannot be carried.
    pub fn to_request(&self) -> BridgeResult<OrderRequest> {
        let mut req = OrderRequest::new()
            .with("action", self.action.code())
            .with("symbol", self.symbol.as_str())
            .with("volume", self.volume)
            .with("type", self.order_type.code());

        for (key, value) in [
            ("price", self.price),
            ("stoplimit", self.stoplimit),
            ("sl", self.sl),
            ("tp", self.tp),
        ] {
            if value != 0.0 {
                req.insert(key, value);
            }
        }
        req.insert("deviation", self.deviation);
        if let Some(filling) = self.type_filling {
            req.insert("type_filling", filling.code());
        }
        if let Some(time) = self.type_time {
            req.insert("type_time", time.code());
        }
        if self.expiration != 0 {
            req.insert("expiration", self.expiration);
        }
        for (key, ticket) in [
            ("magic", self.magic),
            ("order", self.order),
            ("position", self.position),
            ("position_by", self.position_by),
        ] {
            if ticket != 0 {
                req.insert(key, ticket_value(key, ticket)?);
            }
        }
        if !self.comment.is_empty() {
            req.insert("comment", self.comment.as_str());
        }
        Ok(req)
    }
}

fn ticket_value(key: &str, ticket: u64) -> BridgeResult<i64> {
    i64::try_from(ticket)
        .map_err(|_| BridgeError::serialization(format!("{} {} does not fit the wire", key, ticket)))
}

impl TryFrom<&TradeRequest> for OrderRequest {
    type Error = BridgeError;

    fn try_from(value: &TradeRequest) -> BridgeResult<Self> {
        value.to_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_market_request_fields() {
        let req = TradeRequest::market("EURUSD", OrderType::Buy, 0.1)
            .with_price(1.1)
            .with_magic(42)
            .with_comment("probe")
            .to_request()
            .unwrap();

        assert_eq!(
            req.keys().collect::<Vec<_>>(),
            vec!["action", "symbol", "volume", "type", "price", "deviation", "magic", "comment"]
        );
        assert_eq!(req.get("action"), Some(&Value::Int(1)));
        assert_eq!(req.get("deviation"), Some(&Value::Int(20)));
    }

    #[test]
    fn test_oversized_ticket_rejected() {
        let req = TradeRequest::market("EURUSD", OrderType::Sell, 1.0).closing(u64::MAX);
        assert!(matches!(req.to_request(), Err(BridgeError::Serialization(_))));
    }
}
