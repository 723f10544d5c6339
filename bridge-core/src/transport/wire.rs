// transport/wire.rs
// JSON frames exchanged with the terminal's RPC server

use bridge_common::constants::{OrderType, Timeframe};
use bridge_common::contract::ParamKind;
use bridge_common::errors::{BridgeError, BridgeResult};
use bridge_common::value::OrderRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireArg {
    pub name: String,
    pub value: Value,
}

/// One call. Positional parameters travel in `args`, name-only ones in
/// `kwargs`; every declared parameter is present, defaults included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub args: Vec<WireArg>,
    #[serde(default)]
    pub kwargs: Vec<WireArg>,
}

impl RequestFrame {
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args
            .iter()
            .chain(self.kwargs.iter())
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Parameters in wire order with their kind.
    pub fn params(&self) -> impl Iterator<Item = (&WireArg, ParamKind)> {
        self.args
            .iter()
            .map(|a| (a, ParamKind::Positional))
            .chain(self.kwargs.iter().map(|a| (a, ParamKind::NameOnly)))
    }
}

/// Terminal-side rejection carried instead of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFault {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub id: u64,
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireFault>,
}

impl ResponseFrame {
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            id,
            result,
            error: None,
        }
    }

    pub fn fault(id: u64, code: i32, message: impl Into<String>) -> Self {
        Self {
            id,
            result: Value::Null,
            error: Some(WireFault {
                code,
                message: message.into(),
            }),
        }
    }
}

// ====================================================================
// ARGUMENT ENCODING
// ====================================================================

/// Values that can travel as call arguments.
pub trait ToWire {
    fn to_wire(&self) -> BridgeResult<Value>;
}

impl ToWire for bool {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(json!(self))
    }
}

impl ToWire for i64 {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(json!(self))
    }
}

impl ToWire for i32 {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(json!(self))
    }
}

impl ToWire for u64 {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(json!(self))
    }
}

impl ToWire for f64 {
    fn to_wire(&self) -> BridgeResult<Value> {
        if !self.is_finite() {
            return Err(BridgeError::serialization(format!(
                "non-finite argument {}",
                self
            )));
        }
        Ok(json!(self))
    }
}

impl ToWire for str {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(json!(self))
    }
}

impl ToWire for String {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(json!(self))
    }
}

/// Epoch seconds, UTC.
impl ToWire for DateTime<Utc> {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(json!(self.timestamp()))
    }
}

impl ToWire for Timeframe {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(json!(self.code()))
    }
}

impl ToWire for OrderType {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(json!(self.code()))
    }
}

impl ToWire for OrderRequest {
    fn to_wire(&self) -> BridgeResult<Value> {
        self.encode()
    }
}

/// Already encoded, passed through as is.
impl ToWire for Value {
    fn to_wire(&self) -> BridgeResult<Value> {
        Ok(self.clone())
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self) -> BridgeResult<Value> {
        match self {
            Some(v) => v.to_wire(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: ToWire + ?Sized> ToWire for &T {
    fn to_wire(&self) -> BridgeResult<Value> {
        (**self).to_wire()
    }
}

/// Builds a [`RequestFrame`]; the first encoding failure wins.
#[derive(Debug)]
pub struct WireCall {
    method: &'static str,
    args: Vec<WireArg>,
    kwargs: Vec<WireArg>,
    error: Option<BridgeError>,
}

impl WireCall {
    pub fn new(method: &'static str) -> Self {
        Self {
            method,
            args: Vec::new(),
            kwargs: Vec::new(),
            error: None,
        }
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn arg(self, name: &str, value: impl ToWire) -> Self {
        self.push(name, value, ParamKind::Positional)
    }

    pub fn kwarg(self, name: &str, value: impl ToWire) -> Self {
        self.push(name, value, ParamKind::NameOnly)
    }

    fn push(mut self, name: &str, value: impl ToWire, kind: ParamKind) -> Self {
        if self.error.is_some() {
            return self;
        }
        match value.to_wire() {
            Ok(value) => {
                let arg = WireArg {
                    name: name.to_string(),
                    value,
                };
                match kind {
                    ParamKind::Positional => self.args.push(arg),
                    ParamKind::NameOnly => self.kwargs.push(arg),
                }
            }
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn into_frame(self, id: u64) -> BridgeResult<RequestFrame> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(RequestFrame {
            id,
            method: self.method.to_string(),
            args: self.args,
            kwargs: self.kwargs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let frame = WireCall::new("symbolSelect")
            .arg("symbol", "EURUSD")
            .kwarg("enable", true)
            .into_frame(7)
            .unwrap();
        let raw = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            raw,
            json!({
                "id": 7,
                "method": "symbolSelect",
                "args": [{"name": "symbol", "value": "EURUSD"}],
                "kwargs": [{"name": "enable", "value": true}]
            })
        );
        assert_eq!(frame.arg("enable"), Some(&json!(true)));
    }

    #[test]
    fn test_encoding_failure_surfaces_on_build() {
        let call = WireCall::new("orderCalcMargin")
            .arg("action", 0i64)
            .arg("volume", f64::NAN)
            .arg("price", 1.1);
        assert!(matches!(call.into_frame(1), Err(BridgeError::Serialization(_))));
    }

    #[test]
    fn test_encoded_request_keeps_key_order() {
        let request = OrderRequest::new()
            .with("symbol", "EURUSD")
            .with("action", 1i64)
            .with("volume", 0.1);
        let encoded = request.encode().unwrap();
        let frame = WireCall::new("orderCheck")
            .arg("request", encoded)
            .into_frame(3)
            .unwrap();
        let sent = frame.arg("request").and_then(Value::as_object).unwrap();
        let keys: Vec<&str> = sent.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["symbol", "action", "volume"]);
    }

    #[test]
    fn test_datetime_and_timeframe() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(ts.to_wire().unwrap(), json!(1_700_000_000));
        assert_eq!(Timeframe::H1.to_wire().unwrap(), json!(16385));
        assert_eq!(None::<&str>.to_wire().unwrap(), Value::Null);
    }

    #[test]
    fn test_response_without_error_field() {
        let frame: ResponseFrame = serde_json::from_str(r#"{"id": 3, "result": [1, 2]}"#).unwrap();
        assert_eq!(frame.error, None);
        let frame: ResponseFrame = serde_json::from_str(r#"{"id": 4}"#).unwrap();
        assert_eq!(frame.result, Value::Null);
    }
}
