// bridge-common/src/value.rs
// JSON-like payload values for orderCheck / orderSend

use crate::errors::{BridgeError, BridgeResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number};

/// Tagged payload value. Mappings keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Encodes into a wire value, rejecting anything JSON cannot carry.
    pub fn encode(&self) -> BridgeResult<serde_json::Value> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number(Number::from(*i)),
            Value::Float(f) => match Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => {
                    return Err(BridgeError::serialization(format!(
                        "non-finite float {} is not representable",
                        f
                    )))
                }
            },
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(Value::encode).collect::<BridgeResult<Vec<_>>>()?,
            ),
            Value::Map(entries) => serde_json::Value::Object(encode_entries(entries)?),
        })
    }

    /// Lifts a wire value. Integers that do not fit `i64` become floats.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn encode_entries(entries: &[(String, Value)]) -> BridgeResult<Map<String, serde_json::Value>> {
    let mut map = Map::with_capacity(entries.len());
    for (key, value) in entries {
        if key.is_empty() {
            return Err(BridgeError::serialization("empty mapping key"));
        }
        if map.insert(key.clone(), value.encode()?).is_some() {
            return Err(BridgeError::serialization(format!("duplicate key {:?}", key)));
        }
    }
    Ok(map)
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encode()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

// ====================================================================
// ORDER REQUEST
// ====================================================================

/// Name → value trade intent. The terminal validates it, the bridge only
/// checks that it can be carried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderRequest {
    entries: Vec<(String, Value)>,
}

impl OrderRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`OrderRequest::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Replacing an existing key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self) -> BridgeResult<serde_json::Value> {
        Ok(serde_json::Value::Object(encode_entries(&self.entries)?))
    }

    pub fn from_json(value: serde_json::Value) -> BridgeResult<Self> {
        match Value::from_json(value) {
            Value::Map(entries) => Ok(Self { entries }),
            Value::Null => Ok(Self::default()),
            other => Err(BridgeError::serialization(format!(
                "order request must be a mapping, got {:?}",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for OrderRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        OrderRequest::from_json(raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for OrderRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encode()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for OrderRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut request = OrderRequest::new();
        for (k, v) in iter {
            request.insert(k, v);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_keeps_insertion_order() {
        let request = OrderRequest::new()
            .with("symbol", "EURUSD")
            .with("action", 1)
            .with("volume", 0.1)
            .with("comment", "bridge");
        let encoded = request.encode().unwrap();
        let keys: Vec<&String> = encoded.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["symbol", "action", "volume", "comment"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut request = OrderRequest::new().with("a", 1).with("b", 2);
        request.insert("a", 3);
        assert_eq!(request.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(request.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let request = OrderRequest::new().with("price", f64::NAN);
        assert!(matches!(request.encode(), Err(BridgeError::Serialization(_))));

        let nested = Value::List(vec![Value::Float(f64::INFINITY)]);
        assert!(nested.encode().is_err());
    }

    #[test]
    fn test_empty_key_rejected() {
        let request = OrderRequest::new().with("", 1);
        assert!(request.encode().is_err());
    }

    #[test]
    fn test_nested_mapping_survives_decode() {
        let raw = serde_json::json!({"z": 1, "a": {"y": [true, null, "x"], "b": 2.5}});
        let request = OrderRequest::from_json(raw.clone()).unwrap();
        assert_eq!(request.keys().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(request.encode().unwrap(), raw);
    }

    #[test]
    fn test_scalar_is_not_a_request() {
        assert!(OrderRequest::from_json(serde_json::json!([1, 2])).is_err());
    }
}
