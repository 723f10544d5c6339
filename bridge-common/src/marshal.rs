// bridge-common/src/marshal.rs
// ====================================================================
// Wire → domain conversion
// ====================================================================
//
// `null` on the wire is the terminal's "no data" and always becomes an
// explicit absent result. Anything with an unexpected shape is a
// serialization error, never an absent result.

use crate::errors::{BridgeError, BridgeResult, TerminalError};
use crate::types::{Rate, TerminalVersion, Tick};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

fn describe(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn unexpected(what: &str, raw: &Value) -> BridgeError {
    BridgeError::serialization(format!("expected {}, got {}", what, describe(raw)))
}

// ====================================================================
// SCALARS
// ====================================================================

/// `null` decodes to `false`.
pub fn decode_bool(raw: Value) -> BridgeResult<bool> {
    match raw {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        other => Err(unexpected("bool", &other)),
    }
}

pub fn decode_int(raw: Value) -> BridgeResult<Option<i64>> {
    match &raw {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| unexpected("integer", &raw)),
        _ => Err(unexpected("integer", &raw)),
    }
}

pub fn decode_float(raw: Value) -> BridgeResult<Option<f64>> {
    match &raw {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| unexpected("float", &raw)),
        _ => Err(unexpected("float", &raw)),
    }
}

/// `shutdown` answers with anything; the value carries no information.
pub fn decode_unit(_raw: Value) -> BridgeResult<()> {
    Ok(())
}

/// `[major, minor, "build"]`
pub fn decode_version(raw: Value) -> BridgeResult<Option<TerminalVersion>> {
    let items = match raw {
        Value::Null => return Ok(None),
        Value::Array(items) if items.len() == 3 => items,
        other => return Err(unexpected("[major, minor, build]", &other)),
    };
    let part = |v: &Value| {
        v.as_i64()
            .ok_or_else(|| unexpected("integer version part", v))
    };
    let build = match &items[2] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(unexpected("build string", other)),
    };
    Ok(Some(TerminalVersion {
        major: part(&items[0])?,
        minor: part(&items[1])?,
        build,
    }))
}

/// `[code, "message"]`; `null` is the no-error sentinel.
pub fn decode_last_error(raw: Value) -> BridgeResult<TerminalError> {
    match raw {
        Value::Null => Ok(TerminalError::none()),
        Value::Array(items) if items.len() == 2 => {
            let code = items[0]
                .as_i64()
                .and_then(|c| i32::try_from(c).ok())
                .ok_or_else(|| unexpected("error code", &items[0]))?;
            let message = items[1]
                .as_str()
                .ok_or_else(|| unexpected("error message", &items[1]))?;
            Ok(TerminalError::new(code, message))
        }
        other => Err(unexpected("[code, message]", &other)),
    }
}

// ====================================================================
// RECORDS
// ====================================================================

/// One flat record. An empty object is a present record with defaults.
pub fn decode_record<T: DeserializeOwned>(raw: Value) -> BridgeResult<Option<T>> {
    match raw {
        Value::Null => Ok(None),
        Value::Object(_) => Ok(Some(serde_json::from_value(raw)?)),
        other => Err(unexpected("record", &other)),
    }
}

/// A sequence of records. Accepts a plain array or the chunked form
/// `{"total": n, "chunks": [[..], ..]}` used for large symbol lists.
/// An empty array stays a present, empty result.
pub fn decode_records<T: DeserializeOwned>(raw: Value) -> BridgeResult<Option<Vec<T>>> {
    let items = match raw {
        Value::Null => return Ok(None),
        Value::Array(items) => items,
        Value::Object(mut map) if map.contains_key("chunks") => {
            let total = map
                .get("total")
                .and_then(Value::as_u64)
                .ok_or_else(|| BridgeError::serialization("chunked result without total"))?;
            let chunks = match map.remove("chunks") {
                Some(Value::Array(chunks)) => chunks,
                _ => return Err(BridgeError::serialization("chunks must be an array")),
            };
            // `total` is untrusted; size from what actually arrived.
            let mut items = Vec::new();
            for chunk in chunks {
                match chunk {
                    Value::Array(part) => items.extend(part),
                    other => return Err(unexpected("chunk array", &other)),
                }
            }
            if items.len() as u64 != total {
                return Err(BridgeError::serialization(format!(
                    "chunked result announced {} rows, carried {}",
                    total,
                    items.len()
                )));
            }
            debug!(total, "reassembled chunked records");
            items
        }
        other => return Err(unexpected("record array", &other)),
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(_) => Ok(serde_json::from_value(item)?),
            other => Err(unexpected("record", &other)),
        })
        .collect::<BridgeResult<Vec<T>>>()
        .map(Some)
}

// ====================================================================
// TABULAR SERIES
// ====================================================================

/// A fixed-schema row of a tabular series.
pub trait SeriesRow: Sized {
    /// Field names in wire order.
    const SCHEMA: &'static [&'static str];

    fn from_cells(cells: &[Value]) -> BridgeResult<Self>;

    fn to_cells(&self) -> Vec<Value>;

    fn time(&self) -> i64;
}

fn cell_i64(cells: &[Value], idx: usize, name: &str) -> BridgeResult<i64> {
    cells[idx]
        .as_i64()
        .ok_or_else(|| BridgeError::serialization(format!("column {}: expected integer", name)))
}

fn cell_u64(cells: &[Value], idx: usize, name: &str) -> BridgeResult<u64> {
    cells[idx].as_u64().ok_or_else(|| {
        BridgeError::serialization(format!("column {}: expected unsigned integer", name))
    })
}

fn cell_f64(cells: &[Value], idx: usize, name: &str) -> BridgeResult<f64> {
    cells[idx]
        .as_f64()
        .ok_or_else(|| BridgeError::serialization(format!("column {}: expected number", name)))
}

impl SeriesRow for Rate {
    const SCHEMA: &'static [&'static str] = &[
        "time",
        "open",
        "high",
        "low",
        "close",
        "tick_volume",
        "spread",
        "real_volume",
    ];

    fn from_cells(cells: &[Value]) -> BridgeResult<Self> {
        Ok(Rate {
            time: cell_i64(cells, 0, "time")?,
            open: cell_f64(cells, 1, "open")?,
            high: cell_f64(cells, 2, "high")?,
            low: cell_f64(cells, 3, "low")?,
            close: cell_f64(cells, 4, "close")?,
            tick_volume: cell_u64(cells, 5, "tick_volume")?,
            spread: i32::try_from(cell_i64(cells, 6, "spread")?)
                .map_err(|_| BridgeError::serialization("column spread: out of range"))?,
            real_volume: cell_u64(cells, 7, "real_volume")?,
        })
    }

    fn to_cells(&self) -> Vec<Value> {
        vec![
            json!(self.time),
            json!(self.open),
            json!(self.high),
            json!(self.low),
            json!(self.close),
            json!(self.tick_volume),
            json!(self.spread),
            json!(self.real_volume),
        ]
    }

    fn time(&self) -> i64 {
        self.time
    }
}

impl SeriesRow for Tick {
    const SCHEMA: &'static [&'static str] = &[
        "time",
        "bid",
        "ask",
        "last",
        "volume",
        "time_msc",
        "flags",
        "volume_real",
    ];

    fn from_cells(cells: &[Value]) -> BridgeResult<Self> {
        Ok(Tick {
            time: cell_i64(cells, 0, "time")?,
            bid: cell_f64(cells, 1, "bid")?,
            ask: cell_f64(cells, 2, "ask")?,
            last: cell_f64(cells, 3, "last")?,
            volume: cell_u64(cells, 4, "volume")?,
            time_msc: cell_i64(cells, 5, "time_msc")?,
            flags: i32::try_from(cell_i64(cells, 6, "flags")?)
                .map_err(|_| BridgeError::serialization("column flags: out of range"))?,
            volume_real: cell_f64(cells, 7, "volume_real")?,
        })
    }

    fn to_cells(&self) -> Vec<Value> {
        vec![
            json!(self.time),
            json!(self.bid),
            json!(self.ask),
            json!(self.last),
            json!(self.volume),
            json!(self.time_msc),
            json!(self.flags),
            json!(self.volume_real),
        ]
    }

    fn time(&self) -> i64 {
        self.time
    }
}

/// Ordered rows exactly as the terminal sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<T> {
    rows: Vec<T>,
}

impl<T: SeriesRow> Series<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        T::SCHEMA
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.rows.last()
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    /// Non-decreasing by `time`. Gaps are allowed.
    pub fn is_sorted_by_time(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].time() <= w[1].time())
    }

    /// Wire form as `{"columns": [..], "rows": [..]}`.
    pub fn encode(&self) -> Value {
        json!({
            "columns": T::SCHEMA,
            "rows": self.rows.iter().map(SeriesRow::to_cells).collect::<Vec<_>>(),
        })
    }
}

impl<T> IntoIterator for Series<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Series<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<T> std::ops::Index<usize> for Series<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        &self.rows[idx]
    }
}

/// Decodes a tabular series.
///
/// Accepted shapes: an array of row arrays, an array of row objects whose
/// keys equal the schema in order, or `{"columns": [..], "rows": [..]}`
/// whose columns equal the schema. Any row whose width differs from the
/// schema is rejected.
pub fn decode_series<T: SeriesRow>(raw: Value) -> BridgeResult<Option<Series<T>>> {
    let rows = match raw {
        Value::Null => return Ok(None),
        Value::Array(rows) => rows,
        Value::Object(mut map) => {
            let columns: Vec<String> = match map.remove("columns") {
                Some(c) => serde_json::from_value(c)?,
                None => return Err(BridgeError::serialization("series object without columns")),
            };
            if columns.iter().map(String::as_str).ne(T::SCHEMA.iter().copied()) {
                return Err(BridgeError::serialization(format!(
                    "series columns {:?} do not match schema {:?}",
                    columns,
                    T::SCHEMA
                )));
            }
            match map.remove("rows") {
                Some(Value::Array(rows)) => rows,
                Some(other) => return Err(unexpected("row array", &other)),
                None => return Err(BridgeError::serialization("series object without rows")),
            }
        }
        other => return Err(unexpected("series", &other)),
    };

    let width = T::SCHEMA.len();
    let mut decoded = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let cells: Vec<Value> = match row {
            Value::Array(cells) => cells,
            Value::Object(fields) => {
                if fields.keys().map(String::as_str).ne(T::SCHEMA.iter().copied()) {
                    return Err(BridgeError::serialization(format!(
                        "row {}: fields {:?} do not match schema",
                        idx,
                        fields.keys().collect::<Vec<_>>()
                    )));
                }
                fields.into_iter().map(|(_, v)| v).collect()
            }
            other => return Err(unexpected("row", &other)),
        };
        if cells.len() != width {
            return Err(BridgeError::serialization(format!(
                "row {}: {} fields, schema has {}",
                idx,
                cells.len(),
                width
            )));
        }
        decoded.push(T::from_cells(&cells)?);
    }
    Ok(Some(Series::new(decoded)))
}
