// src/models/raw.rs

//! Raw records and page metadata returned by source adapters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One upstream record, kept in the source's own shape until normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Look up a nested value by a dotted path (`"features.parking.total"`).
    pub fn at(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |node, key| node.get(key))
            .filter(|v| !v.is_null())
    }

    /// Non-empty trimmed string at `path`. Numbers are rendered as text.
    pub fn str_at(&self, path: &str) -> Option<String> {
        let text = match self.at(path)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn f64_at(&self, path: &str) -> Option<f64> {
        match self.at(path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn bool_at(&self, path: &str) -> bool {
        self.at(path).is_some_and(is_truthy)
    }

    /// Array elements at `path`; empty when absent or not an array.
    pub fn array_at(&self, path: &str) -> &[Value] {
        self.at(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// JavaScript-style truthiness, used for loosely typed upstream flags.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// How a source says whether more pages exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSignal {
    /// Explicit total page count
    TotalPages(u32),
    /// Total result count and the page size it was split by
    TotalCount { total: u64, page_size: u32 },
    /// Boolean "has next page" flag
    HasNext(bool),
}

impl PageSignal {
    /// Whether `page` (1-based) is the last page under this signal.
    pub fn is_exhausted(&self, page: u32) -> bool {
        match *self {
            PageSignal::TotalPages(total) => page >= total,
            PageSignal::TotalCount { total, page_size } => {
                let total_pages = total.div_ceil(u64::from(page_size.max(1)));
                u64::from(page) >= total_pages
            }
            PageSignal::HasNext(has_next) => !has_next,
        }
    }
}

/// One page of raw records plus its exhaustion signal.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    pub records: Vec<RawRecord>,
    pub signal: PageSignal,
}

impl RawPage {
    pub fn new(records: Vec<RawRecord>, signal: PageSignal) -> Self {
        Self { records, signal }
    }

    /// Whether no page after `page` should be requested.
    pub fn exhausted(&self, page: u32) -> bool {
        self.signal.is_exhausted(page)
    }
}
