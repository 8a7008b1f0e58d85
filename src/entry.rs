use serde::ser::{Error as _, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A single log entry handed to the hook: its message and the structured
/// fields attached to it. Level filtering happens before an entry is built.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub message: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogEntry {
    /// Entry with no fields.
    pub fn new(message: impl Into<String>) -> Self {
        LogEntry {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field, replacing any previous value under the same name.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The field `name` if it holds a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Str(s)) => Some(s),
            _ => None,
        }
    }
}

/// Value of a log entry field.
///
/// `Json`, `Error` and `Text` carry values that chose how they want to be
/// rendered: already serialized, described as an error, or rendered to text.
/// The remaining variants serialize natively.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    Json(serde_json::Value),
    Error(String),
    Text(String),
}

impl FieldValue {
    /// A value that serializes itself to JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(FieldValue::Json)
    }

    /// An error, recorded by its description.
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        FieldValue::Error(err.to_string())
    }

    /// Anything that renders to text.
    pub fn display(value: impl fmt::Display) -> Self {
        FieldValue::Text(value.to_string())
    }

    /// Default formatting applied to fields without a custom filter:
    /// errors and text collapse to plain strings, everything else passes
    /// through.
    pub fn formatted(self) -> Self {
        match self {
            FieldValue::Error(s) | FieldValue::Text(s) => FieldValue::Str(s),
            other => other,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::I64(n) => serializer.serialize_i64(*n),
            FieldValue::U64(n) => serializer.serialize_u64(*n),
            FieldValue::F64(n) if n.is_finite() => serializer.serialize_f64(*n),
            FieldValue::F64(n) => Err(S::Error::custom(format!("unsupported value: {}", n))),
            FieldValue::Str(s) | FieldValue::Error(s) | FieldValue::Text(s) => {
                serializer.serialize_str(s)
            }
            FieldValue::Json(v) => v.serialize(serializer),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::I64(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::I64(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::U64(v.into())
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::U64(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::F64(v)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Json(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}
