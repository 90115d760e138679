//! Scalar values and SQL literal rendering.
//!
//! [`Value`] is the single carrier for everything that ends up inside a generated statement.
//! Coercions never fail: input that cannot be interpreted yields zero / false / empty text.
//! [`Value::to_sql_literal`] is the only place that emits literals, and every non-numeric
//! kind passes through [`escape_sql_value`] on the way out.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

/// Escape a string for embedding inside a single-quoted MySQL literal.
///
/// Backslash is escaped first so the escapes added for quotes are not doubled.
pub fn escape_sql_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// A dynamically typed scalar (or list of scalars, for IN / BETWEEN).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
}

impl Value {
    /// Text form of the value. Null is empty; bytes are decoded lossily.
    pub fn as_string(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Value::Int(n) => Cow::Owned(n.to_string()),
            Value::UInt(n) => Cow::Owned(n.to_string()),
            Value::Float(f) => Cow::Owned(f.to_string()),
            Value::Text(s) => Cow::Borrowed(s),
            Value::Bytes(b) => String::from_utf8_lossy(b),
            Value::List(items) => Cow::Owned(
                items
                    .iter()
                    .map(|v| v.as_string().into_owned())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }

    /// Signed integer form. Floats truncate toward zero; unparseable text is 0.
    pub fn as_i64(&self) -> i64 {
        match self {
            Value::Bool(b) => i64::from(*b),
            Value::Int(n) => *n,
            Value::UInt(n) => *n as i64,
            Value::Float(f) => *f as i64,
            Value::Text(_) | Value::Bytes(_) => self.as_string().parse().unwrap_or(0),
            Value::Null | Value::List(_) => 0,
        }
    }

    /// Unsigned integer form. Negative integers wrap; unparseable text is 0.
    pub fn as_u64(&self) -> u64 {
        match self {
            Value::Bool(b) => u64::from(*b),
            Value::Int(n) => *n as u64,
            Value::UInt(n) => *n,
            Value::Float(f) => *f as u64,
            Value::Text(_) | Value::Bytes(_) => self.as_string().parse().unwrap_or(0),
            Value::Null | Value::List(_) => 0,
        }
    }

    /// Float form; unparseable text is 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(n) => *n as f64,
            Value::UInt(n) => *n as f64,
            Value::Float(f) => *f,
            Value::Text(_) | Value::Bytes(_) => self.as_string().parse().unwrap_or(0.0),
            Value::Null | Value::List(_) => 0.0,
        }
    }

    /// Boolean form: true when the unsigned form is non-zero.
    ///
    /// Text `"true"` (any case) is also accepted so `as_string` output round-trips.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Text(_) | Value::Bytes(_) => {
                let s = self.as_string();
                s.eq_ignore_ascii_case("true") || self.as_u64() > 0
            }
            _ => self.as_u64() > 0,
        }
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Elements of a list value; any other value is a one-element list.
    pub fn to_list(&self) -> Cow<'_, [Value]> {
        match self {
            Value::List(items) => Cow::Borrowed(items.as_slice()),
            other => Cow::Owned(vec![other.clone()]),
        }
    }

    /// Render the value as a SQL literal.
    ///
    /// Integers, finite floats and booleans (as `1`/`0`) are bare tokens; `NULL` is bare;
    /// everything else is escaped and single-quoted. Lists render their elements comma-joined.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => u8::from(*b).to_string(),
            Value::Int(n) => n.to_string(),
            Value::UInt(n) => n.to_string(),
            Value::Float(f) if f.is_finite() => f.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::to_sql_literal)
                .collect::<Vec<_>>()
                .join(","),
            other => format!("'{}'", escape_sql_value(&other.as_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $target:ty; $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

impl_from_int!(Int, i64; i8, i16, i32, i64, isize);
impl_from_int!(UInt, u64; u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(v: Cow<'_, str>) -> Self {
        Value::Text(v.into_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_from_vec {
    ($($t:ty),*) => {
        $(
            impl From<Vec<$t>> for Value {
                fn from(v: Vec<$t>) -> Self {
                    Value::List(v.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

// Vec<u8> is bytes, not a list.
impl_from_vec!(
    Value, i8, i16, i32, i64, isize, u16, u32, u64, usize, f32, f64, bool, String, &str
);

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<chrono::NaiveTime> for Value {
    fn from(v: chrono::NaiveTime) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Text(v.to_string())
    }
}

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Value {
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Value::Text(v.naive_utc().to_string())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Text(v.to_string())
    }
}

/// JSON scalars map onto the matching variant, arrays onto lists, and objects onto their
/// serialized text.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            object @ serde_json::Value::Object(_) => Value::Text(object.to_string()),
        }
    }
}

/// Decode a field from a [`Value`]. Never fails; see the coercion rules on [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Self;
}

impl FromValue for String {
    fn from_value(value: &Value) -> Self {
        value.as_string().into_owned()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Self {
        value.as_bool()
    }
}

macro_rules! impl_from_value {
    ($method:ident; $($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Self {
                    value.$method() as $t
                }
            }
        )*
    };
}

impl_from_value!(as_i64; i8, i16, i32, i64, isize);
impl_from_value!(as_u64; u8, u16, u32, u64, usize);
impl_from_value!(as_f64; f32, f64);

impl FromValue for Value {
    fn from_value(value: &Value) -> Self {
        value.clone()
    }
}
