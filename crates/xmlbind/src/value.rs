//! Field values.

use std::fmt;

/// A scalar field value as seen by callers.
///
/// `Int` and `Hex` hold the same number space and compare equal when the
/// numbers match; the variant only records which text family (`16` or
/// `0x10`) the value renders as.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Hex(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) | Value::Hex(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used for presence fields: null, `false`, zero and empty
    /// text are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) | Value::Hex(n) => *n != 0,
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// Document text for values that have one.
    ///
    /// Null and booleans are structural (remove / create the node) and have
    /// no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null | Value::Bool(_) => None,
            Value::Int(n) => Some(n.to_string()),
            Value::Hex(n) if *n < 0 => Some(format!("-{:#x}", n.unsigned_abs())),
            Value::Hex(n) => Some(format!("{n:#x}")),
            Value::Text(s) => Some(s.clone()),
        }
    }
}

/// Parse integer text. Text containing `0x` is read as base 16 and keeps the
/// hex family; anything else is decimal.
pub fn parse_int(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.contains("0x") {
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let digits = body.strip_prefix("0x")?;
        let n = i64::from_str_radix(digits, 16).ok()?;
        return Some(Value::Hex(if negative { -n } else { n }));
    }
    text.parse().ok().map(Value::Int)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (a, b) => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            other => f.write_str(&other.to_text().unwrap_or_default()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
