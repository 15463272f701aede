use crate::config::Config;
use crate::error::ConfigError;
use crate::fields::{BoundMethod, ListProxy};
use base64::{engine::general_purpose, Engine as _};
use indexmap::IndexMap;
use std::{cmp::Ordering, fmt};

/// A basic value: primitives, ordered lists and ordered string-keyed maps
///
/// This is the only shape that crosses the serialization boundary.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

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
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Reads floats, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key when this value is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    // Ints and floats share a rank so they sort together.
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::List(_) => 4,
            Value::Map(_) => 5,
        }
    }

    /// Kind name used when values of different kinds cannot be ordered together
    pub fn sort_kind(&self) -> &'static str {
        match self {
            Value::Int(_) | Value::Float(_) => "number",
            other => other.type_name(),
        }
    }

    /// A total order over basic values
    ///
    /// Values of different kinds order by kind (null, bool, number, string, list,
    /// map). Numbers compare with [`f64::total_cmp`] unless both are ints, so NaN
    /// sorts after every other number.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let a = self.as_float().unwrap_or(f64::NAN);
                let b = other.as_float().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.total_cmp(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Value::Map(a), Value::Map(b)) => a
                .iter()
                .zip(b)
                .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.total_cmp(vb)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            other => fmt_nested(other, f),
        }
    }
}

// Strings nested in containers are quoted so the output reads as JSON.
fn fmt_nested(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Null => write!(f, "null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Int(i) => write!(f, "{}", i),
        Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
        Value::Float(x) => write!(f, "{}", x),
        Value::String(s) => write!(f, "{:?}", s),
        Value::List(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                fmt_nested(item, f)?;
            }
            write!(f, "]")
        }
        Value::Map(map) => {
            write!(f, "{{")?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}: ", key)?;
                fmt_nested(item, f)?;
            }
            write!(f, "}}")
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_float()?.partial_cmp(&other.as_float()?)
            }
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::List(a), Value::List(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),+ $(,)?) => {$(
        impl From<$ty> for Value {
            fn from($v: $ty) -> Self {
                $body
            }
        }
    )+};
}

value_from! {
    bool => |v| Value::Bool(v),
    i32 => |v| Value::Int(v.into()),
    i64 => |v| Value::Int(v),
    u16 => |v| Value::Int(v.into()),
    u32 => |v| Value::Int(v.into()),
    f64 => |v| Value::Float(v),
    &str => |v| Value::String(v.to_string()),
    String => |v| Value::String(v),
    &String => |v| Value::String(v.clone()),
    IndexMap<String, Value> => |v| Value::Map(v),
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Value {
    fn from(entries: [(K, V); N]) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl PartialEq<i32> for Value {
    fn eq(&self, other: &i32) -> bool {
        self.as_int() == Some(i64::from(*other))
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Value::Float(f) if f == other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// A value held by a config: basic data, a validated list, a nested config or a bound method
#[derive(Debug, Clone)]
pub enum FieldValue {
    Basic(Value),
    List(ListProxy),
    Config(Config),
    Method(BoundMethod),
    /// Raw bytes; the basic form is a text encoding picked by the field
    Bytes(Vec<u8>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Basic(Value::Null)
    }
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Basic(value) => value.type_name(),
            FieldValue::List(_) => "list",
            FieldValue::Config(_) => "config",
            FieldValue::Method(_) => "method",
            FieldValue::Bytes(_) => "bytes",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Basic(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Basic(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            FieldValue::Basic(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_int)
    }

    pub fn as_float(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_float)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_list(&self) -> Option<&ListProxy> {
        match self {
            FieldValue::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_config(&self) -> Option<&Config> {
        match self {
            FieldValue::Config(cfg) => Some(cfg),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&BoundMethod> {
        match self {
            FieldValue::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Converts to basic form without a field's help
    ///
    /// Methods become null and bytes are base64 encoded.
    pub fn to_basic(&self) -> Result<Value, ConfigError> {
        match self {
            FieldValue::Basic(value) => Ok(value.clone()),
            FieldValue::List(list) => list.to_basic(),
            FieldValue::Config(cfg) => cfg.to_basic(),
            FieldValue::Method(_) => Ok(Value::Null),
            FieldValue::Bytes(bytes) => Ok(Value::String(general_purpose::STANDARD.encode(bytes))),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Basic(a), FieldValue::Basic(b)) => a == b,
            (FieldValue::List(a), FieldValue::List(b)) => a == b,
            (FieldValue::List(a), FieldValue::Basic(Value::List(b)))
            | (FieldValue::Basic(Value::List(b)), FieldValue::List(a)) => a == b,
            (FieldValue::Config(a), FieldValue::Config(b)) => a.ptr_eq(b),
            (FieldValue::Bytes(a), FieldValue::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Basic(a), FieldValue::Basic(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl PartialEq<Value> for FieldValue {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (FieldValue::Basic(a), b) => a == b,
            (FieldValue::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! field_value_eq {
    ($($ty:ty),+ $(,)?) => {$(
        impl PartialEq<$ty> for FieldValue {
            fn eq(&self, other: &$ty) -> bool {
                matches!(self, FieldValue::Basic(value) if value == other)
            }
        }
    )+};
}

field_value_eq!(i32, i64, f64, bool, str, &str);

macro_rules! field_value_from {
    ($($ty:ty),+ $(,)?) => {$(
        impl From<$ty> for FieldValue {
            fn from(value: $ty) -> Self {
                FieldValue::Basic(value.into())
            }
        }
    )+};
}

field_value_from!(Value, bool, i32, i64, u16, u32, f64, &str, String, &String);

impl<T: Into<Value>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Basic(items.into())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for FieldValue {
    fn from(entries: [(K, V); N]) -> Self {
        FieldValue::Basic(entries.into())
    }
}

impl From<ListProxy> for FieldValue {
    fn from(list: ListProxy) -> Self {
        FieldValue::List(list)
    }
}

impl From<Config> for FieldValue {
    fn from(cfg: Config) -> Self {
        FieldValue::Config(cfg)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(bytes: &[u8]) -> Self {
        FieldValue::Bytes(bytes.to_vec())
    }
}

impl From<BoundMethod> for FieldValue {
    fn from(method: BoundMethod) -> Self {
        FieldValue::Method(method)
    }
}
