use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use smol_str::SmolStr;
use uuid::Uuid;

use crate::{
    arena::{Arena, ValueKind},
    num,
};

/// Payload of a change-log entry.
///
/// Natives keep their exact type so a reader asking for the same type gets
/// the value back without a round trip through text. `Tree` holds a
/// pre-serialized subtree.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    String(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(BigDecimal),
    DateTime(DateTime<FixedOffset>),
    Uuid(Uuid),
    Tree(Arc<Arena>),
}

impl Value {
    /// The JSON kind this value serializes as. Non-finite floats are written
    /// as `null`.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) | Value::DateTime(_) | Value::Uuid(_) => ValueKind::String,
            Value::F32(v) if !v.is_finite() => ValueKind::Null,
            Value::F64(v) if !v.is_finite() => ValueKind::Null,
            Value::I8(_)
            | Value::I16(_)
            | Value::I32(_)
            | Value::I64(_)
            | Value::U8(_)
            | Value::U16(_)
            | Value::U32(_)
            | Value::U64(_)
            | Value::F32(_)
            | Value::F64(_)
            | Value::Decimal(_) => ValueKind::Number,
            Value::Tree(tree) => tree.root().kind(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

pub(crate) fn date_time_text(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

macro_rules! from_native {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

from_native! {
    bool => Bool,
    String => String,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    BigDecimal => Decimal,
    DateTime<FixedOffset> => DateTime,
    Uuid => Uuid,
    Arc<Arena> => Tree,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<SmolStr> for Value {
    fn from(value: SmolStr) -> Self {
        Value::String(value.into())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value.fixed_offset())
    }
}

impl From<Arena> for Value {
    fn from(value: Arena) -> Self {
        Value::Tree(Arc::new(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Value::I64(v)
                } else if let Some(v) = n.as_u64() {
                    Value::U64(v)
                } else {
                    let text = n.to_string();
                    match num::exact_f64(&text) {
                        Some(v) => Value::F64(v),
                        None => num::parse_decimal(&text).map_or(Value::Null, Value::Decimal),
                    }
                }
            }
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Value::Tree(Arc::new(Arena::from_value(value)))
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Value::String(s),
            other => Value::from(&other),
        }
    }
}
