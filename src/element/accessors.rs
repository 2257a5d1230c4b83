use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use super::Element;
use crate::{
    arena::{NodeView, ValueKind},
    error::{Error, Result},
    num,
    value::Value,
};

/// Types an element can be read as.
///
/// `from_value` answers straight from a logged native of the same type;
/// `from_node` parses the tree form. A `None` from `from_node` means the
/// node has the right kind but its content does not fit the type.
pub trait FromScalar: Sized {
    const KIND: ValueKind;
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
    fn from_node(node: NodeView<'_>) -> Option<Self>;
}

macro_rules! numeric_scalar {
    ($($ty:ty => $variant:ident, $parse:path;)*) => {
        $(
            impl FromScalar for $ty {
                const KIND: ValueKind = ValueKind::Number;
                const TYPE_NAME: &'static str = stringify!($ty);

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(*v),
                        _ => None,
                    }
                }

                fn from_node(node: NodeView<'_>) -> Option<Self> {
                    node.number_text().and_then($parse)
                }
            }
        )*
    };
}

numeric_scalar! {
    i8 => I8, num::parse_integer;
    i16 => I16, num::parse_integer;
    i32 => I32, num::parse_integer;
    i64 => I64, num::parse_integer;
    u8 => U8, num::parse_integer;
    u16 => U16, num::parse_integer;
    u32 => U32, num::parse_integer;
    u64 => U64, num::parse_integer;
    f32 => F32, num::parse_f32;
    f64 => F64, num::parse_f64;
}

impl FromScalar for BigDecimal {
    const KIND: ValueKind = ValueKind::Number;
    const TYPE_NAME: &'static str = "decimal";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn from_node(node: NodeView<'_>) -> Option<Self> {
        node.number_text().and_then(num::parse_decimal)
    }
}

impl FromScalar for bool {
    const KIND: ValueKind = ValueKind::Bool;
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn from_node(node: NodeView<'_>) -> Option<Self> {
        node.as_bool()
    }
}

impl FromScalar for String {
    const KIND: ValueKind = ValueKind::String;
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn from_node(node: NodeView<'_>) -> Option<Self> {
        node.as_str().map(str::to_owned)
    }
}

impl FromScalar for DateTime<FixedOffset> {
    const KIND: ValueKind = ValueKind::String;
    const TYPE_NAME: &'static str = "date-time";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    fn from_node(node: NodeView<'_>) -> Option<Self> {
        node.as_str()
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
    }
}

impl FromScalar for Uuid {
    const KIND: ValueKind = ValueKind::String;
    const TYPE_NAME: &'static str = "uuid";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uuid(v) => Some(*v),
            _ => None,
        }
    }

    fn from_node(node: NodeView<'_>) -> Option<Self> {
        node.as_str().and_then(|text| Uuid::parse_str(text).ok())
    }
}

enum Reading<T> {
    Found(T),
    Null,
    Unformattable,
}

impl<'a> Element<'a> {
    fn read<T: FromScalar>(&self) -> Result<Reading<T>> {
        let log = self.log();
        let resolved = self.resolve_in(&log)?;
        drop(log);

        if let Some(value) = resolved.change.as_ref().and_then(|c| T::from_value(c.value())) {
            return Ok(Reading::Found(value));
        }
        let node = resolved.view();
        match node.kind() {
            ValueKind::Null => Ok(Reading::Null),
            kind if kind == T::KIND => Ok(T::from_node(node).map_or(Reading::Unformattable, Reading::Found)),
            kind => Err(Error::type_mismatch(&self.path, T::KIND.as_str(), kind.as_str())),
        }
    }

    /// Reads the element as `T`. Null and content that does not fit `T`
    /// yield `None`; a node of the wrong kind is an error.
    pub fn try_get<T: FromScalar>(&self) -> Result<Option<T>> {
        Ok(match self.read::<T>()? {
            Reading::Found(value) => Some(value),
            Reading::Null | Reading::Unformattable => None,
        })
    }

    pub fn get<T: FromScalar>(&self) -> Result<T> {
        match self.read::<T>()? {
            Reading::Found(value) => Ok(value),
            Reading::Null => Err(Error::type_mismatch(
                &self.path,
                T::KIND.as_str(),
                ValueKind::Null.as_str(),
            )),
            Reading::Unformattable => Err(Error::format(&self.path, T::TYPE_NAME)),
        }
    }

    pub fn get_bool(&self) -> Result<bool> {
        self.get()
    }

    pub fn try_get_bool(&self) -> Result<Option<bool>> {
        self.try_get()
    }

    /// The string content, or `None` for null.
    pub fn get_string(&self) -> Result<Option<String>> {
        self.try_get()
    }

    pub fn try_get_i8(&self) -> Result<Option<i8>> {
        self.try_get()
    }

    pub fn get_i8(&self) -> Result<i8> {
        self.get()
    }

    pub fn try_get_i16(&self) -> Result<Option<i16>> {
        self.try_get()
    }

    pub fn get_i16(&self) -> Result<i16> {
        self.get()
    }

    pub fn try_get_i32(&self) -> Result<Option<i32>> {
        self.try_get()
    }

    pub fn get_i32(&self) -> Result<i32> {
        self.get()
    }

    pub fn try_get_i64(&self) -> Result<Option<i64>> {
        self.try_get()
    }

    pub fn get_i64(&self) -> Result<i64> {
        self.get()
    }

    pub fn try_get_u8(&self) -> Result<Option<u8>> {
        self.try_get()
    }

    pub fn get_u8(&self) -> Result<u8> {
        self.get()
    }

    pub fn try_get_u16(&self) -> Result<Option<u16>> {
        self.try_get()
    }

    pub fn get_u16(&self) -> Result<u16> {
        self.get()
    }

    pub fn try_get_u32(&self) -> Result<Option<u32>> {
        self.try_get()
    }

    pub fn get_u32(&self) -> Result<u32> {
        self.get()
    }

    pub fn try_get_u64(&self) -> Result<Option<u64>> {
        self.try_get()
    }

    pub fn get_u64(&self) -> Result<u64> {
        self.get()
    }

    pub fn try_get_f32(&self) -> Result<Option<f32>> {
        self.try_get()
    }

    pub fn get_f32(&self) -> Result<f32> {
        self.get()
    }

    pub fn try_get_f64(&self) -> Result<Option<f64>> {
        self.try_get()
    }

    pub fn get_f64(&self) -> Result<f64> {
        self.get()
    }

    pub fn try_get_decimal(&self) -> Result<Option<BigDecimal>> {
        self.try_get()
    }

    pub fn get_decimal(&self) -> Result<BigDecimal> {
        self.get()
    }

    pub fn try_get_date_time(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.try_get()
    }

    pub fn get_date_time(&self) -> Result<DateTime<FixedOffset>> {
        self.get()
    }

    pub fn try_get_uuid(&self) -> Result<Option<Uuid>> {
        self.try_get()
    }

    pub fn get_uuid(&self) -> Result<Uuid> {
        self.get()
    }
}
