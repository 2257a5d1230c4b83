use serde::de::{
    self, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, VariantAccess,
    Visitor,
};
use serde::forward_to_deserialize_any;

use super::{NodeView, Pair, Scalar, ValueKind};
use crate::{
    error::{Error, Result},
    num,
};

// Typed models are read straight out of the arena; strings are handed to
// visitors as borrowed data so `&str` fields work for the arena's lifetime.
impl<'de> de::Deserializer<'de> for NodeView<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.kind() {
            ValueKind::Array => visitor.visit_seq(ArrayAccess {
                node: self,
                items: self.children().iter(),
            }),
            ValueKind::Object => visitor.visit_map(ObjectAccess {
                node: self,
                pairs: self.pairs().iter(),
                value: None,
            }),
            _ => match self.scalar() {
                Some(Scalar::Bool(value)) => visitor.visit_bool(value),
                Some(Scalar::String(value)) => visitor.visit_borrowed_str(value),
                Some(Scalar::Number(text)) => visit_number(text, visitor),
                Some(Scalar::Null) | None => visitor.visit_unit(),
            },
        }
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.scalar() {
            Some(Scalar::Number(text)) => match num::parse_f64(text) {
                Some(value) => visitor.visit_f64(value),
                None => Err(Error::deserialize(format!("number '{text}' is out of range"))),
            },
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.kind() == ValueKind::Null {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.kind() {
            ValueKind::String => {
                let variant = self.as_str().unwrap_or_default();
                visitor.visit_enum(variant.into_deserializer())
            }
            ValueKind::Object if self.len() == 1 => {
                let mut properties = self.properties();
                match properties.next() {
                    Some((variant, value)) => visitor.visit_enum(VariantAccessor { variant, value }),
                    None => Err(Error::deserialize("expected an externally tagged enum")),
                }
            }
            found => Err(Error::deserialize(format!(
                "expected a string or single-key object for an enum, found {found}"
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

// Text that no native reproduces is offered the way serde_json offers it, as
// a one-entry map, so `serde_json::Value` targets keep every digit.
fn visit_number<'de, V: Visitor<'de>>(text: &'de str, visitor: V) -> Result<V::Value> {
    if let Some(value) = num::parse_integer::<i64>(text).filter(|_| text != "-0") {
        return visitor.visit_i64(value);
    }
    if let Some(value) = num::parse_integer::<u64>(text) {
        return visitor.visit_u64(value);
    }
    match num::exact_f64(text) {
        Some(value) => visitor.visit_f64(value),
        None => visitor.visit_map(RawNumberAccess { text: Some(text) }),
    }
}

struct RawNumberAccess<'de> {
    text: Option<&'de str>,
}

impl<'de> MapAccess<'de> for RawNumberAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        if self.text.is_none() {
            return Ok(None);
        }
        seed.deserialize(de::value::BorrowedStrDeserializer::new(num::RAW_NUMBER_TOKEN))
            .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.text.take() {
            Some(text) => seed.deserialize(de::value::BorrowedStrDeserializer::new(text)),
            None => Err(Error::deserialize("value requested before key")),
        }
    }
}

struct ArrayAccess<'de> {
    node: NodeView<'de>,
    items: std::slice::Iter<'de, usize>,
}

impl<'de> SeqAccess<'de> for ArrayAccess<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.items.next() {
            Some(&id) => seed.deserialize(self.node.arena().view(id)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct ObjectAccess<'de> {
    node: NodeView<'de>,
    pairs: std::slice::Iter<'de, Pair>,
    value: Option<NodeView<'de>>,
}

impl<'de> MapAccess<'de> for ObjectAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(pair) = self.pairs.next() else {
            return Ok(None);
        };
        let arena = self.node.arena();
        self.value = Some(arena.view(pair.value));
        let key = arena.get_key(pair.key).unwrap_or_default();
        seed.deserialize(de::value::BorrowedStrDeserializer::new(key))
            .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(Error::deserialize("value requested before key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.pairs.len())
    }
}

struct VariantAccessor<'de> {
    variant: &'de str,
    value: NodeView<'de>,
}

impl<'de> EnumAccess<'de> for VariantAccessor<'de> {
    type Error = Error;
    type Variant = NodeView<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, NodeView<'de>)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(de::value::BorrowedStrDeserializer::<Error>::new(
            self.variant,
        ))?;
        Ok((variant, self.value))
    }
}

impl<'de> VariantAccess<'de> for NodeView<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.kind() {
            ValueKind::Null => Ok(()),
            found => Err(Error::deserialize(format!(
                "expected null for a unit variant, found {found}"
            ))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_map(self, visitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use crate::arena::Arena;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order<'a> {
        id: u32,
        customer: &'a str,
        lines: Vec<Line>,
        note: Option<String>,
        status: Status,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Line {
        sku: String,
        quantity: u16,
        price: f64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Status {
        Open,
        Shipped { carrier: String },
        Held(u8),
    }

    fn read<'a, T: Deserialize<'a>>(arena: &'a Arena) -> crate::Result<T> {
        T::deserialize(arena.root())
    }

    #[rstest::rstest]
    fn nested_struct_reads_from_arena() {
        let arena = Arena::parse(
            br#"{"id":9,"customer":"ada","lines":[{"sku":"x","quantity":2,"price":1.25}],"note":null,"status":"Open"}"#,
            16,
        )
        .unwrap();
        let order: Order<'_> = read(&arena).unwrap();
        assert_eq!(
            order,
            Order {
                id: 9,
                customer: "ada",
                lines: vec![Line {
                    sku: "x".to_string(),
                    quantity: 2,
                    price: 1.25,
                }],
                note: None,
                status: Status::Open,
            }
        );
    }

    #[rstest::rstest]
    fn tagged_enum_variants() {
        let arena = Arena::parse(br#"[{"Shipped":{"carrier":"ups"}},{"Held":3},"Open"]"#, 8).unwrap();
        let statuses: Vec<Status> = read(&arena).unwrap();
        assert_eq!(
            statuses,
            vec![
                Status::Shipped {
                    carrier: "ups".to_string()
                },
                Status::Held(3),
                Status::Open,
            ]
        );
    }

    #[rstest::rstest]
    fn out_of_range_integer_is_rejected() {
        let arena = Arena::parse(br#"{"sku":"x","quantity":70000,"price":1}"#, 8).unwrap();
        let err = read::<Line>(&arena).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Deserialize);
    }

    #[rstest::rstest]
    fn long_numbers_reach_json_values_intact() {
        let arena = Arena::parse(br#"[12345678901234567890123, 1.50, 2.5]"#, 2).unwrap();
        let value: serde_json::Value = read(&arena).unwrap();
        assert_eq!(value.to_string(), "[12345678901234567890123,1.50,2.5]");
        let floats: Vec<f64> = read(&arena).unwrap();
        assert_eq!(floats, vec![1.2345678901234568e22, 1.5, 2.5]);
    }

    #[rstest::rstest]
    fn integer_text_reads_as_float() {
        let arena = Arena::parse(b"3", 2).unwrap();
        let value: f64 = read(&arena).unwrap();
        assert_eq!(value, 3.0);
    }
}
