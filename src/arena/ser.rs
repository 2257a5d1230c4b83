use serde::ser::{self, Impossible, Serialize, SerializeMap, SerializeSeq};

use super::{Arena, ArenaBuilder, NodeView, Scalar, ValueKind};
use crate::{
    error::{Error, Result},
    num,
    options::{DocumentOptions, KeyNaming},
};

/// Re-encodes any `Serialize` value as a standalone subtree, renaming struct
/// fields with the document's naming policy.
pub(crate) fn to_tree<T>(value: &T, options: &DocumentOptions) -> Result<Arena>
where
    T: ?Sized + Serialize,
{
    let mut builder = ArenaBuilder::new(options.max_depth);
    value.serialize(TreeSerializer {
        builder: &mut builder,
        naming: options.key_naming,
    })?;
    builder.finish()
}

struct TreeSerializer<'b> {
    builder: &'b mut ArenaBuilder,
    naming: KeyNaming,
}

impl<'b> ser::Serializer for TreeSerializer<'b> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = SerializeArray<'b>;
    type SerializeTuple = SerializeArray<'b>;
    type SerializeTupleStruct = SerializeArray<'b>;
    type SerializeTupleVariant = SerializeArray<'b>;
    type SerializeMap = SerializeObject<'b>;
    type SerializeStruct = SerializeObject<'b>;
    type SerializeStructVariant = SerializeObject<'b>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.builder.bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.builder.number(&num::integer_text(v))
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        match num::f32_text(v) {
            Some(text) => self.builder.number(&text),
            None => self.builder.null(),
        }
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        match num::f64_text(v) {
            Some(text) => self.builder.number(&text),
            None => self.builder.null(),
        }
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.builder.string(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.builder.string(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.builder.begin_array()?;
        for byte in v {
            self.builder.number(&num::integer_text(*byte))?;
        }
        self.builder.end_array()
    }

    fn serialize_none(self) -> Result<()> {
        self.builder.null()
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.builder.null()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.builder.null()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.builder.string(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let TreeSerializer { builder, naming } = self;
        builder.begin_object()?;
        builder.key(variant)?;
        value.serialize(TreeSerializer {
            builder: &mut *builder,
            naming,
        })?;
        builder.end_object()
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<SerializeArray<'b>> {
        self.builder.begin_array()?;
        Ok(SerializeArray {
            builder: self.builder,
            naming: self.naming,
            variant: false,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeArray<'b>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeArray<'b>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeArray<'b>> {
        self.builder.begin_object()?;
        self.builder.key(variant)?;
        self.builder.begin_array()?;
        Ok(SerializeArray {
            builder: self.builder,
            naming: self.naming,
            variant: true,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeObject<'b>> {
        self.builder.begin_object()?;
        Ok(SerializeObject {
            builder: self.builder,
            naming: self.naming,
            shape: ObjectShape::Plain,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<SerializeObject<'b>> {
        if name == num::RAW_NUMBER_TOKEN {
            return Ok(SerializeObject {
                builder: self.builder,
                naming: self.naming,
                shape: ObjectShape::RawNumber,
            });
        }
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeObject<'b>> {
        self.builder.begin_object()?;
        self.builder.key(variant)?;
        self.builder.begin_object()?;
        Ok(SerializeObject {
            builder: self.builder,
            naming: self.naming,
            shape: ObjectShape::Variant,
        })
    }
}

struct SerializeArray<'b> {
    builder: &'b mut ArenaBuilder,
    naming: KeyNaming,
    variant: bool,
}

impl SerializeArray<'_> {
    fn element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(TreeSerializer {
            builder: &mut *self.builder,
            naming: self.naming,
        })
    }

    fn close(self) -> Result<()> {
        self.builder.end_array()?;
        if self.variant {
            self.builder.end_object()?;
        }
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeArray<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeTuple for SerializeArray<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeTupleStruct for SerializeArray<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeTupleVariant for SerializeArray<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ObjectShape {
    Plain,
    Variant,
    /// serde_json's number carrier: one field holding the number's text.
    RawNumber,
}

struct SerializeObject<'b> {
    builder: &'b mut ArenaBuilder,
    naming: KeyNaming,
    shape: ObjectShape,
}

impl SerializeObject<'_> {
    fn value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(TreeSerializer {
            builder: &mut *self.builder,
            naming: self.naming,
        })
    }

    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        if self.shape == ObjectShape::RawNumber {
            let text = value.serialize(KeySerializer)?;
            return self.builder.number(&text);
        }
        self.builder.key(&self.naming.apply(key))?;
        self.value(value)
    }

    fn close(self) -> Result<()> {
        match self.shape {
            ObjectShape::Plain => self.builder.end_object(),
            ObjectShape::Variant => {
                self.builder.end_object()?;
                self.builder.end_object()
            }
            ObjectShape::RawNumber => Ok(()),
        }
    }
}

impl ser::SerializeMap for SerializeObject<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        let key = key.serialize(KeySerializer)?;
        self.builder.key(&key)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.value(value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeStruct for SerializeObject<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.field(key, value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeStructVariant for SerializeObject<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.field(key, value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

/// Map keys must end up as JSON strings; scalars are stringified the way
/// serde_json does it.
struct KeySerializer;

fn key_error(what: &str) -> Error {
    Error::serialize(format!("{what} cannot be used as an object key"))
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_bool(self, v: bool) -> Result<String> {
        Ok(if v { "true" } else { "false" }.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        Ok(num::integer_text(v).into())
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        Ok(num::integer_text(v).into())
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        Ok(num::integer_text(v).into())
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        Ok(num::integer_text(v).into())
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        Ok(num::integer_text(v).into())
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        Ok(num::integer_text(v).into())
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        Ok(num::integer_text(v).into())
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        Ok(num::integer_text(v).into())
    }

    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(key_error("a float"))
    }

    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(key_error("a float"))
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(key_error("a byte array"))
    }

    fn serialize_none(self) -> Result<String> {
        Err(key_error("none"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String> {
        Err(key_error("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(key_error("a unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String> {
        Err(key_error("a newtype variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_error("a sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_error("a tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_error("a tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_error("a tuple variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_error("a map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_error("a struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_error("a struct variant"))
    }
}

impl Serialize for NodeView<'_> {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.kind() {
            ValueKind::Array => {
                let mut seq = serializer.serialize_seq(Some(self.len()))?;
                for element in self.elements() {
                    seq.serialize_element(&element)?;
                }
                seq.end()
            }
            ValueKind::Object => {
                let mut map = serializer.serialize_map(Some(self.len()))?;
                for (key, value) in self.properties() {
                    map.serialize_entry(key, &value)?;
                }
                map.end()
            }
            _ => match self.scalar() {
                Some(Scalar::Bool(value)) => serializer.serialize_bool(value),
                Some(Scalar::String(value)) => serializer.serialize_str(value),
                Some(Scalar::Number(text)) => serialize_number(text, serializer),
                Some(Scalar::Null) | None => serializer.serialize_unit(),
            },
        }
    }
}

// Natives are used only when they reproduce the text. Anything else goes
// out as a `serde_json::Number`, which serde_json's serializers write
// verbatim.
fn serialize_number<S: ser::Serializer>(
    text: &str,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if let Some(value) = num::parse_integer::<i64>(text).filter(|_| text != "-0") {
        return serializer.serialize_i64(value);
    }
    if let Some(value) = num::parse_integer::<u64>(text) {
        return serializer.serialize_u64(value);
    }
    if let Some(value) = num::exact_f64(text) {
        return serializer.serialize_f64(value);
    }
    match text.parse::<serde_json::Number>() {
        Ok(number) => number.serialize(serializer),
        Err(_) => Err(<S::Error as ser::Error>::custom(format!(
            "'{text}' is not a JSON number"
        ))),
    }
}

impl Serialize for Arena {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}
