use std::fmt;

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};

use super::{Arena, ArenaBuilder};
use crate::{
    error::{Error, Result},
    num,
};

pub(super) fn parse_slice(input: &[u8], max_depth: usize) -> Result<Arena> {
    let mut builder = ArenaBuilder::new(max_depth);
    let mut de = serde_json::Deserializer::from_slice(input);
    // serde_json's own recursion guard would trip before ours on deep input.
    de.disable_recursion_limit();
    TreeSeed::new(&mut builder).deserialize(&mut de)?;
    de.end()?;
    builder.finish().map_err(|err| Error::parse(err.message))
}

/// Streams any self-describing deserializer into an [`ArenaBuilder`].
pub(crate) struct TreeSeed<'b> {
    builder: &'b mut ArenaBuilder,
}

impl<'b> TreeSeed<'b> {
    pub fn new(builder: &'b mut ArenaBuilder) -> Self {
        Self { builder }
    }
}

impl<'de> DeserializeSeed<'de> for TreeSeed<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(TreeVisitor {
            builder: self.builder,
        })
    }
}

struct TreeVisitor<'b> {
    builder: &'b mut ArenaBuilder,
}

fn lift<E: de::Error>(result: Result<()>) -> std::result::Result<(), E> {
    result.map_err(|err| E::custom(err.message))
}

impl<'de> Visitor<'de> for TreeVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<(), E> {
        lift(self.builder.bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<(), E> {
        lift(self.builder.number(&num::integer_text(value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<(), E> {
        lift(self.builder.number(&num::integer_text(value)))
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> std::result::Result<(), E> {
        lift(self.builder.number(&num::integer_text(value)))
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> std::result::Result<(), E> {
        lift(self.builder.number(&num::integer_text(value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<(), E> {
        match num::f64_text(value) {
            Some(text) => lift(self.builder.number(&text)),
            None => lift(self.builder.null()),
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<(), E> {
        lift(self.builder.string(value))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<(), E> {
        lift(self.builder.null())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<(), E> {
        lift(self.builder.null())
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        TreeSeed::new(self.builder).deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        lift(self.builder.begin_array())?;
        while seq
            .next_element_seed(TreeSeed::new(&mut *self.builder))?
            .is_some()
        {}
        lift(self.builder.end_array())
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut next = map.next_key::<String>()?;
        // serde_json hands over numbers it cannot hold natively as a
        // one-entry map carrying the source text.
        if next.as_deref() == Some(num::RAW_NUMBER_TOKEN) {
            let text = map.next_value::<String>()?;
            return lift(self.builder.number(&text));
        }
        lift(self.builder.begin_object())?;
        while let Some(key) = next {
            lift(self.builder.key(&key))?;
            map.next_value_seed(TreeSeed::new(&mut *self.builder))?;
            next = map.next_key::<String>()?;
        }
        lift(self.builder.end_object())
    }
}
