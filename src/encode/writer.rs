use smallvec::SmallVec;

use super::Emit;
use crate::{error::Result, options::Indent};

#[derive(Clone, Copy)]
struct Frame {
    object: bool,
    first: bool,
}

/// JSON text writer. Layout matches `serde_json::to_string`, and
/// `Indent::Spaces(n)` matches serde_json's pretty printer with an `n`-space
/// indent. Number text is written as given, so float exponents follow ryu
/// (`1e21`) rather than serde_json (`1e+21`).
pub(crate) struct JsonWriter {
    buffer: Vec<u8>,
    pretty: bool,
    indent_unit: String,
    indent_cache: Vec<String>,
    frames: SmallVec<[Frame; 32]>,
}

impl JsonWriter {
    pub fn with_buffer(mut buffer: Vec<u8>, indent: Indent) -> Self {
        buffer.clear();
        Self {
            buffer,
            pretty: indent.is_pretty(),
            indent_unit: " ".repeat(indent.get_spaces()),
            indent_cache: vec![String::new()],
            frames: SmallVec::new(),
        }
    }

    pub fn finish_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn write_newline_indent(&mut self, depth: usize) {
        if !self.pretty {
            return;
        }
        self.buffer.push(b'\n');
        if depth == 0 || self.indent_unit.is_empty() {
            return;
        }
        if depth >= self.indent_cache.len() {
            self.extend_indent_cache(depth);
        }
        self.buffer
            .extend_from_slice(self.indent_cache[depth].as_bytes());
    }

    fn extend_indent_cache(&mut self, depth: usize) {
        while self.indent_cache.len() <= depth {
            let next = match self.indent_cache.last() {
                Some(prev) => format!("{prev}{}", self.indent_unit),
                None => String::new(),
            };
            self.indent_cache.push(next);
        }
    }

    // Objects write their separator in `key`; only array members need one
    // here.
    fn before_value(&mut self) {
        let depth = self.frames.len();
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if frame.object {
            return;
        }
        let first = std::mem::replace(&mut frame.first, false);
        if !first {
            self.buffer.push(b',');
        }
        self.write_newline_indent(depth);
    }

    fn open(&mut self, object: bool) {
        self.before_value();
        self.buffer.push(if object { b'{' } else { b'[' });
        self.frames.push(Frame {
            object,
            first: true,
        });
    }

    fn close(&mut self, object: bool) {
        if let Some(frame) = self.frames.pop() {
            if !frame.first {
                self.write_newline_indent(self.frames.len());
            }
        }
        self.buffer.push(if object { b'}' } else { b']' });
    }

    fn write_quoted(&mut self, s: &str) {
        self.buffer.push(b'"');
        let bytes = s.as_bytes();
        let mut start = 0;
        for (offset, &byte) in bytes.iter().enumerate() {
            let escape: &[u8] = match byte {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                b'\n' => b"\\n",
                b'\r' => b"\\r",
                b'\t' => b"\\t",
                0x08 => b"\\b",
                0x0c => b"\\f",
                0x00..=0x1f => {
                    self.buffer.extend_from_slice(&bytes[start..offset]);
                    self.write_unicode_escape(byte);
                    start = offset + 1;
                    continue;
                }
                _ => continue,
            };
            self.buffer.extend_from_slice(&bytes[start..offset]);
            self.buffer.extend_from_slice(escape);
            start = offset + 1;
        }
        self.buffer.extend_from_slice(&bytes[start..]);
        self.buffer.push(b'"');
    }

    fn write_unicode_escape(&mut self, byte: u8) {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        self.buffer.extend_from_slice(b"\\u00");
        self.buffer.push(HEX[usize::from(byte >> 4)]);
        self.buffer.push(HEX[usize::from(byte & 0x0f)]);
    }
}

impl Emit for JsonWriter {
    fn null(&mut self) -> Result<()> {
        self.before_value();
        self.buffer.extend_from_slice(b"null");
        Ok(())
    }

    fn bool(&mut self, value: bool) -> Result<()> {
        self.before_value();
        self.buffer
            .extend_from_slice(if value { b"true" } else { b"false" });
        Ok(())
    }

    fn number(&mut self, text: &str) -> Result<()> {
        self.before_value();
        self.buffer.extend_from_slice(text.as_bytes());
        Ok(())
    }

    fn string(&mut self, value: &str) -> Result<()> {
        self.before_value();
        self.write_quoted(value);
        Ok(())
    }

    fn begin_array(&mut self) -> Result<()> {
        self.open(false);
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.close(false);
        Ok(())
    }

    fn begin_object(&mut self) -> Result<()> {
        self.open(true);
        Ok(())
    }

    fn key(&mut self, key: &str) -> Result<()> {
        let depth = self.frames.len();
        if let Some(frame) = self.frames.last_mut() {
            let first = std::mem::replace(&mut frame.first, false);
            if !first {
                self.buffer.push(b',');
            }
        }
        self.write_newline_indent(depth);
        self.write_quoted(key);
        self.buffer.push(b':');
        if self.pretty {
            self.buffer.push(b' ');
        }
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        self.close(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::arena::Arena;

    fn write(value: &serde_json::Value, indent: Indent) -> String {
        let arena = Arena::from_value(value);
        let mut writer = JsonWriter::with_buffer(Vec::new(), indent);
        writer.node(arena.root()).unwrap();
        String::from_utf8(writer.finish_bytes()).unwrap()
    }

    #[rstest::rstest]
    fn compact_output_matches_serde_json() {
        let value = json!({"a": [1, 2.5, {"b": null}], "c": "x\"y", "d": {}, "e": []});
        assert_eq!(write(&value, Indent::None), serde_json::to_string(&value).unwrap());
    }

    #[rstest::rstest]
    fn pretty_output_matches_serde_json() {
        let value = json!({"a": [1, {"b": true}], "d": {}, "e": [], "f": "s"});
        assert_eq!(
            write(&value, Indent::Spaces(2)),
            serde_json::to_string_pretty(&value).unwrap()
        );
    }

    #[rstest::rstest]
    fn wide_indent() {
        let value = json!({"a": [1]});
        assert_eq!(write(&value, Indent::Spaces(4)), "{\n    \"a\": [\n        1\n    ]\n}");
    }

    #[rstest::rstest]
    fn control_characters_are_escaped() {
        let value = json!("tab\there\u{1}\u{8}\u{c}\r\n\\");
        assert_eq!(write(&value, Indent::None), serde_json::to_string(&value).unwrap());
        assert_eq!(write(&value, Indent::None), r#""tab\there\u0001\b\f\r\n\\""#);
    }

    #[rstest::rstest]
    fn non_ascii_passes_through() {
        let value = json!("ünïcødé ✓");
        assert_eq!(write(&value, Indent::None), "\"ünïcødé ✓\"");
    }

    #[rstest::rstest]
    fn reused_buffer_is_cleared() {
        let writer = JsonWriter::with_buffer(b"stale".to_vec(), Indent::None);
        assert!(writer.finish_bytes().is_empty());
    }
}
