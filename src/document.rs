use std::{fmt, io, sync::Arc};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;

use crate::{
    arena::{self, Arena, ArenaBuilder, NodeRef, TreeSeed},
    changes::{ChangeLog, Window},
    constants::ROOT_PATH,
    element::Element,
    error::{Error, Result},
    options::DocumentOptions,
};

/// A parsed JSON document with a mutable overlay.
///
/// The parse tree is never modified. Writes go to the change log and are
/// merged back in when elements are read or the document is serialized.
///
/// ```
/// use json_overlay::Document;
///
/// let doc = Document::parse_str(r#"{"name":"ada","langs":["en"]}"#)?;
/// let root = doc.root();
/// root.get_property("name")?.set("grace")?;
/// root.set_property("active", true)?;
/// assert_eq!(
///     doc.to_json_string()?,
///     r#"{"name":"grace","langs":["en"],"active":true}"#
/// );
/// # Ok::<(), json_overlay::Error>(())
/// ```
#[derive(Debug)]
pub struct Document {
    tree: Arc<Arena>,
    changes: ChangeLog,
    options: DocumentOptions,
}

impl Document {
    pub fn parse(input: &[u8]) -> Result<Self> {
        Self::parse_with_options(input, DocumentOptions::default())
    }

    pub fn parse_str(input: &str) -> Result<Self> {
        Self::parse(input.as_bytes())
    }

    pub fn parse_with_options(input: &[u8], options: DocumentOptions) -> Result<Self> {
        let arena = Arena::parse(input, options.max_depth)?;
        tracing::debug!(nodes = arena.len(), bytes = input.len(), "parsed document");
        Ok(Self::from_tree(Arc::new(arena), options))
    }

    pub fn from_reader<R: io::Read>(mut reader: R, options: DocumentOptions) -> Result<Self> {
        let mut input = Vec::new();
        reader.read_to_end(&mut input)?;
        Self::parse_with_options(&input, options)
    }

    pub fn from_value(value: &serde_json::Value) -> Self {
        Self::from_tree(Arc::new(Arena::from_value(value)), DocumentOptions::default())
    }

    /// Builds a document from a typed model, renaming struct fields with the
    /// options' naming policy.
    pub fn from_serializable<T>(value: &T, options: DocumentOptions) -> Result<Self>
    where
        T: ?Sized + Serialize,
    {
        let arena = arena::to_tree(value, &options)?;
        Ok(Self::from_tree(Arc::new(arena), options))
    }

    pub fn from_tree(tree: Arc<Arena>, options: DocumentOptions) -> Self {
        Self {
            tree,
            changes: ChangeLog::new(),
            options,
        }
    }

    /// The root element. A root replaced through the log is resolved here,
    /// so this is the way back to a valid view after any replacement.
    pub fn root(&self) -> Element<'_> {
        let window = Window::default();
        let log = self.changes.read();
        match log.try_get_change(ROOT_PATH, window) {
            Some(change) => Element::new(
                self,
                NodeRef::root(change.tree()),
                SmolStr::default(),
                window.rebase(change.sequence_index()),
            ),
            None => Element::new(
                self,
                NodeRef::root(Arc::clone(&self.tree)),
                SmolStr::default(),
                window,
            ),
        }
    }

    pub fn select(&self, selector: &str) -> Result<Element<'_>> {
        self.root().select(selector)
    }

    pub fn changes(&self) -> &ChangeLog {
        &self.changes
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// The immutable parse tree, without any changes applied.
    pub fn original(&self) -> &Arc<Arena> {
        &self.tree
    }

    pub fn to_json_string(&self) -> Result<String> {
        self.root().to_json_string()
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        self.root().to_json_vec()
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<()> {
        self.root().write_to(writer)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        self.root().to_value()
    }

    /// Collapses the overlay into a fresh document with an empty log.
    pub fn snapshot(&self) -> Result<Document> {
        let tree = self.root().to_tree()?;
        Ok(Self::from_tree(tree, self.options.clone()))
    }
}

/// Writes the merged document. [`Document::root`] is always resolved, so the
/// error arm is not expected to run; it writes the error text instead of
/// failing the formatter.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json_string() {
            Ok(text) => f.write_str(&text),
            Err(err) => write!(f, "{err}"),
        }
    }
}

impl std::str::FromStr for Document {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        Self::parse_str(input)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let options = DocumentOptions::default();
        let mut builder = ArenaBuilder::new(options.max_depth);
        de::DeserializeSeed::deserialize(TreeSeed::new(&mut builder), deserializer)?;
        let arena = builder
            .finish()
            .map_err(|err| <D::Error as de::Error>::custom(err.message))?;
        Ok(Self::from_tree(Arc::new(arena), options))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[rstest::rstest]
    fn parse_failures_are_reported() {
        let err = Document::parse_str("{\"a\":").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }

    #[rstest::rstest]
    fn root_follows_root_replacement() {
        let doc = Document::parse_str(r#"{"a":1}"#).unwrap();
        doc.root().set(json!([1, 2])).unwrap();
        let root = doc.root();
        assert_eq!(root.array_length().unwrap(), 2);
        assert_eq!(root.window().base, 1);
        assert_eq!(doc.to_json_string().unwrap(), "[1,2]");
    }

    #[rstest::rstest]
    fn original_tree_is_untouched() {
        let doc = Document::parse_str(r#"{"a":1}"#).unwrap();
        doc.root().get_property("a").unwrap().set(2).unwrap();
        assert_eq!(doc.original().root().property("a").and_then(|n| n.number_text()), Some("1"));
        assert!(doc.has_changes());
    }

    #[rstest::rstest]
    fn snapshot_collapses_the_log() {
        let doc = Document::parse_str(r#"{"a":1}"#).unwrap();
        doc.root().set_property("b", "x").unwrap();
        let snapshot = doc.snapshot().unwrap();
        assert!(!snapshot.has_changes());
        assert_eq!(snapshot.to_json_string().unwrap(), r#"{"a":1,"b":"x"}"#);
    }

    #[rstest::rstest]
    fn reader_input() {
        let doc = Document::from_reader(&b"[true]"[..], DocumentOptions::default()).unwrap();
        assert!(doc.root().get_index(0).unwrap().get_bool().unwrap());
    }

    #[rstest::rstest]
    fn serde_round_trip() {
        let doc: Document = serde_json::from_str(r#"{"k":[1,"two",null]}"#).unwrap();
        doc.select("k[1]").unwrap().set("2").unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({"k": [1, "2", null]}));
    }
}
