//! Mutable overlays over parsed JSON documents.
//!
//! A [`Document`] parses its input once into an immutable tree. Edits made
//! through [`Element`] views are appended to a shared [`ChangeLog`] and merged
//! in on read and on serialization, so unchanged subtrees are written back
//! exactly as they were parsed.

pub mod arena;
pub mod changes;
pub mod constants;
pub mod document;
pub mod element;
pub(crate) mod encode;
pub mod error;
pub(crate) mod num;
pub mod options;
pub mod path;
pub mod value;

pub use crate::arena::{Arena, NodeView, Scalar, ValueKind};
pub use crate::changes::{Change, ChangeKind, ChangeLog, HighWaterMark, Seq, Window};
pub use crate::constants::{MAX_DEPTH, ROOT_PATH};
pub use crate::document::Document;
pub use crate::element::{ArrayIter, Element, FromScalar, ObjectIter, Property};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::options::{DocumentOptions, Indent, KeyNaming};
pub use crate::path::Segment;
pub use crate::value::Value;
