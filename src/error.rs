use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    Format,
    PropertyNotFound,
    IndexOutOfBounds,
    StaleView,
    InvalidRemoval,
    Parse,
    Serialize,
    Deserialize,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::Format => "format",
            ErrorKind::PropertyNotFound => "property not found",
            ErrorKind::IndexOutOfBounds => "index out of bounds",
            ErrorKind::StaleView => "stale view",
            ErrorKind::InvalidRemoval => "invalid removal",
            ErrorKind::Parse => "parse",
            ErrorKind::Serialize => "serialize",
            ErrorKind::Deserialize => "deserialize",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every fallible operation in the crate reports this error. `path` is the
/// canonical path of the element the operation ran against, or empty when
/// the failure is not tied to an element.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub path: String,
    pub message: String,
}

fn shown(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

impl Error {
    pub fn new(kind: ErrorKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(path: &str, expected: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            path,
            format!(
                "expected {expected} at '{}' but found {found}",
                shown(path)
            ),
        )
    }

    pub fn format(path: &str, type_name: &str) -> Self {
        Self::new(
            ErrorKind::Format,
            path,
            format!(
                "element at '{}' cannot be formatted as type '{type_name}'",
                shown(path)
            ),
        )
    }

    pub fn property_not_found(path: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::PropertyNotFound,
            path,
            format!("'{}' does not contain a property named '{name}'", shown(path)),
        )
    }

    pub fn index_out_of_bounds(path: &str, index: usize, len: usize) -> Self {
        Self::new(
            ErrorKind::IndexOutOfBounds,
            path,
            format!(
                "index {index} is out of bounds for array at '{}' of length {len}",
                shown(path)
            ),
        )
    }

    pub fn stale(path: &str) -> Self {
        Self::new(
            ErrorKind::StaleView,
            path,
            format!(
                "element at '{}' was replaced after it was read; request it again from the document root",
                shown(path)
            ),
        )
    }

    pub fn invalid_removal(path: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::InvalidRemoval,
            path,
            format!("object at '{}' does not have property '{name}'", shown(path)),
        )
    }

    pub fn invalid_path(input: &str, reason: &str) -> Self {
        Self::new(
            ErrorKind::Parse,
            input,
            format!("invalid path '{input}': {reason}"),
        )
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, "", message)
    }

    pub fn serialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialize, "", message)
    }

    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Deserialize, "", message)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, "", err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return Self::new(ErrorKind::Io, "", err.to_string());
        }
        Self::parse(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::serialize(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::deserialize(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn error_messages_name_the_path() {
        let err = Error::property_not_found(".a.b", "c");
        assert_eq!(err.kind(), ErrorKind::PropertyNotFound);
        assert_eq!(err.path(), ".a.b");
        assert!(err.to_string().contains("'.a.b'"));
        assert!(err.to_string().contains("'c'"));
    }

    #[rstest::rstest]
    fn root_path_is_rendered_readably() {
        let err = Error::stale("");
        assert!(err.to_string().contains("<root>"));
        assert_eq!(err.path(), "");
    }

    #[rstest::rstest]
    fn format_errors_carry_target_type() {
        let err = Error::format(".n", "i32");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(
            err.to_string(),
            "element at '.n' cannot be formatted as type 'i32'"
        );
    }

    #[rstest::rstest]
    fn json_syntax_errors_become_parse_errors() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
