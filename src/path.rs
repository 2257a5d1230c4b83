//! Canonical element paths.
//!
//! The root is the empty string. A property segment is `.` followed by the
//! property name with `\`, `.`, `[` and `]` escaped by a backslash, and an
//! array segment is `[i]`. Every element has exactly one canonical path, so
//! the change log can key its entries by path text alone.

use std::fmt;

use smol_str::{format_smolstr, SmolStr};

use crate::{
    constants::{
        is_path_reserved, is_segment_start, ESCAPE, INDEX_CLOSE, INDEX_OPEN, PROPERTY_SEPARATOR,
    },
    error::{Error, Result},
};

struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.as_bytes();
        let mut start = 0;
        for (offset, &byte) in bytes.iter().enumerate() {
            if is_path_reserved(byte) {
                f.write_str(&self.0[start..offset])?;
                f.write_str("\\")?;
                start = offset;
            }
        }
        f.write_str(&self.0[start..])
    }
}

fn needs_escape(name: &str) -> bool {
    let bytes = name.as_bytes();
    memchr::memchr3(PROPERTY_SEPARATOR, INDEX_OPEN, INDEX_CLOSE, bytes).is_some()
        || memchr::memchr(ESCAPE, bytes).is_some()
}

pub fn push_property(base: &str, name: &str) -> SmolStr {
    if needs_escape(name) {
        format_smolstr!("{base}.{}", Escaped(name))
    } else {
        format_smolstr!("{base}.{name}")
    }
}

pub fn push_index(base: &str, index: usize) -> SmolStr {
    format_smolstr!("{base}[{index}]")
}

/// Byte offsets at which an unescaped segment begins.
fn segment_starts(path: &str) -> impl Iterator<Item = usize> + '_ {
    let mut skip_through = None;
    let bytes = path.as_bytes();
    memchr::memchr3_iter(PROPERTY_SEPARATOR, INDEX_OPEN, ESCAPE, bytes).filter(move |&offset| {
        if skip_through.is_some_and(|end| offset <= end) {
            return false;
        }
        if bytes[offset] == ESCAPE {
            skip_through = Some(offset + 1);
            return false;
        }
        true
    })
}

/// Proper ancestors of `path`, from the root down to the parent.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> + '_ {
    segment_starts(path).map(move |offset| &path[..offset])
}

pub fn parent(path: &str) -> Option<&str> {
    segment_starts(path).last().map(|offset| &path[..offset])
}

pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && is_segment_start(path.as_bytes()[ancestor.len()])
}

/// One step of a user-supplied selector such as `items[2].name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Property(String),
    Index(usize),
}

/// Parses a selector into segments. The leading `.` is optional, names may
/// escape reserved characters with `\`, and the empty string selects the root.
pub fn parse(input: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    if input.is_empty() {
        return Ok(segments);
    }

    let mut chars = input.chars().peekable();
    let mut expect_name = true;
    match chars.peek() {
        Some('.') => {
            chars.next();
        }
        Some('[') => {
            chars.next();
            expect_name = false;
        }
        _ => {}
    }

    loop {
        if expect_name {
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '.' || ch == '[' {
                    break;
                }
                chars.next();
                if ch == '\\' {
                    let escaped = chars
                        .next()
                        .ok_or_else(|| Error::invalid_path(input, "dangling escape"))?;
                    name.push(escaped);
                } else {
                    name.push(ch);
                }
            }
            segments.push(Segment::Property(name));
        } else {
            let mut digits = String::new();
            loop {
                match chars.next() {
                    Some(']') => break,
                    Some(ch) if ch.is_ascii_digit() => digits.push(ch),
                    _ => return Err(Error::invalid_path(input, "malformed index")),
                }
            }
            let index = digits
                .parse::<usize>()
                .map_err(|_| Error::invalid_path(input, "malformed index"))?;
            segments.push(Segment::Index(index));
        }

        match chars.next() {
            None => break,
            Some('.') => expect_name = true,
            Some('[') => expect_name = false,
            Some(_) => return Err(Error::invalid_path(input, "expected '.' or '['")),
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn property_and_index_segments() {
        let a = push_property("", "a");
        let item = push_index(&a, 3);
        let name = push_property(&item, "name");
        assert_eq!(a, ".a");
        assert_eq!(item, ".a[3]");
        assert_eq!(name, ".a[3].name");
    }

    #[rstest::rstest]
    #[case("a.b", ".a\\.b")]
    #[case("x[0]", ".x\\[0\\]")]
    #[case("back\\slash", ".back\\\\slash")]
    #[case("", ".")]
    fn reserved_characters_are_escaped(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(push_property("", name), expected);
    }

    #[rstest::rstest]
    fn escaping_keeps_paths_distinct() {
        let dotted = push_property("", "a.b");
        let nested = push_property(&push_property("", "a"), "b");
        assert_ne!(dotted, nested);
    }

    #[rstest::rstest]
    fn ancestors_run_from_root_to_parent() {
        let found: Vec<&str> = ancestors(".a[2].b").collect();
        assert_eq!(found, vec!["", ".a", ".a[2]"]);
        assert_eq!(ancestors("").count(), 0);
    }

    #[rstest::rstest]
    fn ancestors_skip_escaped_separators() {
        let path = push_property(&push_property("", "a.b"), "c");
        let found: Vec<&str> = ancestors(&path).collect();
        assert_eq!(found, vec!["", ".a\\.b"]);
        assert_eq!(parent(&path), Some(".a\\.b"));
    }

    #[rstest::rstest]
    fn escaped_backslash_does_not_hide_next_separator() {
        let path = push_property(&push_property("", "a\\"), "b");
        assert_eq!(path, ".a\\\\.b");
        assert_eq!(parent(&path), Some(".a\\\\"));
    }

    #[rstest::rstest]
    fn root_has_no_parent() {
        assert_eq!(parent(""), None);
        assert_eq!(parent(".a"), Some(""));
    }

    #[rstest::rstest]
    #[case(".a.b", ".a", true)]
    #[case(".a[0]", ".a", true)]
    #[case(".ab", ".a", false)]
    #[case(".a", ".a", false)]
    #[case(".a\\.b", ".a", false)]
    #[case(".a", "", true)]
    fn descendant_checks(#[case] path: &str, #[case] ancestor: &str, #[case] expected: bool) {
        assert_eq!(is_descendant(path, ancestor), expected);
    }

    #[rstest::rstest]
    fn parse_selectors() {
        assert_eq!(
            parse("items[2].name").unwrap(),
            vec![
                Segment::Property("items".to_string()),
                Segment::Index(2),
                Segment::Property("name".to_string()),
            ]
        );
        assert_eq!(
            parse(".a").unwrap(),
            vec![Segment::Property("a".to_string())]
        );
        assert_eq!(parse("[0][1]").unwrap(), vec![Segment::Index(0), Segment::Index(1)]);
        assert!(parse("").unwrap().is_empty());
    }

    #[rstest::rstest]
    fn parse_accepts_canonical_escapes() {
        let canonical = push_property("", "a.b");
        assert_eq!(
            parse(&canonical).unwrap(),
            vec![Segment::Property("a.b".to_string())]
        );
    }

    #[rstest::rstest]
    #[case("a[")]
    #[case("a[x]")]
    #[case("a[]")]
    #[case("[0]x")]
    #[case("a\\")]
    fn malformed_selectors_fail(#[case] input: &str) {
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }
}
