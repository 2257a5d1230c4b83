use std::borrow::Cow;

use crate::constants::MAX_DEPTH;

/// Naming policy applied to struct field names when a typed value is
/// re-encoded into a subtree. Map keys and parsed JSON keys are never renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyNaming {
    #[default]
    AsIs,
    CamelCase,
    PascalCase,
    SnakeCase,
    KebabCase,
}

impl KeyNaming {
    pub fn apply(self, name: &str) -> Cow<'_, str> {
        match self {
            KeyNaming::AsIs => Cow::Borrowed(name),
            KeyNaming::CamelCase => {
                let mut out = String::with_capacity(name.len());
                for (position, word) in split_words(name).into_iter().enumerate() {
                    if position == 0 {
                        out.extend(word.chars().flat_map(char::to_lowercase));
                    } else {
                        push_capitalized(&mut out, word);
                    }
                }
                Cow::Owned(out)
            }
            KeyNaming::PascalCase => {
                let mut out = String::with_capacity(name.len());
                for word in split_words(name) {
                    push_capitalized(&mut out, word);
                }
                Cow::Owned(out)
            }
            KeyNaming::SnakeCase => Cow::Owned(join_lowercase(name, '_')),
            KeyNaming::KebabCase => Cow::Owned(join_lowercase(name, '-')),
        }
    }
}

fn push_capitalized(out: &mut String, word: &str) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.extend(chars.flat_map(char::to_lowercase));
    }
}

fn join_lowercase(name: &str, separator: char) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (position, word) in split_words(name).into_iter().enumerate() {
        if position > 0 {
            out.push(separator);
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

// Splits on '_', '-' and ' ' and on case transitions. An uppercase run
// followed by a lowercase letter keeps its last capital for the next word,
// so "HTTPServer" becomes ["HTTP", "Server"].
fn split_words(name: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &(offset, ch)) in chars.iter().enumerate() {
        if matches!(ch, '_' | '-' | ' ') {
            if let Some(begin) = start.take() {
                words.push(&name[begin..offset]);
            }
            continue;
        }
        let Some(begin) = start else {
            start = Some(offset);
            continue;
        };
        let prev = chars[i - 1].1;
        let next_is_lower = chars.get(i + 1).is_some_and(|&(_, next)| next.is_lowercase());
        let boundary = ch.is_uppercase()
            && (prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower));
        if boundary {
            words.push(&name[begin..offset]);
            start = Some(offset);
        }
    }
    if let Some(begin) = start {
        words.push(&name[begin..]);
    }
    words
}

/// Output layout for serialization. `None` writes compact JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indent {
    #[default]
    None,
    Spaces(usize),
}

impl Indent {
    pub fn spaces(count: usize) -> Self {
        Indent::Spaces(count)
    }

    pub fn get_spaces(self) -> usize {
        match self {
            Indent::None => 0,
            Indent::Spaces(count) => count,
        }
    }

    pub fn is_pretty(self) -> bool {
        matches!(self, Indent::Spaces(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    pub key_naming: KeyNaming,
    pub indent: Indent,
    pub max_depth: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            key_naming: KeyNaming::default(),
            indent: Indent::default(),
            max_depth: MAX_DEPTH,
        }
    }
}

impl DocumentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_naming(mut self, key_naming: KeyNaming) -> Self {
        self.key_naming = key_naming;
        self
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
