//! Structural path addressing.
//!
//! A `NodePath` is an ordered list of object keys and array indices. It is
//! recorded against one snapshot and re-walked against later ones with the
//! same segments. Walking never fails: a missing key, an out-of-range index,
//! or a segment applied to the wrong kind of value yields `Resolved::Absent`.
//!
//! The display form is `['a']['b'][0]`. Quotes and backslashes inside keys
//! are escaped, so distinct paths always display differently and the display
//! string can serve as a unique key.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// One step in a path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    /// Short label used next to a value (no brackets or quotes).
    pub fn label(&self) -> String {
        match self {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => {
                f.write_str("['")?;
                for ch in key.chars() {
                    if ch == '\'' || ch == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{ch}")?;
                }
                f.write_str("']")
            }
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Ordered sequence of segments locating a value inside a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    segments: Vec<Segment>,
}

impl NodePath {
    /// The empty path (the snapshot itself).
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path with `segment` appended. `self` is unchanged.
    #[must_use]
    pub fn append(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Returns the segments of `self` after `prefix`, if `prefix` is a prefix.
    pub fn strip_prefix(&self, prefix: &NodePath) -> Option<&[Segment]> {
        self.segments.strip_prefix(prefix.segments.as_slice())
    }

    /// Display form used for labels; the root renders as `$`.
    pub fn label(&self) -> String {
        if self.is_root() {
            "$".to_string()
        } else {
            self.to_string()
        }
    }
}

impl FromIterator<Segment> for NodePath {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Outcome of walking a path against a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Found(&'a Value),
    Absent,
}

impl<'a> Resolved<'a> {
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Resolved::Found(value) => Some(value),
            Resolved::Absent => None,
        }
    }

    pub fn is_absent(self) -> bool {
        matches!(self, Resolved::Absent)
    }
}

/// Walks `path` one segment at a time starting at `root`.
pub fn resolve<'a>(root: &'a Value, path: &NodePath) -> Resolved<'a> {
    let mut current = root;
    for segment in path.segments() {
        let next = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Resolved::Absent,
        }
    }
    Resolved::Found(current)
}

/// Path parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Expected `[` at the given byte offset.
    ExpectedBracket(usize),
    /// A quoted key was not closed.
    UnterminatedKey(usize),
    /// An index was empty or not a number.
    InvalidIndex(String),
    /// Expected `]` at the given byte offset.
    ExpectedClose(usize),
}

impl fmt::Display for PathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathParseError::ExpectedBracket(at) => write!(f, "expected '[' at offset {at}"),
            PathParseError::UnterminatedKey(at) => {
                write!(f, "unterminated quoted key starting at offset {at}")
            }
            PathParseError::InvalidIndex(text) => write!(f, "invalid index '{text}'"),
            PathParseError::ExpectedClose(at) => write!(f, "expected ']' at offset {at}"),
        }
    }
}

impl std::error::Error for PathParseError {}

impl FromStr for NodePath {
    type Err = PathParseError;

    /// Parses the display grammar. An empty string and `$` both mean root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let text = text.strip_prefix('$').unwrap_or(text);
        let bytes: Vec<(usize, char)> = text.char_indices().collect();
        let mut segments = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            let (offset, ch) = bytes[pos];
            if ch != '[' {
                return Err(PathParseError::ExpectedBracket(offset));
            }
            pos += 1;

            match bytes.get(pos) {
                Some(&(start, quote @ ('\'' | '"'))) => {
                    pos += 1;
                    let mut key = String::new();
                    loop {
                        match bytes.get(pos) {
                            None => return Err(PathParseError::UnterminatedKey(start)),
                            Some(&(_, '\\')) => {
                                let Some(&(_, escaped)) = bytes.get(pos + 1) else {
                                    return Err(PathParseError::UnterminatedKey(start));
                                };
                                key.push(escaped);
                                pos += 2;
                            }
                            Some(&(_, c)) if c == quote => {
                                pos += 1;
                                break;
                            }
                            Some(&(_, c)) => {
                                key.push(c);
                                pos += 1;
                            }
                        }
                    }
                    segments.push(Segment::Key(key));
                }
                _ => {
                    let mut digits = String::new();
                    while let Some(&(_, c)) = bytes.get(pos) {
                        if c == ']' {
                            break;
                        }
                        digits.push(c);
                        pos += 1;
                    }
                    let index = digits
                        .parse::<usize>()
                        .ok()
                        .ok_or_else(|| PathParseError::InvalidIndex(digits.clone()))?;
                    segments.push(Segment::Index(index));
                }
            }

            match bytes.get(pos) {
                Some(&(_, ']')) => pos += 1,
                Some(&(offset, _)) => return Err(PathParseError::ExpectedClose(offset)),
                None => return Err(PathParseError::ExpectedClose(text.len())),
            }
        }

        Ok(Self { segments })
    }
}
