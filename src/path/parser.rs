use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::PathError;

// ─── PathSegment ────────────────────────────────────────────────────────────

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A key lookup on a dict, e.g. `city` in `address.city`.
    Named(SmolStr),
    /// An element lookup on a sequence, e.g. `0` in `items[0]`.
    Indexed(i64),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Named(name) => f.write_str(name),
            PathSegment::Indexed(index) => write!(f, "[{index}]"),
        }
    }
}

// ─── SpookyPath ─────────────────────────────────────────────────────────────

/// A parsed, non-empty path. Cloning is a reference-count bump.
///
/// Grammar:
///
/// ```text
/// path        := segment ( '.' segment )*
/// segment     := name indexSuffix*
/// indexSuffix := '[' digits ']'
/// name        := any run of characters excluding '.' and '['
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpookyPath {
    segments: Arc<[PathSegment]>,
}

impl SpookyPath {
    /// Parse `path` into segments.
    ///
    /// A path without `.` or `[` is a single bare key and skips the scanner.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if is_bare_key(path) {
            return Ok(Self::bare(path));
        }
        let segments = scan(path)?;
        Ok(SpookyPath {
            segments: segments.into(),
        })
    }

    /// A single-segment path for a key known to contain neither `.` nor `[`.
    #[inline]
    pub(crate) fn bare(key: &str) -> Self {
        SpookyPath {
            segments: Arc::from([PathSegment::Named(SmolStr::new(key))]),
        }
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; parsing rejects empty paths.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every segment except the last, and the last one.
    #[inline]
    pub fn split_last(&self) -> (&[PathSegment], &PathSegment) {
        let (last, init) = self
            .segments
            .split_last()
            .unwrap_or_else(|| unreachable!("SpookyPath is never empty"));
        (init, last)
    }
}

impl FromStr for SpookyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpookyPath::parse(s)
    }
}

impl fmt::Display for SpookyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Named(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// ─── Scanner ────────────────────────────────────────────────────────────────

#[inline]
pub(crate) fn is_bare_key(path: &str) -> bool {
    !path.is_empty() && !path.bytes().any(|b| b == b'.' || b == b'[')
}

pub(super) fn scan(path: &str) -> Result<Vec<PathSegment>, PathError> {
    let bytes = path.as_bytes();
    let mut segments = Vec::with_capacity(4);
    // Start of the pending name. `.`, `[` and `]` are ASCII, so byte offsets
    // always land on char boundaries.
    let mut start = 0usize;
    let mut pos = 0usize;

    while pos < bytes.len() {
        match bytes[pos] {
            b'.' => {
                flush(path, start, pos, &mut segments);
                pos += 1;
                start = pos;
            }
            b'[' => {
                flush(path, start, pos, &mut segments);
                let close = path[pos + 1..]
                    .find(']')
                    .map(|rel| pos + 1 + rel)
                    .ok_or_else(|| PathError::UnmatchedBracket {
                        path: path.to_owned(),
                        offset: pos,
                    })?;
                let text = &path[pos + 1..close];
                let index = text
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| PathError::InvalidIndex {
                        path: path.to_owned(),
                        offset: pos,
                        text: text.to_owned(),
                    })?;
                segments.push(PathSegment::Indexed(index));
                pos = close + 1;
                start = pos;
            }
            _ => pos += 1,
        }
    }
    flush(path, start, pos, &mut segments);

    if segments.is_empty() {
        return Err(PathError::Empty);
    }
    Ok(segments)
}

#[inline]
fn flush(path: &str, start: usize, end: usize, segments: &mut Vec<PathSegment>) {
    if end > start {
        segments.push(PathSegment::Named(SmolStr::new(&path[start..end])));
    }
}
