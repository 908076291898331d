// ─── Error ──────────────────────────────────────────────────────────────────
use smol_str::SmolStr;
use thiserror::Error;

/// A path string that could not be parsed. Always surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("unmatched `[` at offset {offset} in `{path}`")]
    UnmatchedBracket { path: String, offset: usize },
    #[error("invalid index `{text}` at offset {offset} in `{path}`")]
    InvalidIndex {
        path: String,
        offset: usize,
        text: String,
    },
}

/// Failure of a path write. Containers created before the failing step stay in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Path(#[from] PathError),
    /// The final segment of a write is an index. Replace the whole sequence instead.
    #[error("cannot assign a sequence element directly at `{path}`")]
    IndexedWrite { path: String },
    /// An index in the middle of a write path points at a missing element.
    #[error("no element at index {index} while writing `{path}`")]
    IndexedTraversal { path: String, index: i64 },
    #[error("cannot descend into {found} at segment `{segment}` of `{path}`")]
    NotAContainer {
        path: String,
        segment: String,
        found: &'static str,
    },
}

/// Why a typed read fell back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("no value at `{path}`")]
    Missing { path: String },
    #[error("cannot convert {found} to {target}")]
    Incompatible {
        found: &'static str,
        target: &'static str,
    },
    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
    #[error("`{text}` is not a valid {target}")]
    Parse { text: SmolStr, target: &'static str },
    #[error(transparent)]
    Path(#[from] PathError),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("top-level json value must be an object, got {found}")]
    NotAnObject { found: &'static str },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
}
