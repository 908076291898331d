use tracing::trace;

use super::SpookyDict;
use crate::error::RecordError;
use crate::path::{PathSegment, SpookyPath, parse_cached};
use crate::resolver::ResolverChain;
use crate::spooky_value::{SpookySeq, SpookyValue};

/// The container a write is currently positioned in.
enum Cursor {
    Dict(SpookyDict),
    Seq(SpookySeq),
}

impl Cursor {
    fn kind(&self) -> &'static str {
        match self {
            Cursor::Dict(_) => "object",
            Cursor::Seq(_) => "array",
        }
    }
}

impl SpookyDict {
    /// Write `value` at `path`, creating missing intermediate dicts.
    ///
    /// A missing key followed by an index segment gets an empty sequence,
    /// which the next step then fails on: sequences are never auto-sized.
    /// Assigning a sequence element directly (`items[0]` as the final
    /// segment) is unsupported; replace the whole sequence instead.
    ///
    /// On error, containers created before the failing segment stay in place.
    pub fn set(&self, path: &str, value: impl Into<SpookyValue>) -> Result<(), RecordError> {
        let parsed = parse_cached(path)?;
        self.set_path(&parsed, value.into())
    }

    pub fn set_path(&self, path: &SpookyPath, value: SpookyValue) -> Result<(), RecordError> {
        let resolvers = self.resolvers();
        let segments = path.segments();
        let (init, last) = path.split_last();

        let mut cursor = Cursor::Dict(self.clone());
        for (i, segment) in init.iter().enumerate() {
            let next_is_indexed = matches!(segments[i + 1], PathSegment::Indexed(_));
            cursor = match (segment, cursor) {
                (PathSegment::Named(key), Cursor::Dict(dict)) => {
                    descend_named(&dict, key, next_is_indexed, &resolvers, path)?
                }
                (&PathSegment::Indexed(index), Cursor::Seq(seq)) => {
                    descend_indexed(&seq, index, &resolvers, path)?
                }
                (segment, cursor) => return Err(not_a_container(path, segment, cursor.kind())),
            };
        }

        match (last, cursor) {
            (PathSegment::Indexed(_), _) => Err(RecordError::IndexedWrite {
                path: path.to_string(),
            }),
            (PathSegment::Named(key), Cursor::Dict(dict)) => {
                dict.set_member(key, value);
                Ok(())
            }
            (segment, cursor) => Err(not_a_container(path, segment, cursor.kind())),
        }
    }
}

fn not_a_container(path: &SpookyPath, segment: &PathSegment, found: &'static str) -> RecordError {
    RecordError::NotAContainer {
        path: path.to_string(),
        segment: segment.to_string(),
        found,
    }
}

fn descend_named(
    dict: &SpookyDict,
    key: &str,
    next_is_indexed: bool,
    resolvers: &ResolverChain,
    path: &SpookyPath,
) -> Result<Cursor, RecordError> {
    let stored = dict.get_raw(key);
    let resolved = stored.clone().map(|v| resolvers.resolve(v));

    match resolved {
        None | Some(SpookyValue::Null) => {
            if next_is_indexed {
                let seq = SpookySeq::new();
                dict.set_member(key, seq.clone());
                trace!(%path, key, "created intermediate sequence");
                Ok(Cursor::Seq(seq))
            } else {
                let child = SpookyDict::with_resolvers(resolvers.clone());
                dict.set_member(key, child.clone());
                trace!(%path, key, "created intermediate dict");
                Ok(Cursor::Dict(child))
            }
        }
        Some(SpookyValue::Object(child)) => {
            // Keep what the resolver produced so the write lands in the stored graph.
            if !matches!(&stored, Some(SpookyValue::Object(d)) if d.ptr_eq(&child)) {
                dict.set_member(key, child.clone());
            }
            Ok(Cursor::Dict(child))
        }
        Some(SpookyValue::Array(seq)) => {
            if !matches!(&stored, Some(SpookyValue::Array(s)) if s.ptr_eq(&seq)) {
                dict.set_member(key, seq.clone());
            }
            Ok(Cursor::Seq(seq))
        }
        Some(other) => Err(RecordError::NotAContainer {
            path: path.to_string(),
            segment: key.to_owned(),
            found: other.kind(),
        }),
    }
}

fn descend_indexed(
    seq: &SpookySeq,
    index: i64,
    resolvers: &ResolverChain,
    path: &SpookyPath,
) -> Result<Cursor, RecordError> {
    let stored = seq.get(index);
    let resolved = stored.clone().map(|v| resolvers.resolve(v));

    match resolved {
        None | Some(SpookyValue::Null) => Err(RecordError::IndexedTraversal {
            path: path.to_string(),
            index,
        }),
        Some(SpookyValue::Object(child)) => {
            if !matches!(&stored, Some(SpookyValue::Object(d)) if d.ptr_eq(&child)) {
                seq.set_unchecked(index as usize, SpookyValue::Object(child.clone()));
            }
            Ok(Cursor::Dict(child))
        }
        Some(SpookyValue::Array(inner)) => {
            if !matches!(&stored, Some(SpookyValue::Array(s)) if s.ptr_eq(&inner)) {
                seq.set_unchecked(index as usize, SpookyValue::Array(inner.clone()));
            }
            Ok(Cursor::Seq(inner))
        }
        Some(other) => Err(RecordError::NotAContainer {
            path: path.to_string(),
            segment: PathSegment::Indexed(index).to_string(),
            found: other.kind(),
        }),
    }
}
