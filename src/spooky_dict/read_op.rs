use super::SpookyDict;
use crate::error::PathError;
use crate::path::{PathSegment, SpookyPath, parse_cached};
use crate::spooky_value::SpookyValue;

impl SpookyDict {
    /// Read the value at `path`, e.g. `users[1].address.city`.
    ///
    /// A missing key, an out-of-range index or a step into the wrong kind of
    /// value yields `Ok(None)`. Only a malformed path is an error.
    pub fn get(&self, path: &str) -> Result<Option<SpookyValue>, PathError> {
        let path = parse_cached(path)?;
        Ok(self.get_path(&path))
    }

    /// Read the value at an already parsed path.
    ///
    /// Every step passes through this dict's resolvers before the next
    /// segment is looked up, so lazily decoded nodes can be walked into.
    pub fn get_path(&self, path: &SpookyPath) -> Option<SpookyValue> {
        let resolvers = self.resolvers();
        let mut current = SpookyValue::Object(self.clone());
        for segment in path.segments() {
            let next = match (segment, &current) {
                (PathSegment::Named(key), SpookyValue::Object(dict)) => dict.get_raw(key),
                (PathSegment::Indexed(index), SpookyValue::Array(seq)) => seq.get(*index),
                _ => None,
            }?;
            current = resolvers.resolve(next);
        }
        Some(current)
    }

    /// Whether `path` leads to a stored value (possibly `Null`).
    pub fn contains_path(&self, path: &str) -> Result<bool, PathError> {
        Ok(self.get(path)?.is_some())
    }
}
