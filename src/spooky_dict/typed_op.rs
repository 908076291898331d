use tracing::trace;

use super::SpookyDict;
use crate::coerce::FromSpooky;
use crate::error::ConversionError;

impl SpookyDict {
    /// Read `path` as a `T`, falling back to `default` when the value is
    /// missing, `Null`, unconvertible, or the path is malformed. Never fails.
    pub fn get_typed<T: FromSpooky>(&self, path: &str, default: T) -> T {
        match self.try_get_typed(path) {
            Ok(value) => value,
            Err(err) => {
                trace!(path, %err, "typed read fell back to default");
                default
            }
        }
    }

    /// Like [`get_typed`](Self::get_typed) with `T::default()` as the fallback.
    pub fn get_typed_or_default<T: FromSpooky + Default>(&self, path: &str) -> T {
        self.get_typed(path, T::default())
    }

    /// Read `path` as a `T`, reporting why the conversion failed.
    ///
    /// Distinguishes a missing value ([`ConversionError::Missing`]) from one
    /// that is present but unconvertible.
    pub fn try_get_typed<T: FromSpooky>(&self, path: &str) -> Result<T, ConversionError> {
        let value = match self.get(path)? {
            Some(value) if !value.is_null() => value,
            _ => {
                return Err(ConversionError::Missing {
                    path: path.to_owned(),
                });
            }
        };
        // `get` already ran the resolvers on `value`.
        T::from_spooky(&value, &self.resolvers())
    }
}
