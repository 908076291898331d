//! Persistence boundary: a record is loaded from and saved to JSON text
//! through a [`TextStore`].

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::StoreError;
use crate::json;
use crate::resolver::ResolverChain;
use crate::spooky_dict::SpookyDict;

pub trait TextStore {
    fn read_text(&self, path: &Path) -> Result<String, StoreError>;
    fn write_text(&self, path: &Path, text: &str) -> Result<(), StoreError>;
}

/// [`TextStore`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl TextStore for FsStore {
    fn read_text(&self, path: &Path) -> Result<String, StoreError> {
        Ok(fs::read_to_string(path)?)
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        Ok(fs::write(path, text)?)
    }
}

/// Load the JSON object at `path` into a dict on `resolvers`.
///
/// With `lazy`, nested containers are decoded on first read.
pub fn load_record(
    store: &impl TextStore,
    path: &Path,
    resolvers: &ResolverChain,
    lazy: bool,
) -> Result<SpookyDict, StoreError> {
    let text = store.read_text(path)?;
    let dict = if lazy {
        json::decode_lazy(&text, resolvers)?
    } else {
        json::decode_with(&text, resolvers)?
    };
    debug!(path = %path.display(), keys = dict.len(), lazy, "record loaded");
    Ok(dict)
}

/// Save `dict` to `path` as pretty-printed JSON, resolving values first.
pub fn save_record(store: &impl TextStore, path: &Path, dict: &SpookyDict) -> Result<(), StoreError> {
    let text = json::encode_pretty(dict)?;
    store.write_text(path, &text)?;
    debug!(path = %path.display(), bytes = text.len(), "record saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::spooky_value::SpookyValue;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    /// In-memory store for exercising the trait seam.
    #[derive(Default)]
    struct MemStore {
        files: RefCell<HashMap<PathBuf, String>>,
    }

    impl TextStore for MemStore {
        fn read_text(&self, path: &Path) -> Result<String, StoreError> {
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound).into())
        }

        fn write_text(&self, path: &Path, text: &str) -> Result<(), StoreError> {
            self.files.borrow_mut().insert(path.to_path_buf(), text.to_owned());
            Ok(())
        }
    }

    #[test]
    fn test_fs_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_file = NamedTempFile::new()?;
        let chain = ResolverChain::new();

        let dict = SpookyDict::with_resolvers(chain.clone());
        dict.set("user.name", "Alice")?;
        dict.set("user.age", 28i64)?;
        dict.set("flags", vec![SpookyValue::from(true), SpookyValue::Null])?;
        save_record(&FsStore, tmp_file.path(), &dict)?;

        let eager = load_record(&FsStore, tmp_file.path(), &chain, false)?;
        assert!(eager.deep_eq(&dict));

        let lazy = load_record(&FsStore, tmp_file.path(), &chain, true)?;
        assert_eq!(lazy.get_typed("USER.NAME", String::new()), "Alice");
        assert!(lazy.get_typed("flags[0]", false));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().ok();
        let path = dir
            .as_ref()
            .map(|d| d.path().join("absent.json"))
            .unwrap_or_default();
        let result = load_record(&FsStore, &path, &ResolverChain::new(), false);
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[test]
    fn test_non_object_document_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemStore::default();
        let path = Path::new("list.json");
        store.write_text(path, "[1, 2, 3]")?;
        let result = load_record(&store, path, &ResolverChain::new(), true);
        assert!(matches!(
            result,
            Err(StoreError::Codec(CodecError::NotAnObject { found: "array" }))
        ));
        Ok(())
    }

    #[test]
    fn test_save_through_custom_store() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemStore::default();
        let path = Path::new("a.json");
        let dict = SpookyDict::with_resolvers(ResolverChain::new());
        dict.set_member("Key", 1i64);
        save_record(&store, path, &dict)?;

        let text = store.read_text(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value, serde_json::json!({ "Key": 1 }));
        Ok(())
    }
}
