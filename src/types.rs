use rustc_hash::FxHasher;
use smol_str::SmolStr;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::num::NonZeroUsize;

pub type FastMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<FxHasher>>;
pub type FastHashSet<T> = std::collections::HashSet<T, BuildHasherDefault<FxHasher>>;

// ─── CaseKey ────────────────────────────────────────────────────────────────

/// A dictionary key that hashes and compares case-insensitively but keeps
/// the spelling it was first written with.
#[derive(Debug, Clone)]
pub struct CaseKey(SmolStr);

impl CaseKey {
    #[inline]
    pub fn new(key: &str) -> Self {
        CaseKey(SmolStr::new(key))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[inline]
    pub fn into_inner(self) -> SmolStr {
        self.0
    }

    #[inline]
    fn folded(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().flat_map(char::to_lowercase)
    }
}

impl PartialEq for CaseKey {
    fn eq(&self, other: &Self) -> bool {
        // ASCII keys are the common case and avoid the char iterator.
        if self.0.is_ascii() && other.0.is_ascii() {
            return self.0.eq_ignore_ascii_case(&other.0);
        }
        self.folded().eq(other.folded())
    }
}

impl Eq for CaseKey {}

impl Hash for CaseKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.folded() {
            state.write_u32(c as u32);
        }
        state.write_u8(0xff);
    }
}

impl From<&str> for CaseKey {
    fn from(key: &str) -> Self {
        CaseKey::new(key)
    }
}

impl From<SmolStr> for CaseKey {
    fn from(key: SmolStr) -> Self {
        CaseKey(key)
    }
}

// ─── Config ─────────────────────────────────────────────────────────────────

/// Configuration for [`PathCache`](crate::path::PathCache).
#[derive(Debug, Clone, Copy)]
pub struct PathCacheConfig {
    /// Maximum number of parsed paths kept per cache.
    ///
    /// When this limit is reached, the least-recently-used path is evicted
    /// and parsed again on its next use.
    ///
    /// Default: 512 paths.
    pub capacity: NonZeroUsize,
}

impl Default for PathCacheConfig {
    fn default() -> Self {
        Self {
            capacity: NonZeroUsize::new(512).unwrap_or(NonZeroUsize::MIN),
        }
    }
}
