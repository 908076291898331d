use lru::LruCache;
use smol_str::SmolStr;
use std::cell::RefCell;
use tracing::trace;

use super::parser::{SpookyPath, is_bare_key};
use crate::error::PathError;
use crate::types::PathCacheConfig;

/// LRU cache of parsed paths, keyed by the path text.
pub struct PathCache {
    entries: LruCache<SmolStr, SpookyPath>,
    hits: u64,
    misses: u64,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(PathCacheConfig::default())
    }
}

impl PathCache {
    pub fn new(config: PathCacheConfig) -> Self {
        PathCache {
            entries: LruCache::new(config.capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached parse of `path`, parsing and caching it on a miss.
    /// Failed parses are not cached.
    pub fn get_or_parse(&mut self, path: &str) -> Result<SpookyPath, PathError> {
        if is_bare_key(path) {
            return Ok(SpookyPath::bare(path));
        }
        if let Some(parsed) = self.entries.get(path) {
            self.hits += 1;
            return Ok(parsed.clone());
        }
        self.misses += 1;
        trace!(path, "path cache miss");
        let parsed = SpookyPath::parse(path)?;
        self.entries.put(SmolStr::new(path), parsed.clone());
        Ok(parsed)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// `(hits, misses)` since creation.
    #[inline]
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

thread_local! {
    static THREAD_CACHE: RefCell<PathCache> = RefCell::new(PathCache::default());
}

/// Parse `path` through this thread's cache.
pub fn parse_cached(path: &str) -> Result<SpookyPath, PathError> {
    if is_bare_key(path) {
        return Ok(SpookyPath::bare(path));
    }
    THREAD_CACHE.with(|cache| match cache.try_borrow_mut() {
        Ok(mut cache) => cache.get_or_parse(path),
        Err(_) => SpookyPath::parse(path),
    })
}

/// Replace this thread's cache with an empty one built from `config`.
pub fn configure_thread_cache(config: PathCacheConfig) {
    THREAD_CACHE.with(|cache| {
        if let Ok(mut cache) = cache.try_borrow_mut() {
            *cache = PathCache::new(config);
        }
    });
}

/// Run `f` against this thread's cache.
pub fn with_thread_cache<R>(f: impl FnOnce(&PathCache) -> R) -> Option<R> {
    THREAD_CACHE.with(|cache| cache.try_borrow().ok().map(|cache| f(&cache)))
}
