use serde::ser::{Serialize, Serializer};
use smol_str::SmolStr;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::resolver::ResolverChain;
use crate::spooky_value::{Resolved, SpookyValue, debug_container, deep_eq_in};
use crate::types::{CaseKey, FastHashSet, FastMap};

pub(crate) struct DictInner {
    entries: FastMap<CaseKey, SpookyValue>,
    resolvers: ResolverChain,
}

/// A mutable, case-insensitive string-keyed dictionary of [`SpookyValue`]s.
///
/// `SpookyDict` is a shared handle: `Clone` aliases the same dictionary, the
/// same way assigning one record into two parents shares it. Use
/// [`SpookyDict::clone_record`] for an actual copy.
///
/// Every value handed out by a read passes through the dict's
/// [`ResolverChain`].
#[derive(Clone)]
pub struct SpookyDict(Rc<RefCell<DictInner>>);

impl Default for SpookyDict {
    fn default() -> Self {
        Self::new()
    }
}

impl SpookyDict {
    // ════════════════════════════════════════════════════════════════════════
    // Construction
    // ════════════════════════════════════════════════════════════════════════

    /// An empty dict on the global resolver chain.
    pub fn new() -> Self {
        Self::with_resolvers(ResolverChain::global().clone())
    }

    /// An empty dict on `resolvers`.
    pub fn with_resolvers(resolvers: ResolverChain) -> Self {
        SpookyDict(Rc::new(RefCell::new(DictInner {
            entries: FastMap::default(),
            resolvers,
        })))
    }

    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<SpookyValue>,
    {
        Self::from_entries_with(entries, ResolverChain::global().clone())
    }

    pub fn from_entries_with<K, V>(
        entries: impl IntoIterator<Item = (K, V)>,
        resolvers: ResolverChain,
    ) -> Self
    where
        K: AsRef<str>,
        V: Into<SpookyValue>,
    {
        let dict = Self::with_resolvers(resolvers);
        {
            let mut inner = dict.0.borrow_mut();
            for (key, value) in entries {
                inner.entries.insert(CaseKey::new(key.as_ref()), value.into());
            }
        }
        dict
    }

    /// The chain this dict resolves reads through.
    #[inline]
    pub fn resolvers(&self) -> ResolverChain {
        self.0.borrow().resolvers.clone()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Map access
    // ════════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().entries.is_empty()
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().entries.contains_key(&CaseKey::new(key))
    }

    /// Keys as first written.
    pub fn keys(&self) -> Vec<SmolStr> {
        self.0
            .borrow()
            .entries
            .keys()
            .map(|k| SmolStr::new(k.as_str()))
            .collect()
    }

    /// Snapshot of all entries, unresolved. Containers stay shared.
    pub fn entries(&self) -> Vec<(SmolStr, SpookyValue)> {
        self.0
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (SmolStr::new(k.as_str()), v.clone()))
            .collect()
    }

    /// The stored value for `key` without running resolvers.
    #[inline]
    pub fn get_raw(&self, key: &str) -> Option<SpookyValue> {
        self.get_key(&CaseKey::new(key))
    }

    /// Named-member read: the value for `key`, passed through the resolvers.
    /// The key is taken literally; `.` and `[` are not interpreted.
    pub fn get_member(&self, key: &str) -> Option<SpookyValue> {
        let raw = self.get_raw(key)?;
        Some(self.resolvers().resolve(raw))
    }

    /// Named-member write. An existing entry keeps its original key spelling.
    pub fn set_member(&self, key: &str, value: impl Into<SpookyValue>) {
        self.insert_key(CaseKey::new(key), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<SpookyValue> {
        self.0.borrow_mut().entries.remove(&CaseKey::new(key))
    }

    pub fn clear(&self) {
        self.0.borrow_mut().entries.clear();
    }

    // ════════════════════════════════════════════════════════════════════════
    // Identity / equality
    // ════════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn ptr_eq(&self, other: &SpookyDict) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Structural equality over unresolved values. Cycles are allowed.
    pub fn deep_eq(&self, other: &SpookyDict) -> bool {
        deep_eq_in(
            &SpookyValue::Object(self.clone()),
            &SpookyValue::Object(other.clone()),
            &mut FastHashSet::default(),
        )
    }

    // ════════════════════════════════════════════════════════════════════════
    // Internal
    // ════════════════════════════════════════════════════════════════════════

    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub(crate) fn get_key(&self, key: &CaseKey) -> Option<SpookyValue> {
        self.0.borrow().entries.get(key).cloned()
    }

    #[inline]
    pub(crate) fn insert_key(&self, key: CaseKey, value: SpookyValue) {
        self.0.borrow_mut().entries.insert(key, value);
    }

    pub(crate) fn raw_entries(&self) -> Vec<(CaseKey, SpookyValue)> {
        self.0
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Shallow copy of the entry map onto the same resolver chain.
    pub(crate) fn shallow_copy(&self) -> SpookyDict {
        let inner = self.0.borrow();
        SpookyDict(Rc::new(RefCell::new(DictInner {
            entries: inner.entries.clone(),
            resolvers: inner.resolvers.clone(),
        })))
    }
}

impl fmt::Debug for SpookyDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(inner) => debug_container(f, self.addr(), "{<cycle>}", |f| {
                f.debug_map()
                    .entries(inner.entries.iter().map(|(k, v)| (k.as_str(), v)))
                    .finish()
            }),
            Err(_) => f.write_str("{<borrowed>}"),
        }
    }
}

impl Serialize for SpookyDict {
    /// Serializes as a map, resolving every value through this dict's chain.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let resolvers = self.resolvers();
        Resolved::new(&SpookyValue::Object(self.clone()), &resolvers).serialize(serializer)
    }
}
