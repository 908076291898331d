//! Pluggable value transformation applied to every value a dict hands out.
//!
//! A [`ResolverChain`] is an ordered list of [`ValueResolver`]s. The most
//! recently registered resolver is consulted first and the first one whose
//! [`ValueResolver::can_resolve`] accepts the value produces the result;
//! resolvers are never chained on a single lookup.
//!
//! The list lives behind an [`ArcSwap`]: readers take a lock-free snapshot,
//! writers publish a new list. Chains are cheap handles, so a chain can be
//! injected into each [`SpookyDict`](crate::SpookyDict) or shared through
//! [`ResolverChain::global`].

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::{Arc, LazyLock, Weak};
use tracing::debug;

use crate::spooky_value::SpookyValue;

// ─── ValueResolver ──────────────────────────────────────────────────────────

pub trait ValueResolver: Send + Sync {
    fn can_resolve(&self, value: &SpookyValue) -> bool;
    fn resolve(&self, value: &SpookyValue) -> SpookyValue;

    /// Label used in logs and to recognise a resolver kind in a chain.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A [`ValueResolver`] built from a predicate and a transform closure.
pub struct FnResolver<C, R> {
    can: C,
    res: R,
}

impl<C, R> FnResolver<C, R>
where
    C: Fn(&SpookyValue) -> bool + Send + Sync + 'static,
    R: Fn(&SpookyValue) -> SpookyValue + Send + Sync + 'static,
{
    pub fn new(can: C, res: R) -> Self {
        FnResolver { can, res }
    }

    /// Box the pair into a handle ready for [`ResolverChain::register`].
    pub fn shared(can: C, res: R) -> Arc<dyn ValueResolver> {
        Arc::new(Self::new(can, res))
    }
}

impl<C, R> ValueResolver for FnResolver<C, R>
where
    C: Fn(&SpookyValue) -> bool + Send + Sync,
    R: Fn(&SpookyValue) -> SpookyValue + Send + Sync,
{
    #[inline]
    fn can_resolve(&self, value: &SpookyValue) -> bool {
        (self.can)(value)
    }

    #[inline]
    fn resolve(&self, value: &SpookyValue) -> SpookyValue {
        (self.res)(value)
    }
}

// ─── ResolverChain ──────────────────────────────────────────────────────────

type Snapshot = Vec<Arc<dyn ValueResolver>>;

static GLOBAL: LazyLock<ResolverChain> = LazyLock::new(ResolverChain::new);

/// Shared handle to an ordered resolver list. Clones observe the same list.
#[derive(Clone)]
pub struct ResolverChain {
    snap: Arc<ArcSwap<Snapshot>>,
}

impl Default for ResolverChain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("len", &self.len())
            .finish()
    }
}

impl ResolverChain {
    /// An empty chain, independent from every other chain.
    pub fn new() -> Self {
        ResolverChain {
            snap: Arc::new(ArcSwap::from_pointee(Vec::new())),
        }
    }

    /// The process-wide chain used by dicts that were not given one.
    pub fn global() -> &'static ResolverChain {
        &GLOBAL
    }

    /// Insert `resolver` at the head so it is checked before existing ones.
    pub fn register(&self, resolver: Arc<dyn ValueResolver>) {
        self.snap.rcu(|cur| {
            let mut next: Snapshot = Vec::with_capacity(cur.len() + 1);
            next.push(resolver.clone());
            next.extend(cur.iter().cloned());
            next
        });
        debug!(resolver = resolver.name(), len = self.len(), "value resolver registered");
    }

    /// Remove the first registered instance of `resolver` (by identity).
    pub fn unregister(&self, resolver: &Arc<dyn ValueResolver>) -> bool {
        let mut removed = false;
        self.snap.rcu(|cur| {
            let mut next: Snapshot = (**cur).clone();
            removed = match next.iter().position(|r| Arc::ptr_eq(r, resolver)) {
                Some(pos) => {
                    next.remove(pos);
                    true
                }
                None => false,
            };
            next
        });
        if removed {
            debug!(resolver = resolver.name(), len = self.len(), "value resolver unregistered");
        }
        removed
    }

    pub fn clear(&self) {
        self.snap.store(Arc::new(Vec::new()));
        debug!("value resolvers cleared");
    }

    /// Registered resolvers, most recently registered first.
    pub fn list(&self) -> Vec<Arc<dyn ValueResolver>> {
        self.snap.load().iter().cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.snap.load().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snap.load().is_empty()
    }

    pub fn contains(&self, resolver: &Arc<dyn ValueResolver>) -> bool {
        self.snap.load().iter().any(|r| Arc::ptr_eq(r, resolver))
    }

    pub fn contains_named(&self, name: &str) -> bool {
        self.snap.load().iter().any(|r| r.name() == name)
    }

    /// Apply the first matching resolver, or hand `value` back unchanged.
    pub fn resolve(&self, value: SpookyValue) -> SpookyValue {
        let snap = self.snap.load_full();
        for resolver in snap.iter() {
            if resolver.can_resolve(&value) {
                return resolver.resolve(&value);
            }
        }
        value
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ResolverChain) -> bool {
        Arc::ptr_eq(&self.snap, &other.snap)
    }

    /// A handle that does not keep the chain alive. Resolvers that create
    /// dicts hold one of these to avoid a reference cycle with their chain.
    pub fn downgrade(&self) -> WeakResolverChain {
        WeakResolverChain {
            snap: Arc::downgrade(&self.snap),
        }
    }
}

#[derive(Clone)]
pub struct WeakResolverChain {
    snap: Weak<ArcSwap<Snapshot>>,
}

impl WeakResolverChain {
    pub fn upgrade(&self) -> Option<ResolverChain> {
        self.snap.upgrade().map(|snap| ResolverChain { snap })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper() -> Arc<dyn ValueResolver> {
        FnResolver::shared(
            |v| matches!(v, SpookyValue::Str(_)),
            |v| SpookyValue::from(v.as_str().unwrap_or_default().to_uppercase()),
        )
    }

    fn constant(tag: &'static str) -> Arc<dyn ValueResolver> {
        FnResolver::shared(|v| matches!(v, SpookyValue::Str(_)), move |_| SpookyValue::from(tag))
    }

    #[test]
    fn test_unclaimed_value_passes_through() {
        let chain = ResolverChain::new();
        chain.register(upper());
        assert_eq!(chain.resolve(SpookyValue::from(7i64)), SpookyValue::from(7i64));
        assert_eq!(chain.resolve(SpookyValue::Null), SpookyValue::Null);
    }

    #[test]
    fn test_latest_registration_wins() {
        let chain = ResolverChain::new();
        chain.register(constant("a"));
        chain.register(constant("b"));
        assert_eq!(chain.resolve(SpookyValue::from("x")), SpookyValue::from("b"));
    }

    #[test]
    fn test_no_chaining_between_resolvers() {
        let chain = ResolverChain::new();
        chain.register(constant("lower"));
        chain.register(upper());
        // `upper` wins; `constant` must not run on its output.
        assert_eq!(chain.resolve(SpookyValue::from("abc")), SpookyValue::from("ABC"));
    }

    #[test]
    fn test_unregister_removes_first_instance_only() {
        let chain = ResolverChain::new();
        let a = constant("a");
        chain.register(a.clone());
        chain.register(a.clone());
        assert_eq!(chain.len(), 2);

        assert!(chain.unregister(&a));
        assert_eq!(chain.len(), 1);
        assert!(chain.contains(&a));
        assert!(chain.unregister(&a));
        assert!(!chain.unregister(&a));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let chain = ResolverChain::new();
        let a = constant("a");
        let b = constant("b");
        chain.register(a.clone());
        chain.register(b.clone());

        let listed = chain.list();
        assert_eq!(listed.len(), 2);
        assert!(Arc::ptr_eq(&listed[0], &b));
        assert!(Arc::ptr_eq(&listed[1], &a));
    }

    #[test]
    fn test_clear_and_shared_handles() {
        let chain = ResolverChain::new();
        let alias = chain.clone();
        chain.register(upper());
        assert_eq!(alias.len(), 1);
        assert!(alias.ptr_eq(&chain));

        alias.clear();
        assert!(chain.is_empty());
        assert_eq!(chain.resolve(SpookyValue::from("x")), SpookyValue::from("x"));
    }

    #[test]
    fn test_chains_are_isolated() {
        let a = ResolverChain::new();
        let b = ResolverChain::new();
        a.register(upper());
        assert!(b.is_empty());
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_names_and_weak_handles() {
        let chain = ResolverChain::new();
        chain.register(upper());
        assert!(chain.contains_named(chain.list()[0].name()));
        assert!(!chain.contains_named("nope"));

        let weak = chain.downgrade();
        assert!(weak.upgrade().is_some_and(|c| c.ptr_eq(&chain)));
        drop(chain);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_concurrent_registration() {
        let chain = ResolverChain::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                let chain = chain.clone();
                s.spawn(move || {
                    for _ in 0..25 {
                        chain.register(constant("t"));
                    }
                });
            }
        });
        assert_eq!(chain.len(), 100);
    }
}
