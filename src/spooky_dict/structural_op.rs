use super::SpookyDict;
use crate::spooky_value::{SpookySeq, SpookyValue};
use crate::types::{FastHashSet, FastMap};

impl SpookyDict {
    /// Copy this dict.
    ///
    /// Shallow copies only the top-level entries; nested dicts and sequences
    /// stay shared with `self`. Deep copies the whole graph, including dicts
    /// inside sequences. Containers shared within the source stay shared
    /// within the copy, and cycles are reproduced.
    ///
    /// The copy uses the same resolver chain. Opaque payloads are shared.
    pub fn clone_record(&self, deep: bool) -> SpookyDict {
        if deep {
            deep_clone_dict(self, &mut CloneMemo::default())
        } else {
            self.shallow_copy()
        }
    }

    /// Merge the entries of `other` into `self`.
    ///
    /// An incoming value replaces an existing one only when
    /// `overwrite_existing` is set or the key is absent. With `deep_merge`,
    /// two dicts under the same key are merged recursively with the same
    /// flags instead. Keys only present in `self` are never removed.
    pub fn merge(&self, other: &SpookyDict, overwrite_existing: bool, deep_merge: bool) {
        let mut active = FastHashSet::default();
        merge_into(self, other, overwrite_existing, deep_merge, &mut active);
    }
}

// ─── Deep clone ─────────────────────────────────────────────────────────────

/// Source container address → its copy.
#[derive(Default)]
struct CloneMemo {
    dicts: FastMap<usize, SpookyDict>,
    seqs: FastMap<usize, SpookySeq>,
}

fn deep_clone_dict(src: &SpookyDict, memo: &mut CloneMemo) -> SpookyDict {
    if let Some(done) = memo.dicts.get(&src.addr()) {
        return done.clone();
    }
    let copy = SpookyDict::with_resolvers(src.resolvers());
    memo.dicts.insert(src.addr(), copy.clone());
    for (key, value) in src.raw_entries() {
        copy.insert_key(key, deep_clone_value(&value, memo));
    }
    copy
}

fn deep_clone_seq(src: &SpookySeq, memo: &mut CloneMemo) -> SpookySeq {
    if let Some(done) = memo.seqs.get(&src.addr()) {
        return done.clone();
    }
    let copy = SpookySeq::new();
    memo.seqs.insert(src.addr(), copy.clone());
    let items = src
        .to_vec()
        .iter()
        .map(|item| deep_clone_value(item, memo))
        .collect();
    copy.replace(items);
    copy
}

fn deep_clone_value(value: &SpookyValue, memo: &mut CloneMemo) -> SpookyValue {
    match value {
        SpookyValue::Object(dict) => SpookyValue::Object(deep_clone_dict(dict, memo)),
        SpookyValue::Array(seq) => SpookyValue::Array(deep_clone_seq(seq, memo)),
        other => other.clone(),
    }
}

// ─── Merge ──────────────────────────────────────────────────────────────────

fn merge_into(
    target: &SpookyDict,
    source: &SpookyDict,
    overwrite_existing: bool,
    deep_merge: bool,
    active: &mut FastHashSet<(usize, usize)>,
) {
    let pair = (target.addr(), source.addr());
    if target.ptr_eq(source) || !active.insert(pair) {
        return;
    }

    for (key, incoming) in source.raw_entries() {
        let existing = target.get_key(&key);
        if deep_merge {
            if let (Some(SpookyValue::Object(ours)), SpookyValue::Object(theirs)) =
                (&existing, &incoming)
            {
                merge_into(ours, theirs, overwrite_existing, deep_merge, active);
                continue;
            }
        }
        if overwrite_existing || existing.is_none() {
            target.insert_key(key, incoming);
        }
    }

    active.remove(&pair);
}
