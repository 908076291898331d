use serde::ser::{Error as SerError, Serialize, SerializeMap, SerializeSeq, Serializer};
use smol_str::SmolStr;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::resolver::ResolverChain;
use crate::spooky_dict::SpookyDict;
use crate::types::FastHashSet;

// ─── SpookyNumber ───────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
pub enum SpookyNumber {
    I64(i64),
    U64(u64),
    F64(f64),
}

/// Integers compare by value whichever variant holds them. Floats only
/// equal floats.
impl PartialEq for SpookyNumber {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (SpookyNumber::F64(a), SpookyNumber::F64(b)) => a == b,
            (SpookyNumber::F64(_), _) | (_, SpookyNumber::F64(_)) => false,
            (a, b) => a.as_i128() == b.as_i128(),
        }
    }
}

impl fmt::Debug for SpookyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpookyNumber::I64(i) => write!(f, "I64({})", i),
            SpookyNumber::U64(u) => write!(f, "U64({})", u),
            SpookyNumber::F64(v) => write!(f, "F64({})", v),
        }
    }
}

impl fmt::Display for SpookyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpookyNumber::I64(i) => write!(f, "{}", i),
            SpookyNumber::U64(u) => write!(f, "{}", u),
            SpookyNumber::F64(v) => write!(f, "{}", v),
        }
    }
}

impl SpookyNumber {
    #[inline]
    fn as_i128(self) -> i128 {
        match self {
            SpookyNumber::I64(i) => i128::from(i),
            SpookyNumber::U64(u) => i128::from(u),
            SpookyNumber::F64(f) => f as i128,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            SpookyNumber::I64(i) => i as f64,
            SpookyNumber::U64(u) => u as f64,
            SpookyNumber::F64(f) => f,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            SpookyNumber::I64(i) => Some(i),
            SpookyNumber::U64(u) => i64::try_from(u).ok(),
            SpookyNumber::F64(f) => {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
    }

    pub fn as_u64(self) -> Option<u64> {
        match self {
            SpookyNumber::U64(u) => Some(u),
            SpookyNumber::I64(i) => u64::try_from(i).ok(),
            SpookyNumber::F64(f) => {
                if f.fract() == 0.0 && f >= 0.0 && f <= u64::MAX as f64 {
                    Some(f as u64)
                } else {
                    None
                }
            }
        }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        match self {
            SpookyNumber::I64(i) => i == 0,
            SpookyNumber::U64(u) => u == 0,
            SpookyNumber::F64(f) => f == 0.0,
        }
    }
}

// ─── SpookySeq ──────────────────────────────────────────────────────────────

/// Shared, mutable sequence of values. Cloning the handle aliases the sequence.
#[derive(Clone, Default)]
pub struct SpookySeq(Rc<RefCell<Vec<SpookyValue>>>);

impl SpookySeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<SpookyValue>) -> Self {
        SpookySeq(Rc::new(RefCell::new(items)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Element at `index`, or `None` when out of range. Negative indexes always miss.
    pub fn get(&self, index: i64) -> Option<SpookyValue> {
        let index = usize::try_from(index).ok()?;
        self.0.borrow().get(index).cloned()
    }

    pub fn push(&self, value: impl Into<SpookyValue>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Replace the whole content, returning the previous items.
    pub fn replace(&self, items: Vec<SpookyValue>) -> Vec<SpookyValue> {
        std::mem::replace(&mut *self.0.borrow_mut(), items)
    }

    /// Snapshot of the current items (container elements stay shared).
    pub fn to_vec(&self) -> Vec<SpookyValue> {
        self.0.borrow().clone()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &SpookySeq) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn set_unchecked(&self, index: usize, value: SpookyValue) {
        if let Some(slot) = self.0.borrow_mut().get_mut(index) {
            *slot = value;
        }
    }
}

impl fmt::Debug for SpookySeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(items) => debug_container(f, self.addr(), "[<cycle>]", |f| {
                f.debug_list().entries(items.iter()).finish()
            }),
            Err(_) => f.write_str("[<borrowed>]"),
        }
    }
}

impl From<Vec<SpookyValue>> for SpookySeq {
    fn from(items: Vec<SpookyValue>) -> Self {
        SpookySeq::from_vec(items)
    }
}

// ─── OpaqueValue ────────────────────────────────────────────────────────────

/// Any foreign payload stored in a dict, typically a raw decoded node that a
/// resolver turns into a regular value on read.
#[derive(Clone)]
pub struct OpaqueValue {
    inner: Rc<dyn Any>,
    type_name: &'static str,
}

impl OpaqueValue {
    pub fn new<T: Any>(payload: T) -> Self {
        OpaqueValue {
            inner: Rc::new(payload),
            type_name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn ptr_eq(&self, other: &OpaqueValue) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

// ─── SpookyValue ────────────────────────────────────────────────────────────

/// A dynamically typed value. Scalars compare by value, containers and
/// opaque payloads by identity; use [`SpookyValue::deep_eq`] for structure.
#[derive(Debug, Clone, Default)]
pub enum SpookyValue {
    #[default]
    Null,
    Bool(bool),
    Number(SpookyNumber),
    Str(SmolStr),
    Array(SpookySeq),
    Object(SpookyDict),
    Opaque(OpaqueValue),
}

impl PartialEq for SpookyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SpookyValue::Null, SpookyValue::Null) => true,
            (SpookyValue::Bool(a), SpookyValue::Bool(b)) => a == b,
            (SpookyValue::Number(a), SpookyValue::Number(b)) => a == b,
            (SpookyValue::Str(a), SpookyValue::Str(b)) => a == b,
            (SpookyValue::Array(a), SpookyValue::Array(b)) => a.ptr_eq(b),
            (SpookyValue::Object(a), SpookyValue::Object(b)) => a.ptr_eq(b),
            (SpookyValue::Opaque(a), SpookyValue::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl SpookyValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SpookyValue::Null => "null",
            SpookyValue::Bool(_) => "bool",
            SpookyValue::Number(_) => "number",
            SpookyValue::Str(_) => "string",
            SpookyValue::Array(_) => "array",
            SpookyValue::Object(_) => "object",
            SpookyValue::Opaque(_) => "opaque value",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SpookyValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SpookyValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SpookyValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SpookyValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SpookyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&SpookyDict> {
        match self {
            SpookyValue::Object(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&SpookySeq> {
        match self {
            SpookyValue::Array(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueValue> {
        match self {
            SpookyValue::Opaque(o) => Some(o),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, SpookyValue::Null)
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, SpookyValue::Array(_) | SpookyValue::Object(_))
    }

    /// Structural equality: containers are compared element by element.
    /// Cyclic graphs compare equal when their shapes match.
    pub fn deep_eq(&self, other: &SpookyValue) -> bool {
        deep_eq_in(self, other, &mut FastHashSet::default())
    }
}

/// Container pairs already under comparison count as equal, so cycles end.
pub(crate) fn deep_eq_in(
    a: &SpookyValue,
    b: &SpookyValue,
    seen: &mut FastHashSet<(usize, usize)>,
) -> bool {
    match (a, b) {
        (SpookyValue::Array(x), SpookyValue::Array(y)) => {
            if x.ptr_eq(y) || !seen.insert((x.addr(), y.addr())) {
                return true;
            }
            let (xs, ys) = (x.to_vec(), y.to_vec());
            xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(p, q)| deep_eq_in(p, q, seen))
        }
        (SpookyValue::Object(x), SpookyValue::Object(y)) => {
            if x.ptr_eq(y) || !seen.insert((x.addr(), y.addr())) {
                return true;
            }
            let entries = x.raw_entries();
            entries.len() == y.len()
                && entries.iter().all(|(key, value)| {
                    y.get_key(key)
                        .is_some_and(|theirs| deep_eq_in(value, &theirs, seen))
                })
        }
        _ => a == b,
    }
}

// ─── Debug guard ────────────────────────────────────────────────────────────

thread_local! {
    /// Containers currently being printed on this thread.
    static DEBUG_ACTIVE: RefCell<FastHashSet<usize>> = RefCell::new(FastHashSet::default());
}

/// Run `body` unless the container at `addr` is already being printed
/// further up, in which case `cycle` is written instead.
pub(crate) fn debug_container(
    f: &mut fmt::Formatter<'_>,
    addr: usize,
    cycle: &str,
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    if !DEBUG_ACTIVE.with(|active| active.borrow_mut().insert(addr)) {
        return f.write_str(cycle);
    }
    let out = body(f);
    DEBUG_ACTIVE.with(|active| active.borrow_mut().remove(&addr));
    out
}

// ─── Serialize ──────────────────────────────────────────────────────────────

/// Serializes a value after passing it through `chain`.
///
/// Entries of a nested dict go through that dict's own chain; sequence
/// elements keep the chain of their parent. Opaque `serde_json::Value`
/// nodes that no resolver claims are written verbatim; any other unresolved
/// opaque payload is a serialization error, and so is a cycle.
pub struct Resolved<'a> {
    value: &'a SpookyValue,
    chain: ResolverChain,
    active: Rc<RefCell<FastHashSet<usize>>>,
}

impl<'a> Resolved<'a> {
    pub fn new(value: &'a SpookyValue, chain: &ResolverChain) -> Self {
        Resolved {
            value,
            chain: chain.clone(),
            active: Rc::default(),
        }
    }

    fn nested<'b>(&self, value: &'b SpookyValue, chain: &ResolverChain) -> Resolved<'b> {
        Resolved {
            value,
            chain: chain.clone(),
            active: Rc::clone(&self.active),
        }
    }

    fn enter<E: SerError>(&self, addr: usize) -> Result<(), E> {
        if self.active.borrow_mut().insert(addr) {
            Ok(())
        } else {
            Err(E::custom("cannot serialize a cyclic value"))
        }
    }

    fn leave(&self, addr: usize) {
        self.active.borrow_mut().remove(&addr);
    }
}

impl Serialize for Resolved<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.chain.resolve(self.value.clone());
        match &value {
            SpookyValue::Null => serializer.serialize_none(),
            SpookyValue::Bool(b) => serializer.serialize_bool(*b),
            SpookyValue::Number(n) => match n {
                SpookyNumber::I64(i) => serializer.serialize_i64(*i),
                SpookyNumber::U64(u) => serializer.serialize_u64(*u),
                SpookyNumber::F64(f) => serializer.serialize_f64(*f),
            },
            SpookyValue::Str(s) => serializer.serialize_str(s.as_str()),
            SpookyValue::Array(seq) => {
                self.enter::<S::Error>(seq.addr())?;
                let items = seq.to_vec();
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    out.serialize_element(&self.nested(item, &self.chain))?;
                }
                self.leave(seq.addr());
                out.end()
            }
            SpookyValue::Object(dict) => {
                self.enter::<S::Error>(dict.addr())?;
                let chain = dict.resolvers();
                let entries = dict.entries();
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, item) in &entries {
                    out.serialize_entry(key.as_str(), &self.nested(item, &chain))?;
                }
                self.leave(dict.addr());
                out.end()
            }
            SpookyValue::Opaque(o) => match o.downcast_ref::<serde_json::Value>() {
                Some(node) => node.serialize(serializer),
                None => Err(S::Error::custom(format!(
                    "cannot serialize opaque value of type {}",
                    o.type_name()
                ))),
            },
        }
    }
}

impl Serialize for SpookyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SpookyValue::Object(dict) => dict.serialize(serializer),
            _ => Resolved::new(self, ResolverChain::global()).serialize(serializer),
        }
    }
}

// ─── From impls ─────────────────────────────────────────────────────────────

impl From<f64> for SpookyValue {
    fn from(n: f64) -> Self {
        SpookyValue::Number(SpookyNumber::F64(n))
    }
}

impl From<f32> for SpookyValue {
    fn from(n: f32) -> Self {
        SpookyValue::Number(SpookyNumber::F64(f64::from(n)))
    }
}

impl From<i64> for SpookyValue {
    fn from(n: i64) -> Self {
        SpookyValue::Number(SpookyNumber::I64(n))
    }
}

impl From<i32> for SpookyValue {
    fn from(n: i32) -> Self {
        SpookyValue::Number(SpookyNumber::I64(i64::from(n)))
    }
}

impl From<u64> for SpookyValue {
    fn from(n: u64) -> Self {
        SpookyValue::Number(SpookyNumber::U64(n))
    }
}

impl From<u32> for SpookyValue {
    fn from(n: u32) -> Self {
        SpookyValue::Number(SpookyNumber::U64(u64::from(n)))
    }
}

impl From<bool> for SpookyValue {
    fn from(b: bool) -> Self {
        SpookyValue::Bool(b)
    }
}

impl From<&str> for SpookyValue {
    fn from(s: &str) -> Self {
        SpookyValue::Str(SmolStr::from(s))
    }
}

impl From<String> for SpookyValue {
    fn from(s: String) -> Self {
        SpookyValue::Str(SmolStr::from(s))
    }
}

impl From<SmolStr> for SpookyValue {
    fn from(s: SmolStr) -> Self {
        SpookyValue::Str(s)
    }
}

impl From<SpookyDict> for SpookyValue {
    fn from(dict: SpookyDict) -> Self {
        SpookyValue::Object(dict)
    }
}

impl From<SpookySeq> for SpookyValue {
    fn from(seq: SpookySeq) -> Self {
        SpookyValue::Array(seq)
    }
}

impl From<Vec<SpookyValue>> for SpookyValue {
    fn from(items: Vec<SpookyValue>) -> Self {
        SpookyValue::Array(SpookySeq::from_vec(items))
    }
}

impl From<OpaqueValue> for SpookyValue {
    fn from(o: OpaqueValue) -> Self {
        SpookyValue::Opaque(o)
    }
}

impl<T: Into<SpookyValue>> From<Option<T>> for SpookyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SpookyValue::Null, Into::into)
    }
}

// ─── From serde_json::Value ─────────────────────────────────────────────────

/// Eager conversion; objects become dicts on the global resolver chain.
impl From<serde_json::Value> for SpookyValue {
    fn from(v: serde_json::Value) -> Self {
        crate::json::eager_value(v, ResolverChain::global())
    }
}
