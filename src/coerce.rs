//! Best-effort conversion of dynamic values to static Rust types.
//!
//! Resolution order for a value that is present:
//!
//! 1. the value already has the requested shape (identity)
//! 2. dict → declared record type ([`SpookyRecordType`]), shallow key copy
//! 3. `Option<T>` unwraps to `T`
//! 4. declared enums ([`SpookyEnum`]) parse by name or map by discriminant
//! 5. numeric → numeric with checked narrowing
//! 6. text/bool/number fallbacks (`"42"` → `42`, `1` → `true`, ...)
//!
//! Absent values never reach this module; the typed accessors on
//! [`SpookyDict`] turn them into the caller's default.

use smol_str::SmolStr;
use std::str::FromStr;

use crate::error::ConversionError;
use crate::resolver::ResolverChain;
use crate::spooky_dict::SpookyDict;
use crate::spooky_value::{SpookyNumber, SpookySeq, SpookyValue};

// ─── Traits ─────────────────────────────────────────────────────────────────

/// Conversion from a dynamic value. Implementations may assume `value` has
/// already been passed through `resolvers`; nested values they extract
/// should go through [`coerce`].
pub trait FromSpooky: Sized {
    fn from_spooky(value: &SpookyValue, resolvers: &ResolverChain) -> Result<Self, ConversionError>;
}

/// A named view over a [`SpookyDict`]. Declare with [`spooky_record_type!`](crate::spooky_record_type).
pub trait SpookyRecordType: Sized {
    fn from_dict(dict: SpookyDict) -> Self;
    fn as_dict(&self) -> &SpookyDict;
}

/// A fieldless enum addressable by variant name or discriminant.
/// Declare with [`spooky_enum!`](crate::spooky_enum).
pub trait SpookyEnum: Copy + 'static {
    const NAME: &'static str;
    const VARIANTS: &'static [(&'static str, Self)];

    fn discriminant(self) -> i64;

    fn name(self) -> &'static str {
        Self::VARIANTS
            .iter()
            .find(|(_, v)| v.discriminant() == self.discriminant())
            .map_or("", |(name, _)| name)
    }
}

/// Run `value` through `resolvers`, then convert it to `T`.
pub fn coerce<T: FromSpooky>(value: SpookyValue, resolvers: &ResolverChain) -> Result<T, ConversionError> {
    let value = resolvers.resolve(value);
    T::from_spooky(&value, resolvers)
}

#[inline]
fn incompatible(value: &SpookyValue, target: &'static str) -> ConversionError {
    ConversionError::Incompatible {
        found: value.kind(),
        target,
    }
}

// ─── Identity ───────────────────────────────────────────────────────────────

impl FromSpooky for SpookyValue {
    fn from_spooky(value: &SpookyValue, _: &ResolverChain) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl FromSpooky for SpookyDict {
    fn from_spooky(value: &SpookyValue, _: &ResolverChain) -> Result<Self, ConversionError> {
        match value {
            SpookyValue::Object(dict) => Ok(dict.clone()),
            other => Err(incompatible(other, "object")),
        }
    }
}

impl FromSpooky for SpookySeq {
    fn from_spooky(value: &SpookyValue, _: &ResolverChain) -> Result<Self, ConversionError> {
        match value {
            SpookyValue::Array(seq) => Ok(seq.clone()),
            other => Err(incompatible(other, "array")),
        }
    }
}

// ─── Record types ───────────────────────────────────────────────────────────

/// Materialize a record type from a dict by copying its entries into a new
/// dict on the same resolver chain. Nested containers stay shared.
pub fn record_from_value<T: SpookyRecordType>(
    value: &SpookyValue,
    target: &'static str,
) -> Result<T, ConversionError> {
    match value {
        SpookyValue::Object(dict) => Ok(T::from_dict(dict.clone_record(false))),
        other => Err(incompatible(other, target)),
    }
}

// ─── Option ─────────────────────────────────────────────────────────────────

impl<T: FromSpooky> FromSpooky for Option<T> {
    fn from_spooky(value: &SpookyValue, resolvers: &ResolverChain) -> Result<Self, ConversionError> {
        match value {
            SpookyValue::Null => Ok(None),
            other => T::from_spooky(other, resolvers).map(Some),
        }
    }
}

// ─── Enums ──────────────────────────────────────────────────────────────────

pub fn enum_from_value<T: SpookyEnum>(value: &SpookyValue) -> Result<T, ConversionError> {
    let by_discriminant = |d: i64| {
        T::VARIANTS
            .iter()
            .map(|(_, v)| *v)
            .find(|v| v.discriminant() == d)
            .ok_or_else(|| ConversionError::OutOfRange {
                value: d.to_string(),
                target: T::NAME,
            })
    };

    match value {
        SpookyValue::Str(text) => {
            let trimmed = text.trim();
            if let Some((_, v)) = T::VARIANTS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
            {
                return Ok(*v);
            }
            match trimmed.parse::<i64>() {
                Ok(d) => by_discriminant(d),
                Err(_) => Err(ConversionError::Parse {
                    text: text.clone(),
                    target: T::NAME,
                }),
            }
        }
        SpookyValue::Number(n) => match n.as_i64() {
            Some(d) => by_discriminant(d),
            None => Err(ConversionError::OutOfRange {
                value: n.to_string(),
                target: T::NAME,
            }),
        },
        other => Err(incompatible(other, T::NAME)),
    }
}

// ─── Numbers ────────────────────────────────────────────────────────────────

/// Round-half-to-even float to integer conversion through `i128`.
fn float_to_int<T: TryFrom<i128>>(f: f64, target: &'static str) -> Result<T, ConversionError> {
    let out_of_range = || ConversionError::OutOfRange {
        value: f.to_string(),
        target,
    };
    if !f.is_finite() {
        return Err(out_of_range());
    }
    let rounded = f.round_ties_even();
    if rounded < i128::MIN as f64 || rounded >= i128::MAX as f64 {
        return Err(out_of_range());
    }
    T::try_from(rounded as i128).map_err(|_| out_of_range())
}

fn number_to_int<T>(n: SpookyNumber, target: &'static str) -> Result<T, ConversionError>
where
    T: TryFrom<i64> + TryFrom<u64> + TryFrom<i128>,
{
    let out_of_range = || ConversionError::OutOfRange {
        value: n.to_string(),
        target,
    };
    match n {
        SpookyNumber::I64(i) => <T as TryFrom<i64>>::try_from(i).map_err(|_| out_of_range()),
        SpookyNumber::U64(u) => <T as TryFrom<u64>>::try_from(u).map_err(|_| out_of_range()),
        SpookyNumber::F64(f) => float_to_int(f, target),
    }
}

fn parse_text<T: FromStr>(text: &SmolStr, target: &'static str) -> Result<T, ConversionError> {
    text.trim().parse::<T>().map_err(|_| ConversionError::Parse {
        text: text.clone(),
        target,
    })
}

macro_rules! impl_from_spooky_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromSpooky for $t {
                fn from_spooky(value: &SpookyValue, _: &ResolverChain) -> Result<Self, ConversionError> {
                    const TARGET: &str = stringify!($t);
                    match value {
                        SpookyValue::Number(n) => number_to_int(*n, TARGET),
                        SpookyValue::Str(s) => parse_text(s, TARGET),
                        SpookyValue::Bool(b) => Ok(<$t>::from(*b)),
                        other => Err(incompatible(other, TARGET)),
                    }
                }
            }
        )*
    };
}

impl_from_spooky_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl FromSpooky for f64 {
    fn from_spooky(value: &SpookyValue, _: &ResolverChain) -> Result<Self, ConversionError> {
        match value {
            SpookyValue::Number(n) => Ok(n.as_f64()),
            SpookyValue::Str(s) => parse_text(s, "f64"),
            SpookyValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(incompatible(other, "f64")),
        }
    }
}

impl FromSpooky for f32 {
    fn from_spooky(value: &SpookyValue, resolvers: &ResolverChain) -> Result<Self, ConversionError> {
        let wide = f64::from_spooky(value, resolvers).map_err(|err| match err {
            ConversionError::Incompatible { found, .. } => ConversionError::Incompatible {
                found,
                target: "f32",
            },
            ConversionError::Parse { text, .. } => ConversionError::Parse { text, target: "f32" },
            other => other,
        })?;
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(ConversionError::OutOfRange {
                value: wide.to_string(),
                target: "f32",
            });
        }
        Ok(wide as f32)
    }
}

// ─── Text / bool ────────────────────────────────────────────────────────────

impl FromSpooky for bool {
    fn from_spooky(value: &SpookyValue, _: &ResolverChain) -> Result<Self, ConversionError> {
        match value {
            SpookyValue::Bool(b) => Ok(*b),
            SpookyValue::Number(n) => Ok(!n.is_zero()),
            SpookyValue::Str(s) => {
                let t = s.trim();
                if t.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if t.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(ConversionError::Parse {
                        text: s.clone(),
                        target: "bool",
                    })
                }
            }
            other => Err(incompatible(other, "bool")),
        }
    }
}

fn text_of(value: &SpookyValue, target: &'static str) -> Result<SmolStr, ConversionError> {
    match value {
        SpookyValue::Str(s) => Ok(s.clone()),
        SpookyValue::Number(n) => Ok(SmolStr::from(n.to_string())),
        SpookyValue::Bool(b) => Ok(SmolStr::new_static(if *b { "true" } else { "false" })),
        other => Err(incompatible(other, target)),
    }
}

impl FromSpooky for SmolStr {
    fn from_spooky(value: &SpookyValue, _: &ResolverChain) -> Result<Self, ConversionError> {
        text_of(value, "SmolStr")
    }
}

impl FromSpooky for String {
    fn from_spooky(value: &SpookyValue, _: &ResolverChain) -> Result<Self, ConversionError> {
        text_of(value, "String").map(|s| s.to_string())
    }
}

// ─── Sequences ──────────────────────────────────────────────────────────────

impl<T: FromSpooky> FromSpooky for Vec<T> {
    fn from_spooky(value: &SpookyValue, resolvers: &ResolverChain) -> Result<Self, ConversionError> {
        match value {
            SpookyValue::Array(seq) => seq
                .to_vec()
                .into_iter()
                .map(|item| coerce::<T>(item, resolvers))
                .collect(),
            other => Err(incompatible(other, "Vec")),
        }
    }
}
