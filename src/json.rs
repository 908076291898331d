//! JSON boundary: text → [`SpookyDict`] and back, on top of `serde_json`.
//!
//! [`decode`] converts the whole document up front. [`decode_lazy`] keeps
//! nested arrays and objects as opaque `serde_json::Value` nodes and lets
//! [`LazyJsonResolver`] turn them into values one level at a time, when a
//! read first reaches them.

use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::CodecError;
use crate::resolver::{ResolverChain, ValueResolver, WeakResolverChain};
use crate::spooky_dict::SpookyDict;
use crate::spooky_value::{OpaqueValue, SpookyNumber, SpookySeq, SpookyValue};

// ─── Decode ─────────────────────────────────────────────────────────────────

/// Decode a JSON object into a dict on the global resolver chain.
pub fn decode(text: &str) -> Result<SpookyDict, CodecError> {
    decode_with(text, ResolverChain::global())
}

/// Decode a JSON object eagerly into dicts that use `resolvers`.
pub fn decode_with(text: &str, resolvers: &ResolverChain) -> Result<SpookyDict, CodecError> {
    match serde_json::from_str::<serde_json::Value>(text)? {
        serde_json::Value::Object(map) => Ok(SpookyDict::from_entries_with(
            map.into_iter().map(|(k, v)| (k, eager_value(v, resolvers))),
            resolvers.clone(),
        )),
        other => Err(CodecError::NotAnObject {
            found: json_kind(&other),
        }),
    }
}

/// Decode a JSON object, deferring nested containers until they are read.
///
/// Installs [`LazyJsonResolver`] on `resolvers` if it is not there yet,
/// once the text has decoded to an object.
pub fn decode_lazy(text: &str, resolvers: &ResolverChain) -> Result<SpookyDict, CodecError> {
    let map = match serde_json::from_str::<serde_json::Value>(text)? {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(CodecError::NotAnObject {
                found: json_kind(&other),
            });
        }
    };
    install_lazy_resolver(resolvers);
    Ok(SpookyDict::from_entries_with(
        map.into_iter().map(|(k, v)| (k, deferred_value(v))),
        resolvers.clone(),
    ))
}

pub(crate) fn eager_value(node: serde_json::Value, resolvers: &ResolverChain) -> SpookyValue {
    match node {
        serde_json::Value::Null => SpookyValue::Null,
        serde_json::Value::Bool(b) => SpookyValue::Bool(b),
        serde_json::Value::Number(n) => SpookyValue::Number(json_number(&n)),
        serde_json::Value::String(s) => SpookyValue::Str(SmolStr::from(s)),
        serde_json::Value::Array(items) => SpookyValue::Array(SpookySeq::from_vec(
            items.into_iter().map(|v| eager_value(v, resolvers)).collect(),
        )),
        serde_json::Value::Object(map) => SpookyValue::Object(SpookyDict::from_entries_with(
            map.into_iter().map(|(k, v)| (k, eager_value(v, resolvers))),
            resolvers.clone(),
        )),
    }
}

/// Scalars convert right away; containers become opaque nodes.
fn deferred_value(node: serde_json::Value) -> SpookyValue {
    match node {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            SpookyValue::Opaque(OpaqueValue::new(node))
        }
        serde_json::Value::Null => SpookyValue::Null,
        serde_json::Value::Bool(b) => SpookyValue::Bool(b),
        serde_json::Value::Number(n) => SpookyValue::Number(json_number(&n)),
        serde_json::Value::String(s) => SpookyValue::Str(SmolStr::from(s)),
    }
}

pub(crate) fn json_number(n: &serde_json::Number) -> SpookyNumber {
    if let Some(i) = n.as_i64() {
        SpookyNumber::I64(i)
    } else if let Some(u) = n.as_u64() {
        SpookyNumber::U64(u)
    } else {
        SpookyNumber::F64(n.as_f64().unwrap_or(0.0))
    }
}

fn json_kind(node: &serde_json::Value) -> &'static str {
    match node {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ─── LazyJsonResolver ───────────────────────────────────────────────────────

/// Resolves opaque `serde_json::Value` nodes into sequences and dicts whose
/// own nested containers stay deferred.
pub struct LazyJsonResolver {
    resolvers: WeakResolverChain,
}

impl LazyJsonResolver {
    pub const NAME: &'static str = "json.lazy";

    /// A resolver whose dicts use `resolvers` (held weakly).
    pub fn new(resolvers: &ResolverChain) -> Self {
        LazyJsonResolver {
            resolvers: resolvers.downgrade(),
        }
    }
}

impl ValueResolver for LazyJsonResolver {
    fn can_resolve(&self, value: &SpookyValue) -> bool {
        value
            .as_opaque()
            .is_some_and(|o| o.is::<serde_json::Value>())
    }

    fn resolve(&self, value: &SpookyValue) -> SpookyValue {
        let Some(node) = value
            .as_opaque()
            .and_then(|o| o.downcast_ref::<serde_json::Value>())
        else {
            return value.clone();
        };
        let resolvers = self
            .resolvers
            .upgrade()
            .unwrap_or_else(|| ResolverChain::global().clone());
        match node {
            serde_json::Value::Array(items) => SpookyValue::Array(SpookySeq::from_vec(
                items.iter().cloned().map(deferred_value).collect(),
            )),
            serde_json::Value::Object(map) => SpookyValue::Object(SpookyDict::from_entries_with(
                map.iter().map(|(k, v)| (k, deferred_value(v.clone()))),
                resolvers,
            )),
            scalar => deferred_value(scalar.clone()),
        }
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Register a [`LazyJsonResolver`] on `resolvers` unless one is already there.
pub fn install_lazy_resolver(resolvers: &ResolverChain) {
    if resolvers.contains_named(LazyJsonResolver::NAME) {
        return;
    }
    resolvers.register(Arc::new(LazyJsonResolver::new(resolvers)));
    debug!("lazy json resolver installed");
}

// ─── Encode ─────────────────────────────────────────────────────────────────

/// Encode `dict` as compact JSON, resolving values through its chain.
pub fn encode(dict: &SpookyDict) -> Result<String, CodecError> {
    Ok(serde_json::to_string(dict)?)
}

pub fn encode_pretty(dict: &SpookyDict) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(dict)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FnResolver;

    const USER_JSON: &str = r#"{
      "id": "user:abc123",
      "Name": "Alice",
      "age": 28,
      "score": 99.5,
      "active": true,
      "metadata": null,
      "tags": ["developer", "rust"],
      "profile": { "bio": "Developer", "settings": { "theme": "dark", "level": 3 } },
      "history": [
        { "action": "login", "timestamp": 1234567890 },
        { "action": "update", "timestamp": 1234567900 }
      ]
    }"#;

    #[test]
    fn test_decode_eager() -> Result<(), Box<dyn std::error::Error>> {
        let dict = decode_with(USER_JSON, &ResolverChain::new())?;
        assert_eq!(dict.get("name")?, Some(SpookyValue::from("Alice")));
        assert_eq!(dict.get_typed("age", 0u8), 28);
        assert_eq!(dict.get_typed("profile.settings.theme", String::new()), "dark");
        assert_eq!(dict.get_typed("history[1].timestamp", 0i64), 1234567900);
        assert_eq!(dict.get("metadata")?, Some(SpookyValue::Null));
        assert!(matches!(dict.get_raw("profile"), Some(SpookyValue::Object(_))));
        Ok(())
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        assert!(matches!(decode("[1, 2]"), Err(CodecError::NotAnObject { found: "array" })));
        assert!(matches!(decode("42"), Err(CodecError::NotAnObject { found: "number" })));
        assert!(matches!(decode("{"), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_decode_lazy_resolves_on_read() -> Result<(), Box<dyn std::error::Error>> {
        let chain = ResolverChain::new();
        let dict = decode_lazy(USER_JSON, &chain)?;

        // Stored as raw nodes until a read reaches them.
        assert!(matches!(dict.get_raw("profile"), Some(SpookyValue::Opaque(_))));
        assert_eq!(dict.get_raw("age"), Some(SpookyValue::from(28i64)));

        assert_eq!(dict.get_typed("profile.settings.level", 0i32), 3);
        assert_eq!(dict.get_typed("history[0].action", String::new()), "login");
        assert_eq!(dict.get_typed::<Vec<String>>("tags", vec![]), vec!["developer", "rust"]);
        let profile = dict.get_member("profile").and_then(|v| v.as_object().cloned());
        assert!(profile.is_some_and(|p| p.resolvers().ptr_eq(&chain)));
        Ok(())
    }

    #[test]
    fn test_failed_lazy_decode_leaves_chain_untouched() {
        let chain = ResolverChain::new();
        assert!(matches!(decode_lazy("{ nope", &chain), Err(CodecError::Json(_))));
        assert!(matches!(decode_lazy("[1]", &chain), Err(CodecError::NotAnObject { .. })));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_unsigned_roundtrip_is_equal() -> Result<(), Box<dyn std::error::Error>> {
        let dict = SpookyDict::with_resolvers(ResolverChain::new());
        dict.set_member("n", 5u64);
        dict.set_member("big", u64::MAX);
        let decoded = decode_with(&encode(&dict)?, &ResolverChain::new())?;
        assert_eq!(decoded.get_member("n"), Some(SpookyValue::from(5u64)));
        assert_eq!(decoded.get_member("big"), Some(SpookyValue::from(u64::MAX)));
        assert!(decoded.deep_eq(&dict));
        Ok(())
    }

    #[test]
    fn test_nested_dicts_encode_through_their_own_chain() -> Result<(), Box<dyn std::error::Error>> {
        let masking = ResolverChain::new();
        masking.register(FnResolver::shared(
            |v| v.as_str() == Some("secret"),
            |_| SpookyValue::from("***"),
        ));
        let inner = SpookyDict::with_resolvers(masking);
        inner.set_member("p", "secret");

        let outer = SpookyDict::with_resolvers(ResolverChain::new());
        outer.set_member("items", vec![SpookyValue::from(inner.clone())]);
        let value: serde_json::Value = serde_json::from_str(&encode(&outer)?)?;
        assert_eq!(value, serde_json::json!({ "items": [{ "p": "***" }] }));

        // A bare sequence serializes the same way.
        let seq = SpookyValue::from(vec![SpookyValue::from(inner)]);
        assert_eq!(serde_json::to_value(&seq)?, serde_json::json!([{ "p": "***" }]));
        Ok(())
    }

    #[test]
    fn test_cyclic_record_fails_to_encode() {
        let dict = SpookyDict::with_resolvers(ResolverChain::new());
        dict.set_member("me", dict.clone());
        let list = SpookySeq::new();
        list.push(list.clone());
        dict.set_member("list", list.clone());

        assert!(matches!(encode(&dict), Err(CodecError::Json(_))));
        dict.remove("me");
        assert!(matches!(encode(&dict), Err(CodecError::Json(_))));
        list.replace(Vec::new());
        assert_eq!(encode(&dict).ok().as_deref(), Some(r#"{"list":[]}"#));
    }

    #[test]
    fn test_install_is_idempotent() {
        let chain = ResolverChain::new();
        install_lazy_resolver(&chain);
        install_lazy_resolver(&chain);
        assert_eq!(chain.len(), 1);
        assert!(chain.contains_named(LazyJsonResolver::NAME));
    }

    #[test]
    fn test_lazy_write_through_deferred_node() -> Result<(), Box<dyn std::error::Error>> {
        let chain = ResolverChain::new();
        let dict = decode_lazy(USER_JSON, &chain)?;
        dict.set("profile.settings.theme", "light")?;
        assert_eq!(dict.get_typed("profile.settings.theme", String::new()), "light");
        // Untouched siblings survive the materialization.
        assert_eq!(dict.get_typed("profile.bio", String::new()), "Developer");
        assert!(matches!(dict.get_raw("profile"), Some(SpookyValue::Object(_))));
        Ok(())
    }

    #[test]
    fn test_encode_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let chain = ResolverChain::new();
        let lazy = decode_lazy(USER_JSON, &chain)?;
        let text = encode(&lazy)?;
        let again = decode_with(&text, &ResolverChain::new())?;
        let original = decode_with(USER_JSON, &ResolverChain::new())?;
        assert!(again.deep_eq(&original));

        let pretty = encode_pretty(&original)?;
        assert!(pretty.contains('\n'));
        assert!(decode(&pretty)?.deep_eq(&original));
        Ok(())
    }

    #[test]
    fn test_encode_passes_values_through_resolvers() -> Result<(), Box<dyn std::error::Error>> {
        let chain = ResolverChain::new();
        chain.register(FnResolver::shared(
            |v| v.as_str() == Some("secret"),
            |_| SpookyValue::from("***"),
        ));
        let dict = SpookyDict::with_resolvers(chain);
        dict.set_member("password", "secret");
        let value: serde_json::Value = serde_json::from_str(&encode(&dict)?)?;
        assert_eq!(value, serde_json::json!({ "password": "***" }));
        Ok(())
    }

    #[test]
    fn test_encode_unknown_opaque_fails() {
        let dict = SpookyDict::with_resolvers(ResolverChain::new());
        dict.set_member("blob", OpaqueValue::new(vec![1u8, 2, 3]));
        assert!(matches!(encode(&dict), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_unresolved_json_nodes_encode_verbatim() -> Result<(), Box<dyn std::error::Error>> {
        let dict = SpookyDict::with_resolvers(ResolverChain::new());
        dict.set_member("raw", OpaqueValue::new(serde_json::json!({ "k": [1, 2] })));
        let value: serde_json::Value = serde_json::from_str(&encode(&dict)?)?;
        assert_eq!(value, serde_json::json!({ "raw": { "k": [1, 2] } }));
        Ok(())
    }

    #[test]
    fn test_from_json_value() {
        let value = SpookyValue::from(serde_json::json!({ "a": [1, -2, 2.5, u64::MAX] }));
        let dict = value.as_object().cloned().unwrap_or_default();
        assert_eq!(dict.get_typed("a[1]", 0i64), -2);
        assert_eq!(dict.get_typed("a[2]", 0.0f64), 2.5);
        assert_eq!(dict.get_typed("a[3]", 0u64), u64::MAX);
        assert_eq!(dict.get("a[0]").ok().flatten(), Some(SpookyValue::from(1i64)));
    }
}
