use super::*;
use crate::error::PathError;
use crate::types::PathCacheConfig;
use smol_str::SmolStr;
use std::num::NonZeroUsize;

fn named(s: &str) -> PathSegment {
    PathSegment::Named(SmolStr::new(s))
}

fn parse(s: &str) -> Vec<PathSegment> {
    SpookyPath::parse(s).expect("valid path").segments().to_vec()
}

// ═══════════════════════════════════════════════════════════════════════
// Parsing
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_dotted_names() {
    assert_eq!(
        parse("user.address.city"),
        vec![named("user"), named("address"), named("city")]
    );
}

#[test]
fn test_index_suffixes() {
    assert_eq!(parse("items[0]"), vec![named("items"), PathSegment::Indexed(0)]);
    assert_eq!(
        parse("users[1].address.geo.lat"),
        vec![
            named("users"),
            PathSegment::Indexed(1),
            named("address"),
            named("geo"),
            named("lat"),
        ]
    );
    assert_eq!(
        parse("grid[2][3]"),
        vec![named("grid"), PathSegment::Indexed(2), PathSegment::Indexed(3)]
    );
}

#[test]
fn test_bare_key_matches_scanner() {
    for key in ["name", "Name", "with space", "a]b", "ключ", "x-y_z"] {
        let fast = SpookyPath::parse(key).unwrap();
        assert_eq!(fast.segments(), &[named(key)]);
        // The scanner alone reaches the same segments.
        assert_eq!(parser::scan(key), Ok(fast.segments().to_vec()));
        // Same answer from the cached entry point.
        assert_eq!(parse_cached(key).unwrap(), fast);
    }
}

#[test]
fn test_empty_segments_are_skipped() {
    assert_eq!(parse("a..b"), vec![named("a"), named("b")]);
    assert_eq!(parse(".a."), vec![named("a")]);
    assert_eq!(parse("[0]"), vec![PathSegment::Indexed(0)]);
    assert_eq!(parse("a[0]b"), vec![named("a"), PathSegment::Indexed(0), named("b")]);
}

#[test]
fn test_index_text_is_trimmed_and_signed() {
    assert_eq!(parse("a[ 7 ]"), vec![named("a"), PathSegment::Indexed(7)]);
    assert_eq!(parse("a[-1]"), vec![named("a"), PathSegment::Indexed(-1)]);
}

// ═══════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_unmatched_bracket() {
    assert_eq!(
        SpookyPath::parse("items[0"),
        Err(PathError::UnmatchedBracket {
            path: "items[0".into(),
            offset: 5,
        })
    );
    assert!(matches!(
        SpookyPath::parse("a.b["),
        Err(PathError::UnmatchedBracket { offset: 3, .. })
    ));
}

#[test]
fn test_non_integer_index() {
    assert_eq!(
        SpookyPath::parse("items[abc]"),
        Err(PathError::InvalidIndex {
            path: "items[abc]".into(),
            offset: 5,
            text: "abc".into(),
        })
    );
    assert!(matches!(SpookyPath::parse("a[]"), Err(PathError::InvalidIndex { .. })));
    assert!(matches!(SpookyPath::parse("a[1.5]"), Err(PathError::InvalidIndex { .. })));
    assert!(matches!(SpookyPath::parse("a[[0]]"), Err(PathError::InvalidIndex { .. })));
}

#[test]
fn test_empty_path() {
    assert_eq!(SpookyPath::parse(""), Err(PathError::Empty));
    assert_eq!(SpookyPath::parse("."), Err(PathError::Empty));
    assert_eq!(SpookyPath::parse(".."), Err(PathError::Empty));
}

#[test]
fn test_error_messages() {
    let err = SpookyPath::parse("items[x]").unwrap_err();
    assert_eq!(err.to_string(), "invalid index `x` at offset 5 in `items[x]`");
}

// ═══════════════════════════════════════════════════════════════════════
// Display / FromStr
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_display_reparses() {
    for text in ["a", "a.b.c", "items[0]", "users[1].address.geo.lat", "[2].x", "m[1][2]"] {
        let path: SpookyPath = text.parse().unwrap();
        assert_eq!(path.to_string(), text);
        assert_eq!(SpookyPath::parse(&path.to_string()).unwrap(), path);
    }
}

#[test]
fn test_split_last() {
    let path = SpookyPath::parse("a.b[3]").unwrap();
    let (init, last) = path.split_last();
    assert_eq!(init, &[named("a"), named("b")]);
    assert_eq!(last, &PathSegment::Indexed(3));
    assert_eq!(path.len(), 3);
    assert!(!path.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Cache
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_cache_hits_and_misses() {
    let mut cache = PathCache::default();
    let first = cache.get_or_parse("a.b[0]").unwrap();
    let second = cache.get_or_parse("a.b[0]").unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats(), (1, 1));
    assert_eq!(cache.len(), 1);

    // Bare keys never touch the cache.
    cache.get_or_parse("plain").unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats(), (1, 1));
}

#[test]
fn test_cache_does_not_store_errors() {
    let mut cache = PathCache::default();
    assert!(cache.get_or_parse("a[").is_err());
    assert!(cache.get_or_parse("a[").is_err());
    assert!(cache.is_empty());
    assert_eq!(cache.stats(), (0, 2));
}

#[test]
fn test_cache_evicts_least_recent() {
    let mut cache = PathCache::new(PathCacheConfig {
        capacity: NonZeroUsize::new(2).unwrap(),
    });
    assert_eq!(cache.capacity(), 2);
    cache.get_or_parse("a.a").unwrap();
    cache.get_or_parse("b.b").unwrap();
    cache.get_or_parse("a.a").unwrap();
    cache.get_or_parse("c.c").unwrap(); // evicts b.b
    assert_eq!(cache.len(), 2);

    let (_, misses_before) = cache.stats();
    cache.get_or_parse("b.b").unwrap();
    assert_eq!(cache.stats().1, misses_before + 1);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_thread_cache_configuration() {
    configure_thread_cache(PathCacheConfig {
        capacity: NonZeroUsize::new(8).unwrap(),
    });
    parse_cached("x.y").unwrap();
    parse_cached("x.y").unwrap();
    let (capacity, stats) = with_thread_cache(|c| (c.capacity(), c.stats())).unwrap();
    assert_eq!(capacity, 8);
    assert_eq!(stats, (1, 1));
}
