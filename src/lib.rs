//! Dynamic, case-insensitive records with path access, pluggable value
//! resolvers and best-effort typed reads.
//!
//! ```
//! use spooky_dict::SpookyDict;
//!
//! let record = SpookyDict::new();
//! record.set("Profile.Address.City", "Berlin").unwrap();
//! assert_eq!(record.get_typed("profile.address.city", String::new()), "Berlin");
//! assert_eq!(record.get_typed("profile.age", 0u32), 0);
//! ```

pub mod coerce;
pub mod error;
pub mod json;
mod macros;
pub mod path;
pub mod resolver;
pub mod spooky_dict;
pub mod spooky_value;
pub mod store;
pub mod types;

pub use coerce::{FromSpooky, SpookyEnum, SpookyRecordType, coerce};
pub use error::{CodecError, ConversionError, PathError, RecordError, StoreError};
pub use path::{PathSegment, SpookyPath, parse_cached};
pub use resolver::{FnResolver, ResolverChain, ValueResolver, WeakResolverChain};
pub use spooky_dict::SpookyDict;
pub use spooky_value::{OpaqueValue, SpookyNumber, SpookySeq, SpookyValue};
pub use types::PathCacheConfig;
