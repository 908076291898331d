//! Path expressions addressing nested locations, e.g. `users[1].address.geo.lat`.

mod cache;
mod parser;

pub use cache::{PathCache, configure_thread_cache, parse_cached, with_thread_cache};
pub use parser::{PathSegment, SpookyPath};

#[cfg(test)]
mod tests;
