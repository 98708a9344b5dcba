#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Configuration options
pub mod config;

/// Error (common error types)
pub mod error;

/// Frontmatter (locating and parsing the leading YAML block)
pub mod frontmatter;

/// Filesystem abstraction
pub mod fs;

/// Block array normalization
pub mod normalize;

/// Patch engine (insert or remove a reference in one property)
pub mod patch;

/// Note store (lookup, raw I/O and change subscriptions)
pub mod store;

/// Relation orchestrator (mirrors link changes onto linked notes)
pub mod sync;

/// Wikilink extraction
pub mod wikilink;
