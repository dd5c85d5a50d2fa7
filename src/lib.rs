#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A HashMap implementation using separate chaining.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a key-value map interface with configurable hashers and null-key support.
pub mod hash_map;

pub mod hash_table;

pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_table::HashTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used by [`HashMap::new`] when no other builder is
        /// named.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used by [`HashMap::new`] when no other builder is
        /// named.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    }
}
