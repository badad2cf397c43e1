//! Ordered map over fixed-length byte keys, built as a trie where every
//! level branches on one key symbol and all nodes of a level are chained in
//! key order. Comes in two flavours: [`Trie`] keeps nodes in memory with a
//! pluggable child container, [`DiskTrie`] keeps them in a single
//! append-only file.

pub mod api;
pub mod container;
pub mod disk;
pub(crate) mod search;
pub mod sync;
pub mod trie;
pub mod util;

#[cfg(feature = "typed")]
pub mod typed;

#[cfg(test)]
mod proptests;

pub use api::error::{Error, Result};
pub use api::Store;
pub use container::{ByteMap, Container, DigitMap, HexMap, LinkMap};
pub use disk::DiskTrie;
pub use sync::Shared;
pub use trie::Trie;
