pub mod dense;
pub mod sparse;

use crate::api::error::Result;

pub use dense::{Alphabet, ByteMap, Bytes, DenseMap, DigitMap, Digits, Hex, HexMap};
pub use sparse::LinkMap;

/// Stable index of a node inside the trie's arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Nearest present children around a freshly inserted symbol.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Siblings {
    pub lower: Option<NodeId>,
    pub higher: Option<NodeId>,
}

/// Ordered mapping from a key symbol to a child node.
///
/// Strategies differ only in time/space trade-off: iteration from `head()`
/// through `successor()` to `tail()` must always visit present symbols in
/// ascending order. Containers only keep node ids, linking the nodes
/// themselves is up to the trie, based on the returned [`Siblings`].
pub trait Container {
    /// Insert (or replace) a child. Returns nearest present lower/higher siblings.
    fn set(&mut self, symbol: u8, node: NodeId) -> Result<Siblings>;

    fn get(&self, symbol: u8) -> Option<NodeId>;

    /// Remove a child, returns true if the symbol was present.
    fn delete(&mut self, symbol: u8) -> bool;

    /// Nearest present child strictly below the symbol (symbol itself may be absent).
    fn predecessor(&self, symbol: u8) -> Option<NodeId>;

    /// Nearest present child strictly above the symbol (symbol itself may be absent).
    fn successor(&self, symbol: u8) -> Option<NodeId>;

    fn head(&self) -> Option<NodeId>;
    fn tail(&self) -> Option<NodeId>;

    /// Present symbols in ascending order.
    fn keys(&self) -> Vec<u8>;

    /// Minimal symbol of the alphabet, used to right-pad short query keys.
    fn pad(&self) -> u8;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
