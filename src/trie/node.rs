use crate::api::error::{Error, Result};
use crate::container::NodeId;

pub(crate) enum Kind<V, C> {
    Internal(C),
    Leaf { key: Box<[u8]>, val: V },
}

/// Trie node. `prev`/`next` thread all nodes of the same depth in
/// ascending order; at leaf depth this is the global sorted chain.
pub(crate) struct Node<V, C> {
    pub(crate) symbol: u8,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) kind: Kind<V, C>,
}

impl<V, C> Node<V, C> {
    pub(crate) fn internal(symbol: u8, children: C) -> Self {
        Self {
            symbol,
            prev: None,
            next: None,
            kind: Kind::Internal(children),
        }
    }

    pub(crate) fn leaf(symbol: u8, key: &[u8], val: V) -> Self {
        Self {
            symbol,
            prev: None,
            next: None,
            kind: Kind::Leaf {
                key: key.into(),
                val,
            },
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, Kind::Leaf { .. })
    }

    pub(crate) fn children(&self) -> Result<&C> {
        match &self.kind {
            Kind::Internal(children) => Ok(children),
            Kind::Leaf { key, .. } => Err(Error::invariant(format!(
                "leaf {:?} accessed as internal node",
                key
            ))),
        }
    }

    pub(crate) fn children_mut(&mut self) -> Result<&mut C> {
        match &mut self.kind {
            Kind::Internal(children) => Ok(children),
            Kind::Leaf { key, .. } => Err(Error::invariant(format!(
                "leaf {:?} accessed as internal node",
                key
            ))),
        }
    }

    pub(crate) fn entry(&self) -> Result<(&[u8], &V)> {
        match &self.kind {
            Kind::Leaf { key, val } => Ok((key, val)),
            Kind::Internal(_) => Err(Error::invariant(format!(
                "internal node (symbol: {}) accessed as leaf",
                self.symbol
            ))),
        }
    }

    pub(crate) fn value_mut(&mut self) -> Result<&mut V> {
        match &mut self.kind {
            Kind::Leaf { val, .. } => Ok(val),
            Kind::Internal(_) => Err(Error::invariant(format!(
                "internal node (symbol: {}) accessed as leaf",
                self.symbol
            ))),
        }
    }
}
