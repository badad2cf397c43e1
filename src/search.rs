use std::borrow::Cow;

use crate::api::error::{Error, Result};
use crate::util::stack::Stack;

/// Read-only navigation over a trie's internal nodes.
///
/// Both backends implement it (arena ids in memory, record offsets on disk),
/// so the backtracking searches below are written once.
pub(crate) trait Walk {
    type Node: Copy;

    fn root(&self) -> Self::Node;
    fn key_size(&self) -> usize;

    fn child(&self, node: Self::Node, symbol: u8) -> Result<Option<Self::Node>>;
    fn successor(&self, node: Self::Node, symbol: u8) -> Result<Option<Self::Node>>;
    fn predecessor(&self, node: Self::Node, symbol: u8) -> Result<Option<Self::Node>>;
    fn head(&self, node: Self::Node) -> Result<Option<Self::Node>>;
    fn tail(&self, node: Self::Node) -> Result<Option<Self::Node>>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Mode {
    /// Following the query symbols.
    Exact,
    /// Looking for the nearest sibling of the query symbol.
    Seek,
    /// Diving to the extreme leaf of a subtree.
    Extreme,
}

/// Right-pad a short query key with `pad`, or truncate a long one.
pub(crate) fn pad(key: &[u8], size: usize, pad: u8) -> Cow<'_, [u8]> {
    if key.len() >= size {
        Cow::Borrowed(&key[..size])
    } else {
        let mut full = key.to_vec();
        full.resize(size, pad);
        Cow::Owned(full)
    }
}

/// Leaf with the smallest key above (`Forward`) or the biggest key below
/// (`Backward`) the query key, which must already be `key_size` long.
/// An exact hit qualifies only if `inclusive` is set.
pub(crate) fn seek<W: Walk>(
    walk: &W,
    key: &[u8],
    direction: Direction,
    inclusive: bool,
) -> Result<Option<W::Node>> {
    let size = walk.key_size();
    let mut path = Stack::with_capacity(size);
    path.push(walk.root());

    let mut mode = Mode::Exact;
    while let Some(cur) = path.top() {
        let level = path.len() - 1;
        let symbol = key[level];
        let found = match (mode, direction) {
            (Mode::Exact, _) => walk.child(cur, symbol)?,
            (Mode::Seek, Direction::Forward) => walk.successor(cur, symbol)?,
            (Mode::Seek, Direction::Backward) => walk.predecessor(cur, symbol)?,
            (Mode::Extreme, Direction::Forward) => walk.head(cur)?,
            (Mode::Extreme, Direction::Backward) => walk.tail(cur)?,
        };

        match found {
            Some(_) if mode == Mode::Exact && !inclusive && level + 1 == size => {
                mode = Mode::Seek;
            }
            Some(node) if level + 1 == size => return Ok(Some(node)),
            Some(node) => {
                if mode == Mode::Seek {
                    mode = Mode::Extreme;
                }
                path.push(node);
            }
            None => match mode {
                Mode::Exact => mode = Mode::Seek,
                Mode::Seek => {
                    path.pop();
                }
                Mode::Extreme => {
                    return Err(Error::invariant(format!(
                        "empty container at level {} during {:?} descent",
                        level, direction
                    )));
                }
            },
        }
    }
    Ok(None)
}

/// Lowest (`Forward`) or highest (`Backward`) leaf of the whole trie.
pub(crate) fn extreme<W: Walk>(walk: &W, direction: Direction) -> Result<Option<W::Node>> {
    let size = walk.key_size();
    let mut cur = walk.root();
    for level in 0..size {
        let next = match direction {
            Direction::Forward => walk.head(cur)?,
            Direction::Backward => walk.tail(cur)?,
        };
        cur = match next {
            Some(node) => node,
            None if level == 0 => return Ok(None),
            None => {
                return Err(Error::invariant(format!(
                    "empty container at level {} during {:?} descent",
                    level, direction
                )))
            }
        };
    }
    Ok(Some(cur))
}
