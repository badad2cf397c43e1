//! In-memory fixed-length-key trie.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Every node
//! is linked (`prev`/`next`) to its neighbours of the same depth, across
//! subtree boundaries, so the leaves form one sorted chain that iteration
//! and range scans simply follow.

mod arena;
mod iter;
mod node;

use std::mem;

use log::trace;

use crate::api::error::{Error, Result};
use crate::container::{ByteMap, Container, NodeId, Siblings};
use crate::search::Direction;
use crate::util::hex::hex;
use crate::util::stack::Stack;

use arena::Arena;
use node::Node;

pub use iter::Iter;

pub struct Trie<V, C: Container = ByteMap> {
    key_size: usize,
    factory: fn() -> C,
    arena: Arena<Node<V, C>>,
    root: NodeId,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl<V, C: Container> Trie<V, C> {
    /// Create an empty trie for keys of exactly `key_size` symbols, every
    /// internal node gets its child container from `factory`.
    pub fn new(key_size: usize, factory: fn() -> C) -> Self {
        assert!(key_size > 0, "Key size must be positive");
        let mut arena = Arena::new();
        let root = arena.alloc(Node::internal(0, factory()));
        Self {
            key_size,
            factory,
            arena,
            root,
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn key_size(&self) -> usize {
        self.key_size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a value, returns the previous one if the key was present
    /// (the tree is not restructured in that case).
    pub fn set(&mut self, key: &[u8], val: V) -> Result<Option<V>> {
        Error::check_key(self.key_size, key)?;
        let (path, last) = key.split_at(self.key_size - 1);

        let mut parents = Stack::with_capacity(self.key_size);
        let mut cur = self.root;
        for &symbol in path {
            parents.push(cur);
            cur = match self.container(cur)?.get(symbol) {
                Some(child) => child,
                None => {
                    let node = Node::internal(symbol, (self.factory)());
                    match self.attach(cur, symbol, node) {
                        Ok(id) => id,
                        Err(e) => {
                            self.prune(&mut parents)?;
                            return Err(e);
                        }
                    }
                }
            };
        }

        let symbol = last[0];
        if let Some(leaf) = self.container(cur)?.get(symbol) {
            trace!("update: key='{}'", hex(key));
            let old = mem::replace(self.arena[leaf].value_mut()?, val);
            return Ok(Some(old));
        }

        parents.push(cur);
        let leaf = match self.attach(cur, symbol, Node::leaf(symbol, key, val)) {
            Ok(id) => id,
            Err(e) => {
                self.prune(&mut parents)?;
                return Err(e);
            }
        };
        self.len += 1;

        let (prev, next) = (self.arena[leaf].prev, self.arena[leaf].next);
        if prev.is_none() {
            self.head = Some(leaf);
        }
        if next.is_none() {
            self.tail = Some(leaf);
        }
        trace!("insert: key='{}' len={}", hex(key), self.len);
        Ok(None)
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<&V>> {
        Error::check_key(self.key_size, key)?;
        match self.find(key)? {
            Some(leaf) => Ok(Some(self.arena[leaf].entry()?.1)),
            None => Ok(None),
        }
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Result<Option<&mut V>> {
        Error::check_key(self.key_size, key)?;
        match self.find(key)? {
            Some(leaf) => Ok(Some(self.arena[leaf].value_mut()?)),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, key: &[u8]) -> Result<bool> {
        Error::check_key(self.key_size, key)?;
        Ok(self.find(key)?.is_some())
    }

    /// Remove a key. The leaf and every ancestor left without children are
    /// unlinked from their level chains, so order links never dangle.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        Error::check_key(self.key_size, key)?;

        let mut parents = Stack::with_capacity(self.key_size);
        let mut cur = self.root;
        for &symbol in key {
            parents.push(cur);
            cur = match self.container(cur)?.get(symbol) {
                Some(child) => child,
                None => return Ok(false),
            };
        }

        if let Some(parent) = parents.top() {
            self.detach(parent, cur)?;
        }
        self.len -= 1;
        self.prune(&mut parents)?;
        trace!("delete: key='{}' len={}", hex(key), self.len);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = self.arena.alloc(Node::internal(0, (self.factory)()));
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn container(&self, id: NodeId) -> Result<&C> {
        self.arena[id].children()
    }

    fn find(&self, key: &[u8]) -> Result<Option<NodeId>> {
        let mut cur = self.root;
        for &symbol in key {
            cur = match self.container(cur)?.get(symbol) {
                Some(child) => child,
                None => return Ok(None),
            };
        }
        if !self.arena[cur].is_leaf() {
            return Err(Error::invariant(format!(
                "node at depth {} is not a leaf",
                self.key_size
            )));
        }
        Ok(Some(cur))
    }

    /// Put a new node into the parent's container and stitch it into its
    /// level chain.
    fn attach(&mut self, parent: NodeId, symbol: u8, node: Node<V, C>) -> Result<NodeId> {
        let id = self.arena.alloc(node);
        let siblings = match self.arena[parent]
            .children_mut()
            .and_then(|children| children.set(symbol, id))
        {
            Ok(siblings) => siblings,
            Err(e) => {
                self.arena.free(id);
                return Err(e);
            }
        };

        match self.neighbours(parent, siblings) {
            Ok((prev, next)) => {
                self.link(id, prev, next);
                Ok(id)
            }
            Err(e) => {
                if let Ok(children) = self.arena[parent].children_mut() {
                    children.delete(symbol);
                }
                self.arena.free(id);
                Err(e)
            }
        }
    }

    /// Level neighbours of a new child: its container siblings, or, when it
    /// is the new container head (tail), the tail (head) of the container
    /// of the parent's own previous (next) neighbour.
    fn neighbours(
        &self,
        parent: NodeId,
        siblings: Siblings,
    ) -> Result<(Option<NodeId>, Option<NodeId>)> {
        let prev = match siblings.lower {
            Some(lower) => Some(lower),
            None => self.boundary(self.arena[parent].prev, Direction::Backward)?,
        };
        let next = match siblings.higher {
            Some(higher) => Some(higher),
            None => self.boundary(self.arena[parent].next, Direction::Forward)?,
        };
        Ok((prev, next))
    }

    fn boundary(&self, sibling: Option<NodeId>, direction: Direction) -> Result<Option<NodeId>> {
        let sibling = match sibling {
            Some(sibling) => sibling,
            None => return Ok(None),
        };
        let children = self.container(sibling)?;
        let found = match direction {
            Direction::Forward => children.head(),
            Direction::Backward => children.tail(),
        };
        match found {
            Some(id) => Ok(Some(id)),
            None => Err(Error::invariant(format!(
                "linked node (symbol: {}) has no children",
                self.arena[sibling].symbol
            ))),
        }
    }

    fn link(&mut self, id: NodeId, prev: Option<NodeId>, next: Option<NodeId>) {
        self.arena[id].prev = prev;
        self.arena[id].next = next;
        if let Some(prev) = prev {
            self.arena[prev].next = Some(id);
        }
        if let Some(next) = next {
            self.arena[next].prev = Some(id);
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = (self.arena[id].prev, self.arena[id].next);
        if let Some(prev) = prev {
            self.arena[prev].next = next;
        }
        if let Some(next) = next {
            self.arena[next].prev = prev;
        }
        if self.head == Some(id) {
            self.head = next;
        }
        if self.tail == Some(id) {
            self.tail = prev;
        }
    }

    fn detach(&mut self, parent: NodeId, id: NodeId) -> Result<()> {
        let symbol = self.arena[id].symbol;
        self.arena[parent].children_mut()?.delete(symbol);
        self.unlink(id);
        self.arena.free(id);
        Ok(())
    }

    /// Walk back up removing ancestors whose containers became empty.
    /// The root always stays.
    fn prune(&mut self, parents: &mut Stack<NodeId>) -> Result<()> {
        while parents.len() > 1 {
            let node = match parents.pop() {
                Some(node) => node,
                None => break,
            };
            if !self.container(node)?.is_empty() {
                break;
            }
            if let Some(parent) = parents.top() {
                self.detach(parent, node)?;
            }
        }
        Ok(())
    }
}
