use std::ops::{Index, IndexMut};

use crate::container::NodeId;

/// Slot storage for trie nodes. Freed slots are kept on a free list and
/// handed out again by `alloc`, so ids stay small and dense.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<NodeId>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::with_capacity(64),
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, item: T) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(item);
                id
            }
            None => {
                let id = NodeId(self.slots.len() as u32);
                self.slots.push(Some(item));
                id
            }
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) -> Option<T> {
        let item = self.slots.get_mut(id.index())?.take();
        if item.is_some() {
            self.free.push(id);
        }
        item
    }

    /// Number of live items.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.slots.get(id.index()) {
            Some(Some(item)) => item,
            _ => panic!("Dangling node id: {:?}", id),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.slots.get_mut(id.index()) {
            Some(Some(item)) => item,
            _ => panic!("Dangling node id: {:?}", id),
        }
    }
}
