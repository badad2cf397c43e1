use crate::api::error::Result;
use crate::container::{Container, NodeId, Siblings};

/// Sparse container: only present children are kept, in a vector sorted by
/// symbol. Cheap for nodes with few children, O(log n) lookups.
#[derive(Debug, Default)]
pub struct LinkMap {
    entries: Vec<(u8, NodeId)>,
}

impl LinkMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(2),
        }
    }

    fn find(&self, symbol: u8) -> std::result::Result<usize, usize> {
        self.entries.binary_search_by_key(&symbol, |(s, _)| *s)
    }
}

impl Container for LinkMap {
    fn set(&mut self, symbol: u8, node: NodeId) -> Result<Siblings> {
        let idx = match self.find(symbol) {
            Ok(idx) => {
                self.entries[idx].1 = node;
                idx
            }
            Err(idx) => {
                self.entries.insert(idx, (symbol, node));
                idx
            }
        };
        Ok(Siblings {
            lower: idx.checked_sub(1).map(|i| self.entries[i].1),
            higher: self.entries.get(idx + 1).map(|(_, n)| *n),
        })
    }

    fn get(&self, symbol: u8) -> Option<NodeId> {
        self.find(symbol).ok().map(|idx| self.entries[idx].1)
    }

    fn delete(&mut self, symbol: u8) -> bool {
        match self.find(symbol) {
            Ok(idx) => {
                self.entries.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    fn predecessor(&self, symbol: u8) -> Option<NodeId> {
        let idx = self.entries.partition_point(|(s, _)| *s < symbol);
        idx.checked_sub(1).map(|i| self.entries[i].1)
    }

    fn successor(&self, symbol: u8) -> Option<NodeId> {
        let idx = self.entries.partition_point(|(s, _)| *s <= symbol);
        self.entries.get(idx).map(|(_, n)| *n)
    }

    fn head(&self) -> Option<NodeId> {
        self.entries.first().map(|(_, n)| *n)
    }

    fn tail(&self) -> Option<NodeId> {
        self.entries.last().map(|(_, n)| *n)
    }

    fn keys(&self) -> Vec<u8> {
        self.entries.iter().map(|(s, _)| *s).collect()
    }

    fn pad(&self) -> u8 {
        0
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
