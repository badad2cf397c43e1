use std::marker::PhantomData;

use crate::api::error::{Error, Result};
use crate::container::{Container, NodeId, Siblings};

/// Ordered set of symbols a dense container is indexed by.
///
/// `symbol(i)` must be strictly increasing in `i`.
pub trait Alphabet {
    const SIZE: usize;

    fn index(symbol: u8) -> Option<usize>;

    fn symbol(index: usize) -> u8;

    /// Number of alphabet symbols strictly below the given one.
    fn rank(symbol: u8) -> usize {
        let (mut lo, mut hi) = (0, Self::SIZE);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if Self::symbol(mid) < symbol {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

/// Every possible byte value.
#[derive(Debug)]
pub struct Bytes;

impl Alphabet for Bytes {
    const SIZE: usize = 256;

    fn index(symbol: u8) -> Option<usize> {
        Some(symbol as usize)
    }

    fn symbol(index: usize) -> u8 {
        index as u8
    }

    fn rank(symbol: u8) -> usize {
        symbol as usize
    }
}

/// Lowercase hexadecimal digits `0-9a-f`.
#[derive(Debug)]
pub struct Hex;

const HEX: &[u8; 16] = b"0123456789abcdef";

impl Alphabet for Hex {
    const SIZE: usize = 16;

    fn index(symbol: u8) -> Option<usize> {
        match symbol {
            b'0'..=b'9' => Some((symbol - b'0') as usize),
            b'a'..=b'f' => Some((symbol - b'a') as usize + 10),
            _ => None,
        }
    }

    fn symbol(index: usize) -> u8 {
        HEX[index]
    }
}

/// Decimal digits `0-9`.
#[derive(Debug)]
pub struct Digits;

impl Alphabet for Digits {
    const SIZE: usize = 10;

    fn index(symbol: u8) -> Option<usize> {
        match symbol {
            b'0'..=b'9' => Some((symbol - b'0') as usize),
            _ => None,
        }
    }

    fn symbol(index: usize) -> u8 {
        b'0' + index as u8
    }
}

/// Fixed-size slot array indexed directly by symbol: O(1) get/set,
/// neighbour lookups scan outward over the alphabet.
#[derive(Debug)]
pub struct DenseMap<A: Alphabet> {
    slots: Box<[Option<NodeId>]>,
    len: usize,
    alphabet: PhantomData<A>,
}

pub type ByteMap = DenseMap<Bytes>;
pub type HexMap = DenseMap<Hex>;
pub type DigitMap = DenseMap<Digits>;

impl<A: Alphabet> DenseMap<A> {
    pub fn new() -> Self {
        Self {
            slots: vec![None; A::SIZE].into_boxed_slice(),
            len: 0,
            alphabet: PhantomData,
        }
    }

    /// Highest present child with index below `end`.
    fn lower(&self, end: usize) -> Option<NodeId> {
        self.slots[..end].iter().rev().find_map(|slot| *slot)
    }

    /// Lowest present child with index at or above `start`.
    fn upper(&self, start: usize) -> Option<NodeId> {
        self.slots[start.min(A::SIZE)..]
            .iter()
            .find_map(|slot| *slot)
    }
}

impl<A: Alphabet> Default for DenseMap<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Alphabet> Container for DenseMap<A> {
    fn set(&mut self, symbol: u8, node: NodeId) -> Result<Siblings> {
        let idx = A::index(symbol).ok_or(Error::InvalidSymbol(symbol))?;
        if self.slots[idx].replace(node).is_none() {
            self.len += 1;
        }
        Ok(Siblings {
            lower: self.lower(idx),
            higher: self.upper(idx + 1),
        })
    }

    fn get(&self, symbol: u8) -> Option<NodeId> {
        A::index(symbol).and_then(|idx| self.slots[idx])
    }

    fn delete(&mut self, symbol: u8) -> bool {
        match A::index(symbol) {
            Some(idx) if self.slots[idx].take().is_some() => {
                self.len -= 1;
                true
            }
            _ => false,
        }
    }

    fn predecessor(&self, symbol: u8) -> Option<NodeId> {
        self.lower(A::rank(symbol))
    }

    fn successor(&self, symbol: u8) -> Option<NodeId> {
        let start = match A::index(symbol) {
            Some(idx) => idx + 1,
            None => A::rank(symbol),
        };
        self.upper(start)
    }

    fn head(&self) -> Option<NodeId> {
        self.upper(0)
    }

    fn tail(&self) -> Option<NodeId> {
        self.lower(A::SIZE)
    }

    fn keys(&self) -> Vec<u8> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(idx, _)| A::symbol(idx))
            .collect()
    }

    fn pad(&self) -> u8 {
        A::symbol(0)
    }

    fn len(&self) -> usize {
        self.len
    }
}
