use bytes::{Buf, BufMut, BytesMut};
use std::mem::size_of;

use crate::util::pool::Reset;

const U64: usize = size_of::<u64>();

/// Offset of the root record. Doubles as the "no node" marker in links and
/// child slots, since nothing can point back at the root.
pub(crate) const NIL: u64 = 0;
pub(crate) const ROOT: u64 = 0;

pub(crate) const FANOUT: usize = 256;

/// self, prev, next, symbol, children.
pub(crate) const INTERNAL_SIZE: usize = 3 * U64 + 1 + FANOUT * U64;

/// length, self, prev, next.
pub(crate) const LEAF_HEAD: usize = 4 * U64;

pub(crate) fn link(offset: u64) -> Option<u64> {
    if offset == NIL {
        None
    } else {
        Some(offset)
    }
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct Internal {
    pub(crate) offset: u64,
    pub(crate) prev: u64,
    pub(crate) next: u64,
    pub(crate) symbol: u8,
    pub(crate) children: Vec<u64>,
}

impl Default for Internal {
    fn default() -> Self {
        Self {
            offset: NIL,
            prev: NIL,
            next: NIL,
            symbol: 0,
            children: vec![NIL; FANOUT],
        }
    }
}

impl Reset for Internal {
    fn reset(&mut self) {
        self.offset = NIL;
        self.prev = NIL;
        self.next = NIL;
        self.symbol = 0;
        self.children.iter_mut().for_each(|slot| *slot = NIL);
    }
}

impl Internal {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(INTERNAL_SIZE);
        buf.put_u64(self.offset);
        buf.put_u64(self.prev);
        buf.put_u64(self.next);
        buf.put_u8(self.symbol);
        for child in self.children.iter() {
            buf.put_u64(*child);
        }
    }

    /// `src` must hold exactly `INTERNAL_SIZE` bytes.
    pub(crate) fn decode(&mut self, mut src: &[u8]) {
        self.offset = src.get_u64();
        self.prev = src.get_u64();
        self.next = src.get_u64();
        self.symbol = src.get_u8();
        for slot in self.children.iter_mut() {
            *slot = src.get_u64();
        }
    }

    pub(crate) fn child(&self, symbol: u8) -> Option<u64> {
        link(self.children[symbol as usize])
    }

    pub(crate) fn set(&mut self, symbol: u8, offset: u64) {
        self.children[symbol as usize] = offset;
    }

    pub(crate) fn head(&self) -> Option<u64> {
        self.children.iter().copied().find(|x| *x != NIL)
    }

    pub(crate) fn tail(&self) -> Option<u64> {
        self.children.iter().rev().copied().find(|x| *x != NIL)
    }

    /// Nearest occupied slot strictly above `symbol`.
    pub(crate) fn successor(&self, symbol: u8) -> Option<u64> {
        self.children[symbol as usize + 1..]
            .iter()
            .copied()
            .find(|x| *x != NIL)
    }

    /// Nearest occupied slot strictly below `symbol`.
    pub(crate) fn predecessor(&self, symbol: u8) -> Option<u64> {
        self.children[..symbol as usize]
            .iter()
            .rev()
            .copied()
            .find(|x| *x != NIL)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head().is_none()
    }
}

#[derive(Debug, Default, Eq, PartialEq)]
pub(crate) struct Leaf {
    pub(crate) offset: u64,
    pub(crate) prev: u64,
    pub(crate) next: u64,
    pub(crate) key: Vec<u8>,
    pub(crate) val: Vec<u8>,
}

impl Reset for Leaf {
    fn reset(&mut self) {
        self.offset = NIL;
        self.prev = NIL;
        self.next = NIL;
        self.key.clear();
        self.val.clear();
    }
}

impl Leaf {
    pub(crate) fn size(&self) -> usize {
        LEAF_HEAD + self.key.len() + self.val.len()
    }

    /// Symbol the leaf is stored under in its parent.
    pub(crate) fn symbol(&self) -> Option<u8> {
        self.key.last().copied()
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(self.size());
        buf.put_u64(self.size() as u64);
        buf.put_u64(self.offset);
        buf.put_u64(self.prev);
        buf.put_u64(self.next);
        buf.put_slice(&self.key);
        buf.put_slice(&self.val);
    }

    /// Decodes the fixed head and returns the length of the whole record.
    pub(crate) fn decode_head(&mut self, mut src: &[u8]) -> u64 {
        let len = src.get_u64();
        self.offset = src.get_u64();
        self.prev = src.get_u64();
        self.next = src.get_u64();
        len
    }

    /// `src` holds everything after the head.
    pub(crate) fn decode_body(&mut self, src: &[u8], key_size: usize) {
        let (key, val) = src.split_at(key_size);
        self.key.clear();
        self.key.extend_from_slice(key);
        self.val.clear();
        self.val.extend_from_slice(val);
    }
}
