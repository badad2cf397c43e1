use bytes::BytesMut;
use log::{debug, info, trace};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::mem;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use crate::api::error::{Error, Result};
use crate::disk::record::{link, Internal, Leaf, INTERNAL_SIZE, LEAF_HEAD, NIL, ROOT};
use crate::search::{self, Direction, Walk};
use crate::util::hex::hex;
use crate::util::pool::Pool;

/// Decoded records of each kind kept around for reuse.
const POOL_CAPACITY: usize = 32;

/// Fixed-length-key trie stored in a single append-only file.
///
/// The root internal record lives at offset 0. Internal records have a fixed
/// size and are rewritten in place; a leaf gets a brand-new record every
/// time its value is set, and the old record is simply left behind.
pub struct DiskTrie {
    path: PathBuf,
    /// Underlying file reference where all records are physically stored.
    file: RefCell<fs::File>,
    key_size: usize,
    /// Offset where the next record is appended.
    end: u64,
    head: Option<u64>,
    tail: Option<u64>,
    len: usize,
    internals: RefCell<Pool<Internal>>,
    leaves: RefCell<Pool<Leaf>>,
}

/// Maps a short read to `RecordSizeMismatch` for the record at `offset`.
fn short(offset: u64, expected: usize) -> impl FnOnce(io::Error) -> Error {
    move |e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::RecordSizeMismatch { offset, expected },
        _ => Error::IO(e),
    }
}

impl DiskTrie {
    /// Opens the trie stored at `path`, creating the file (with an empty
    /// root) when it does not exist yet.
    ///
    /// Panics if `key_size` is zero.
    pub fn open(path: &Path, key_size: usize) -> Result<Self> {
        assert!(key_size > 0, "Key size must be positive");
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let end = file.metadata()?.len();

        let mut this = Self {
            path: path.to_path_buf(),
            file: RefCell::new(file),
            key_size,
            end,
            head: None,
            tail: None,
            len: 0,
            internals: RefCell::new(Pool::new(POOL_CAPACITY)),
            leaves: RefCell::new(Pool::new(POOL_CAPACITY)),
        };

        if end == 0 {
            let mut root = Internal::default();
            this.append_internal(&mut root)?;
            this.release_internal(root);
        } else {
            let root = this.read_internal(ROOT, None)?;
            this.release_internal(root);
            this.head = search::extreme(&this, Direction::Forward)?;
            this.tail = search::extreme(&this, Direction::Backward)?;
            this.len = this.count()?;
        }

        info!(
            "Opened {:?}: key_size={} bytes={} len={}",
            this.path, key_size, this.end, this.len
        );
        Ok(this)
    }

    pub fn path(&self) -> &Path {
        &self.path
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

    /// Flushes file contents to the device.
    pub fn sync(&self) -> Result<()> {
        self.file.borrow().sync_data()?;
        Ok(())
    }

    /// Inserts or overwrites the value under `key`.
    pub fn set(&mut self, key: &[u8], val: &[u8]) -> Result<()> {
        Error::check_key(self.key_size, key)?;
        let last = self.key_size - 1;

        let mut parent = self.read_internal(ROOT, None)?;
        for &symbol in &key[..last] {
            let child = match parent.child(symbol) {
                Some(offset) => self.read_internal(offset, Some(symbol))?,
                None => {
                    let (prev, next) = self.neighbours(&parent, symbol)?;
                    let mut child = self.internals.borrow_mut().take();
                    child.symbol = symbol;
                    child.prev = prev.unwrap_or(NIL);
                    child.next = next.unwrap_or(NIL);
                    self.append_internal(&mut child)?;
                    parent.set(symbol, child.offset);
                    self.write_internal(&parent)?;
                    self.point_next_internal(prev, child.offset)?;
                    self.point_prev_internal(next, child.offset)?;
                    child
                }
            };
            self.release_internal(mem::replace(&mut parent, child));
        }

        let symbol = key[last];
        let (prev, next, fresh) = match parent.child(symbol) {
            Some(offset) => {
                let old = self.read_leaf(offset, Some(symbol))?;
                self.check_leaf(&old, key)?;
                let links = (link(old.prev), link(old.next));
                self.release_leaf(old);
                (links.0, links.1, false)
            }
            None => {
                let (prev, next) = self.neighbours(&parent, symbol)?;
                (prev, next, true)
            }
        };

        let mut leaf = self.leaves.borrow_mut().take();
        leaf.prev = prev.unwrap_or(NIL);
        leaf.next = next.unwrap_or(NIL);
        leaf.key.extend_from_slice(key);
        leaf.val.extend_from_slice(val);
        self.append_leaf(&mut leaf)?;

        parent.set(symbol, leaf.offset);
        self.write_internal(&parent)?;
        self.point_next(prev, leaf.offset)?;
        self.point_prev(next, leaf.offset)?;
        if fresh {
            self.len += 1;
        }

        trace!(
            "{}: key='{}' offset={} len={}",
            if fresh { "insert" } else { "update" },
            hex(key),
            leaf.offset,
            self.len
        );
        self.release_leaf(leaf);
        self.release_internal(parent);
        Ok(())
    }

    /// Value stored under `key`, `NotFound` if there is none.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.lookup(key)?.ok_or(Error::NotFound)
    }

    pub fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Error::check_key(self.key_size, key)?;
        let offset = match self.find(key)? {
            Some(offset) => offset,
            None => return Ok(None),
        };
        let mut leaf = self.read_leaf(offset, Some(key[self.key_size - 1]))?;
        self.check_leaf(&leaf, key)?;
        let val = mem::take(&mut leaf.val);
        self.release_leaf(leaf);
        Ok(Some(val))
    }

    pub fn contains_key(&self, key: &[u8]) -> Result<bool> {
        Error::check_key(self.key_size, key)?;
        Ok(self.find(key)?.is_some())
    }

    /// Removes `key`, returns `false` if it was not present.
    ///
    /// Internal nodes left without children are unlinked from their level,
    /// their records stay in the file.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        Error::check_key(self.key_size, key)?;

        let mut path: Vec<Internal> = Vec::with_capacity(self.key_size);
        let mut offset = ROOT;
        for (level, &symbol) in key.iter().enumerate() {
            let expected = if level == 0 { None } else { Some(key[level - 1]) };
            let node = self.read_internal(offset, expected)?;
            let child = node.child(symbol);
            path.push(node);
            match child {
                Some(next) => offset = next,
                None => {
                    path.into_iter().for_each(|node| self.release_internal(node));
                    return Ok(false);
                }
            }
        }

        let leaf = self.read_leaf(offset, Some(key[self.key_size - 1]))?;
        self.check_leaf(&leaf, key)?;
        self.point_next(link(leaf.prev), leaf.next)?;
        self.point_prev(link(leaf.next), leaf.prev)?;
        self.release_leaf(leaf);
        self.len -= 1;

        let mut pruning = true;
        for (level, mut node) in path.into_iter().enumerate().rev() {
            if pruning {
                node.set(key[level], NIL);
                if level > 0 && node.is_empty() {
                    self.point_next_internal(link(node.prev), node.next)?;
                    self.point_prev_internal(link(node.next), node.prev)?;
                    debug!("Pruned internal node at offset {}", node.offset);
                } else {
                    self.write_internal(&node)?;
                    pruning = false;
                }
            }
            self.release_internal(node);
        }

        trace!("delete: key='{}' len={}", hex(key), self.len);
        Ok(true)
    }

    /// Value of the smallest key strictly greater than `key`.
    ///
    /// Query keys shorter than the key size are right-padded with zeros,
    /// longer ones are truncated.
    pub fn gt(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.seek_value(key, Direction::Forward, false)
    }

    pub fn gte(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.seek_value(key, Direction::Forward, true)
    }

    /// Value of the biggest key strictly lesser than `key`.
    pub fn lt(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.seek_value(key, Direction::Backward, false)
    }

    pub fn lte(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.seek_value(key, Direction::Backward, true)
    }

    pub fn successor(&self, key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let leaf = self.seek(key, Direction::Forward, false)?;
        self.entry(leaf)
    }

    pub fn predecessor(&self, key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let leaf = self.seek(key, Direction::Backward, false)?;
        self.entry(leaf)
    }

    pub fn first(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.entry(self.head)
    }

    pub fn last(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.entry(self.tail)
    }

    /// All entries in ascending key order, read lazily from the file.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self, self.head, self.tail)
    }

    /// Entries with keys between the bounds, in ascending order.
    pub fn range<K: AsRef<[u8]>>(&self, lower: Bound<K>, upper: Bound<K>) -> Result<Iter<'_>> {
        let lo = self.resolve(lower, Direction::Forward)?;
        let hi = self.resolve(upper, Direction::Backward)?;
        if let (Some(lo), Some(hi)) = (lo, hi) {
            if self.key_at(lo)? <= self.key_at(hi)? {
                return Ok(Iter::new(self, Some(lo), Some(hi)));
            }
        }
        Ok(Iter::new(self, None, None))
    }

    /// Eagerly collected values of [`DiskTrie::range`].
    pub fn scan<K: AsRef<[u8]>>(
        &self,
        lower: Bound<K>,
        upper: Bound<K>,
    ) -> Result<Vec<Vec<u8>>> {
        self.range(lower, upper)?
            .map(|entry| entry.map(|(_, val)| val))
            .collect()
    }

    fn resolve<K: AsRef<[u8]>>(
        &self,
        bound: Bound<K>,
        direction: Direction,
    ) -> Result<Option<u64>> {
        match bound {
            Bound::Included(key) => self.seek(key.as_ref(), direction, true),
            Bound::Excluded(key) => self.seek(key.as_ref(), direction, false),
            Bound::Unbounded => Ok(match direction {
                Direction::Forward => self.head,
                Direction::Backward => self.tail,
            }),
        }
    }

    fn seek(&self, key: &[u8], direction: Direction, inclusive: bool) -> Result<Option<u64>> {
        if self.head.is_none() {
            return Ok(None);
        }
        let key = search::pad(key, self.key_size, 0);
        search::seek(self, &key, direction, inclusive)
    }

    fn seek_value(
        &self,
        key: &[u8],
        direction: Direction,
        inclusive: bool,
    ) -> Result<Option<Vec<u8>>> {
        let leaf = self.seek(key, direction, inclusive)?;
        Ok(self.entry(leaf)?.map(|(_, val)| val))
    }

    fn entry(&self, offset: Option<u64>) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        match offset {
            Some(offset) => {
                let mut leaf = self.read_leaf(offset, None)?;
                let entry = (mem::take(&mut leaf.key), mem::take(&mut leaf.val));
                self.release_leaf(leaf);
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    fn key_at(&self, offset: u64) -> Result<Vec<u8>> {
        let mut leaf = self.read_leaf(offset, None)?;
        let key = mem::take(&mut leaf.key);
        self.release_leaf(leaf);
        Ok(key)
    }

    /// Offset of the leaf stored under `key`, if any.
    fn find(&self, key: &[u8]) -> Result<Option<u64>> {
        let mut offset = ROOT;
        for (level, &symbol) in key.iter().enumerate() {
            let expected = if level == 0 { None } else { Some(key[level - 1]) };
            let node = self.read_internal(offset, expected)?;
            let child = node.child(symbol);
            self.release_internal(node);
            match child {
                Some(next) => offset = next,
                None => return Ok(None),
            }
        }
        Ok(Some(offset))
    }

    /// Walks the leaf chain from head to tail.
    fn count(&self) -> Result<usize> {
        // Every leaf takes at least LEAF_HEAD bytes, more hops means a cycle.
        let limit = self.end as usize / LEAF_HEAD;
        let mut len = 0;
        for entry in self.iter() {
            entry?;
            len += 1;
            if len > limit {
                return Err(Error::invariant(format!(
                    "leaf chain is longer than {} records",
                    limit
                )));
            }
        }
        Ok(len)
    }

    /// Closest nodes at the depth of a new child `symbol` of `parent`.
    fn neighbours(&self, parent: &Internal, symbol: u8) -> Result<(Option<u64>, Option<u64>)> {
        let prev = match parent.predecessor(symbol) {
            Some(offset) => Some(offset),
            None => self.boundary(parent.prev, Direction::Backward)?,
        };
        let next = match parent.successor(symbol) {
            Some(offset) => Some(offset),
            None => self.boundary(parent.next, Direction::Forward)?,
        };
        Ok((prev, next))
    }

    /// First (`Forward`) or last (`Backward`) child of the internal node at `offset`.
    fn boundary(&self, offset: u64, direction: Direction) -> Result<Option<u64>> {
        let offset = match link(offset) {
            Some(offset) => offset,
            None => return Ok(None),
        };
        let node = self.read_internal(offset, None)?;
        let found = match direction {
            Direction::Forward => node.head(),
            Direction::Backward => node.tail(),
        };
        self.release_internal(node);
        match found {
            Some(child) => Ok(Some(child)),
            None => Err(Error::invariant(format!(
                "linked internal node at offset {} has no children",
                offset
            ))),
        }
    }

    /// Makes `to` follow leaf `at`, or the first leaf when there is no `at`.
    fn point_next(&mut self, at: Option<u64>, to: u64) -> Result<()> {
        match at {
            Some(offset) => self.patch_leaf(offset, |leaf| leaf.next = to),
            None => {
                self.head = link(to);
                Ok(())
            }
        }
    }

    /// Makes `to` precede leaf `at`, or the last leaf when there is no `at`.
    fn point_prev(&mut self, at: Option<u64>, to: u64) -> Result<()> {
        match at {
            Some(offset) => self.patch_leaf(offset, |leaf| leaf.prev = to),
            None => {
                self.tail = link(to);
                Ok(())
            }
        }
    }

    fn point_next_internal(&self, at: Option<u64>, to: u64) -> Result<()> {
        match at {
            Some(offset) => self.patch_internal(offset, |node| node.next = to),
            None => Ok(()),
        }
    }

    fn point_prev_internal(&self, at: Option<u64>, to: u64) -> Result<()> {
        match at {
            Some(offset) => self.patch_internal(offset, |node| node.prev = to),
            None => Ok(()),
        }
    }

    fn patch_leaf<F: FnOnce(&mut Leaf)>(&self, offset: u64, f: F) -> Result<()> {
        let mut leaf = self.read_leaf(offset, None)?;
        f(&mut leaf);
        self.write_leaf(&leaf)?;
        self.release_leaf(leaf);
        Ok(())
    }

    fn patch_internal<F: FnOnce(&mut Internal)>(&self, offset: u64, f: F) -> Result<()> {
        let mut node = self.read_internal(offset, None)?;
        f(&mut node);
        self.write_internal(&node)?;
        self.release_internal(node);
        Ok(())
    }

    fn check_leaf(&self, leaf: &Leaf, key: &[u8]) -> Result<()> {
        if leaf.key[..] != key[..] {
            return Err(Error::invariant(format!(
                "leaf at offset {} holds key '{}' instead of '{}'",
                leaf.offset,
                hex(&leaf.key),
                hex(key)
            )));
        }
        Ok(())
    }

    fn load(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)
    }

    fn save(&self, offset: u64, buf: &[u8]) -> Result<()> {
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(())
    }

    /// Reads the internal record at `offset`, checking its self-reference
    /// and, when given, the symbol it is expected to be stored under.
    fn read_internal(&self, offset: u64, symbol: Option<u8>) -> Result<Internal> {
        let mut buf = vec![0u8; INTERNAL_SIZE];
        self.load(offset, &mut buf)
            .map_err(short(offset, INTERNAL_SIZE))?;

        let mut node = self.internals.borrow_mut().take();
        node.decode(&buf);
        if node.offset != offset {
            return Err(Error::invariant(format!(
                "internal record at offset {} refers to offset {}",
                offset, node.offset
            )));
        }
        match symbol {
            Some(symbol) if symbol != node.symbol => Err(Error::invariant(format!(
                "internal record at offset {} has symbol {} instead of {}",
                offset, node.symbol, symbol
            ))),
            _ => Ok(node),
        }
    }

    /// Reads the leaf record at `offset`: the fixed head first, then the
    /// rest as announced by its length prefix.
    fn read_leaf(&self, offset: u64, symbol: Option<u8>) -> Result<Leaf> {
        let mut head = [0u8; LEAF_HEAD];
        self.load(offset, &mut head)
            .map_err(short(offset, LEAF_HEAD))?;

        let mut leaf = self.leaves.borrow_mut().take();
        let len = leaf.decode_head(&head);
        if leaf.offset != offset {
            return Err(Error::invariant(format!(
                "leaf record at offset {} refers to offset {}",
                offset, leaf.offset
            )));
        }
        if len < (LEAF_HEAD + self.key_size) as u64 {
            return Err(Error::invariant(format!(
                "leaf record at offset {} has corrupt length {}",
                offset, len
            )));
        }
        if offset.saturating_add(len) > self.end {
            return Err(Error::RecordSizeMismatch {
                offset,
                expected: len as usize,
            });
        }

        let mut body = vec![0u8; len as usize - LEAF_HEAD];
        self.load(offset + LEAF_HEAD as u64, &mut body)
            .map_err(short(offset, len as usize))?;
        leaf.decode_body(&body, self.key_size);

        match (symbol, leaf.symbol()) {
            (Some(expected), Some(actual)) if expected != actual => {
                Err(Error::invariant(format!(
                    "leaf record at offset {} has symbol {} instead of {}",
                    offset, actual, expected
                )))
            }
            _ => Ok(leaf),
        }
    }

    fn write_internal(&self, node: &Internal) -> Result<()> {
        let mut buf = BytesMut::with_capacity(INTERNAL_SIZE);
        node.encode(&mut buf);
        self.save(node.offset, &buf)
    }

    fn write_leaf(&self, leaf: &Leaf) -> Result<()> {
        let mut buf = BytesMut::with_capacity(leaf.size());
        leaf.encode(&mut buf);
        self.save(leaf.offset, &buf)
    }

    fn append_internal(&mut self, node: &mut Internal) -> Result<()> {
        node.offset = self.end;
        self.write_internal(node)?;
        self.end += INTERNAL_SIZE as u64;
        debug!("Appended internal record at offset {}", node.offset);
        Ok(())
    }

    fn append_leaf(&mut self, leaf: &mut Leaf) -> Result<()> {
        leaf.offset = self.end;
        self.write_leaf(leaf)?;
        self.end += leaf.size() as u64;
        debug!(
            "Appended leaf record at offset {} ({} bytes)",
            leaf.offset,
            leaf.size()
        );
        Ok(())
    }

    fn release_internal(&self, node: Internal) {
        self.internals.borrow_mut().give(node);
    }

    fn release_leaf(&self, leaf: Leaf) {
        self.leaves.borrow_mut().give(leaf);
    }
}

impl Walk for DiskTrie {
    type Node = u64;

    fn root(&self) -> u64 {
        ROOT
    }

    fn key_size(&self) -> usize {
        self.key_size
    }

    fn child(&self, node: u64, symbol: u8) -> Result<Option<u64>> {
        self.with_internal(node, |n| n.child(symbol))
    }

    fn successor(&self, node: u64, symbol: u8) -> Result<Option<u64>> {
        self.with_internal(node, |n| n.successor(symbol))
    }

    fn predecessor(&self, node: u64, symbol: u8) -> Result<Option<u64>> {
        self.with_internal(node, |n| n.predecessor(symbol))
    }

    fn head(&self, node: u64) -> Result<Option<u64>> {
        self.with_internal(node, Internal::head)
    }

    fn tail(&self, node: u64) -> Result<Option<u64>> {
        self.with_internal(node, Internal::tail)
    }
}

impl DiskTrie {
    fn with_internal<T, F: FnOnce(&Internal) -> T>(&self, offset: u64, f: F) -> Result<T> {
        let node = self.read_internal(offset, None)?;
        let out = f(&node);
        self.release_internal(node);
        Ok(out)
    }
}

/// Lazily reads leaves between two of them (both inclusive) following the
/// chain links. Stops after the first error.
pub struct Iter<'a> {
    trie: &'a DiskTrie,
    front: Option<u64>,
    back: Option<u64>,
}

impl<'a> Iter<'a> {
    fn new(trie: &'a DiskTrie, front: Option<u64>, back: Option<u64>) -> Self {
        Self { trie, front, back }
    }

    fn step(&mut self, offset: u64, forward: bool) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut leaf = match self.trie.read_leaf(offset, None) {
            Ok(leaf) => leaf,
            Err(e) => {
                self.front = None;
                self.back = None;
                return Err(e);
            }
        };
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else if forward {
            self.front = link(leaf.next);
        } else {
            self.back = link(leaf.prev);
        }
        let entry = (mem::take(&mut leaf.key), mem::take(&mut leaf.val));
        self.trie.release_leaf(leaf);
        Ok(entry)
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.front?;
        Some(self.step(offset, true))
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let offset = self.back?;
        Some(self.step(offset, false))
    }
}
