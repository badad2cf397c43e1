pub mod error;

use crate::api::error::Result;
use crate::container::Container;
use crate::disk::DiskTrie;
use crate::trie::Trie;

/// Byte-oriented ordered key-value store, implemented by both the in-memory
/// trie (with `Vec<u8>` values) and the disk trie.
pub trait Store {
    fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn insert(&mut self, key: &[u8], val: &[u8]) -> Result<()>;

    /// Returns `false` if there was nothing to remove.
    fn remove(&mut self, key: &[u8]) -> Result<bool>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get lowest/smallest key stored, or none if the store is empty.
    fn min(&self) -> Result<Option<Vec<u8>>>;

    /// Get highest/biggest key stored, or none if the store is empty.
    fn max(&self) -> Result<Option<Vec<u8>>>;

    /// Get smallest key that is strictly greater than given one, if any.
    fn above(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Get biggest key that is strictly lesser than given one, if any.
    fn below(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
}

impl Store for DiskTrie {
    fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        DiskTrie::lookup(self, key)
    }

    fn insert(&mut self, key: &[u8], val: &[u8]) -> Result<()> {
        self.set(key, val)
    }

    fn remove(&mut self, key: &[u8]) -> Result<bool> {
        self.delete(key)
    }

    fn len(&self) -> usize {
        DiskTrie::len(self)
    }

    fn min(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.first()?.map(|(k, _)| k))
    }

    fn max(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.last()?.map(|(k, _)| k))
    }

    fn above(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.successor(key)?.map(|(k, _)| k))
    }

    fn below(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.predecessor(key)?.map(|(k, _)| k))
    }
}

impl<C: Container> Store for Trie<Vec<u8>, C> {
    fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.get(key)?.cloned())
    }

    fn insert(&mut self, key: &[u8], val: &[u8]) -> Result<()> {
        self.set(key, val.to_vec())?;
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> Result<bool> {
        self.delete(key)
    }

    fn len(&self) -> usize {
        Trie::len(self)
    }

    fn min(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.first()?.map(|(k, _)| k.to_vec()))
    }

    fn max(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.last()?.map(|(k, _)| k.to_vec()))
    }

    fn above(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.successor(key)?.map(|(k, _)| k.to_vec()))
    }

    fn below(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.predecessor(key)?.map(|(k, _)| k.to_vec()))
    }
}
