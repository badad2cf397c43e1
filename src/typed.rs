use anyhow::Context;
use std::path::Path;

use crate::api::Store as _;
use crate::disk::DiskTrie;

pub struct Store(DiskTrie);

/// Typed facade over a [`DiskTrie`]: keys and values are anything that can
/// be viewed as bytes and rebuilt from them. Keys must encode to exactly
/// `key_size` bytes.
pub trait DB<K, V>: Sized
where
    K: AsRef<[u8]> + for<'a> From<&'a [u8]>,
    V: AsRef<[u8]> + for<'a> From<&'a [u8]>,
{
    fn open(path: &Path, key_size: usize) -> anyhow::Result<Self>;

    fn contains(&self, key: &K) -> anyhow::Result<bool>;
    fn lookup(&self, key: &K) -> anyhow::Result<Option<V>>;
    fn remove(&mut self, key: &K) -> anyhow::Result<Option<V>>;
    fn insert(&mut self, key: &K, val: V) -> anyhow::Result<()>;

    fn min(&self) -> anyhow::Result<Option<K>>;
    fn max(&self) -> anyhow::Result<Option<K>>;
    fn above(&self, key: &K) -> anyhow::Result<Option<K>>;
    fn below(&self, key: &K) -> anyhow::Result<Option<K>>;
}

impl<K, V> DB<K, V> for Store
where
    K: AsRef<[u8]> + for<'a> From<&'a [u8]>,
    V: AsRef<[u8]> + for<'a> From<&'a [u8]>,
{
    fn open(path: &Path, key_size: usize) -> anyhow::Result<Self> {
        let trie = DiskTrie::open(path, key_size)
            .with_context(|| format!("Failed to open {:?} (key size {})", path, key_size))?;
        Ok(Self(trie))
    }

    fn contains(&self, key: &K) -> anyhow::Result<bool> {
        Ok(self.0.contains_key(key.as_ref())?)
    }

    fn lookup(&self, key: &K) -> anyhow::Result<Option<V>> {
        Ok(self
            .0
            .lookup(key.as_ref())?
            .map(|bytes| V::from(bytes.as_slice())))
    }

    fn remove(&mut self, key: &K) -> anyhow::Result<Option<V>> {
        let val = DB::<K, V>::lookup(self, key)?;
        self.0.delete(key.as_ref())?;
        Ok(val)
    }

    fn insert(&mut self, key: &K, val: V) -> anyhow::Result<()> {
        Ok(self.0.set(key.as_ref(), val.as_ref())?)
    }

    fn min(&self) -> anyhow::Result<Option<K>> {
        Ok(self.0.min()?.map(|bytes| K::from(bytes.as_slice())))
    }

    fn max(&self) -> anyhow::Result<Option<K>> {
        Ok(self.0.max()?.map(|bytes| K::from(bytes.as_slice())))
    }

    fn above(&self, key: &K) -> anyhow::Result<Option<K>> {
        Ok(self
            .0
            .above(key.as_ref())?
            .map(|bytes| K::from(bytes.as_slice())))
    }

    fn below(&self, key: &K) -> anyhow::Result<Option<K>> {
        Ok(self
            .0
            .below(key.as_ref())?
            .map(|bytes| K::from(bytes.as_slice())))
    }
}
