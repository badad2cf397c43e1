//! Sharing a trie between threads.
//!
//! Neither trie does any locking of its own; `Shared` serializes every
//! operation behind one `parking_lot::Mutex`.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

use crate::api::error::Result;
use crate::api::Store;

pub struct Shared<S>(Arc<Mutex<S>>);

impl<S> Clone for Shared<S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<S> Shared<S> {
    pub fn new(store: S) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    /// Exclusive access for as long as the guard lives.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.0.lock()
    }

    pub fn with<T, F: FnOnce(&mut S) -> T>(&self, f: F) -> T {
        let mut guard = self.0.lock();
        f(&mut *guard)
    }
}

impl<S: Store> Shared<S> {
    pub fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.0.lock().lookup(key)
    }

    pub fn insert(&self, key: &[u8], val: &[u8]) -> Result<()> {
        self.0.lock().insert(key, val)
    }

    pub fn remove(&self, key: &[u8]) -> Result<bool> {
        self.0.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}
