use log::debug;

pub(crate) trait Reset {
    /// Bring the item back to the state of a freshly created one.
    fn reset(&mut self);
}

/// Bounded free list of reusable items. `take` hands out a recycled item
/// when one is available, `give` resets the item and keeps it unless the
/// pool is already full.
pub(crate) struct Pool<T> {
    free: Vec<T>,
    cap: usize,
}

impl<T: Default + Reset> Pool<T> {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            free: Vec::with_capacity(cap),
            cap,
        }
    }

    pub(crate) fn take(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    pub(crate) fn give(&mut self, mut item: T) {
        if self.free.len() == self.cap {
            debug!("Pool is full ({}), dropping item", self.cap);
            return;
        }
        item.reset();
        self.free.push(item);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.free.len()
    }
}
