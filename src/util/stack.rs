/// LIFO of visited ancestors, used to walk back up the tree.
#[derive(Debug)]
pub(crate) struct Stack<T> {
    items: Vec<T>,
}

impl<T: Copy> Stack<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub(crate) fn top(&self) -> Option<T> {
        self.items.last().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}
