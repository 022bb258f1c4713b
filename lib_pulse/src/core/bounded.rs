use std::collections::VecDeque;

/// Fixed-capacity sequence with truncate-on-insert eviction.
///
/// Two insertion disciplines are supported, matching the two retention policies of the
/// store:
///
/// - [`prepend_batch`](Self::prepend_batch): newest-first lists (comments). The batch lands
///   at the head in its own order; the tail is evicted.
/// - [`push_back`](Self::push_back): oldest-first logs (events). The item lands at the tail;
///   the head is evicted.
#[derive(Debug, Clone)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    /// Creates an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    /// Inserts `batch` at the head, preserving the batch's order, then evicts from the tail.
    /// Returns the number of evicted items.
    pub fn prepend_batch<I>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        // Anything past capacity in the batch would be evicted immediately anyway.
        let batch: Vec<T> = batch.into_iter().take(self.capacity).collect();
        let before = self.items.len() + batch.len();
        for item in batch.into_iter().rev() {
            self.items.push_front(item);
        }
        self.items.truncate(self.capacity);
        before - self.items.len()
    }

    /// Appends at the tail; evicts and returns the head when over capacity.
    pub fn push_back(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        }
    }
}

impl<T: Clone> BoundedBuffer<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
