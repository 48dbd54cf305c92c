use std::collections::VecDeque;

/// Fixed-capacity FIFO; pushing into a full queue evicts the oldest item.
#[derive(Debug)]
pub struct CircularQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> CircularQueue<T> {
    /// `cap` is raised to 1 so the queue can always hold the latest item.
    pub fn with_capacity(cap: usize) -> Self {
        let capacity = cap.max(1);

        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };

        self.items.push_back(item);
        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Oldest item first.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'_ T> {
        self.items.iter()
    }

    #[inline]
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }
}
