use std::collections::VecDeque;
use std::fmt;
use std::io;

use logsplit_types::RetentionPolicy;

use crate::error::{FilterError, Result};
use crate::router::Sink;

/// Upper bound on up-front allocation; larger buffers grow on demand
const MAX_PREALLOC: usize = 4096;

/// Fixed-capacity buffer that keeps either the first or the last N items
#[derive(Clone)]
pub struct BoundedBuffer<T> {
    /// Retained items, oldest first
    items: VecDeque<T>,

    /// Maximum retained items
    capacity: usize,

    /// Which items survive once full
    policy: RetentionPolicy,

    /// Every add so far, including dropped ones
    total_added: usize,
}

impl<T> BoundedBuffer<T> {
    /// Create a new buffer; capacity must be at least 1
    pub fn new(capacity: usize, policy: RetentionPolicy) -> Result<Self> {
        if capacity < 1 {
            return Err(FilterError::InvalidCapacity { capacity });
        }

        Ok(Self {
            items: VecDeque::with_capacity(capacity.min(MAX_PREALLOC)),
            capacity,
            policy,
            total_added: 0,
        })
    }

    /// Add an item according to the retention policy
    pub fn add(&mut self, item: T) {
        self.total_added += 1;
        match self.policy {
            RetentionPolicy::KeepFirst => {
                if self.items.len() < self.capacity {
                    self.items.push_back(item);
                }
            }
            RetentionPolicy::KeepLast => {
                if self.items.len() >= self.capacity {
                    self.items.pop_front();
                }
                self.items.push_back(item);
            }
        }
    }

    /// Current element count, never above capacity
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Number of adds, retained or not
    pub fn total_added(&self) -> usize {
        self.total_added
    }

    /// Number of adds that were ignored or evicted
    pub fn dropped(&self) -> usize {
        self.total_added - self.items.len()
    }

    /// Iterate retained items in order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Get a window of items (for virtual scrolling)
    pub fn range(&self, start: usize, count: usize) -> impl Iterator<Item = &T> {
        self.items.iter().skip(start).take(count)
    }

    /// Drop all items and reset the add counter
    pub fn clear(&mut self) {
        self.items.clear();
        self.total_added = 0;
    }
}

impl<T: Clone> BoundedBuffer<T> {
    /// Copy of the retained items, in retained order
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("total_added", &self.total_added)
            .field("items", &self.items)
            .finish()
    }
}

impl Sink for BoundedBuffer<String> {
    fn accept(&mut self, line: &str) -> io::Result<()> {
        self.add(line.to_string());
        Ok(())
    }
}
