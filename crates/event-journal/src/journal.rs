//! Bounded FIFO Journal Implementation

use crate::JournalError;
use std::collections::VecDeque;

/// Default journal capacity (50 events)
pub const DEFAULT_CAPACITY: usize = 50;

/// Append-only journal holding at most `capacity` entries, oldest first.
///
/// Owned by a single session; no interior mutability.
#[derive(Debug, Clone)]
pub struct Journal<T> {
    /// Entries, oldest at the front
    entries: VecDeque<T>,
    /// Fixed capacity
    capacity: usize,
    /// Total entries appended (for statistics)
    total_appended: u64,
}

impl<T> Journal<T> {
    /// Create a new journal with given capacity
    pub fn new(capacity: usize) -> Result<Self, JournalError> {
        if capacity == 0 {
            return Err(JournalError::ZeroCapacity);
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total_appended: 0,
        })
    }

    /// Create a journal with default capacity (50 entries)
    pub fn with_default_capacity() -> Self {
        Self {
            entries: VecDeque::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
            total_appended: 0,
        }
    }

    /// Append an entry at the tail, returning the evicted head if full
    pub fn append(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        self.total_appended += 1;
        evicted
    }

    /// Get the number of entries currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if journal is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the journal capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get total entries ever appended, including evicted ones
    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }
}

impl<T: Clone> Journal<T> {
    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

impl<T> Default for Journal<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_append_and_snapshot() {
        let mut journal = Journal::new(10).unwrap();

        for i in 0..5 {
            assert_eq!(journal.append(i), None);
        }

        assert_eq!(journal.len(), 5);
        assert_eq!(journal.snapshot(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_evicts_oldest() {
        let mut journal = Journal::new(3).unwrap();

        for i in 0..3 {
            journal.append(i);
        }
        assert_eq!(journal.len(), journal.capacity());

        assert_eq!(journal.append(3), Some(0));
        assert_eq!(journal.append(4), Some(1));
        assert_eq!(journal.snapshot(), vec![2, 3, 4]);
        assert_eq!(journal.total_appended(), 5);
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut journal = Journal::with_default_capacity();
        journal.append("a");
        journal.append("b");

        assert_eq!(journal.snapshot(), journal.snapshot());
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(Journal::<u8>::new(0).unwrap_err(), JournalError::ZeroCapacity);
    }

    proptest! {
        #[test]
        fn prop_bounded_fifo(capacity in 1usize..64, count in 0usize..200) {
            let mut journal = Journal::new(capacity).unwrap();
            for i in 0..count {
                journal.append(i);
                prop_assert!(journal.len() <= capacity);
            }

            // Contents are always the last `capacity` appends, in order
            let expected: Vec<usize> = (count.saturating_sub(capacity)..count).collect();
            prop_assert_eq!(journal.snapshot(), expected);
        }
    }
}
