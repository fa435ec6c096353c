// ── Bounded sliding-window history ──
//
// FIFO sequence capped at a fixed length. Appending never mutates a
// published sequence: `appended` builds a new one from the retained tail.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Oldest-first sequence holding at most `capacity` entries.
///
/// Entries live behind an `Arc`, so cloning a snapshot that contains a
/// history is O(1); only appends pay for a copy of the retained tail.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedHistory<T> {
    capacity: usize,
    entries: Arc<VecDeque<T>>,
}

impl<T: Clone> BoundedHistory<T> {
    /// Empty history. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Arc::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// History seeded from `items`, keeping only the newest `capacity`.
    pub fn from_items(capacity: usize, items: impl IntoIterator<Item = T>) -> Self {
        let mut history = Self::new(capacity);
        let mut entries: VecDeque<T> = items.into_iter().collect();
        let excess = entries.len().saturating_sub(history.capacity);
        entries.drain(..excess);
        history.entries = Arc::new(entries);
        history
    }

    /// New history equal to `tail(self, capacity - 1) ++ [item]`.
    pub fn appended(&self, item: T) -> Self {
        let keep = self.capacity - 1;
        let skip = self.entries.len().saturating_sub(keep);

        let mut entries = VecDeque::with_capacity(self.capacity);
        entries.extend(self.entries.iter().skip(skip).cloned());
        entries.push_back(item);

        Self {
            capacity: self.capacity,
            entries: Arc::new(entries),
        }
    }

    /// Empty history with the same capacity.
    pub fn cleared(&self) -> Self {
        Self::new(self.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Oldest entry.
    pub fn first(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Newest entry.
    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

impl<'a, T: Clone> IntoIterator for &'a BoundedHistory<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Serializes as a plain oldest-first sequence.
impl<T: Serialize> Serialize for BoundedHistory<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_append_to_empty() {
        let history = BoundedHistory::new(3).appended(1);
        assert_eq!(history.to_vec(), vec![1]);
    }

    #[test]
    fn drops_oldest_at_capacity() {
        let history = (1..=5).fold(BoundedHistory::new(3), |h, i| h.appended(i));
        assert_eq!(history.to_vec(), vec![3, 4, 5]);
        assert!(history.is_full());
        assert_eq!(history.first(), Some(&3));
        assert_eq!(history.last(), Some(&5));
    }

    #[test]
    fn append_leaves_source_untouched() {
        let base = BoundedHistory::new(2).appended('a').appended('b');
        let next = base.appended('c');

        assert_eq!(base.to_vec(), vec!['a', 'b']);
        assert_eq!(next.to_vec(), vec!['b', 'c']);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut history = BoundedHistory::new(60);
        for i in 0..200 {
            history = history.appended(i);
            assert!(history.len() <= 60);
        }
    }

    #[test]
    fn zero_capacity_behaves_as_one() {
        let history = BoundedHistory::new(0).appended(1).appended(2);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.to_vec(), vec![2]);
    }

    #[test]
    fn from_items_keeps_newest() {
        let history = BoundedHistory::from_items(3, 1..=10);
        assert_eq!(history.to_vec(), vec![8, 9, 10]);
    }

    #[test]
    fn cleared_keeps_capacity() {
        let history = BoundedHistory::from_items(4, [1, 2]).cleared();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 4);
    }
}
