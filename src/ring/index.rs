//! Sorted index of ring positions.
//!
//! ## Time Complexity
//! - Search / match: O(log n) binary search
//! - Insert batch: O(n log n) for the single re-sort after appending
//! - Remove: O(n) shift to keep the order

/// Ordered sequence of 32-bit ring positions, ascending after every public call.
///
/// Duplicates are only present when two virtual keys collide; the index does
/// no duplicate suppression of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingIndex {
    positions: Vec<u32>,
}

impl RingIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with room for `capacity` positions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
        }
    }

    /// Number of positions on the ring.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the ring has no positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position value at `index`.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.positions.get(index).copied()
    }

    /// All positions in ascending order.
    pub fn as_slice(&self) -> &[u32] {
        &self.positions
    }

    /// Insert one value and restore ascending order.
    pub fn insert_sorted(&mut self, value: u32) {
        self.positions.push(value);
        self.sort();
    }

    /// Append every value, then sort once.
    pub fn extend_sorted<I: IntoIterator<Item = u32>>(&mut self, values: I) {
        self.positions.extend(values);
        self.sort();
    }

    /// Sort the positions ascending.
    pub fn sort(&mut self) {
        self.positions.sort_unstable();
    }

    /// Exact lookup. Returns the index of the first element equal to `target`.
    pub fn search(&self, target: u32) -> Option<usize> {
        let i = self.positions.partition_point(|&v| v < target);
        match self.positions.get(i) {
            Some(&v) if v == target => Some(i),
            _ => None,
        }
    }

    /// Resolve `target` to the index of the position that owns it.
    ///
    /// The owner is the greatest position `<= target`. A target below the
    /// smallest position wraps to the last index, so the highest position
    /// owns the arc running past `u32::MAX` back to the first position.
    /// Returns `None` only for an empty index.
    pub fn match_position(&self, target: u32) -> Option<usize> {
        if self.positions.is_empty() {
            return None;
        }
        // First element strictly greater than the target.
        let upper = self.positions.partition_point(|&v| v <= target);
        if upper == 0 {
            Some(self.positions.len() - 1)
        } else {
            Some(upper - 1)
        }
    }

    /// Remove the element at `index`, keeping the rest in order.
    pub fn remove(&mut self, index: usize) -> Option<u32> {
        if index < self.positions.len() {
            Some(self.positions.remove(index))
        } else {
            None
        }
    }

    /// Remove one occurrence of `value`. Returns whether it was present.
    pub fn remove_value(&mut self, value: u32) -> bool {
        self.search(value)
            .and_then(|index| self.remove(index))
            .is_some()
    }

    /// Whether `value` is present.
    pub fn contains(&self, value: u32) -> bool {
        self.search(value).is_some()
    }

    /// Drop all positions.
    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

impl From<Vec<u32>> for RingIndex {
    fn from(mut positions: Vec<u32>) -> Self {
        positions.sort_unstable();
        Self { positions }
    }
}
