//! Binary min-heap keyed by a numeric priority.
//!
//! `MinHeap` backs the Dijkstra frontier. It stores `(priority, value)`
//! pairs in a flat vector laid out as an implicit binary tree, so both
//! `push` and `pop` are O(log n). Ties between equal priorities come out in
//! whatever order the sift operations leave them; callers must not rely on
//! insertion order for equal keys.

/// A min-priority queue carrying an opaque payload per entry.
#[derive(Debug, Clone)]
pub struct MinHeap<T> {
    entries: Vec<(f64, T)>,
}

impl<T> MinHeap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert `value` with the given priority.
    pub fn push(&mut self, priority: f64, value: T) {
        self.entries.push((priority, value));
        self.sift_up(self.entries.len() - 1);
    }

    /// Remove and return the entry with the smallest priority.
    pub fn pop(&mut self) -> Option<(f64, T)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let min = self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        min
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.entries[a].0.total_cmp(&self.entries[b].0).is_lt()
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.less(index, parent) {
                break;
            }
            self.entries.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.entries.swap(index, smallest);
            index = smallest;
        }
    }
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}
