use std::collections::VecDeque;

/// Fixed-capacity sliding window; pushing onto a full buffer evicts the oldest value.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl WindowBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Buffer holding the trailing `capacity` values of `initial`.
    pub fn from_slice(capacity: usize, initial: &[f64]) -> Self {
        let mut buffer = Self::with_capacity(capacity);
        for value in initial {
            buffer.push(*value);
        }
        buffer
    }

    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-first contiguous copy, in the shape predictors consume.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}
