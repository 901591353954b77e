//! Grouped counts, sums and means keyed by category.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Cell {
    count: usize,
    sum: f64,
}

/// Running aggregate per key, remembering first-appearance order.
#[derive(Debug, Clone)]
pub struct Tally<K> {
    order: Vec<K>,
    cells: HashMap<K, Cell>,
}

impl<K: Eq + Hash + Clone> Default for Tally<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            cells: HashMap::new(),
        }
    }

    /// Count one row for `key`, adding `weight` to its sum.
    pub fn add(&mut self, key: K, weight: f64) {
        let cell = self.cells.entry(key.clone()).or_insert_with(|| {
            self.order.push(key);
            Cell::default()
        });
        cell.count += 1;
        cell.sum += weight;
    }

    pub fn keys(&self) -> &[K] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn count(&self, key: &K) -> usize {
        self.cells.get(key).map_or(0, |c| c.count)
    }

    pub fn sum(&self, key: &K) -> f64 {
        self.cells.get(key).map_or(0.0, |c| c.sum)
    }

    pub fn mean(&self, key: &K) -> Option<f64> {
        self.cells
            .get(key)
            .filter(|c| c.count > 0)
            .map(|c| c.sum / c.count as f64)
    }

    /// Sum of all row counts.
    pub fn total_count(&self) -> usize {
        self.cells.values().map(|c| c.count).sum()
    }

    pub fn total_sum(&self) -> f64 {
        self.cells.values().map(|c| c.sum).sum()
    }
}
