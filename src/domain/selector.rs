//! Weighted random choice over a small set of alternatives.

use rand::Rng;

/// One selectable alternative with its non-negative weight.
#[derive(Debug, Clone)]
pub struct WeightedEntry<T> {
    pub item: T,
    pub weight: f64,
}

/// Weighted-random-choice collection.
///
/// Selection draws uniformly in `[0, total)` and returns the first entry
/// whose cumulative weight exceeds the draw, via a linear scan. Branching
/// factors here are tens, not millions, so the scan stays cheap.
#[derive(Debug)]
pub struct WeightedSelector<T> {
    entries: Vec<WeightedEntry<T>>,
    total: f64,
}

impl<T> Default for WeightedSelector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WeightedSelector<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            total: 0.0,
        }
    }

    /// Add an alternative. The weight must be finite and non-negative;
    /// violating that is a caller error.
    pub fn add(&mut self, item: T, weight: f64) {
        assert!(
            weight.is_finite() && weight >= 0.0,
            "selection weight must be finite and non-negative, got {weight}"
        );
        self.total += weight;
        self.entries.push(WeightedEntry { item, weight });
    }

    /// Draw one entry at probability weight/total. Returns `None` when the
    /// selector is empty or every entry has zero weight. Zero-weight entries
    /// are never selected otherwise.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        if self.entries.is_empty() || self.total <= 0.0 {
            return None;
        }
        let draw = rng.gen_range(0.0..self.total);
        let mut cumulative = 0.0;
        for entry in &self.entries {
            cumulative += entry.weight;
            if draw < cumulative {
                return Some(&entry.item);
            }
        }
        // float accumulation may leave the draw exactly at the boundary
        self.entries
            .iter()
            .rev()
            .find(|e| e.weight > 0.0)
            .map(|e| &e.item)
    }

    /// Running sum of all entry weights.
    pub fn total_weight(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[WeightedEntry<T>] {
        &self.entries
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.item)
    }
}
