//! Frequency stores.
//!
//! A [`FrequencyStore`] keeps absolute counts per key, their running total,
//! and the relative frequency `count / total` of every key. Relative values
//! are recomputed after each completed update, so between updates every
//! relative value is consistent with the current counts and they sum to 1
//! (or the store is empty).

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use dfdrift_common::{DirectlyFollowsPair, EventLabel};

/// Absolute and relative frequencies over keys of type `K`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyStore<K: Eq + Hash> {
    absolute: HashMap<K, u64>,
    relative: HashMap<K, f64>,
    total: f64,
}

impl<K: Eq + Hash> Default for FrequencyStore<K> {
    fn default() -> Self {
        Self {
            absolute: HashMap::new(),
            relative: HashMap::new(),
            total: 0.0,
        }
    }
}

impl<K: Eq + Hash + Clone> FrequencyStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`.
    ///
    /// Relative values are stale until [`recompute_relative`] runs.
    ///
    /// [`recompute_relative`]: FrequencyStore::recompute_relative
    pub fn record(&mut self, key: K) {
        *self.absolute.entry(key).or_insert(0) += 1;
        self.total += 1.0;
    }

    /// Refresh every relative value from the current counts.
    pub fn recompute_relative(&mut self) {
        let total = self.total;
        self.relative = self
            .absolute
            .iter()
            .map(|(k, &count)| (k.clone(), count as f64 / total))
            .collect();
    }

    /// Count every key, then refresh relative values once.
    pub fn record_all<I: IntoIterator<Item = K>>(&mut self, keys: I) {
        for key in keys {
            self.record(key);
        }
        self.recompute_relative();
    }

    /// Copy of the relative map, unaffected by later updates.
    pub fn snapshot_relative(&self) -> HashMap<K, f64> {
        self.relative.clone()
    }

    pub fn absolute(&self) -> &HashMap<K, u64> {
        &self.absolute
    }

    pub fn relative(&self) -> &HashMap<K, f64> {
        &self.relative
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Count for `key`, zero when unseen.
    pub fn count(&self, key: &K) -> u64 {
        self.absolute.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys observed.
    pub fn len(&self) -> usize {
        self.absolute.len()
    }

    pub fn is_empty(&self) -> bool {
        self.absolute.is_empty()
    }
}

impl FrequencyStore<DirectlyFollowsPair> {
    /// Count every adjacent pair of `labels`.
    pub fn update(&mut self, labels: &[EventLabel]) {
        self.record_all(DirectlyFollowsPair::windows(labels));
    }
}

impl FrequencyStore<EventLabel> {
    /// Count every label.
    pub fn update(&mut self, labels: &[EventLabel]) {
        self.record_all(labels.iter().cloned());
    }
}

/// `{key=count, ...}` in key order.
impl<K: Eq + Hash + Ord + fmt::Display> fmt::Display for FrequencyStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.absolute.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        f.write_str("{")?;
        for (i, (key, count)) in entries.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, count)?;
        }
        f.write_str("}")
    }
}
