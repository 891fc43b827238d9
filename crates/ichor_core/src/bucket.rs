//! Ordered buckets.
//!
//! Every series, and the reserved object namespace, is one [`Bucket`]: an
//! ordered map from key bytes to encoded record bytes. Series keys are
//! [`PointKey`]s, so iterating a series bucket walks it in time order.

use crate::key::PointKey;
use std::collections::BTreeMap;
use std::ops::Bound;

/// An independent ordered key-value partition.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    name: String,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Bucket {
    /// Creates an empty bucket.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the bucket holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upserts an entry. The last write at an identical key wins.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    /// Looks up a single key.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Returns entries with `min <= key <= max`, ascending.
    ///
    /// An inverted range yields nothing.
    #[must_use]
    pub fn scan_range(&self, min: &PointKey, max: &PointKey) -> Vec<(&[u8], &[u8])> {
        if min > max {
            return Vec::new();
        }
        let lower = Bound::Included(min.as_bytes().as_slice());
        let upper = Bound::Included(max.as_bytes().as_slice());
        self.entries
            .range::<[u8], _>((lower, upper))
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect()
    }

    /// Returns the `n` entries with the largest keys, ascending.
    #[must_use]
    pub fn scan_last_n(&self, n: usize) -> Vec<(&[u8], &[u8])> {
        let mut tail: Vec<_> = self
            .entries
            .iter()
            .rev()
            .take(n)
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();
        tail.reverse();
        tail
    }

    /// Returns the smallest and largest keys, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<(&[u8], &[u8])> {
        let first = self.entries.keys().next()?;
        let last = self.entries.keys().next_back()?;
        Some((first.as_slice(), last.as_slice()))
    }
}
