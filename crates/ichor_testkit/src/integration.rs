//! Shadow-model harness for store queries.
//!
//! Mirrors every write into a plain ordered map and checks that range and
//! tail queries agree with it.

use crate::fixtures::{at, TestStore};
use crate::generators::MAX_SECS;
use chrono::{DateTime, Utc};
use ichor_core::{CoreResult, GlucosePoint, PointKey, SERIES_GLUCOSE};
use std::collections::BTreeMap;

/// A test harness that tracks expected glucose contents.
pub struct IntegrationHarness {
    /// The store under test.
    pub store: TestStore,
    /// Expected readings keyed by whole second.
    expected: BTreeMap<u64, GlucosePoint>,
}

impl IntegrationHarness {
    /// Creates a harness over an in-memory store.
    pub fn new() -> Self {
        Self::with_store(TestStore::memory())
    }

    /// Creates a harness over a file-backed store.
    pub fn file() -> Self {
        Self::with_store(TestStore::file())
    }

    fn with_store(store: TestStore) -> Self {
        Self {
            store,
            expected: BTreeMap::new(),
        }
    }

    /// Stores a reading at its own time and records it in the model.
    pub fn put(&mut self, point: GlucosePoint) {
        self.store
            .put_point(SERIES_GLUCOSE, point.time, &point)
            .expect("Failed to put reading");
        self.expected
            .insert(PointKey::from_time(&point.time).secs(), point);
    }

    /// Consumes the harness, returning the store.
    pub fn into_store(self) -> TestStore {
        self.store
    }

    /// Number of distinct seconds written.
    pub fn len(&self) -> usize {
        self.expected.len()
    }

    /// Returns true if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    /// Expected result of a range query.
    pub fn expected_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<GlucosePoint> {
        let (lo, hi) = (
            PointKey::from_time(&start).secs(),
            PointKey::from_time(&end).secs(),
        );
        if lo > hi {
            return Vec::new();
        }
        self.expected.range(lo..=hi).map(|(_, p)| *p).collect()
    }

    /// Expected result of a tail query.
    pub fn expected_tail(&self, count: usize) -> Vec<GlucosePoint> {
        let mut tail: Vec<GlucosePoint> =
            self.expected.values().rev().take(count).copied().collect();
        tail.reverse();
        tail
    }

    /// Runs a range query against the store.
    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Vec<GlucosePoint>> {
        self.store.range_query(SERIES_GLUCOSE, start, end)
    }

    /// Runs a tail query against the store.
    pub fn tail(&self, count: usize) -> CoreResult<Vec<GlucosePoint>> {
        self.store.tail_query(SERIES_GLUCOSE, count)
    }

    /// Checks the full range and a tail of every length against the model.
    pub fn verify_all(&self) -> Result<(), String> {
        let (start, end) = (at(0), at(MAX_SECS));
        let all = self.range(start, end).map_err(|e| e.to_string())?;
        let expected = self.expected_range(start, end);
        if all != expected {
            return Err(format!("range mismatch: got {all:?}, expected {expected:?}"));
        }

        for n in 0..=self.len() + 1 {
            let tail = self.tail(n).map_err(|e| e.to_string())?;
            if tail != self.expected_tail(n) {
                return Err(format!("tail({n}) mismatch: got {tail:?}"));
            }
        }
        Ok(())
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}
