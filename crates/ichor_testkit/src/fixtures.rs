//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use chrono::{DateTime, Utc};
use ichor_core::{GlucosePoint, Store, StoreConfig, Trend, DEFAULT_SERIES};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates an initialized in-memory test store.
    pub fn memory() -> Self {
        let store = Store::open_in_memory().expect("Failed to open in-memory store");
        store
            .initialize(&DEFAULT_SERIES)
            .expect("Failed to initialize store");
        Self {
            store,
            temp_dir: None,
        }
    }

    /// Creates an initialized file-backed test store.
    ///
    /// Syncing is disabled to keep tests fast; data is still flushed to
    /// the file on every write.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = open_file_store(&temp_dir.path().join("ichor.db"));
        store
            .initialize(&DEFAULT_SERIES)
            .expect("Failed to initialize store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the data file path if file-backed.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("ichor.db"))
    }

    /// Returns the temporary directory if file-backed.
    pub fn dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Closes the store and opens it again from disk.
    ///
    /// # Panics
    ///
    /// Panics for in-memory stores.
    pub fn reopen(self) -> Self {
        let Self { store, temp_dir } = self;
        let temp_dir = temp_dir.expect("Only file-backed stores can be reopened");
        store.close().expect("Failed to close store");
        drop(store);
        Self {
            store: open_file_store(&temp_dir.path().join("ichor.db")),
            temp_dir: Some(temp_dir),
        }
    }

    /// Closes the store, keeping the directory, and returns the directory.
    pub fn into_dir(self) -> TempDir {
        let Self { store, temp_dir } = self;
        store.close().expect("Failed to close store");
        temp_dir.expect("Only file-backed stores have a directory")
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Opens a file store with syncing disabled.
pub fn open_file_store(path: &Path) -> Store {
    Store::open_with_config(StoreConfig::new(path).sync_on_write(false))
        .expect("Failed to open file store")
}

/// Runs a test with an initialized in-memory store.
///
/// # Example
///
/// ```rust
/// use ichor_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     assert_eq!(store.series_names().unwrap().len(), 4);
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with an initialized file-backed store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store, &Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store.path().expect("File store should have a path");
    f(&test_store.store, &path)
}

/// Returns the instant `secs` seconds after the epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("timestamp out of range")
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use ichor_core::SERIES_GLUCOSE;

    /// Returns a flat reading at `secs`.
    pub fn reading(secs: i64, value: f64) -> GlucosePoint {
        GlucosePoint::new(at(secs), value, Trend::Flat)
    }

    /// Creates a store with `count` glucose readings, five minutes apart,
    /// starting at t = 300.
    pub fn populated_store(count: usize) -> TestStore {
        let store = TestStore::memory();
        for i in 0..count {
            let secs = (i as i64 + 1) * 300;
            store
                .put_point(SERIES_GLUCOSE, at(secs), &reading(secs, 5.0 + i as f64 * 0.1))
                .expect("Failed to put reading");
        }
        store
    }
}
