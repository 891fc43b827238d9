//! Crash recovery testing for the ichor store.
//!
//! A crash mid-append leaves a partial record at the end of the data file.
//! These helpers reproduce that by cutting the closed file at chosen
//! offsets, then reopening it and checking which writes survived.
//!
//! ## Test Strategy
//!
//! 1. **Torn tail** - the file ends inside a record; it is dropped on open
//! 2. **Clean cut** - the file ends on a record boundary; nothing is lost
//! 3. **Bit rot** - a byte inside a complete record changes; open fails

use crate::fixtures::{open_file_store, TestStore};
use ichor_core::{GlucosePoint, SERIES_GLUCOSE};
use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::TempDir;

/// Truncates the file at `path` to `len` bytes.
pub fn truncate_file(path: &Path, len: u64) -> io::Result<()> {
    OpenOptions::new().write(true).open(path)?.set_len(len)
}

/// Appends raw bytes to the file at `path`.
pub fn append_bytes(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Inverts every bit of the byte at `offset`.
pub fn flip_byte(path: &Path, offset: u64) -> io::Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut byte)?;
    byte[0] = !byte[0];
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&byte)
}

/// Writes readings to a file store and remembers where each one ended.
pub struct CrashHarness {
    dir: TempDir,
    /// File size after initialization.
    pub base_size: u64,
    /// File size after each reading, in write order.
    pub boundaries: Vec<u64>,
    points: Vec<GlucosePoint>,
}

impl CrashHarness {
    /// Writes `points` (distinct seconds, ascending) and closes the store.
    pub fn write(points: &[GlucosePoint]) -> Self {
        let store = TestStore::file();
        let base_size = file_size(&store);
        let mut boundaries = Vec::with_capacity(points.len());

        for point in points {
            store
                .put_point(SERIES_GLUCOSE, point.time, point)
                .expect("Failed to put reading");
            boundaries.push(file_size(&store));
        }

        Self {
            dir: store.into_dir(),
            base_size,
            boundaries,
            points: points.to_vec(),
        }
    }

    /// The data file path.
    pub fn path(&self) -> std::path::PathBuf {
        self.dir.path().join("ichor.db")
    }

    /// Cuts the file to `len` bytes, reopens it and returns what survived.
    pub fn cut_and_recover(&self, len: u64) -> Vec<GlucosePoint> {
        truncate_file(&self.path(), len).expect("Failed to truncate");
        let store = open_file_store(&self.path());
        let points = store
            .tail_query(SERIES_GLUCOSE, usize::MAX)
            .expect("Failed to query after recovery");
        store.close().expect("Failed to close store");
        points
    }

    /// Readings whose records end at or before `len`.
    pub fn expected_after_cut(&self, len: u64) -> Vec<GlucosePoint> {
        self.boundaries
            .iter()
            .zip(&self.points)
            .take_while(|(end, _)| **end <= len)
            .map(|(_, p)| *p)
            .collect()
    }
}

fn file_size(store: &TestStore) -> u64 {
    store.stats().expect("Failed to read stats").file_size
}
