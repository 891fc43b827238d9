//! CSV export of series history.

use crate::error::CoreResult;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Writes series records as delimited columnar files.
///
/// One file per series, named `<series>.csv`, with a header row taken from
/// the record's field names. Records must be flat: nested structs and maps
/// cannot be laid out as columns.
#[derive(Debug, Clone)]
pub struct Exporter {
    dest: PathBuf,
}

impl Exporter {
    /// Creates an exporter writing into `dest`.
    #[must_use]
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }

    /// Returns the file a series is written to.
    #[must_use]
    pub fn path_for(&self, series: &str) -> PathBuf {
        self.dest.join(format!("{series}.csv"))
    }

    /// Writes `records` to the series file, replacing any previous export.
    ///
    /// An empty series produces an empty file.
    ///
    /// # Errors
    ///
    /// Returns I/O errors if the directory or file cannot be created and
    /// [`crate::CoreError::Export`] if a record cannot be written as a row.
    pub fn write_series<T: Serialize>(&self, series: &str, records: &[T]) -> CoreResult<PathBuf> {
        fs::create_dir_all(&self.dest)?;
        let path = self.path_for(series);

        let mut writer = csv::Writer::from_path(&path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        info!(series, rows = records.len(), path = %path.display(), "exported series");
        Ok(path)
    }
}
