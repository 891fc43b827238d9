//! Store configuration.

use std::path::PathBuf;

/// Default location of the data file, relative to the working directory.
pub const DEFAULT_PATH: &str = "data/ichor.db";

/// Configuration for opening a [`crate::Store`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the single data file.
    pub path: PathBuf,

    /// Whether to create the file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to fsync after every write (safer but slower).
    pub sync_on_write: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            create_if_missing: true,
            sync_on_write: true,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration for the data file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets whether to create the file if missing.
    #[must_use]
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to fsync after every write.
    #[must_use]
    pub fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.path, PathBuf::from("data/ichor.db"));
        assert!(config.create_if_missing);
        assert!(config.sync_on_write);
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::new("/tmp/readings.db")
            .create_if_missing(false)
            .sync_on_write(false);

        assert_eq!(config.path, PathBuf::from("/tmp/readings.db"));
        assert!(!config.create_if_missing);
        assert!(!config.sync_on_write);
    }
}
