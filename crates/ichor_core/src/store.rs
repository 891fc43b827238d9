//! The store facade.

use crate::bucket::Bucket;
use crate::config::StoreConfig;
use crate::engine::Engine;
use crate::error::{CoreError, CoreResult};
use crate::export::Exporter;
use crate::key::PointKey;
use crate::model::OBJECT_BUCKET;
use chrono::{DateTime, Utc};
use ichor_codec::{JsonCodec, RecordCodec};
use ichor_storage::{FileBackend, InMemoryBackend, StorageBackend, StorageError};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The time-indexed store.
///
/// A `Store` owns one data file holding any number of named series plus
/// the reserved `obj` bucket for keyed objects. Records are encoded with
/// codec `C`; the caller picks the record type per call, so one store can
/// hold glucose readings, insulin doses and configuration side by side.
///
/// Every operation, read or write, runs under a single process-wide lock
/// and blocks until it is available.
///
/// # Example
///
/// ```rust,no_run
/// use ichor_core::{GlucosePoint, Store, Trend, DEFAULT_SERIES};
/// use chrono::Utc;
///
/// let store: Store = Store::open("data/ichor.db")?;
/// store.initialize(&DEFAULT_SERIES)?;
///
/// let now = Utc::now();
/// store.put_point("glucose", now, &GlucosePoint::new(now, 5.5, Trend::Flat))?;
/// let recent: Vec<GlucosePoint> = store.tail_query("glucose", 24)?;
/// # Ok::<(), ichor_core::CoreError>(())
/// ```
pub struct Store<C: RecordCodec = JsonCodec> {
    /// `None` once the store is closed.
    engine: Mutex<Option<Engine>>,
    /// Data file path. `None` for in-memory stores.
    path: Option<PathBuf>,
    _codec: PhantomData<C>,
}

/// Per-series statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Series name.
    pub name: String,
    /// Number of stored points.
    pub count: usize,
    /// Earliest key.
    pub first: Option<DateTime<Utc>>,
    /// Latest key.
    pub last: Option<DateTime<Utc>>,
}

/// Store-wide statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    /// Data file path, if file-backed.
    pub path: Option<String>,
    /// Data file size in bytes.
    pub file_size: u64,
    /// Record codec name.
    pub codec: &'static str,
    /// Series in name order.
    pub series: Vec<SeriesStats>,
    /// Number of object entries.
    pub object_count: usize,
}

impl<C: RecordCodec> Store<C> {
    /// Opens or creates the store at `path` with default configuration.
    ///
    /// # Errors
    ///
    /// See [`Store::open_with_config`].
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(StoreConfig::new(path.as_ref()))
    }

    /// Opens the store described by `config`.
    ///
    /// Parent directories are created and the file is locked for the
    /// lifetime of the store.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`CoreError::StoreLocked`] if another handle has the file open
    /// - [`CoreError::InvalidFormat`] if the file is missing and
    ///   `create_if_missing` is false, or the file is not a compatible store
    /// - storage errors if the file cannot be opened or replayed
    pub fn open_with_config(config: StoreConfig) -> CoreResult<Self> {
        if !config.create_if_missing && !config.path.exists() {
            return Err(CoreError::invalid_format(format!(
                "store does not exist at {} and create_if_missing is false",
                config.path.display()
            )));
        }

        let backend = FileBackend::open_locked(&config.path).map_err(|e| match e {
            StorageError::Locked { .. } => CoreError::StoreLocked,
            other => CoreError::Storage(other),
        })?;

        let engine = Engine::open(Box::new(backend), C::ID, config.sync_on_write)?;
        info!(
            path = %config.path.display(),
            codec = C::NAME,
            buckets = engine.buckets().count(),
            "opened store"
        );

        Ok(Self {
            engine: Mutex::new(Some(engine)),
            path: Some(config.path),
            _codec: PhantomData,
        })
    }

    /// Opens a store over an arbitrary backend.
    ///
    /// # Errors
    ///
    /// Returns format or storage errors from replaying the backend.
    pub fn open_with_backend(
        backend: Box<dyn StorageBackend>,
        sync_on_write: bool,
    ) -> CoreResult<Self> {
        let engine = Engine::open(backend, C::ID, sync_on_write)?;
        Ok(Self {
            engine: Mutex::new(Some(engine)),
            path: None,
            _codec: PhantomData,
        })
    }

    /// Opens a fresh, non-persistent store for tests.
    ///
    /// # Errors
    ///
    /// Only fails if the in-memory header cannot be written.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_with_backend(Box::new(InMemoryBackend::new()), false)
    }

    /// Runs `f` with exclusive access to the engine.
    fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> CoreResult<R>) -> CoreResult<R> {
        let mut guard = self.engine.lock();
        let engine = guard.as_mut().ok_or(CoreError::StoreClosed)?;
        f(engine)
    }

    /// Ensures each named series and the object bucket exist.
    ///
    /// Safe to call on an initialized store: existing data is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] for an empty series name,
    /// one that collides with the object bucket, or one that is not a plain
    /// file name (series names become export file names), and storage
    /// errors if a bucket cannot be created.
    pub fn initialize(&self, series: &[&str]) -> CoreResult<()> {
        for name in series {
            if !is_valid_series_name(name) {
                return Err(CoreError::invalid_operation(format!(
                    "invalid series name {name:?}"
                )));
            }
        }

        self.with_engine(|engine| {
            let mut created = 0;
            for name in series.iter().copied().chain(std::iter::once(OBJECT_BUCKET)) {
                if engine.create_bucket(name)? {
                    debug!(bucket = name, "created bucket");
                    created += 1;
                }
            }
            info!(series = series.len(), created, "initialized store");
            Ok(())
        })
    }

    /// Stores `record` at `time` in `series`, replacing any record in the
    /// same second.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SeriesNotFound`] if the series was never
    /// initialized, [`CoreError::Encode`] if the record cannot be encoded,
    /// and storage errors if the write fails.
    pub fn put_point<T: Serialize + ?Sized>(
        &self,
        series: &str,
        time: DateTime<Utc>,
        record: &T,
    ) -> CoreResult<()> {
        let key = PointKey::from_time(&time);
        let value = C::marshal(record)?;

        self.with_engine(|engine| {
            series_bucket(engine, series)?;
            engine.put(series, key.as_bytes().to_vec(), value)
        })
    }

    /// Returns every record in `series` with `start <= time <= end` (second
    /// precision), oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SeriesNotFound`] for an unknown series and
    /// [`CoreError::Decode`] if any record in range is not a `T`.
    pub fn range_query<T: DeserializeOwned>(
        &self,
        series: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Vec<T>> {
        let min = PointKey::from_time(&start);
        let max = PointKey::from_time(&end);

        self.with_engine(|engine| {
            let bucket = series_bucket(engine, series)?;
            decode_all::<C, T>(bucket.scan_range(&min, &max))
        })
    }

    /// Returns the `count` most recent records in `series`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SeriesNotFound`] for an unknown series and
    /// [`CoreError::Decode`] if any returned record is not a `T`.
    pub fn tail_query<T: DeserializeOwned>(&self, series: &str, count: usize) -> CoreResult<Vec<T>> {
        self.with_engine(|engine| {
            let bucket = series_bucket(engine, series)?;
            decode_all::<C, T>(bucket.scan_last_n(count))
        })
    }

    /// Stores `value` under `index` in the object bucket.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the store was never
    /// initialized, plus encode and storage errors.
    pub fn put_object<T: Serialize + ?Sized>(&self, index: &str, value: &T) -> CoreResult<()> {
        let bytes = C::marshal(value)?;
        self.with_engine(|engine| {
            object_bucket(engine)?;
            engine.put(OBJECT_BUCKET, index.as_bytes().to_vec(), bytes)
        })
    }

    /// Reads the object stored under `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ObjectNotFound`] if nothing is stored there and
    /// [`CoreError::Decode`] if it is not a `T`.
    pub fn get_object<T: DeserializeOwned>(&self, index: &str) -> CoreResult<T> {
        self.with_engine(|engine| {
            let bytes = object_bucket(engine)?
                .get(index.as_bytes())
                .ok_or_else(|| CoreError::object_not_found(index))?;
            Ok(C::unmarshal(bytes)?)
        })
    }

    /// Writes the full history of each series to `<dest>/<series>.csv`.
    ///
    /// Each file holds what a range query from the epoch to now returns, in
    /// the same order. Returns the paths written.
    ///
    /// # Errors
    ///
    /// Fails on the first series that is unknown, does not decode as `T`,
    /// or cannot be written.
    pub fn export<T: Serialize + DeserializeOwned>(
        &self,
        series: &[&str],
        dest: impl AsRef<Path>,
    ) -> CoreResult<Vec<PathBuf>> {
        let exporter = Exporter::new(dest.as_ref());
        let epoch = PointKey::MIN.to_time()?;
        let now = Utc::now();
        let mut written = Vec::with_capacity(series.len());

        for name in series {
            let records: Vec<T> = self.range_query(name, epoch, now)?;
            written.push(exporter.write_series(name, &records)?);
        }

        Ok(written)
    }

    /// Returns the names of all series, excluding the object bucket.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreClosed`] after [`Store::close`].
    pub fn series_names(&self) -> CoreResult<Vec<String>> {
        self.with_engine(|engine| {
            Ok(engine
                .buckets()
                .filter(|b| b.name() != OBJECT_BUCKET)
                .map(|b| b.name().to_owned())
                .collect())
        })
    }

    /// Collects per-series counts and time bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreClosed`] after close and
    /// [`CoreError::Corruption`] for malformed keys.
    pub fn stats(&self) -> CoreResult<StoreStats> {
        let path = self.path.as_ref().map(|p| p.display().to_string());
        self.with_engine(|engine| {
            let mut series = Vec::new();
            let mut object_count = 0;

            for bucket in engine.buckets() {
                if bucket.name() == OBJECT_BUCKET {
                    object_count = bucket.len();
                    continue;
                }
                let (first, last) = match bucket.bounds() {
                    Some((first, last)) => (
                        Some(PointKey::from_slice(first)?.to_time()?),
                        Some(PointKey::from_slice(last)?.to_time()?),
                    ),
                    None => (None, None),
                };
                series.push(SeriesStats {
                    name: bucket.name().to_owned(),
                    count: bucket.len(),
                    first,
                    last,
                });
            }

            Ok(StoreStats {
                path,
                file_size: engine.file_size()?,
                codec: C::NAME,
                series,
                object_count,
            })
        })
    }

    /// Flushes and syncs the data file.
    ///
    /// # Errors
    ///
    /// Returns storage errors, or [`CoreError::StoreClosed`].
    pub fn flush(&self) -> CoreResult<()> {
        self.with_engine(Engine::sync)
    }

    /// Flushes, syncs and releases the data file.
    ///
    /// Closing twice is a no-op. Every other operation fails with
    /// [`CoreError::StoreClosed`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the final sync; the file is released
    /// either way.
    pub fn close(&self) -> CoreResult<()> {
        let mut guard = self.engine.lock();
        let Some(mut engine) = guard.take() else {
            return Ok(());
        };
        let result = engine.sync();
        drop(engine);
        info!(path = ?self.path, "closed store");
        result
    }

    /// Returns whether the store is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.engine.lock().is_some()
    }

    /// Returns the data file path, if file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl<C: RecordCodec> Drop for Store<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to sync store on drop");
        }
    }
}

impl<C: RecordCodec> std::fmt::Debug for Store<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("codec", &C::NAME)
            .field("open", &self.is_open())
            .finish()
    }
}

fn is_valid_series_name(name: &str) -> bool {
    !name.is_empty()
        && name != OBJECT_BUCKET
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn series_bucket<'a>(engine: &'a Engine, name: &str) -> CoreResult<&'a Bucket> {
    if name == OBJECT_BUCKET {
        return Err(CoreError::series_not_found(name));
    }
    engine
        .bucket(name)
        .ok_or_else(|| CoreError::series_not_found(name))
}

fn object_bucket(engine: &Engine) -> CoreResult<&Bucket> {
    engine
        .bucket(OBJECT_BUCKET)
        .ok_or_else(|| CoreError::invalid_operation("store is not initialized"))
}

fn decode_all<C: RecordCodec, T: DeserializeOwned>(entries: Vec<(&[u8], &[u8])>) -> CoreResult<Vec<T>> {
    entries
        .into_iter()
        .map(|(_, bytes)| C::unmarshal(bytes).map_err(CoreError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{AlertConfig, GlucosePoint, Trend, DEFAULT_SERIES, INDEX_CONFIG};
    use ichor_codec::CborCodec;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Reading {
        time: DateTime<Utc>,
        value: f64,
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn reading(secs: i64, value: f64) -> Reading {
        Reading {
            time: at(secs),
            value,
        }
    }

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.initialize(&["glucose", "insulin"]).unwrap();
        store
    }

    fn put(store: &Store, secs: i64, value: f64) {
        store.put_point("glucose", at(secs), &reading(secs, value)).unwrap();
    }

    #[test]
    fn put_then_range() {
        let store = store();
        put(&store, 100, 5.5);

        let found: Vec<Reading> = store.range_query("glucose", at(0), at(1000)).unwrap();
        assert_eq!(found, vec![reading(100, 5.5)]);
    }

    #[test]
    fn same_second_overwrites() {
        let store = store();
        put(&store, 100, 5.5);
        let later = at(100) + chrono::Duration::milliseconds(400);
        store.put_point("glucose", later, &reading(100, 6.0)).unwrap();

        let found: Vec<Reading> = store.range_query("glucose", at(0), at(1000)).unwrap();
        assert_eq!(found, vec![reading(100, 6.0)]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let store = store();
        for secs in [100, 200, 300] {
            put(&store, secs, secs as f64);
        }

        let found: Vec<Reading> = store.range_query("glucose", at(100), at(200)).unwrap();
        assert_eq!(found, vec![reading(100, 100.0), reading(200, 200.0)]);

        let point: Vec<Reading> = store.range_query("glucose", at(300), at(300)).unwrap();
        assert_eq!(point, vec![reading(300, 300.0)]);

        let inverted: Vec<Reading> = store.range_query("glucose", at(300), at(100)).unwrap();
        assert!(inverted.is_empty());
    }

    #[test]
    fn tail_returns_latest_ascending() {
        let store = store();
        for secs in [500, 100, 400, 200, 300] {
            put(&store, secs, secs as f64);
        }

        let tail: Vec<Reading> = store.tail_query("glucose", 3).unwrap();
        let times: Vec<i64> = tail.iter().map(|r| r.time.timestamp()).collect();
        assert_eq!(times, vec![300, 400, 500]);

        let all: Vec<Reading> = store.tail_query("glucose", 50).unwrap();
        assert_eq!(all.len(), 5);

        let empty: Vec<Reading> = store.tail_query("insulin", 3).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn unknown_series_is_not_found() {
        let store = store();
        let err = store
            .range_query::<Reading>("unknown-series", at(0), at(1000))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = store.put_point("unknown-series", at(1), &1.0).unwrap_err();
        assert!(matches!(err, CoreError::SeriesNotFound { .. }));

        // The object bucket is not a series.
        assert!(store.tail_query::<Reading>("obj", 1).unwrap_err().is_not_found());
    }

    #[test]
    fn wrong_shape_fails_whole_query() {
        let store = store();
        put(&store, 100, 5.5);
        store.put_point("glucose", at(200), &"not a reading").unwrap();

        let err = store
            .range_query::<Reading>("glucose", at(0), at(1000))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn objects_roundtrip() {
        let store = store();
        let err = store.get_object::<AlertConfig>(INDEX_CONFIG).unwrap_err();
        assert!(matches!(err, CoreError::ObjectNotFound { .. }));

        let config = AlertConfig {
            low_threshold: 3.7,
            high_threshold: 10.0,
            ..AlertConfig::default()
        };
        store.put_object(INDEX_CONFIG, &config).unwrap();
        assert_eq!(store.get_object::<AlertConfig>(INDEX_CONFIG).unwrap(), config);

        store.put_object("timeout-expire", &at(5000)).unwrap();
        assert_eq!(store.get_object::<DateTime<Utc>>("timeout-expire").unwrap(), at(5000));
    }

    #[test]
    fn objects_are_separate_from_series() {
        let store = store();
        store.put_object("glucose", &42).unwrap();
        let found: Vec<Reading> = store.range_query("glucose", at(0), at(1000)).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn uninitialized_store_rejects_objects() {
        let store: Store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.put_object("config", &1),
            Err(CoreError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn invalid_series_names() {
        let store: Store = Store::open_in_memory().unwrap();
        assert!(store.initialize(&["obj"]).is_err());
        assert!(store.initialize(&[""]).is_err());
        for name in ["../escape", "a/b", "a\\b", "..", ".", "nul\0"] {
            assert!(matches!(
                store.initialize(&[name]),
                Err(CoreError::InvalidOperation { .. })
            ));
        }
        assert!(store.series_names().unwrap().is_empty());
        store.initialize(&["glucose-pred", "ketones.v2"]).unwrap();
    }

    #[test]
    fn reinitialize_keeps_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ichor.db");

        {
            let store: Store = Store::open(&path).unwrap();
            store.initialize(&DEFAULT_SERIES).unwrap();
            store
                .put_point("glucose", at(100), &GlucosePoint::new(at(100), 5.5, Trend::Flat))
                .unwrap();
            store.close().unwrap();
        }

        let store: Store = Store::open(&path).unwrap();
        store.initialize(&DEFAULT_SERIES).unwrap();
        let points: Vec<GlucosePoint> = store.tail_query("glucose", 10).unwrap();
        assert_eq!(points, vec![GlucosePoint::new(at(100), 5.5, Trend::Flat)]);
        assert_eq!(store.series_names().unwrap().len(), 4);
    }

    #[test]
    fn second_open_is_locked_until_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ichor.db");

        let first: Store = Store::open(&path).unwrap();
        assert!(matches!(
            Store::<JsonCodec>::open(&path),
            Err(CoreError::StoreLocked)
        ));

        first.close().unwrap();
        assert!(Store::<JsonCodec>::open(&path).is_ok());
    }

    #[test]
    fn closed_store_rejects_operations() {
        let store = store();
        store.close().unwrap();
        store.close().unwrap();
        assert!(!store.is_open());
        assert!(matches!(
            store.tail_query::<Reading>("glucose", 1),
            Err(CoreError::StoreClosed)
        ));
    }

    #[test]
    fn missing_file_without_create() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("absent.db")).create_if_missing(false);
        assert!(matches!(
            Store::<JsonCodec>::open_with_config(config),
            Err(CoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn codec_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ichor.db");
        Store::<JsonCodec>::open(&path).unwrap().close().unwrap();

        assert!(matches!(
            Store::<CborCodec>::open(&path),
            Err(CoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn cbor_store_works() {
        let store: Store<CborCodec> = Store::open_in_memory().unwrap();
        store.initialize(&["glucose"]).unwrap();
        store.put_point("glucose", at(100), &reading(100, 7.1)).unwrap();
        let found: Vec<Reading> = store.tail_query("glucose", 1).unwrap();
        assert_eq!(found, vec![reading(100, 7.1)]);
    }

    #[test]
    fn stats_report_bounds() {
        let store = store();
        put(&store, 100, 5.0);
        put(&store, 900, 6.0);
        store.put_object("config", &AlertConfig::default()).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.codec, "json");
        assert_eq!(stats.object_count, 1);
        assert!(stats.path.is_none());

        let glucose = stats.series.iter().find(|s| s.name == "glucose").unwrap();
        assert_eq!(glucose.count, 2);
        assert_eq!(glucose.first, Some(at(100)));
        assert_eq!(glucose.last, Some(at(900)));

        let insulin = stats.series.iter().find(|s| s.name == "insulin").unwrap();
        assert_eq!(insulin.count, 0);
        assert!(insulin.first.is_none());
    }

    #[test]
    fn concurrent_readers_and_writers_are_serialized() {
        let store = store();
        let writers = 4i64;
        let per_writer = 50i64;

        std::thread::scope(|scope| {
            for w in 0..writers {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..per_writer {
                        let secs = i * writers + w + 1;
                        store
                            .put_point("glucose", at(secs), &reading(secs, 5.0))
                            .unwrap();
                    }
                });
            }
            for _ in 0..2 {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..50 {
                        let tail: Vec<Reading> = store.tail_query("glucose", 10).unwrap();
                        assert!(tail.windows(2).all(|p| p[0].time < p[1].time));
                        let all: Vec<Reading> =
                            store.range_query("glucose", at(0), at(10_000)).unwrap();
                        assert!(all.windows(2).all(|p| p[0].time < p[1].time));
                    }
                });
            }
        });

        let all: Vec<Reading> = store.tail_query("glucose", usize::MAX).unwrap();
        let secs: Vec<i64> = all.iter().map(|r| r.time.timestamp()).collect();
        assert_eq!(secs, (1..=writers * per_writer).collect::<Vec<_>>());
    }
}
