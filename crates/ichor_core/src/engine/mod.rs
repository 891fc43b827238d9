//! The single-file engine.
//!
//! ## File Format
//!
//! ```text
//! | magic "ICHR" (4) | version (2) | codec id (1) | reserved (1) | record | record | ...
//! ```
//!
//! Records are described in [`record`]. The file is append-only: a put at an
//! existing key appends a new record and replay keeps the last one.
//!
//! ## Recovery Policy
//!
//! On open every record is replayed into in-memory [`Bucket`]s. A trailing
//! record cut short by a crash is dropped and the file truncated back to the
//! last complete record. Only a plausible partial record at the very end
//! counts as torn: if its header is invalid, or a complete record follows
//! it, the open fails with [`CoreError::Corruption`] and the file is left
//! as it is. A complete record whose checksum does not match also stops the
//! open; the engine never skips damaged data.
//!
//! A write whose append succeeds but whose flush or sync fails is still
//! applied in memory before the error is returned, since the bytes are
//! already in the file and would come back on the next replay.

pub mod record;

use crate::bucket::Bucket;
use crate::error::{CoreError, CoreResult};
use ichor_storage::StorageBackend;
use record::{Decoded, LogRecord, RecordKind};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// File magic.
pub const MAGIC: &[u8; 4] = b"ICHR";
/// Current format version.
pub const FORMAT_VERSION: u16 = 1;
/// Header size in bytes.
pub const HEADER_SIZE: u64 = 8;

/// Owns the storage backend and the replayed buckets.
pub struct Engine {
    backend: Box<dyn StorageBackend>,
    buckets: BTreeMap<String, Bucket>,
    sync_on_write: bool,
    codec_id: u8,
}

impl Engine {
    /// Opens an engine over `backend`, writing a header into empty storage
    /// and replaying existing records otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] for a foreign or incompatible
    /// file, [`CoreError::ChecksumMismatch`] or [`CoreError::Corruption`] for
    /// damaged records, and storage errors from the backend.
    pub fn open(
        mut backend: Box<dyn StorageBackend>,
        codec_id: u8,
        sync_on_write: bool,
    ) -> CoreResult<Self> {
        if backend.size()? == 0 {
            let mut header = Vec::with_capacity(HEADER_SIZE as usize);
            header.extend_from_slice(MAGIC);
            header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
            header.push(codec_id);
            header.push(0);
            backend.append(&header)?;
            backend.sync()?;
            debug!(codec_id, "wrote new store header");
        } else {
            Self::check_header(backend.as_ref(), codec_id)?;
        }

        let mut engine = Self {
            backend,
            buckets: BTreeMap::new(),
            sync_on_write,
            codec_id,
        };
        engine.replay()?;
        Ok(engine)
    }

    fn check_header(backend: &dyn StorageBackend, codec_id: u8) -> CoreResult<()> {
        if backend.size()? < HEADER_SIZE {
            return Err(CoreError::invalid_format("file shorter than store header"));
        }
        let header = backend.read_at(0, HEADER_SIZE as usize)?;

        if &header[0..4] != MAGIC {
            return Err(CoreError::invalid_format("not an ichor store (bad magic)"));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != FORMAT_VERSION {
            return Err(CoreError::invalid_format(format!(
                "unsupported format version {version}, expected {FORMAT_VERSION}"
            )));
        }

        let stored_codec = header[6];
        if stored_codec != codec_id {
            return Err(CoreError::invalid_format(format!(
                "store was written with codec {} but opened with codec {}",
                ichor_codec::codec_name(stored_codec).unwrap_or("unknown"),
                ichor_codec::codec_name(codec_id).unwrap_or("unknown"),
            )));
        }

        Ok(())
    }

    fn replay(&mut self) -> CoreResult<()> {
        let data = self.backend.read_from(HEADER_SIZE)?;
        let mut pos = 0usize;
        let mut applied = 0usize;

        while pos < data.len() {
            let offset = HEADER_SIZE + pos as u64;
            match LogRecord::decode(&data[pos..], offset)? {
                Decoded::Record(record, len) => {
                    self.apply(record);
                    applied += 1;
                    pos += len;
                }
                Decoded::Incomplete => {
                    warn!(
                        offset,
                        dropped = data.len() - pos,
                        "truncating incomplete trailing record"
                    );
                    self.backend.truncate(offset)?;
                    break;
                }
            }
        }

        debug!(records = applied, buckets = self.buckets.len(), "replayed store");
        Ok(())
    }

    fn apply(&mut self, record: LogRecord) {
        match record.kind {
            RecordKind::CreateBucket => {
                self.buckets
                    .entry(record.bucket.clone())
                    .or_insert_with(|| Bucket::new(record.bucket));
            }
            RecordKind::Put => {
                self.buckets
                    .entry(record.bucket.clone())
                    .or_insert_with(|| Bucket::new(record.bucket))
                    .put(record.key, record.value);
            }
        }
    }

    /// Appends `record`, then flushes (and syncs, if configured).
    ///
    /// The outer error means nothing was appended. The inner result is the
    /// flush/sync outcome for bytes that are already in the file.
    fn write(&mut self, record: &LogRecord) -> CoreResult<CoreResult<()>> {
        let bytes = record.encode()?;
        self.backend.append(&bytes)?;
        Ok(self.make_durable())
    }

    fn make_durable(&mut self) -> CoreResult<()> {
        self.backend.flush()?;
        if self.sync_on_write {
            self.backend.sync()?;
        }
        Ok(())
    }

    /// Declares a bucket. Returns false if it already existed.
    ///
    /// # Errors
    ///
    /// Returns storage errors if the declaration cannot be written.
    pub fn create_bucket(&mut self, name: &str) -> CoreResult<bool> {
        if self.buckets.contains_key(name) {
            return Ok(false);
        }
        let durable = self.write(&LogRecord::create_bucket(name))?;
        self.buckets.insert(name.to_owned(), Bucket::new(name));
        durable.map(|()| true)
    }

    /// Returns a bucket by name.
    #[must_use]
    pub fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.buckets.get(name)
    }

    /// Iterates over all buckets in name order.
    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.values()
    }

    /// Durably appends a put, then applies it to the bucket.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] for an unknown bucket, or
    /// storage errors if the record cannot be written. If only the flush or
    /// sync fails, the put is applied in memory and the error is returned.
    pub fn put(&mut self, bucket: &str, key: Vec<u8>, value: Vec<u8>) -> CoreResult<()> {
        if !self.buckets.contains_key(bucket) {
            return Err(CoreError::invalid_operation(format!(
                "put into undeclared bucket {bucket}"
            )));
        }
        let record = LogRecord::put(bucket, key, value);
        let durable = self.write(&record)?;
        if let Some(b) = self.buckets.get_mut(bucket) {
            b.put(record.key, record.value);
        }
        durable
    }

    /// Flushes and syncs the backend.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the backend.
    pub fn sync(&mut self) -> CoreResult<()> {
        self.backend.flush()?;
        self.backend.sync()?;
        Ok(())
    }

    /// Returns the size of the data file in bytes.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the backend.
    pub fn file_size(&self) -> CoreResult<u64> {
        Ok(self.backend.size()?)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("buckets", &self.buckets.keys().collect::<Vec<_>>())
            .field("sync_on_write", &self.sync_on_write)
            .field("codec_id", &self.codec_id)
            .finish_non_exhaustive()
    }
}
