//! # ichor storage
//!
//! The lowest layer of the ichor store: a single append-only byte file.
//!
//! Backends know nothing about series, keys or records. They hand out
//! offsets for appended bytes, read ranges back, and make data durable.
//! The engine in `ichor_core` owns the record format written on top.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - one file on disk, optionally under an exclusive lock
//! - [`InMemoryBackend`] - a growable buffer for tests
//!
//! ## Example
//!
//! ```rust
//! use ichor_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"reading").unwrap();
//! assert_eq!(backend.read_at(offset, 7).unwrap(), b"reading");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
