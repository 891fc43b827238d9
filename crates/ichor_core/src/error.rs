//! Error types for the ichor core.

use ichor_codec::CodecError;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification of a [`CoreError`].
///
/// Collaborators branch on this rather than on individual variants: a
/// `NotFound` usually means "nothing yet, try next tick", `Io` means the
/// store itself is in trouble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A series, object index or record is absent.
    NotFound,
    /// Stored bytes do not match the shape the caller asked for.
    Decode,
    /// The storage engine failed to open, read, write or flush.
    Io,
    /// The call or the data file is invalid (bad format, closed store, ...).
    Invalid,
}

/// Errors that can occur in ichor core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] ichor_storage::StorageError),

    /// I/O error outside the storage backend (export files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Writing an export file failed.
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),

    /// The series was never initialized.
    #[error("series not found: {name}")]
    SeriesNotFound {
        /// Name of the series.
        name: String,
    },

    /// No object is stored under the index.
    #[error("object not found: {index}")]
    ObjectNotFound {
        /// The object index.
        index: String,
    },

    /// A stored record does not decode into the requested shape.
    #[error("decode error: {message}")]
    Decode {
        /// Codec error description.
        message: String,
    },

    /// A record could not be encoded.
    #[error("encode error: {message}")]
    Encode {
        /// Codec error description.
        message: String,
    },

    /// The data file is corrupted.
    #[error("store corruption: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// Checksum mismatch detected on a complete record.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Offset of the record in the data file.
        offset: u64,
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// The data file has an unknown header, version or codec.
    #[error("invalid store format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Another process holds the data file.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// The store was closed.
    #[error("store is closed")]
    StoreClosed,

    /// Operation not permitted.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a series not found error.
    pub fn series_not_found(name: impl Into<String>) -> Self {
        Self::SeriesNotFound { name: name.into() }
    }

    /// Creates an object not found error.
    pub fn object_not_found(index: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            index: index.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Classifies this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SeriesNotFound { .. } | Self::ObjectNotFound { .. } => ErrorKind::NotFound,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Storage(_)
            | Self::Io(_)
            | Self::Export(_)
            | Self::Corruption { .. }
            | Self::ChecksumMismatch { .. }
            | Self::StoreLocked => ErrorKind::Io,
            Self::Encode { .. }
            | Self::InvalidFormat { .. }
            | Self::StoreClosed
            | Self::InvalidOperation { .. } => ErrorKind::Invalid,
        }
    }

    /// Returns true for missing series or objects.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<CodecError> for CoreError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::DecodingFailed { .. } => Self::Decode {
                message: err.to_string(),
            },
            CodecError::EncodingFailed { .. } => Self::Encode {
                message: err.to_string(),
            },
        }
    }
}
