//! # ichor codec
//!
//! Converts records of any serde-compatible shape to and from the bytes
//! stored in a bucket.
//!
//! The store never inspects record contents. The caller names the target
//! type at query time, so a [`RecordCodec`] is a pair of generic functions
//! rather than a registry of known shapes.
//!
//! ## Codecs
//!
//! - [`JsonCodec`] - textual JSON, the default on-disk encoding
//! - [`CborCodec`] - compact binary CBOR
//!
//! Each codec carries a one-byte [`RecordCodec::ID`] which the engine writes
//! into the file header, so a file is never read back with the wrong codec.
//!
//! ## Usage
//!
//! ```
//! use ichor_codec::{JsonCodec, RecordCodec};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Reading {
//!     value: f64,
//! }
//!
//! let bytes = JsonCodec::marshal(&Reading { value: 5.5 }).unwrap();
//! let back: Reading = JsonCodec::unmarshal(&bytes).unwrap();
//! assert_eq!(back, Reading { value: 5.5 });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod error;
mod json;

pub use cbor::CborCodec;
pub use error::{CodecError, CodecResult};
pub use json::JsonCodec;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A serialize/deserialize pair for stored records.
///
/// Implementors are zero-sized markers; all methods are associated
/// functions so that a `Store<C>` is parameterized by codec at compile time.
pub trait RecordCodec: Send + Sync + 'static {
    /// Identifier written into the file header.
    const ID: u8;

    /// Human-readable codec name.
    const NAME: &'static str;

    /// Serializes a record to self-contained bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if the value cannot be
    /// represented (for example a map with non-string keys in JSON).
    fn marshal<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>>;

    /// Deserializes bytes into the shape requested by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DecodingFailed`] if the bytes do not conform to
    /// `T`.
    fn unmarshal<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T>;
}

/// Returns the codec name for a header id, if it is a known codec.
#[must_use]
pub fn codec_name(id: u8) -> Option<&'static str> {
    match id {
        JsonCodec::ID => Some(JsonCodec::NAME),
        CborCodec::ID => Some(CborCodec::NAME),
        _ => None,
    }
}
