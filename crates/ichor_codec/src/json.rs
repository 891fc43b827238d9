//! JSON record codec.

use crate::error::{CodecError, CodecResult};
use crate::RecordCodec;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Textual JSON encoding.
///
/// Stored values stay readable with ordinary tools, which is handy when
/// poking at a data file by hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    const ID: u8 = 1;
    const NAME: &'static str = "json";

    fn marshal<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CodecError::encoding_failed(Self::NAME, e.to_string()))
    }

    fn unmarshal<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
        serde_json::from_slice(bytes)
            .map_err(|e| CodecError::decoding_failed(Self::NAME, e.to_string()))
    }
}
