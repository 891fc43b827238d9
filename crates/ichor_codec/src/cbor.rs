//! CBOR record codec.

use crate::error::{CodecError, CodecResult};
use crate::RecordCodec;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Binary CBOR encoding via `ciborium`.
///
/// Smaller than JSON for numeric series; pick it when the file is only ever
/// read through the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CborCodec;

impl RecordCodec for CborCodec {
    const ID: u8 = 2;
    const NAME: &'static str = "cbor";

    fn marshal<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(value, &mut buf)
            .map_err(|e| CodecError::encoding_failed(Self::NAME, e.to_string()))?;
        Ok(buf)
    }

    fn unmarshal<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
        ciborium::de::from_reader(bytes)
            .map_err(|e| CodecError::decoding_failed(Self::NAME, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn truncated_input_fails() {
        let bytes = CborCodec::marshal(&("glucose", 5.5f64)).unwrap();
        let result: CodecResult<(String, f64)> = CborCodec::unmarshal(&bytes[..bytes.len() - 2]);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    proptest! {
        #[test]
        fn floats_survive(value in -1.0e6f64..1.0e6) {
            let bytes = CborCodec::marshal(&value).unwrap();
            let back: f64 = CborCodec::unmarshal(&bytes).unwrap();
            prop_assert_eq!(back, value);
        }
    }
}
