//! Log record format.
//!
//! ```text
//! | record_len (4) | kind (1) | bucket_len (2) | key_len (2) | bucket | key | value | crc32 (4) |
//! ```
//!
//! Integers are little-endian. `record_len` counts the whole record and the
//! CRC covers every byte before it.

use crate::error::{CoreError, CoreResult};

/// What a log record does when replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    /// Declares a bucket. Key and value are empty.
    CreateBucket = 1,
    /// Upserts `key -> value` in a bucket.
    Put = 2,
}

impl RecordKind {
    fn from_byte(b: u8) -> CoreResult<Self> {
        match b {
            1 => Ok(Self::CreateBucket),
            2 => Ok(Self::Put),
            other => Err(CoreError::corruption(format!("unknown record kind {other}"))),
        }
    }
}

/// One entry in the data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Record kind.
    pub kind: RecordKind,
    /// Bucket the record applies to.
    pub bucket: String,
    /// Entry key (empty for `CreateBucket`).
    pub key: Vec<u8>,
    /// Entry value (empty for `CreateBucket`).
    pub value: Vec<u8>,
}

/// Outcome of decoding at a position in the log.
#[derive(Debug)]
pub enum Decoded {
    /// A complete, checksummed record and its encoded length.
    Record(LogRecord, usize),
    /// Fewer bytes remain than the record needs: a torn trailing write.
    Incomplete,
}

impl LogRecord {
    /// Fixed bytes ahead of the variable part: len + kind + bucket_len + key_len.
    pub const HEADER_SIZE: usize = 4 + 1 + 2 + 2;
    /// CRC size.
    pub const CRC_SIZE: usize = 4;

    /// Creates a bucket declaration.
    #[must_use]
    pub fn create_bucket(bucket: &str) -> Self {
        Self {
            kind: RecordKind::CreateBucket,
            bucket: bucket.to_owned(),
            key: Vec::new(),
            value: Vec::new(),
        }
    }

    /// Creates an upsert.
    #[must_use]
    pub fn put(bucket: &str, key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            kind: RecordKind::Put,
            bucket: bucket.to_owned(),
            key,
            value,
        }
    }

    /// Returns the encoded size of this record.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        Self::HEADER_SIZE + self.bucket.len() + self.key.len() + self.value.len() + Self::CRC_SIZE
    }

    /// Encodes the record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the bucket name or key is
    /// longer than 65535 bytes or the record exceeds 4 GiB.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let bucket_len = u16::try_from(self.bucket.len())
            .map_err(|_| CoreError::invalid_operation("bucket name too long"))?;
        let key_len = u16::try_from(self.key.len())
            .map_err(|_| CoreError::invalid_operation("key too long"))?;
        let record_len = u32::try_from(self.encoded_size())
            .map_err(|_| CoreError::invalid_operation("record too large"))?;

        let mut buf = Vec::with_capacity(record_len as usize);
        buf.extend_from_slice(&record_len.to_le_bytes());
        buf.push(self.kind as u8);
        buf.extend_from_slice(&bucket_len.to_le_bytes());
        buf.extend_from_slice(&key_len.to_le_bytes());
        buf.extend_from_slice(self.bucket.as_bytes());
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);

        let crc = compute_crc32(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());

        Ok(buf)
    }

    /// Decodes the record at the start of `data`.
    ///
    /// `offset` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChecksumMismatch`] or [`CoreError::Corruption`]
    /// for a complete but damaged record.
    pub fn decode(data: &[u8], offset: u64) -> CoreResult<Decoded> {
        if data.len() < 4 {
            return Ok(Decoded::Incomplete);
        }

        let record_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if record_len < Self::HEADER_SIZE + Self::CRC_SIZE {
            return Err(CoreError::corruption(format!(
                "record at offset {offset} declares impossible length {record_len}"
            )));
        }
        if data.len() < record_len {
            Self::check_torn_tail(data, record_len, offset)?;
            return Ok(Decoded::Incomplete);
        }

        let body = &data[..record_len - Self::CRC_SIZE];
        let stored_crc = u32::from_le_bytes([
            data[record_len - 4],
            data[record_len - 3],
            data[record_len - 2],
            data[record_len - 1],
        ]);
        let computed_crc = compute_crc32(body);
        if stored_crc != computed_crc {
            return Err(CoreError::ChecksumMismatch {
                offset,
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let kind = RecordKind::from_byte(data[4])?;
        let bucket_len = u16::from_le_bytes([data[5], data[6]]) as usize;
        let key_len = u16::from_le_bytes([data[7], data[8]]) as usize;

        let bucket_end = Self::HEADER_SIZE + bucket_len;
        let key_end = bucket_end + key_len;
        if key_end > body.len() {
            return Err(CoreError::corruption(format!(
                "record at offset {offset} has field lengths beyond its end"
            )));
        }

        let bucket = std::str::from_utf8(&body[Self::HEADER_SIZE..bucket_end])
            .map_err(|_| CoreError::corruption(format!("bucket name at offset {offset} is not UTF-8")))?
            .to_owned();

        Ok(Decoded::Record(
            Self {
                kind,
                bucket,
                key: body[bucket_end..key_end].to_vec(),
                value: body[key_end..].to_vec(),
            },
            record_len,
        ))
    }

    /// Accepts `data` as a torn final write only if it could be the start of
    /// one record and no complete record follows it.
    fn check_torn_tail(data: &[u8], record_len: usize, offset: u64) -> CoreResult<()> {
        if data.len() >= Self::HEADER_SIZE {
            let bucket_len = u16::from_le_bytes([data[5], data[6]]) as usize;
            let key_len = u16::from_le_bytes([data[7], data[8]]) as usize;
            let fits = Self::HEADER_SIZE + bucket_len + key_len + Self::CRC_SIZE <= record_len;
            if RecordKind::from_byte(data[4]).is_err() || !fits {
                return Err(CoreError::corruption(format!(
                    "record at offset {offset} runs past end of file with an invalid header"
                )));
            }
        }

        let resumes = (1..data.len())
            .any(|pos| Self::decode_complete(&data[pos..]).is_some());
        if resumes {
            return Err(CoreError::corruption(format!(
                "record at offset {offset} declares length {record_len} past end of file \
                 but complete records follow it"
            )));
        }
        Ok(())
    }

    /// Decodes a complete, checksummed record without tail handling.
    fn decode_complete(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE + Self::CRC_SIZE {
            return None;
        }
        let record_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if record_len < Self::HEADER_SIZE + Self::CRC_SIZE || record_len > data.len() {
            return None;
        }
        match Self::decode(&data[..record_len], 0) {
            Ok(Decoded::Record(record, _)) => Some(record),
            _ => None,
        }
    }
}

/// Computes a CRC32 checksum (IEEE polynomial).
#[must_use]
pub fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc = CRC32_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_complete(bytes: &[u8]) -> (LogRecord, usize) {
        match LogRecord::decode(bytes, 0).unwrap() {
            Decoded::Record(record, len) => (record, len),
            Decoded::Incomplete => panic!("expected a complete record"),
        }
    }

    #[test]
    fn crc32_check_value() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn put_record_layout() {
        let record = LogRecord::put("glucose", vec![0, 0, 0, 0, 0, 0, 0, 100], b"{}".to_vec());
        let bytes = record.encode().unwrap();

        assert_eq!(bytes.len(), record.encoded_size());
        assert_eq!(bytes.len(), 9 + 7 + 8 + 2 + 4);
        assert_eq!(bytes[4], RecordKind::Put as u8);

        let (decoded, len) = decode_complete(&bytes);
        assert_eq!(decoded, record);
        assert_eq!(len, bytes.len());
    }

    #[test]
    fn create_bucket_has_empty_payload() {
        let bytes = LogRecord::create_bucket("obj").encode().unwrap();
        let (decoded, _) = decode_complete(&bytes);
        assert_eq!(decoded.kind, RecordKind::CreateBucket);
        assert_eq!(decoded.bucket, "obj");
        assert!(decoded.key.is_empty() && decoded.value.is_empty());
    }

    #[test]
    fn short_input_is_incomplete() {
        let bytes = LogRecord::put("insulin", vec![1; 8], b"{\"value\":4}".to_vec())
            .encode()
            .unwrap();

        for cut in [0, 3, 4, bytes.len() - 1] {
            assert!(matches!(
                LogRecord::decode(&bytes[..cut], 0).unwrap(),
                Decoded::Incomplete
            ));
        }
    }

    #[test]
    fn overlong_length_before_complete_record_is_corruption() {
        let mut bytes = LogRecord::put("glucose", vec![1; 8], b"5.5".to_vec())
            .encode()
            .unwrap();
        bytes.extend_from_slice(&LogRecord::put("glucose", vec![2; 8], b"6.0".to_vec()).encode().unwrap());
        bytes[3] = 0x7F;

        assert!(matches!(
            LogRecord::decode(&bytes, 8),
            Err(CoreError::Corruption { .. })
        ));
    }

    #[test]
    fn short_record_with_bad_header_is_corruption() {
        let mut bytes = LogRecord::put("glucose", vec![1; 8], b"5.5".to_vec())
            .encode()
            .unwrap();
        bytes.truncate(bytes.len() - 2);

        let mut bad_kind = bytes.clone();
        bad_kind[4] = 9;
        assert!(matches!(
            LogRecord::decode(&bad_kind, 0),
            Err(CoreError::Corruption { .. })
        ));

        let mut bad_lengths = bytes;
        bad_lengths[6] = 0xFF;
        assert!(matches!(
            LogRecord::decode(&bad_lengths, 0),
            Err(CoreError::Corruption { .. })
        ));
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let mut bytes = LogRecord::put("glucose", vec![2; 8], b"5.5".to_vec())
            .encode()
            .unwrap();
        bytes[12] ^= 0xFF;

        let result = LogRecord::decode(&bytes, 64);
        assert!(matches!(
            result,
            Err(CoreError::ChecksumMismatch { offset: 64, .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let first = LogRecord::create_bucket("glucose").encode().unwrap();
        let mut bytes = first.clone();
        bytes.extend_from_slice(&LogRecord::create_bucket("insulin").encode().unwrap());

        let (decoded, len) = decode_complete(&bytes);
        assert_eq!(decoded.bucket, "glucose");
        assert_eq!(len, first.len());
    }
}
