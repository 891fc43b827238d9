//! Order-preserving time keys.
//!
//! A point key is the timestamp truncated to whole seconds and written as an
//! 8-byte big-endian unsigned integer, so byte order equals time order and a
//! bucket's ordered map doubles as a time index.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Width of an encoded key in bytes.
pub const KEY_LEN: usize = 8;

/// An encoded point key.
///
/// Two instants inside the same second map to the same key; a later write
/// at that key replaces the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointKey([u8; KEY_LEN]);

impl PointKey {
    /// The smallest key (the Unix epoch).
    pub const MIN: Self = Self([0; KEY_LEN]);

    /// Encodes an instant. Instants before the epoch clamp to [`Self::MIN`].
    #[must_use]
    pub fn from_time<Tz: TimeZone>(time: &DateTime<Tz>) -> Self {
        Self::from_secs(u64::try_from(time.timestamp()).unwrap_or(0))
    }

    /// Encodes a count of seconds since the epoch.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.to_be_bytes())
    }

    /// Parses a stored key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if `bytes` is not exactly
    /// [`KEY_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        let raw: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CoreError::corruption(format!("point key must be {KEY_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(raw))
    }

    /// Returns the seconds since the epoch.
    #[must_use]
    pub const fn secs(self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Decodes back to an instant, truncated to the second.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if the key lies outside the range
    /// `chrono` can represent.
    pub fn to_time(self) -> CoreResult<DateTime<Utc>> {
        i64::try_from(self.secs())
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| CoreError::corruption(format!("point key {} out of range", self.secs())))
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.secs())
    }
}
