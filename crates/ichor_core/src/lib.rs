//! # ichor core
//!
//! Embedded, single-file, time-indexed store for health measurements.
//!
//! A [`Store`] holds named series of time-keyed records (glucose readings,
//! predictions, carbohydrate intake, insulin doses) plus a small keyed
//! object area for configuration and alert state. Records are serialized
//! with a pluggable [`ichor_codec::RecordCodec`]; the default is JSON.
//!
//! This crate provides:
//! - The append-only engine and its crash recovery
//! - Time-keyed range and tail queries
//! - CSV export of whole series
//! - The domain model and alert evaluation
//! - Timezone-aware query windows and summaries
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use ichor_core::{GlucosePoint, Store, Trend, DEFAULT_SERIES, SERIES_GLUCOSE};
//!
//! let store: Store = Store::open_in_memory().unwrap();
//! store.initialize(&DEFAULT_SERIES).unwrap();
//!
//! let now = Utc::now();
//! store
//!     .put_point(SERIES_GLUCOSE, now, &GlucosePoint::new(now, 6.1, Trend::Flat))
//!     .unwrap();
//!
//! let recent: Vec<GlucosePoint> = store
//!     .range_query(SERIES_GLUCOSE, now - Duration::hours(1), now)
//!     .unwrap();
//! assert_eq!(recent.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod alert;
mod bucket;
mod config;
mod engine;
mod error;
mod export;
mod key;
mod model;
mod store;
mod summary;
pub mod window;

pub use alert::{AlertLevel, AlertMonitor};
pub use config::{StoreConfig, DEFAULT_PATH};
pub use engine::{FORMAT_VERSION, HEADER_SIZE, MAGIC};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use export::Exporter;
pub use key::{PointKey, KEY_LEN};
pub use model::{
    AlertConfig, Carbohydrate, GlucosePoint, Insulin, InsulinKind, Trend, DEFAULT_SERIES,
    INDEX_CONFIG, INDEX_TIMEOUT_EXPIRE, OBJECT_BUCKET, SERIES_CARBOHYDRATE, SERIES_GLUCOSE,
    SERIES_GLUCOSE_PRED, SERIES_INSULIN,
};
pub use store::{SeriesStats, Store, StoreStats};
pub use summary::GlucoseSummary;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
