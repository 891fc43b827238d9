//! # ichor testkit
//!
//! Test utilities for the ichor store.
//!
//! This crate provides:
//! - Temporary stores that clean up after themselves
//! - Property-based generators for timestamps and readings
//! - A shadow-model harness that checks queries against a reference map
//! - Crash helpers that tear the data file mid-record
//!
//! ## Usage
//!
//! ```rust
//! use ichor_testkit::prelude::*;
//! use ichor_core::{GlucosePoint, SERIES_GLUCOSE};
//!
//! with_temp_store(|store| {
//!     let points: Vec<GlucosePoint> = store.tail_query(SERIES_GLUCOSE, 5).unwrap();
//!     assert!(points.is_empty());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
pub use integration::*;
