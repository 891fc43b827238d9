//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use chrono::{DateTime, Utc};
use ichor_core::{GlucosePoint, Trend};
use proptest::prelude::*;

/// Latest second generated (2100-01-01).
pub const MAX_SECS: i64 = 4_102_444_800;

/// Strategy for whole-second instants between the epoch and 2100.
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0..=MAX_SECS).prop_map(|secs| DateTime::from_timestamp(secs, 0).expect("in range"))
}

/// Strategy for instants with a sub-second component.
pub fn subsecond_timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0..=MAX_SECS, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| DateTime::from_timestamp(secs, nanos).expect("in range"))
}

/// Strategy for glucose values with one decimal, 1.0 to 30.0 mmol/L.
pub fn glucose_value_strategy() -> impl Strategy<Value = f64> {
    (10u32..=300).prop_map(|tenths| f64::from(tenths) / 10.0)
}

/// Strategy for sensor trends.
pub fn trend_strategy() -> impl Strategy<Value = Trend> {
    prop_oneof![
        Just(Trend::DoubleUp),
        Just(Trend::SingleUp),
        Just(Trend::HalfUp),
        Just(Trend::Flat),
        Just(Trend::HalfDown),
        Just(Trend::SingleDown),
        Just(Trend::DoubleDown),
        Just(Trend::Missing),
    ]
}

/// Strategy for a reading at a whole-second instant.
pub fn glucose_point_strategy() -> impl Strategy<Value = GlucosePoint> {
    (timestamp_strategy(), glucose_value_strategy(), trend_strategy())
        .prop_map(|(time, value, trend)| GlucosePoint::new(time, value, trend))
}

/// Strategy for a batch of readings, possibly sharing seconds.
pub fn glucose_batch_strategy(max: usize) -> impl Strategy<Value = Vec<GlucosePoint>> {
    prop::collection::vec(
        (0i64..10_000, glucose_value_strategy(), trend_strategy()).prop_map(
            |(secs, value, trend)| {
                GlucosePoint::new(
                    DateTime::from_timestamp(secs, 0).expect("in range"),
                    value,
                    trend,
                )
            },
        ),
        0..max,
    )
}

/// Strategy for valid series names.
pub fn series_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,15}")
        .expect("Invalid regex")
        .prop_filter("Series name must not be the object bucket", |s| s != "obj")
}

/// Strategy for arbitrary JSON objects used with the object bucket.
pub fn json_object_strategy() -> impl Strategy<Value = serde_json::Value> {
    prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..6).prop_map(|map| {
        serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, serde_json::Value::from(v)))
                .collect(),
        )
    })
}
