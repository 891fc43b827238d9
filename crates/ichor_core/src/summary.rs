//! Summary statistics over glucose readings.

use crate::model::{GlucosePoint, Trend};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Descriptive statistics for a window of readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlucoseSummary {
    /// Time of the most recent reading.
    pub latest_time: DateTime<Utc>,
    /// Most recent value.
    pub latest_value: f64,
    /// Most recent trend.
    pub latest_trend: Trend,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (n - 1); zero for a single reading.
    pub std_dev: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Number of readings.
    pub count: usize,
}

impl GlucoseSummary {
    /// Summarizes chronologically ordered readings. `None` if empty.
    #[must_use]
    pub fn from_points(points: &[GlucosePoint]) -> Option<Self> {
        let latest = points.last()?;
        let count = points.len();
        let n = count as f64;

        let mean = points.iter().map(|p| p.value).sum::<f64>() / n;
        let std_dev = if count < 2 {
            0.0
        } else {
            let sq: f64 = points.iter().map(|p| (p.value - mean).powi(2)).sum();
            (sq / (n - 1.0)).sqrt()
        };
        let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
        let max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            latest_time: latest.time,
            latest_value: latest.value,
            latest_trend: latest.trend,
            mean,
            std_dev,
            min,
            max,
            count,
        })
    }

    /// Fraction of readings within `[low, high]`.
    #[must_use]
    pub fn time_in_range(points: &[GlucosePoint], low: f64, high: f64) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        let inside = points
            .iter()
            .filter(|p| p.value >= low && p.value <= high)
            .count();
        inside as f64 / points.len() as f64
    }
}
