//! Record shapes and well-known names used by ichor collaborators.
//!
//! The store itself is agnostic to these; they are the shapes the uploader,
//! predictor and reporting code agree on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Observed glucose readings.
pub const SERIES_GLUCOSE: &str = "glucose";
/// Predicted glucose readings.
pub const SERIES_GLUCOSE_PRED: &str = "glucose-pred";
/// Carbohydrate intake.
pub const SERIES_CARBOHYDRATE: &str = "carbohydrate";
/// Insulin doses.
pub const SERIES_INSULIN: &str = "insulin";

/// Series created by a default initialization.
pub const DEFAULT_SERIES: [&str; 4] = [
    SERIES_GLUCOSE,
    SERIES_GLUCOSE_PRED,
    SERIES_CARBOHYDRATE,
    SERIES_INSULIN,
];

/// Reserved bucket for object entries.
pub const OBJECT_BUCKET: &str = "obj";

/// Object index of the [`AlertConfig`].
pub const INDEX_CONFIG: &str = "config";
/// Object index of the alert cooldown expiry timestamp.
pub const INDEX_TIMEOUT_EXPIRE: &str = "timeout-expire";

/// Direction and rate of glucose change reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Trend {
    /// Rising quickly.
    DoubleUp,
    /// Rising.
    SingleUp,
    /// Rising slowly.
    HalfUp,
    /// Steady.
    Flat,
    /// Falling slowly.
    HalfDown,
    /// Falling.
    SingleDown,
    /// Falling quickly.
    DoubleDown,
    /// No trend available (e.g. predictions).
    #[default]
    Missing,
}

impl Trend {
    /// Arrow used when displaying a reading.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::DoubleUp => "↟",
            Self::SingleUp => "↑",
            Self::HalfUp => "↗",
            Self::Flat => "→",
            Self::HalfDown => "↘",
            Self::SingleDown => "↓",
            Self::DoubleDown => "↡",
            Self::Missing => "-",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A glucose reading in mmol/L.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucosePoint {
    /// When the reading was taken.
    pub time: DateTime<Utc>,
    /// Glucose concentration in mmol/L.
    pub value: f64,
    /// Sensor trend.
    #[serde(default)]
    pub trend: Trend,
}

impl GlucosePoint {
    /// Creates a reading.
    #[must_use]
    pub fn new(time: DateTime<Utc>, value: f64, trend: Trend) -> Self {
        Self { time, value, trend }
    }
}

/// A carbohydrate entry in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carbohydrate {
    /// When the carbohydrates were eaten.
    pub time: DateTime<Utc>,
    /// Grams of carbohydrate.
    pub value: i64,
}

/// Insulin action profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsulinKind {
    /// Rapid-acting (bolus).
    Rapid,
    /// Long-acting (basal).
    Long,
}

/// An insulin dose in units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insulin {
    /// When the dose was taken.
    pub time: DateTime<Utc>,
    /// Insulin type.
    #[serde(rename = "type")]
    pub kind: InsulinKind,
    /// Units injected.
    pub value: i64,
}

/// Alerting thresholds, stored under [`INDEX_CONFIG`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Quiet period after an alert fires.
    pub warning_timeout: Duration,
    /// Predicted values at or below this raise a low alert.
    pub low_threshold: f64,
    /// Predicted values at or above this raise a high alert.
    pub high_threshold: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            warning_timeout: Duration::from_secs(60 * 60),
            low_threshold: 3.7,
            high_threshold: 10.0,
        }
    }
}
