//! Alert cooldown around glucose predictions.
//!
//! Thresholds live in the `config` object; the end of the current quiet
//! period lives in `timeout-expire`. Both are plain object entries, so any
//! process sharing the store sees the same cooldown.

use crate::error::{CoreError, CoreResult};
use crate::model::{AlertConfig, GlucosePoint, INDEX_CONFIG, INDEX_TIMEOUT_EXPIRE};
use crate::store::Store;
use chrono::{DateTime, Utc};
use ichor_codec::RecordCodec;
use std::fmt;
use tracing::{debug, info};

/// Which side of the target range a prediction falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertLevel {
    /// Predicted value at or below the low threshold.
    Low,
    /// Predicted value at or above the high threshold.
    High,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Decides whether a prediction should raise an alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertMonitor;

impl AlertMonitor {
    /// Checks `predicted` against the stored thresholds.
    ///
    /// Returns `None` while a previous alert's cooldown is running or when
    /// the value is in range. When an alert fires, the cooldown is restarted
    /// at `now + warning_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ObjectNotFound`] if no `config` has been stored,
    /// and decode or storage errors otherwise. A missing cooldown entry is
    /// not an error.
    pub fn evaluate<C: RecordCodec>(
        store: &Store<C>,
        predicted: &GlucosePoint,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<AlertLevel>> {
        let config: AlertConfig = store.get_object(INDEX_CONFIG)?;

        if let Some(expire) = Self::cooldown_expiry(store)? {
            if expire > now {
                debug!(%expire, "alert suppressed by cooldown");
                return Ok(None);
            }
        }

        let level = if predicted.value <= config.low_threshold {
            AlertLevel::Low
        } else if predicted.value >= config.high_threshold {
            AlertLevel::High
        } else {
            return Ok(None);
        };

        let timeout = chrono::Duration::from_std(config.warning_timeout)
            .map_err(|_| CoreError::invalid_operation("warning timeout out of range"))?;
        store.put_object(INDEX_TIMEOUT_EXPIRE, &(now + timeout))?;
        info!(%level, value = predicted.value, "glucose alert raised");

        Ok(Some(level))
    }

    /// Returns the end of the current cooldown, if one was ever set.
    ///
    /// # Errors
    ///
    /// Returns decode or storage errors; a missing entry yields `None`.
    pub fn cooldown_expiry<C: RecordCodec>(store: &Store<C>) -> CoreResult<Option<DateTime<Utc>>> {
        match store.get_object(INDEX_TIMEOUT_EXPIRE) {
            Ok(expire) => Ok(Some(expire)),
            Err(CoreError::ObjectNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Trend, DEFAULT_SERIES};
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.initialize(&DEFAULT_SERIES).unwrap();
        store.put_object(INDEX_CONFIG, &AlertConfig::default()).unwrap();
        store
    }

    fn predict(value: f64) -> GlucosePoint {
        GlucosePoint::new(at(10_000), value, Trend::Missing)
    }

    #[test]
    fn missing_config_is_an_error() {
        let store: Store = Store::open_in_memory().unwrap();
        store.initialize(&DEFAULT_SERIES).unwrap();
        let err = AlertMonitor::evaluate(&store, &predict(2.0), at(0)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn in_range_is_quiet() {
        let store = store();
        assert_eq!(AlertMonitor::evaluate(&store, &predict(6.0), at(0)).unwrap(), None);
        assert_eq!(AlertMonitor::cooldown_expiry(&store).unwrap(), None);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let store = store();
        assert_eq!(
            AlertMonitor::evaluate(&store, &predict(3.7), at(0)).unwrap(),
            Some(AlertLevel::Low)
        );

        let store = self::store();
        assert_eq!(
            AlertMonitor::evaluate(&store, &predict(10.0), at(0)).unwrap(),
            Some(AlertLevel::High)
        );
    }

    #[test]
    fn cooldown_suppresses_until_expiry() {
        let store = store();
        let start = at(1_000);

        assert_eq!(
            AlertMonitor::evaluate(&store, &predict(2.5), start).unwrap(),
            Some(AlertLevel::Low)
        );
        assert_eq!(
            AlertMonitor::cooldown_expiry(&store).unwrap(),
            Some(start + Duration::hours(1))
        );

        let during = start + Duration::minutes(30);
        assert_eq!(AlertMonitor::evaluate(&store, &predict(12.0), during).unwrap(), None);

        let after = start + Duration::hours(1) + Duration::seconds(1);
        assert_eq!(
            AlertMonitor::evaluate(&store, &predict(12.0), after).unwrap(),
            Some(AlertLevel::High)
        );
    }
}
