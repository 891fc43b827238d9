//! End-to-end scenarios over file-backed stores.

use chrono::{Duration, FixedOffset};
use ichor_core::window::{last_hours, week_range};
use ichor_core::{
    AlertConfig, AlertLevel, AlertMonitor, Carbohydrate, CoreError, ErrorKind, GlucosePoint,
    GlucoseSummary, Insulin, InsulinKind, Store, Trend, DEFAULT_SERIES, INDEX_CONFIG,
    SERIES_CARBOHYDRATE, SERIES_GLUCOSE, SERIES_GLUCOSE_PRED, SERIES_INSULIN,
};
use ichor_testkit::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reading {
    time: i64,
    value: f64,
}

#[test]
fn scenario_put_then_range() {
    let store: Store = Store::open_in_memory().unwrap();
    store.initialize(&["glucose", "insulin"]).unwrap();
    store
        .put_point("glucose", at(100), &Reading { time: 100, value: 5.5 })
        .unwrap();

    let got: Vec<Reading> = store.range_query("glucose", at(0), at(1000)).unwrap();
    assert_eq!(got, vec![Reading { time: 100, value: 5.5 }]);
}

#[test]
fn scenario_same_second_overwrite() {
    with_temp_store(|store| {
        store
            .put_point("glucose", at(100), &Reading { time: 100, value: 5.5 })
            .unwrap();
        store
            .put_point("glucose", at(100), &Reading { time: 100, value: 6.0 })
            .unwrap();
        let got: Vec<Reading> = store.range_query("glucose", at(0), at(1000)).unwrap();
        assert_eq!(got, vec![Reading { time: 100, value: 6.0 }]);
    });
}

#[test]
fn scenario_tail_three() {
    with_temp_store(|store| {
        for t in (100..=500).step_by(100) {
            store
                .put_point("glucose", at(t), &Reading { time: t, value: 5.0 })
                .unwrap();
        }
        let got: Vec<Reading> = store.tail_query("glucose", 3).unwrap();
        let times: Vec<i64> = got.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![300, 400, 500]);
    });
}

#[test]
fn scenario_config_objects() {
    with_temp_store(|store| {
        let err = store.get_object::<AlertConfig>(INDEX_CONFIG).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let config = AlertConfig {
            low_threshold: 3.7,
            high_threshold: 10.0,
            ..AlertConfig::default()
        };
        store.put_object(INDEX_CONFIG, &config).unwrap();
        assert_eq!(store.get_object::<AlertConfig>(INDEX_CONFIG).unwrap(), config);
    });
}

#[test]
fn scenario_unknown_series() {
    with_temp_store(|store| {
        let err = store
            .range_query::<Reading>("unknown-series", at(0), at(1000))
            .unwrap_err();
        assert!(matches!(err, CoreError::SeriesNotFound { .. }));
        assert!(err.is_not_found());
    });
}

#[test]
fn export_matches_full_range() {
    let store = TestStore::file();
    let dir = tempfile::tempdir().unwrap();
    for (i, secs) in [500, 100, 300].into_iter().enumerate() {
        let trend = if i == 0 { Trend::SingleUp } else { Trend::Flat };
        store
            .put_point(SERIES_GLUCOSE, at(secs), &GlucosePoint::new(at(secs), 5.5, trend))
            .unwrap();
    }
    store
        .put_point(SERIES_CARBOHYDRATE, at(50), &Carbohydrate { time: at(50), value: 45 })
        .unwrap();
    store
        .put_point(
            SERIES_INSULIN,
            at(60),
            &Insulin {
                time: at(60),
                kind: InsulinKind::Rapid,
                value: 4,
            },
        )
        .unwrap();

    let written = store
        .export::<GlucosePoint>(&[SERIES_GLUCOSE], dir.path().join("out"))
        .unwrap();
    assert_eq!(written, vec![dir.path().join("out").join("glucose.csv")]);

    let expected: Vec<GlucosePoint> = store
        .range_query(SERIES_GLUCOSE, at(0), chrono::Utc::now())
        .unwrap();
    let mut reader = csv::Reader::from_path(&written[0]).unwrap();
    let exported: Vec<GlucosePoint> = reader.deserialize().map(Result::unwrap).collect();
    assert_eq!(exported, expected);

    store
        .export::<Insulin>(&[SERIES_INSULIN], dir.path())
        .unwrap();
    let insulin = std::fs::read_to_string(dir.path().join("insulin.csv")).unwrap();
    assert_eq!(insulin, "time,type,value\n1970-01-01T00:01:00Z,rapid,4\n");

    store
        .export::<Carbohydrate>(&[SERIES_CARBOHYDRATE], dir.path())
        .unwrap();
    let mut reader = csv::Reader::from_path(dir.path().join("carbohydrate.csv")).unwrap();
    let carbs: Vec<Carbohydrate> = reader.deserialize().map(Result::unwrap).collect();
    assert_eq!(carbs, vec![Carbohydrate { time: at(50), value: 45 }]);
}

#[test]
fn second_handle_is_locked_out() {
    with_file_store(|_store, path| {
        let err = Store::<ichor_codec::JsonCodec>::open(path).unwrap_err();
        assert!(matches!(err, CoreError::StoreLocked));
    });
}

#[test]
fn closed_store_rejects_calls_and_releases_lock() {
    let store = TestStore::file();
    let path = store.path().unwrap();
    store.close().unwrap();
    store.close().unwrap();

    let err = store.tail_query::<GlucosePoint>(SERIES_GLUCOSE, 1).unwrap_err();
    assert!(matches!(err, CoreError::StoreClosed));

    let reopened = open_file_store(&path);
    assert_eq!(reopened.series_names().unwrap().len(), DEFAULT_SERIES.len());
}

#[test]
fn prediction_alert_flow() {
    let store = TestStore::file();
    store.put_object(INDEX_CONFIG, &AlertConfig::default()).unwrap();

    let now = at(10_000);
    let predicted = GlucosePoint::new(now + Duration::minutes(30), 11.2, Trend::Missing);
    store
        .put_point(SERIES_GLUCOSE_PRED, predicted.time, &predicted)
        .unwrap();

    assert_eq!(
        AlertMonitor::evaluate(&store.store, &predicted, now).unwrap(),
        Some(AlertLevel::High)
    );

    // Cooldown survives a restart.
    let store = store.reopen();
    assert_eq!(
        AlertMonitor::evaluate(&store.store, &predicted, now + Duration::minutes(59)).unwrap(),
        None
    );
    assert_eq!(
        AlertMonitor::cooldown_expiry(&store.store).unwrap(),
        Some(now + Duration::hours(1))
    );
    assert_eq!(
        AlertMonitor::evaluate(&store.store, &predicted, now + Duration::minutes(61)).unwrap(),
        Some(AlertLevel::High)
    );
}

#[test]
fn report_window_summary() {
    with_temp_store(|store| {
        let now = at(12 * 3600 + 1800);
        for (i, value) in [4.0, 6.0, 8.0].into_iter().enumerate() {
            let t = now - Duration::hours(2) + Duration::minutes(i as i64 * 5);
            store
                .put_point(SERIES_GLUCOSE, t, &GlucosePoint::new(t, value, Trend::Flat))
                .unwrap();
        }
        // Outside the 1 hour window.
        let old = now - Duration::hours(3);
        store
            .put_point(SERIES_GLUCOSE, old, &GlucosePoint::new(old, 20.0, Trend::Flat))
            .unwrap();

        let (start, end) = last_hours(now, 2).unwrap();
        let points: Vec<GlucosePoint> = store.range_query(SERIES_GLUCOSE, start, end).unwrap();
        let summary = GlucoseSummary::from_points(&points).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean, 6.0);
        assert_eq!(summary.std_dev, 2.0);
        assert_eq!(summary.latest_value, 8.0);
    });
}

#[test]
fn weekly_window_query() {
    with_temp_store(|store| {
        // Monday 1970-01-05 00:00 UTC opens the first full week.
        let monday = at(4 * 86_400);
        let tz = FixedOffset::east_opt(0).unwrap();
        for day in 0..10 {
            let t = monday + Duration::days(day) + Duration::hours(12);
            store
                .put_point(SERIES_GLUCOSE, t, &GlucosePoint::new(t, 5.0, Trend::Flat))
                .unwrap();
        }

        let now = monday + Duration::days(8);
        let (start, end) = week_range(now, &tz, 1).unwrap();
        assert_eq!(start, monday);
        // The window end is exclusive; the range query is inclusive.
        let points: Vec<GlucosePoint> = store
            .range_query(SERIES_GLUCOSE, start, end - Duration::seconds(1))
            .unwrap();
        assert_eq!(points.len(), 7);
    });
}
