//! Watch command implementation.
//!
//! Polls the most recent glucose reading and prediction on a fixed
//! interval and runs the alert check on each prediction. Runs until
//! SIGINT or SIGTERM (Ctrl-C on non-Unix), then closes the store.

use super::CommandResult;
use chrono::{FixedOffset, Utc};
use ichor_core::window::format_local;
use ichor_core::{
    AlertLevel, AlertMonitor, GlucosePoint, Store, SERIES_GLUCOSE, SERIES_GLUCOSE_PRED,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Runs the watch loop on a current-thread runtime.
pub fn run(store: &Store, interval_secs: u64, tz: &FixedOffset) -> CommandResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(store, Duration::from_secs(interval_secs.max(1)), tz))?;

    info!("closing store");
    store.close()?;
    Ok(())
}

async fn watch(store: &Store, period: Duration, tz: &FixedOffset) -> CommandResult {
    info!(interval_secs = period.as_secs(), "watching for new readings");
    let mut ticker = tokio::time::interval(period);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                _ = ticker.tick() => log_tick(store, tz),
                _ = sigint.recv() => {
                    info!("SIGINT received - shutting down");
                    break;
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM received - shutting down");
                    break;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = ticker.tick() => log_tick(store, tz),
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received - shutting down");
                    break;
                }
            }
        }
    }

    Ok(())
}

fn log_tick(store: &Store, tz: &FixedOffset) {
    if let Err(e) = tick(store, tz) {
        error!(error = %e, "watch tick failed");
    }
}

/// One poll: report the latest reading and check the latest prediction.
pub fn tick(store: &Store, tz: &FixedOffset) -> CommandResult<Option<AlertLevel>> {
    let latest: Vec<GlucosePoint> = store.tail_query(SERIES_GLUCOSE, 1)?;
    match latest.last() {
        Some(point) => info!(
            value = point.value,
            trend = %point.trend,
            at = %format_local(point.time, tz),
            "latest glucose"
        ),
        None => debug!("no glucose readings yet"),
    }

    let predicted: Vec<GlucosePoint> = store.tail_query(SERIES_GLUCOSE_PRED, 1)?;
    let Some(prediction) = predicted.last() else {
        debug!("no predictions yet");
        return Ok(None);
    };

    let level = AlertMonitor::evaluate(store, prediction, Utc::now())?;
    if let Some(level) = level {
        warn!(
            %level,
            value = prediction.value,
            at = %format_local(prediction.time, tz),
            "predicted {} glucose",
            level
        );
    }
    Ok(level)
}
