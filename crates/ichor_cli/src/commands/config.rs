//! Config command implementation.

use super::report::load_config;
use super::CommandResult;
use ichor_core::{AlertConfig, Store, INDEX_CONFIG};
use std::time::Duration;
use tracing::info;

/// Prints the alert configuration.
pub fn show(store: &Store) -> CommandResult {
    let config = load_config(store)?;
    println!("Low threshold:   {:.1}", config.low_threshold);
    println!("High threshold:  {:.1}", config.high_threshold);
    println!(
        "Alert timeout:   {} min",
        config.warning_timeout.as_secs() / 60
    );
    Ok(())
}

/// Applies the given changes to the alert configuration.
pub fn set(
    store: &Store,
    low: Option<f64>,
    high: Option<f64>,
    timeout_mins: Option<u64>,
) -> CommandResult {
    let config = apply(load_config(store)?, low, high, timeout_mins)?;
    store.put_object(INDEX_CONFIG, &config)?;
    info!(
        low = config.low_threshold,
        high = config.high_threshold,
        "alert configuration updated"
    );
    show(store)
}

fn apply(
    mut config: AlertConfig,
    low: Option<f64>,
    high: Option<f64>,
    timeout_mins: Option<u64>,
) -> CommandResult<AlertConfig> {
    if let Some(low) = low {
        config.low_threshold = low;
    }
    if let Some(high) = high {
        config.high_threshold = high;
    }
    if let Some(mins) = timeout_mins {
        config.warning_timeout = Duration::from_secs(mins * 60);
    }
    if config.low_threshold >= config.high_threshold {
        return Err(format!(
            "low threshold {} must be below high threshold {}",
            config.low_threshold, config.high_threshold
        )
        .into());
    }
    Ok(config)
}
