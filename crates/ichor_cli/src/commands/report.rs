//! Report command implementation.

use super::CommandResult;
use chrono::{FixedOffset, Utc};
use ichor_core::window::{format_local, last_hours};
use ichor_core::{AlertConfig, GlucosePoint, GlucoseSummary, Store, INDEX_CONFIG, SERIES_GLUCOSE};

/// Prints a summary of glucose readings over the last `hours`.
pub fn run(store: &Store, hours: i64, tz: &FixedOffset) -> CommandResult {
    let (start, end) = last_hours(Utc::now(), hours)?;
    let points: Vec<GlucosePoint> = store.range_query(SERIES_GLUCOSE, start, end)?;
    let config = load_config(store)?;

    let Some(summary) = GlucoseSummary::from_points(&points) else {
        println!("No glucose readings in the last {hours} hours");
        return Ok(());
    };
    let in_range =
        GlucoseSummary::time_in_range(&points, config.low_threshold, config.high_threshold);

    println!("=== Glucose Report ({hours}h) ===");
    println!(
        "Latest:        {:.1} {} at {}",
        summary.latest_value,
        summary.latest_trend,
        format_local(summary.latest_time, tz)
    );
    println!("Mean:          {:.2}", summary.mean);
    println!("Std dev:       {:.2}", summary.std_dev);
    println!("Min / Max:     {:.1} / {:.1}", summary.min, summary.max);
    println!("Readings:      {}", summary.count);
    println!(
        "In range:      {:.0}% ({:.1} - {:.1})",
        in_range * 100.0,
        config.low_threshold,
        config.high_threshold
    );

    Ok(())
}

/// Loads the stored alert configuration, falling back to the defaults.
pub fn load_config(store: &Store) -> CommandResult<AlertConfig> {
    match store.get_object::<AlertConfig>(INDEX_CONFIG) {
        Ok(config) => Ok(config),
        Err(e) if e.is_not_found() => Ok(AlertConfig::default()),
        Err(e) => Err(e.into()),
    }
}
