//! Range and tail command implementations.

use super::{parse_time, print_records, CommandResult};
use chrono::FixedOffset;
use ichor_core::Store;
use serde_json::Value;

/// Prints the records of `series` keyed within `[start, end]`.
pub fn range(
    store: &Store,
    series: &str,
    start: &str,
    end: &str,
    format: &str,
    tz: &FixedOffset,
) -> CommandResult {
    let records: Vec<Value> = store.range_query(series, parse_time(start)?, parse_time(end)?)?;
    print_records(&records, format, tz)
}

/// Prints the `count` most recent records of `series`.
pub fn tail(
    store: &Store,
    series: &str,
    count: usize,
    format: &str,
    tz: &FixedOffset,
) -> CommandResult {
    let records: Vec<Value> = store.tail_query(series, count)?;
    print_records(&records, format, tz)
}
