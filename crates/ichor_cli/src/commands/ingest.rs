//! Ingest command implementation.

use super::{parse_time, CommandResult};
use ichor_core::Store;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Reads JSON lines from `file` (or stdin) into `series`.
pub fn run(store: &Store, series: &str, file: Option<&Path>) -> CommandResult {
    let count = match file {
        Some(path) => ingest(store, series, BufReader::new(File::open(path)?))?,
        None => ingest(store, series, io::stdin().lock())?,
    };
    println!("Ingested {count} records into {series}");
    Ok(())
}

/// Stores each non-empty line as a record keyed by its `time` field.
///
/// Records are stored verbatim. Returns the number of records written.
pub fn ingest(store: &Store, series: &str, reader: impl BufRead) -> CommandResult<usize> {
    let mut count = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: Value =
            serde_json::from_str(line).map_err(|e| format!("line {}: {e}", index + 1))?;
        let time = record
            .get("time")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("line {}: missing \"time\" field", index + 1))?;
        let time = parse_time(time).map_err(|e| format!("line {}: {e}", index + 1))?;

        store.put_point(series, time, &record)?;
        debug!(series, %time, "ingested record");
        count += 1;
    }

    info!(series, count, "ingest complete");
    Ok(count)
}
