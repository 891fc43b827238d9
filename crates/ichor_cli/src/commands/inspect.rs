//! Inspect command implementation.

use super::CommandResult;
use ichor_core::{Store, StoreStats};

/// Prints store statistics.
pub fn run(store: &Store, format: &str) -> CommandResult {
    let stats = store.stats()?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => print_text_output(&stats),
    }
    Ok(())
}

fn print_text_output(stats: &StoreStats) {
    println!("=== ichor store ===");
    println!("Path:      {}", stats.path.as_deref().unwrap_or("<memory>"));
    println!("Size:      {} bytes", stats.file_size);
    println!("Codec:     {}", stats.codec);
    println!("Objects:   {}", stats.object_count);
    println!();
    println!("{:<16} {:>8}  {:<25} {:<25}", "SERIES", "POINTS", "FIRST", "LAST");
    for series in &stats.series {
        let first = series.first.map(|t| t.to_rfc3339()).unwrap_or_default();
        let last = series.last.map(|t| t.to_rfc3339()).unwrap_or_default();
        println!(
            "{:<16} {:>8}  {:<25} {:<25}",
            series.name, series.count, first, last
        );
    }
}
