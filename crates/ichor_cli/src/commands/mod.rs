//! CLI command implementations.

pub mod config;
pub mod export;
pub mod ingest;
pub mod init;
pub mod inspect;
pub mod query;
pub mod report;
pub mod watch;

use chrono::{DateTime, FixedOffset, Utc};
use ichor_core::window::format_local;
use serde_json::Value;

/// Result type shared by all commands.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_time(s: &str) -> CommandResult<DateTime<Utc>> {
    let t = DateTime::parse_from_rfc3339(s).map_err(|e| format!("invalid time {s:?}: {e}"))?;
    Ok(t.with_timezone(&Utc))
}

/// Renders one stored record as a single text line.
///
/// The `time` field is shown in `tz`; the other fields follow as
/// `name=value` in key order.
pub fn render_record(record: &Value, tz: &FixedOffset) -> String {
    let Value::Object(fields) = record else {
        return record.to_string();
    };

    let time = fields
        .get("time")
        .and_then(Value::as_str)
        .and_then(|s| parse_time(s).ok())
        .map(|t| format_local(t, tz));

    let rest: Vec<String> = fields
        .iter()
        .filter(|(k, _)| k.as_str() != "time")
        .map(|(k, v)| match v {
            Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect();

    match time {
        Some(time) => format!("{time}  {}", rest.join(" ")),
        None => rest.join(" "),
    }
}

/// Prints records as text lines or a pretty JSON array.
pub fn print_records(records: &[Value], format: &str, tz: &FixedOffset) -> CommandResult {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(records)?),
        _ => {
            for record in records {
                println!("{}", render_record(record, tz));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_time_in_offset() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let record = json!({"time": "2022-04-04T02:15:00Z", "value": 5.5, "trend": "Flat"});
        assert_eq!(
            render_record(&record, &tz),
            "2022-04-03 09:15 PM  trend=Flat value=5.5"
        );
    }

    #[test]
    fn renders_without_time() {
        let tz = FixedOffset::east_opt(0).unwrap();
        assert_eq!(render_record(&json!({"value": 3}), &tz), "value=3");
        assert_eq!(render_record(&json!(42), &tz), "42");
    }

    #[test]
    fn rejects_bad_time() {
        assert!(parse_time("yesterday").is_err());
        assert_eq!(parse_time("1970-01-01T00:01:40Z").unwrap().timestamp(), 100);
    }
}
