//! ichor CLI
//!
//! Command-line tools for the ichor health-data store.
//!
//! # Commands
//!
//! - `init` - Create the default series and alert configuration
//! - `ingest` - Load JSON-lines records into a series
//! - `range` / `tail` - Query a series
//! - `report` - Summarize recent glucose readings
//! - `config` - Show or change alert thresholds
//! - `export` - Write the default series to CSV
//! - `inspect` - Display store statistics
//! - `watch` - Poll the latest readings and raise alerts until stopped

mod commands;

use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use ichor_core::{Store, DEFAULT_PATH};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ichor health-data store tools.
#[derive(Parser)]
#[command(name = "ichor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data file
    #[arg(global = true, short, long, default_value = DEFAULT_PATH)]
    path: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Hours east of UTC used for display and day/week windows
    #[arg(global = true, long, default_value = "0", allow_hyphen_values = true)]
    utc_offset: i32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the default series and alert configuration
    Init {
        /// Additional series to create
        #[arg(short, long)]
        series: Vec<String>,
    },

    /// Load JSON-lines records into a series
    Ingest {
        /// Target series
        #[arg(short, long)]
        series: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the records of a series between two RFC 3339 times
    Range {
        /// Series to query
        #[arg(short, long)]
        series: String,

        /// Window start (inclusive)
        #[arg(long)]
        start: String,

        /// Window end (inclusive)
        #[arg(long)]
        end: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the most recent records of a series
    Tail {
        /// Series to query
        #[arg(short, long)]
        series: String,

        /// Number of records
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Summarize glucose readings over recent hours
    Report {
        /// Window length in hours
        #[arg(long, default_value = "12")]
        hours: i64,
    },

    /// Show or change alert thresholds
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Export the default series to CSV files
    Export {
        /// Destination directory
        #[arg(short, long, default_value = "data")]
        dest: PathBuf,
    },

    /// Display store statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Poll the latest readings and raise alerts until interrupted
    Watch {
        /// Seconds between polls
        #[arg(long, default_value = "60")]
        interval_secs: u64,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current alert configuration
    Show,

    /// Update alert thresholds
    Set {
        /// Low threshold (mmol/L)
        #[arg(long)]
        low: Option<f64>,

        /// High threshold (mmol/L)
        #[arg(long)]
        high: Option<f64>,

        /// Quiet period after an alert, in minutes
        #[arg(long)]
        timeout_mins: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("ichor CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("ichor core v{}", ichor_core::VERSION);
        return Ok(());
    }

    let tz = FixedOffset::east_opt(cli.utc_offset * 3600)
        .ok_or_else(|| format!("invalid --utc-offset {}", cli.utc_offset))?;
    let store: Store = Store::open(&cli.path)?;

    match cli.command {
        Commands::Init { series } => commands::init::run(&store, &series)?,
        Commands::Ingest { series, file } => {
            commands::ingest::run(&store, &series, file.as_deref())?;
        }
        Commands::Range {
            series,
            start,
            end,
            format,
        } => commands::query::range(&store, &series, &start, &end, &format, &tz)?,
        Commands::Tail {
            series,
            count,
            format,
        } => commands::query::tail(&store, &series, count, &format, &tz)?,
        Commands::Report { hours } => commands::report::run(&store, hours, &tz)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&store)?,
            ConfigAction::Set {
                low,
                high,
                timeout_mins,
            } => commands::config::set(&store, low, high, timeout_mins)?,
        },
        Commands::Export { dest } => commands::export::run(&store, &dest)?,
        Commands::Inspect { format } => commands::inspect::run(&store, &format)?,
        Commands::Watch { interval_secs } => {
            commands::watch::run(&store, interval_secs, &tz)?;
        }
        Commands::Version => {}
    }

    store.close()?;
    Ok(())
}
