//! `overlap` CLI: compute group availability overlaps from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Windows where at least two participants are free (stdin → stdout)
//! cat participants.json | overlap compute
//!
//! # Windows where everyone is free, from file to file
//! overlap compute --full -i participants.json -o windows.json
//!
//! # Aggregate persisted plan records (epoch-millisecond slots + name map)
//! overlap plan -i plan.json --skip-invalid
//!
//! # Would 09:30-10:30 collide with my existing slots?
//! overlap conflict --start 2026-03-16T09:30:00Z --end 2026-03-16T10:30:00Z -i mine.json
//!
//! # Busiest overlap per day in Seoul time
//! overlap daily -i participants.json --tz Asia/Seoul
//!
//! # Overlay colour for 3 of 5 participants
//! overlap color --count 3 --total 5
//! ```

mod config;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use overlap_engine::ingest::{IngestPolicy, TimeSlotsRecord};
use overlap_engine::names::StaticDirectory;
use overlap_engine::plan::{FixedSession, MemoryNotifier, MemoryStore, PlanKey, PlanService};
use overlap_engine::render::daily_max_overlap;
use overlap_engine::{
    compute_overlaps, full_overlap_windows, has_time_conflict, overlap_color,
    parse_participants_json, Interval,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "overlap",
    version,
    about = "Find time windows where enough participants are available"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./overlap.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute overlap windows from a JSON array of participants
    Compute {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Minimum number of participants per window
        #[arg(long, conflicts_with = "full")]
        min: Option<usize>,
        /// Only windows where every participant is available
        #[arg(long)]
        full: bool,
    },
    /// Aggregate persisted plan records with display names
    Plan {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Minimum number of participants per window
        #[arg(long)]
        min: Option<usize>,
        /// Drop malformed slots instead of failing
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Check a candidate slot against existing slots
    Conflict {
        /// Candidate start (RFC 3339, or naive time read as UTC)
        #[arg(long)]
        start: String,
        /// Candidate end (RFC 3339, or naive time read as UTC)
        #[arg(long)]
        end: String,
        /// JSON array of existing `{start, end}` slots (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Index of the slot being moved, ignored in the check
        #[arg(long)]
        exclude: Option<usize>,
    },
    /// Print the maximum overlap count per day
    Daily {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Minimum number of participants per window
        #[arg(long)]
        min: Option<usize>,
        /// IANA timezone used to assign windows to days
        #[arg(long, default_value = "UTC")]
        tz: String,
    },
    /// Print the overlay colour for a window
    Color {
        /// Participants in the window
        #[arg(long)]
        count: usize,
        /// Participants in the plan
        #[arg(long)]
        total: usize,
        /// Print `#RRGGBB` instead of `rgb(r, g, b)`
        #[arg(long)]
        hex: bool,
    },
}

/// Persisted plan records as exported from the document store.
#[derive(Deserialize)]
struct PlanInput {
    #[serde(default = "default_party_id")]
    party_id: String,
    #[serde(default = "default_plan_id")]
    plan_id: String,
    /// Directory contents: participant id → display name.
    #[serde(default)]
    names: HashMap<String, String>,
    records: Vec<TimeSlotsRecord>,
}

fn default_party_id() -> String {
    "party".to_string()
}

fn default_plan_id() -> String {
    "plan".to_string()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;
    init_logging(cli.verbose, &config.logging.level);

    match cli.command {
        Commands::Compute {
            input,
            output,
            min,
            full,
        } => {
            let json = read_input(input.as_deref())?;
            let participants =
                parse_participants_json(&json).context("Failed to parse participants JSON")?;

            let windows = if full {
                full_overlap_windows(&participants)
            } else {
                let min = min.unwrap_or(config.aggregation.min_overlap_count);
                compute_overlaps(&participants, min).context("Failed to compute overlaps")?
            };
            tracing::info!(windows = windows.len(), "computed overlap windows");

            write_output(output.as_deref(), &serde_json::to_string_pretty(&windows)?)?;
        }
        Commands::Plan {
            input,
            output,
            min,
            skip_invalid,
        } => {
            let json = read_input(input.as_deref())?;
            let plan_input: PlanInput =
                serde_json::from_str(&json).context("Failed to parse plan JSON")?;
            let plan = PlanKey::new(plan_input.party_id, plan_input.plan_id);

            let store = MemoryStore::new().with_records(&plan, plan_input.records)?;
            let resolver = config.names.resolver();
            let directory = plan_input
                .names
                .into_iter()
                .collect::<StaticDirectory>()
                .with_max_batch(resolver.batch_size());
            let notifier = MemoryNotifier::new();
            let session = FixedSession::signed_out();

            let policy = if skip_invalid {
                IngestPolicy::SkipInvalid
            } else {
                config.aggregation.validation
            };
            let service = PlanService::new(&store, &directory, &notifier, &session)
                .with_resolver(resolver)
                .with_min_overlap_count(min.unwrap_or(config.aggregation.min_overlap_count))
                .with_policy(policy);

            let overview = service
                .overview(&plan)
                .context("Failed to aggregate plan")?;

            write_output(output.as_deref(), &serde_json::to_string_pretty(&overview)?)?;
        }
        Commands::Conflict {
            start,
            end,
            input,
            exclude,
        } => {
            let start = parse_datetime(&start)?;
            let end = parse_datetime(&end)?;
            let candidate =
                Interval::new(start, end).context("Candidate slot must start before it ends")?;

            let json = read_input(input.as_deref())?;
            let existing: Vec<Interval> =
                serde_json::from_str(&json).context("Failed to parse slots JSON")?;
            if let Some(index) = exclude.filter(|&i| i >= existing.len()) {
                tracing::warn!(
                    index,
                    slots = existing.len(),
                    "exclude index out of range, checking against every slot"
                );
            }

            let conflict =
                has_time_conflict(candidate.start(), candidate.end(), &existing, exclude);
            println!("{}", conflict);
        }
        Commands::Daily { input, min, tz } => {
            let tz: Tz = tz
                .parse()
                .map_err(|_| anyhow!("Unknown timezone: '{}'", tz))?;
            let json = read_input(input.as_deref())?;
            let participants =
                parse_participants_json(&json).context("Failed to parse participants JSON")?;

            let min = min.unwrap_or(config.aggregation.min_overlap_count);
            let windows =
                compute_overlaps(&participants, min).context("Failed to compute overlaps")?;

            for (day, count) in daily_max_overlap(&windows, tz) {
                println!("{} {}", day, count);
            }
        }
        Commands::Color { count, total, hex } => {
            let color = overlap_color(count, total);
            if hex {
                println!("{}", color.to_hex());
            } else {
                println!("{}", color);
            }
        }
    }

    Ok(())
}

/// Install a stderr subscriber; `RUST_LOG` wins over flags and config.
fn init_logging(verbose: u8, configured: &str) {
    let level = match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 with an offset, or a naive `YYYY-MM-DDTHH:MM:SS` read as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .with_context(|| format!("Invalid datetime: '{}'", s))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
