//! Schedule inspector for reveille alarm files.
//!
//! Usage:
//!   reveille-dryrun show alarms.json
//!   reveille-dryrun show alarms.json --from "2025-03-10 06:00"
//!   reveille-dryrun simulate alarms.json --hours 72

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use time::{Date, Duration, Month, PrimitiveDateTime};

use reveille_clock::alarm::sort_for_display;
use reveille_clock::clock::{SystemClock, WallClock};
use reveille_clock::schedule;
use reveille_clock::{AlarmDefinition, AlarmTime};

/// Inspect alarm schedules without running the clock daemon.
#[derive(Parser)]
#[command(name = "reveille-dryrun")]
#[command(about = "Inspect alarm schedules without running the daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the alarm table with next occurrences
    Show {
        /// Alarm JSON file
        file: PathBuf,

        /// Evaluate countdowns from this instant (YYYY-MM-DD HH:MM)
        #[arg(long)]
        from: Option<String>,
    },

    /// Walk the clock forward and print every fire
    Simulate {
        /// Alarm JSON file
        file: PathBuf,

        /// Simulation horizon in hours
        #[arg(long, default_value_t = 48)]
        hours: i64,

        /// Start instant (YYYY-MM-DD HH:MM); defaults to now
        #[arg(long)]
        from: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Show { file, from } => {
            let now = resolve_start(from.as_deref())?;
            cmd_show(&file, now)
        }
        Commands::Simulate { file, hours, from } => {
            let start = resolve_start(from.as_deref())?;
            cmd_simulate(&file, start, hours)
        }
    }
}

/// Print the alarm table the way the daemon's list view sorts it.
fn cmd_show(path: &Path, now: PrimitiveDateTime) -> Result<()> {
    let mut alarms = load_alarms(path)?;
    if alarms.is_empty() {
        println!("No alarms in {}", path.display());
        return Ok(());
    }
    sort_for_display(&mut alarms);

    let header = format!(
        "{:>4}  {:<3}  {:>8}  {:<20}  {:<14}  {}",
        "ID", "ST", "TIME", "LABEL", "REPEATS", "NEXT"
    );
    println!("{}", header.bold());

    for alarm in &alarms {
        let state = if alarm.enabled {
            "on ".green()
        } else {
            "off".dimmed()
        };
        let next = if alarm.enabled {
            match schedule::time_until(alarm, now) {
                Some(until) => format!("in {}", schedule::format_countdown(until)).green(),
                None => "never".dimmed(),
            }
        } else {
            "--".dimmed()
        };
        println!(
            "{:>4}  {}  {:>8}  {:<20}  {:<14}  {}",
            alarm.id(),
            state,
            alarm.time.twelve_hour(),
            alarm.display_label(),
            alarm.recurrence().to_string(),
            next,
        );
    }
    Ok(())
}

/// Replay the trigger schedule against a moving cursor and print each
/// fire inside the horizon.
fn cmd_simulate(path: &Path, start: PrimitiveDateTime, hours: i64) -> Result<()> {
    let mut alarms = load_alarms(path)?;
    let horizon = start + Duration::hours(hours);

    println!(
        "Simulating {} alarm(s) from {} for {} hours",
        alarms.len(),
        format_instant(start),
        hours
    );

    let mut cursor = start;
    let mut fires = 0u32;
    loop {
        // Ties on a shared minute collapse to the first stored alarm,
        // the same way the engine's consumed-minute rule absorbs the
        // runner-up.
        let next = alarms
            .iter()
            .enumerate()
            .filter(|(_, a)| a.enabled)
            .filter_map(|(idx, a)| schedule::next_occurrence(a, cursor).map(|at| (at, idx)))
            .min();
        let Some((at, idx)) = next else { break };
        if at > horizon {
            break;
        }

        let alarm = &mut alarms[idx];
        println!(
            "  {}  #{} {} ({})",
            format_instant(at).green(),
            alarm.id(),
            alarm.display_label(),
            alarm.recurrence(),
        );

        // One-shot and dated alarms spend themselves on their first
        // fire, exactly as the engine disables them.
        if alarm.fires_once() {
            alarm.enabled = false;
        }
        cursor = at;
        fires += 1;
    }

    if fires == 0 {
        println!("  {}", "no fires inside the horizon".dimmed());
    } else {
        println!("{fires} fire(s)");
    }
    Ok(())
}

fn load_alarms(path: &Path) -> Result<Vec<AlarmDefinition>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).context("alarm file is not a valid alarm array")
}

fn resolve_start(from: Option<&str>) -> Result<PrimitiveDateTime> {
    match from {
        Some(raw) => parse_instant(raw),
        None => Ok(SystemClock.now()),
    }
}

/// Parse "YYYY-MM-DD HH:MM" (a 'T' separator also works).
fn parse_instant(raw: &str) -> Result<PrimitiveDateTime> {
    let (date_raw, time_raw) = raw
        .split_once(' ')
        .or_else(|| raw.split_once('T'))
        .with_context(|| format!("expected YYYY-MM-DD HH:MM, got '{raw}'"))?;

    let mut parts = date_raw.splitn(3, '-');
    let year: i32 = parts.next().context("missing year")?.parse()?;
    let month: u8 = parts.next().context("missing month")?.parse()?;
    let day: u8 = parts.next().context("missing day")?.parse()?;
    let date = Date::from_calendar_date(year, Month::try_from(month)?, day)?;

    let time: AlarmTime = time_raw.parse()?;
    Ok(PrimitiveDateTime::new(date, time.as_time()))
}

fn format_instant(at: PrimitiveDateTime) -> String {
    format!(
        "{} {:02}:{:02}",
        at.date(),
        at.time().hour(),
        at.time().minute()
    )
}
