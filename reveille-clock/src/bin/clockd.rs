//! Alarm clock daemon.
//!
//! Runs the engine against a JSON alarm file and exposes a small
//! interactive console on stdin for managing alarms and answering a
//! ringing one.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use reveille_clock::clock::SystemClock;
use reveille_clock::engine::{ChallengeOutcome, DismissOutcome, UiIntent};
use reveille_clock::notify::{LogNotifier, NotificationPlanner, ScheduleStrategy};
use reveille_clock::schedule;
use reveille_clock::store::{AlarmStore, JsonFileRepository};
use reveille_clock::tone::ToneCatalog;
use reveille_clock::tracing::prelude::*;
use reveille_clock::{AlarmDraft, AlarmEngine, AlarmId, AlarmTime, EngineConfig, EngineHandle};

#[tokio::main]
async fn main() -> Result<()> {
    reveille_clock::tracing::init();

    let args: Vec<String> = env::args().collect();
    if args.get(1).is_some_and(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    let alarms_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("alarms.json"));

    let tones = match args.get(2) {
        Some(path) => ToneCatalog::with_custom_file(PathBuf::from(path)).await,
        None => ToneCatalog::new(),
    };
    let tones = Arc::new(Mutex::new(tones));

    let strategy = match env::var("REVEILLE_NOTIFY").as_deref() {
        Ok("per-alarm") => ScheduleStrategy::PerAlarm,
        _ => ScheduleStrategy::SingleNext,
    };

    let store = AlarmStore::new(Box::new(JsonFileRepository::new(&alarms_path)));
    let planner = NotificationPlanner::new(Box::new(LogNotifier::new()), strategy);
    let (engine, handle, intents) = AlarmEngine::new(
        store,
        planner,
        Arc::new(SystemClock),
        EngineConfig::default(),
    );

    info!(path = %alarms_path.display(), "Starting alarm engine");

    let cancellation = CancellationToken::new();
    let engine_task = tokio::spawn(engine.run(cancellation.child_token()));
    let ringer_task = tokio::spawn(announce_intents(intents, handle.clone(), tones.clone()));

    console(&handle, &tones).await?;

    cancellation.cancel();
    engine_task.await?;
    ringer_task.await?;
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: reveille-clockd [alarms.json] [tones.json]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  REVEILLE_NOTIFY    Notification strategy: single-next (default) or per-alarm");
}

fn print_help() {
    println!("Commands:");
    println!("  list                        Show alarms");
    println!("  add HH:MM [label]           Create a one-shot alarm");
    println!("  del <id>                    Delete an alarm");
    println!("  toggle <id>                 Flip an alarm on or off");
    println!("  snooze                      Snooze the ringing alarm");
    println!("  dismiss                     Dismiss the ringing alarm");
    println!("  answer <number>             Answer the dismissal challenge");
    println!("  tones                       List alarm tones");
    println!("  tone-add <id> <name> <uri>  Register a custom tone");
    println!("  quit                        Exit");
}

/// Read console commands until quit or end of input.
async fn console(handle: &EngineHandle, tones: &Arc<Mutex<ToneCatalog>>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !dispatch(handle, tones, line.trim()).await? {
                    break;
                }
            }
        }
    }
    Ok(())
}

async fn dispatch(
    handle: &EngineHandle,
    tones: &Arc<Mutex<ToneCatalog>>,
    line: &str,
) -> Result<bool> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(true);
    };
    let rest: Vec<&str> = words.collect();

    match command {
        "list" | "ls" => cmd_list(handle).await,
        "add" => cmd_add(handle, &rest).await,
        "del" => cmd_delete(handle, &rest).await,
        "toggle" => cmd_toggle(handle, &rest).await,
        "snooze" => cmd_snooze(handle).await,
        "dismiss" => cmd_dismiss(handle).await,
        "answer" => cmd_answer(handle, &rest).await,
        "tones" => cmd_tones(tones).await,
        "tone-add" => cmd_tone_add(tones, &rest).await,
        "help" => print_help(),
        "quit" | "exit" => return Ok(false),
        _ => println!("Unknown command: {command} (try 'help')"),
    }
    Ok(true)
}

/// Print the sorted alarm list with countdowns.
async fn cmd_list(handle: &EngineHandle) {
    let snapshot = handle.snapshot();
    if snapshot.alarms.is_empty() {
        println!("No alarms. 'add HH:MM [label]' creates one.");
        return;
    }

    let now = handle.clock().now();
    for alarm in &snapshot.alarms {
        let state = if alarm.enabled { "on " } else { "off" };
        let next = if alarm.enabled {
            schedule::time_until(alarm, now)
                .map(|until| format!("in {}", schedule::format_countdown(until)))
                .unwrap_or_else(|| "spent".to_string())
        } else {
            "--".to_string()
        };
        println!(
            "  {:>3}  {}  {:>8}  {:<30}  {:<12}  {}",
            alarm.id(),
            state,
            alarm.time.twelve_hour(),
            alarm.display_label(),
            alarm.recurrence().to_string(),
            next,
        );
    }

    if let Some(active) = &snapshot.active {
        if active.is_snoozing {
            println!("Snoozing: {} (snoozed {}x)", active.label, active.snooze_count);
        } else {
            println!("RINGING: {} -- 'snooze' or 'dismiss'", active.label);
        }
    }
}

async fn cmd_add(handle: &EngineHandle, rest: &[&str]) {
    let Some(raw) = rest.first() else {
        println!("Usage: add HH:MM [label]");
        return;
    };
    let time: AlarmTime = match raw.parse() {
        Ok(time) => time,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    let mut draft = AlarmDraft::at(time);
    let label = rest[1..].join(" ");
    if !label.is_empty() {
        draft.label = Some(label);
    }

    match handle.create(draft).await {
        Ok(id) => println!("Added alarm {id} for {}", time.twelve_hour()),
        Err(e) => println!("{e}"),
    }
}

async fn cmd_delete(handle: &EngineHandle, rest: &[&str]) {
    let Some(id) = parse_id(rest) else {
        println!("Usage: del <id>");
        return;
    };
    match handle.delete(id).await {
        Ok(true) => println!("Deleted alarm {id}"),
        Ok(false) => println!("No alarm {id}"),
        Err(e) => println!("{e}"),
    }
}

async fn cmd_toggle(handle: &EngineHandle, rest: &[&str]) {
    let Some(id) = parse_id(rest) else {
        println!("Usage: toggle <id>");
        return;
    };
    match handle.toggle(id).await {
        Ok(Some(true)) => println!("Alarm {id} enabled"),
        Ok(Some(false)) => println!("Alarm {id} disabled"),
        Ok(None) => println!("No alarm {id}"),
        Err(e) => println!("{e}"),
    }
}

async fn cmd_snooze(handle: &EngineHandle) {
    match handle.snooze().await {
        Ok(until) => println!(
            "Snoozing until {:02}:{:02}",
            until.time().hour(),
            until.time().minute()
        ),
        Err(e) => println!("{e}"),
    }
}

async fn cmd_dismiss(handle: &EngineHandle) {
    match handle.dismiss().await {
        Ok(DismissOutcome::Dismissed) => println!("Alarm dismissed."),
        Ok(DismissOutcome::ChallengeRequired { question }) => {
            println!("Solve to dismiss: {question} = ?");
            println!("('answer <number>' to reply)");
        }
        Err(e) => println!("{e}"),
    }
}

async fn cmd_answer(handle: &EngineHandle, rest: &[&str]) {
    let Some(input) = rest.first() else {
        println!("Usage: answer <number>");
        return;
    };
    match handle.answer(*input).await {
        Ok(ChallengeOutcome::Dismissed) => println!("Correct. Alarm dismissed."),
        Ok(ChallengeOutcome::Incorrect { attempts_remaining }) => {
            println!("Wrong. {attempts_remaining} attempts left in this cycle.");
        }
        Err(e) => println!("{e}"),
    }
}

async fn cmd_tones(tones: &Arc<Mutex<ToneCatalog>>) {
    let catalog = tones.lock().await;
    for tone in catalog.tones() {
        let kind = if tone.custom { "custom" } else { "builtin" };
        println!("  {:<10}  {:<14}  {:<7}  {}", tone.id, tone.name, kind, tone.uri);
    }
}

async fn cmd_tone_add(tones: &Arc<Mutex<ToneCatalog>>, rest: &[&str]) {
    let [id, name, uri] = rest else {
        println!("Usage: tone-add <id> <name> <uri>");
        return;
    };
    tones
        .lock()
        .await
        .add_custom(id.to_string(), name.to_string(), uri.to_string())
        .await;
    println!("Tone '{id}' added.");
}

fn parse_id(rest: &[&str]) -> Option<AlarmId> {
    rest.first()?.parse().ok().map(AlarmId::new)
}

/// Narrate engine intents on the console, resolving the ring tone
/// through the catalog.
async fn announce_intents(
    mut intents: mpsc::Receiver<UiIntent>,
    handle: EngineHandle,
    tones: Arc<Mutex<ToneCatalog>>,
) {
    while let Some(intent) = intents.recv().await {
        match intent {
            UiIntent::ShowRinging { id } => {
                let Some(active) = handle.snapshot().active else {
                    continue;
                };
                if active.id != id {
                    continue;
                }
                let tone = tones.lock().await.resolve(&active.tone).clone();
                println!();
                println!(
                    "*** ALARM {} -- {} ({}) ***",
                    active.time.twelve_hour(),
                    active.label,
                    tone.name
                );
                println!("    tone: {}", tone.uri);
                if active.snooze_count > 0 {
                    println!("    snoozes used: {}", active.snooze_count);
                }
                println!("    'snooze' or 'dismiss'");
            }
            UiIntent::ReturnToList => {
                println!("(back to list -- 'list' to review alarms)");
            }
        }
    }
}
