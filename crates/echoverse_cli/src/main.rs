//! CLI probe for EchoVerse core.
//!
//! # Responsibility
//! - Verify `echoverse_core` linkage without the Flutter runtime.
//! - Record, list and run one unlock pass against a local database.

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use echoverse_core::db::open_db;
use echoverse_core::{
    AlertSink, EchoService, MountToken, NewEcho, SqliteEchoStore, SqlitePreferencesStore,
    UnlockAlert, ViewState, ViewSurface,
};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "echoverse_cli", version, about = "EchoVerse core CLI")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "ECHOVERSE_DB_PATH", default_value = "echoverse.sqlite3")]
    db: PathBuf,
    /// Absolute directory for rolling log files
    #[arg(long, env = "ECHOVERSE_LOG_DIR")]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core linkage info
    Ping,
    /// Record a new echo
    Record {
        #[arg(long)]
        owner: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        mood: String,
        /// Days until the echo unlocks
        #[arg(long, default_value = "0")]
        unlock_in_days: i64,
        /// Audio length in seconds
        #[arg(long, default_value = "0")]
        duration: u32,
    },
    /// List echoes, newest first
    List {
        #[arg(long)]
        owner: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Run one mount-time unlock pass and print the alert, if any
    Check {
        #[arg(long)]
        owner: Uuid,
        /// dashboard | navbar | timeline
        #[arg(long, default_value = "dashboard")]
        view: String,
    },
}

struct StdoutSink;

impl AlertSink for StdoutSink {
    fn emit(&mut self, alert: &UnlockAlert) {
        println!("ALERT {} {}", alert.echo_id, alert.message());
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        echoverse_core::init_logging(echoverse_core::default_log_level(), log_dir)?;
    }

    if let Commands::Ping = cli.command {
        println!("echoverse_core ping={}", echoverse_core::ping());
        println!("echoverse_core version={}", echoverse_core::core_version());
        return Ok(());
    }

    let conn = open_db(&cli.db)?;
    let service = EchoService::new(
        SqliteEchoStore::new(&conn),
        SqlitePreferencesStore::new(&conn),
    );
    let now = Utc::now();
    let now_ms = now.timestamp_millis();

    match cli.command {
        Commands::Ping => {}
        Commands::Record {
            owner,
            title,
            mood,
            unlock_in_days,
            duration,
        } => {
            let unlock_at = Duration::try_days(unlock_in_days)
                .and_then(|offset| now.checked_add_signed(offset))
                .ok_or("unlock-in-days out of range")?;
            let request = NewEcho {
                owner,
                title,
                mood,
                unlock_at: unlock_at.timestamp_millis(),
                audio_duration_secs: duration,
            };
            let echo = service.record_echo(&request, now_ms)?;
            println!("Echo recorded: {}", echo.id);
        }
        Commands::List { owner, json } => {
            let cards = service.list_cards(owner, now_ms)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
            } else {
                for card in &cards {
                    let state = match &card.countdown {
                        Some(countdown) => format!("locked, {countdown} remaining"),
                        None => "unlocked".to_string(),
                    };
                    println!("{}  {}  [{}]", card.id, card.title, state);
                }
            }
        }
        Commands::Check { owner, view } => {
            let surface = ViewSurface::parse(&view).ok_or_else(|| format!("unknown view `{view}`"))?;
            let token = MountToken::new(surface);
            let outcome = service.mount_view(owner, &token, now_ms, &mut StdoutSink);
            if let ViewState::Error(message) = &outcome.state {
                return Err(message.clone().into());
            }
            println!(
                "Checked {} echo(es): acknowledged={} failed={}",
                outcome.cards.len(),
                outcome.dispatch.acknowledged.len(),
                outcome.dispatch.failed.len()
            );
            if let Some(next) = outcome.refresh.next_refresh_at {
                println!("Next unlock at {next}");
            }
        }
    }

    Ok(())
}
