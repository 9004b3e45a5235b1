//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, view-level functions to Dart via FRB.
//! - Own the mount-token registry so unmounted views stop receiving alerts.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported through `ok=false` envelopes with a message.
//! - Wall-clock time is read here; core receives explicit epoch ms.

use echoverse_core::db::open_db;
use echoverse_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CollectingSink, EchoCard, EchoService, MountOutcome, MountToken, NewEcho, OwnerId,
    SqliteEchoStore, SqlitePreferencesStore, TimelineGroup, TimelineQuery, UnlockAlert,
    UnlockPreferences, ViewState, ViewSurface,
};
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use uuid::Uuid;

const ECHO_DB_FILE_NAME: &str = "echoverse.sqlite3";
static ECHO_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static MOUNTS: OnceLock<Mutex<HashMap<String, MountedView>>> = OnceLock::new();

/// Registry entry; a mount is bound to the owner it was created for.
#[derive(Clone)]
struct MountedView {
    owner: OwnerId,
    token: MountToken,
}

type EchoServiceHandle<'conn> = EchoService<SqliteEchoStore<'conn>, SqlitePreferencesStore<'conn>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Echo row for list/timeline rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoItem {
    pub echo_id: String,
    pub title: String,
    pub mood: String,
    pub created_at_epoch_ms: i64,
    pub unlock_at_epoch_ms: i64,
    pub audio_duration_secs: u32,
    pub unlocked: bool,
    /// `N days` / `N months` while locked.
    pub countdown: Option<String>,
}

/// Unlock toast payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertItem {
    pub echo_id: String,
    pub title: String,
    pub message: String,
    pub also_unlocked: u32,
}

/// Generic action envelope for write calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoActionResponse {
    pub ok: bool,
    pub echo_id: Option<String>,
    pub message: String,
}

/// Response of a view mount or scheduled refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMountResponse {
    pub ok: bool,
    /// Handle to pass to `view_refresh` / `view_unmount`.
    pub mount_id: Option<String>,
    pub items: Vec<EchoItem>,
    pub alert: Option<AlertItem>,
    /// Epoch ms at which the view should call `view_refresh`, if any.
    pub next_refresh_at_epoch_ms: Option<i64>,
    pub message: String,
}

/// One month bucket of the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineGroupItem {
    pub label: String,
    pub items: Vec<EchoItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineResponse {
    pub ok: bool,
    pub groups: Vec<TimelineGroupItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesResponse {
    pub ok: bool,
    pub unlock_notifications: bool,
    pub message: String,
}

/// Records a new echo that unlocks at `unlock_at_epoch_ms`.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Rejects blank titles and unlock times in the past.
#[flutter_rust_bridge::frb(sync)]
pub fn echo_record(
    owner_id: String,
    title: String,
    mood: String,
    unlock_at_epoch_ms: i64,
    audio_duration_secs: u32,
) -> EchoActionResponse {
    let result = parse_owner(&owner_id).and_then(|owner| {
        let request = NewEcho {
            owner,
            title,
            mood,
            unlock_at: unlock_at_epoch_ms,
            audio_duration_secs,
        };
        with_echo_service(|service| {
            service
                .record_echo(&request, now_epoch_ms())
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(echo) => EchoActionResponse {
            ok: true,
            echo_id: Some(echo.id.to_string()),
            message: "Echo recorded.".to_string(),
        },
        Err(err) => EchoActionResponse {
            ok: false,
            echo_id: None,
            message: format!("echo_record failed: {err}"),
        },
    }
}

/// Lists the owner's echoes newest first, without running unlock dispatch.
#[flutter_rust_bridge::frb(sync)]
pub fn echo_list(owner_id: String) -> ViewMountResponse {
    let result = parse_owner(&owner_id).and_then(|owner| {
        with_echo_service(|service| {
            service
                .list_cards(owner, now_epoch_ms())
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(cards) => ViewMountResponse {
            ok: true,
            mount_id: None,
            message: format!("{} echo(es).", cards.len()),
            items: cards.iter().map(to_echo_item).collect(),
            alert: None,
            next_refresh_at_epoch_ms: None,
        },
        Err(err) => failed_mount(format!("echo_list failed: {err}")),
    }
}

/// Mounts a view (`dashboard|navbar|timeline`) and runs one unlock pass.
///
/// # FFI contract
/// - Registers a mount token that stays valid until `view_unmount`.
/// - Returns at most one alert.
/// - Store failures yield `ok=false` with an empty item list.
#[flutter_rust_bridge::frb(sync)]
pub fn view_mount(owner_id: String, surface: String) -> ViewMountResponse {
    let Some(surface) = ViewSurface::parse(&surface) else {
        return failed_mount(format!("view_mount failed: unknown view `{surface}`"));
    };
    let owner = match parse_owner(&owner_id) {
        Ok(owner) => owner,
        Err(err) => return failed_mount(format!("view_mount failed: {err}")),
    };

    let token = MountToken::new(surface);
    let mount_id = token.id().to_string();
    mounts().insert(
        mount_id.clone(),
        MountedView {
            owner,
            token: token.clone(),
        },
    );

    run_mount_pass(owner, &token, Some(mount_id))
}

/// Re-runs the unlock pass for a still-mounted view.
///
/// Hosts call this at `next_refresh_at_epoch_ms`. The pass runs for the
/// owner the view was mounted with; calls for unmounted views are rejected
/// without touching the store.
#[flutter_rust_bridge::frb(sync)]
pub fn view_refresh(mount_id: String) -> ViewMountResponse {
    let Some(mounted) = mounts().get(mount_id.trim()).cloned() else {
        return failed_mount(format!("view_refresh skipped: `{mount_id}` is not mounted"));
    };
    run_mount_pass(
        mounted.owner,
        &mounted.token,
        Some(mounted.token.id().to_string()),
    )
}

/// Tears down a mounted view. Returns `false` for unknown ids.
///
/// In-flight passes of that view stop emitting alerts; their store writes
/// still complete.
#[flutter_rust_bridge::frb(sync)]
pub fn view_unmount(mount_id: String) -> bool {
    match mounts().remove(mount_id.trim()) {
        Some(MountedView { token, .. }) => {
            token.cancel();
            info!(
                "event=view_unmount module=ffi status=ok view={} mount_id={}",
                token.surface().as_str(),
                token.id()
            );
            true
        }
        None => false,
    }
}

/// Filters and groups the owner's echoes for the timeline view.
#[flutter_rust_bridge::frb(sync)]
pub fn timeline_query(
    owner_id: String,
    search: Option<String>,
    mood: Option<String>,
    utc_offset_minutes: i32,
) -> TimelineResponse {
    let query = TimelineQuery {
        search,
        mood,
        utc_offset_minutes,
    };
    let result = parse_owner(&owner_id).and_then(|owner| {
        with_echo_service(|service| {
            service
                .timeline(owner, &query, now_epoch_ms())
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(groups) => TimelineResponse {
            ok: true,
            message: if groups.is_empty() {
                "No echoes.".to_string()
            } else {
                format!("{} month(s).", groups.len())
            },
            groups: groups.iter().map(to_timeline_group_item).collect(),
        },
        Err(err) => TimelineResponse {
            ok: false,
            groups: Vec::new(),
            message: format!("timeline_query failed: {err}"),
        },
    }
}

/// Reads the owner's unlock notification preference.
#[flutter_rust_bridge::frb(sync)]
pub fn preferences_get(owner_id: String) -> PreferencesResponse {
    let result = parse_owner(&owner_id).and_then(|owner| {
        with_echo_service(|service| service.preferences(owner).map_err(|err| err.to_string()))
    });
    to_preferences_response(result, "preferences_get")
}

/// Persists the "entry unlock notifications" toggle.
#[flutter_rust_bridge::frb(sync)]
pub fn preferences_set_unlock_notifications(owner_id: String, enabled: bool) -> PreferencesResponse {
    let result = parse_owner(&owner_id).and_then(|owner| {
        with_echo_service(|service| {
            service
                .set_unlock_notifications(owner, enabled)
                .map_err(|err| err.to_string())
        })
    });
    to_preferences_response(result, "preferences_set_unlock_notifications")
}

fn run_mount_pass(owner: OwnerId, token: &MountToken, mount_id: Option<String>) -> ViewMountResponse {
    let now = now_epoch_ms();
    let mut sink = CollectingSink::new();
    let outcome = with_echo_service(|service| Ok(service.mount_view(owner, token, now, &mut sink)));

    match outcome {
        Ok(outcome) => to_mount_response(outcome, sink.into_alerts(), mount_id),
        Err(err) => ViewMountResponse {
            mount_id,
            ..failed_mount(format!("view_mount failed: {err}"))
        },
    }
}

fn to_mount_response(
    outcome: MountOutcome,
    alerts: Vec<UnlockAlert>,
    mount_id: Option<String>,
) -> ViewMountResponse {
    let (ok, message) = match &outcome.state {
        ViewState::Ready => (true, format!("{} echo(es).", outcome.cards.len())),
        ViewState::Error(message) => (false, message.clone()),
    };
    ViewMountResponse {
        ok,
        mount_id,
        items: outcome.cards.iter().map(to_echo_item).collect(),
        alert: alerts.first().map(to_alert_item),
        next_refresh_at_epoch_ms: outcome.refresh.next_refresh_at,
        message,
    }
}

fn failed_mount(message: String) -> ViewMountResponse {
    ViewMountResponse {
        ok: false,
        mount_id: None,
        items: Vec::new(),
        alert: None,
        next_refresh_at_epoch_ms: None,
        message,
    }
}

fn to_preferences_response(
    result: Result<UnlockPreferences, String>,
    operation: &str,
) -> PreferencesResponse {
    match result {
        Ok(preferences) => PreferencesResponse {
            ok: true,
            unlock_notifications: preferences.unlock_notifications,
            message: String::new(),
        },
        Err(err) => PreferencesResponse {
            ok: false,
            unlock_notifications: true,
            message: format!("{operation} failed: {err}"),
        },
    }
}

fn to_echo_item(card: &EchoCard) -> EchoItem {
    EchoItem {
        echo_id: card.id.to_string(),
        title: card.title.clone(),
        mood: card.mood.clone(),
        created_at_epoch_ms: card.created_at,
        unlock_at_epoch_ms: card.unlock_at,
        audio_duration_secs: card.audio_duration_secs,
        unlocked: card.unlocked,
        countdown: card.countdown.clone(),
    }
}

fn to_alert_item(alert: &UnlockAlert) -> AlertItem {
    AlertItem {
        echo_id: alert.echo_id.to_string(),
        title: alert.title.clone(),
        message: alert.message(),
        also_unlocked: u32::try_from(alert.also_unlocked).unwrap_or(u32::MAX),
    }
}

fn to_timeline_group_item(group: &TimelineGroup) -> TimelineGroupItem {
    TimelineGroupItem {
        label: group.label.clone(),
        items: group.echoes.iter().map(to_echo_item).collect(),
    }
}

fn parse_owner(owner_id: &str) -> Result<OwnerId, String> {
    let trimmed = owner_id.trim();
    match Uuid::parse_str(trimmed) {
        Ok(owner) if !owner.is_nil() => Ok(owner),
        _ => Err(format!("invalid owner id `{trimmed}`")),
    }
}

fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn mounts() -> MutexGuard<'static, HashMap<String, MountedView>> {
    MOUNTS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn resolve_echo_db_path() -> PathBuf {
    ECHO_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("ECHOVERSE_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ECHO_DB_FILE_NAME)
        })
        .clone()
}

fn with_echo_service<T>(
    f: impl FnOnce(&EchoServiceHandle<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let db_path = resolve_echo_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("echo DB open failed: {err}"))?;
    let service = EchoService::new(
        SqliteEchoStore::new(&conn),
        SqlitePreferencesStore::new(&conn),
    );
    f(&service)
}
