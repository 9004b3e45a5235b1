//! Echo store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the minimal store surface: create, get, list by owner and
//!   acknowledge an unlock notification.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `mark_notified` only succeeds for rows with `unlock_at <= now`.
//! - `mark_notified` is idempotent for already-acknowledged rows.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::echo::{Echo, EchoId, EchoValidationError, OwnerId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ECHO_SELECT_SQL: &str = "SELECT
    id,
    owner,
    title,
    mood,
    created_at,
    unlock_at,
    audio_duration_secs,
    notification_shown
FROM echoes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error for echo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EchoValidationError),
    Db(DbError),
    NotFound(EchoId),
    /// Acknowledgment refused because the echo has not unlocked yet.
    StillLocked { id: EchoId, unlock_at: i64 },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "echo not found: {id}"),
            Self::StillLocked { id, unlock_at } => {
                write!(f, "echo {id} is locked until {unlock_at}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted echo data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::StillLocked { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<EchoValidationError> for RepoError {
    fn from(value: EchoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract consumed by the unlock evaluator and dispatcher.
pub trait EchoStore {
    fn create_echo(&self, echo: &Echo) -> RepoResult<EchoId>;
    fn get_echo(&self, id: EchoId) -> RepoResult<Option<Echo>>;
    /// Lists every echo of `owner`, newest `created_at` first.
    fn list_echoes(&self, owner: OwnerId) -> RepoResult<Vec<Echo>>;
    /// Persists `notification_shown = true` for one unlocked echo.
    fn mark_notified(&self, id: EchoId, now_ms: i64) -> RepoResult<()>;
}

impl<S: EchoStore + ?Sized> EchoStore for &S {
    fn create_echo(&self, echo: &Echo) -> RepoResult<EchoId> {
        (**self).create_echo(echo)
    }

    fn get_echo(&self, id: EchoId) -> RepoResult<Option<Echo>> {
        (**self).get_echo(id)
    }

    fn list_echoes(&self, owner: OwnerId) -> RepoResult<Vec<Echo>> {
        (**self).list_echoes(owner)
    }

    fn mark_notified(&self, id: EchoId, now_ms: i64) -> RepoResult<()> {
        (**self).mark_notified(id, now_ms)
    }
}

/// SQLite-backed echo store.
pub struct SqliteEchoStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEchoStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EchoStore for SqliteEchoStore<'_> {
    fn create_echo(&self, echo: &Echo) -> RepoResult<EchoId> {
        echo.validate()?;

        self.conn.execute(
            "INSERT INTO echoes (
                id,
                owner,
                title,
                mood,
                created_at,
                unlock_at,
                audio_duration_secs,
                notification_shown
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                echo.id.to_string(),
                echo.owner.to_string(),
                echo.title.as_str(),
                echo.mood.as_str(),
                echo.created_at,
                echo.unlock_at,
                i64::from(echo.audio_duration_secs),
                bool_to_int(echo.notification_shown),
            ],
        )?;

        Ok(echo.id)
    }

    fn get_echo(&self, id: EchoId) -> RepoResult<Option<Echo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ECHO_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_echo_row(row)?));
        }

        Ok(None)
    }

    fn list_echoes(&self, owner: OwnerId) -> RepoResult<Vec<Echo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ECHO_SELECT_SQL}
             WHERE owner = ?1
             ORDER BY created_at DESC, id ASC;"
        ))?;

        let mut rows = stmt.query([owner.to_string()])?;
        let mut echoes = Vec::new();
        while let Some(row) = rows.next()? {
            echoes.push(parse_echo_row(row)?);
        }

        Ok(echoes)
    }

    fn mark_notified(&self, id: EchoId, now_ms: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE echoes
             SET
                notification_shown = 1,
                notified_at = ?2
             WHERE id = ?1
               AND unlock_at <= ?2
               AND notification_shown = 0;",
            params![id.to_string(), now_ms],
        )?;

        if changed > 0 {
            return Ok(());
        }

        // Nothing changed: distinguish missing, still locked and already acknowledged.
        let existing = self
            .conn
            .query_row(
                "SELECT unlock_at, notification_shown FROM echoes WHERE id = ?1;",
                [id.to_string()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        match existing {
            None => Err(RepoError::NotFound(id)),
            Some((unlock_at, _)) if unlock_at > now_ms => {
                Err(RepoError::StillLocked { id, unlock_at })
            }
            Some(_) => Ok(()),
        }
    }
}

fn parse_echo_row(row: &Row<'_>) -> RepoResult<Echo> {
    let id = parse_uuid_column(row, "id")?;
    let owner = parse_uuid_column(row, "owner")?;

    let duration: i64 = row.get("audio_duration_secs")?;
    let audio_duration_secs = u32::try_from(duration).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid audio_duration_secs value `{duration}` in echoes.audio_duration_secs"
        ))
    })?;

    let notification_shown = match row.get::<_, i64>("notification_shown")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid notification_shown value `{other}` in echoes.notification_shown"
            )));
        }
    };

    let echo = Echo {
        id,
        owner,
        title: row.get("title")?,
        mood: row.get("mood")?,
        created_at: row.get("created_at")?,
        unlock_at: row.get("unlock_at")?,
        audio_duration_secs,
        notification_shown,
    };
    echo.validate()?;
    Ok(echo)
}

fn parse_uuid_column(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in echoes.{column}"))
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
