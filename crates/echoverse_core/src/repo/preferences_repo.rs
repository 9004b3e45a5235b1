//! Unlock preference persistence.

use crate::model::echo::OwnerId;
use crate::model::preferences::UnlockPreferences;
use crate::repo::echo_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Persistence contract for settings-page toggles.
pub trait PreferencesStore {
    /// Returns stored preferences, or defaults when none were saved.
    fn get_preferences(&self, owner: OwnerId) -> RepoResult<UnlockPreferences>;
    fn save_preferences(&self, preferences: &UnlockPreferences) -> RepoResult<()>;
}

impl<P: PreferencesStore + ?Sized> PreferencesStore for &P {
    fn get_preferences(&self, owner: OwnerId) -> RepoResult<UnlockPreferences> {
        (**self).get_preferences(owner)
    }

    fn save_preferences(&self, preferences: &UnlockPreferences) -> RepoResult<()> {
        (**self).save_preferences(preferences)
    }
}

/// SQLite-backed preferences store.
pub struct SqlitePreferencesStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferencesStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PreferencesStore for SqlitePreferencesStore<'_> {
    fn get_preferences(&self, owner: OwnerId) -> RepoResult<UnlockPreferences> {
        let stored = self
            .conn
            .query_row(
                "SELECT unlock_notifications FROM unlock_preferences WHERE owner = ?1;",
                [owner.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match stored {
            None => Ok(UnlockPreferences::defaults_for(owner)),
            Some(0) => Ok(UnlockPreferences {
                owner,
                unlock_notifications: false,
            }),
            Some(1) => Ok(UnlockPreferences {
                owner,
                unlock_notifications: true,
            }),
            Some(other) => Err(RepoError::InvalidData(format!(
                "invalid unlock_notifications value `{other}` in unlock_preferences"
            ))),
        }
    }

    fn save_preferences(&self, preferences: &UnlockPreferences) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO unlock_preferences (owner, unlock_notifications)
             VALUES (?1, ?2)
             ON CONFLICT(owner) DO UPDATE SET
                unlock_notifications = excluded.unlock_notifications,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                preferences.owner.to_string(),
                i64::from(preferences.unlock_notifications)
            ],
        )?;
        Ok(())
    }
}
