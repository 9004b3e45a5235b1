//! Echo domain model.
//!
//! # Responsibility
//! - Define the canonical echo record shared by every page view.
//! - Derive lock state from `unlock_at` on demand.
//!
//! # Invariants
//! - `id` is stable and never reused for another echo.
//! - `unlock_at >= created_at`.
//! - `unlocked` is never stored; it is recomputed from `unlock_at` and `now`.
//! - `notification_shown` only flips to `true` while the echo is unlocked.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one echo.
pub type EchoId = Uuid;

/// Identifier of the user owning an echo.
pub type OwnerId = Uuid;

/// Validation failure for echo records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchoValidationError {
    NilId,
    NilOwner,
    BlankTitle,
    /// `unlock_at` is earlier than `created_at`.
    UnlockBeforeCreation { created_at: i64, unlock_at: i64 },
    NegativeTimestamp(i64),
    /// Attempted to acknowledge an echo that is still locked.
    NotifiedWhileLocked { unlock_at: i64, now: i64 },
}

impl Display for EchoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "echo id must not be nil"),
            Self::NilOwner => write!(f, "echo owner must not be nil"),
            Self::BlankTitle => write!(f, "echo title must not be blank"),
            Self::UnlockBeforeCreation {
                created_at,
                unlock_at,
            } => write!(
                f,
                "unlock_at ({unlock_at}) must be >= created_at ({created_at})"
            ),
            Self::NegativeTimestamp(value) => {
                write!(f, "timestamp must be non-negative epoch ms, got {value}")
            }
            Self::NotifiedWhileLocked { unlock_at, now } => write!(
                f,
                "echo is still locked until {unlock_at} (now {now}); cannot mark notified"
            ),
        }
    }
}

impl Error for EchoValidationError {}

/// Per-echo position in the unlock lifecycle.
///
/// Transitions are strictly monotonic: `Locked -> UnlockedUnnotified ->
/// UnlockedNotified`. There is no way back to `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockState {
    Locked,
    UnlockedUnnotified,
    UnlockedNotified,
}

/// Canonical echo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EchoWire")]
pub struct Echo {
    pub id: EchoId,
    pub owner: OwnerId,
    pub title: String,
    /// Free-form tag, stored trimmed and lowercase.
    pub mood: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Inclusive unlock boundary.
    pub unlock_at: i64,
    pub audio_duration_secs: u32,
    pub notification_shown: bool,
}

#[derive(Deserialize)]
struct EchoWire {
    id: EchoId,
    owner: OwnerId,
    title: String,
    #[serde(default)]
    mood: String,
    created_at: i64,
    unlock_at: i64,
    #[serde(default)]
    audio_duration_secs: u32,
    #[serde(default)]
    notification_shown: bool,
}

impl TryFrom<EchoWire> for Echo {
    type Error = EchoValidationError;

    fn try_from(wire: EchoWire) -> Result<Self, Self::Error> {
        let echo = Echo {
            id: wire.id,
            owner: wire.owner,
            title: wire.title,
            mood: normalize_mood(&wire.mood),
            created_at: wire.created_at,
            unlock_at: wire.unlock_at,
            audio_duration_secs: wire.audio_duration_secs,
            notification_shown: wire.notification_shown,
        };
        echo.validate()?;
        Ok(echo)
    }
}

impl Echo {
    /// Creates a new echo with a generated stable ID.
    ///
    /// `mood` starts empty, `audio_duration_secs` at zero and
    /// `notification_shown` at `false`.
    pub fn new(
        owner: OwnerId,
        title: impl Into<String>,
        created_at: i64,
        unlock_at: i64,
    ) -> Result<Self, EchoValidationError> {
        Self::with_id(Uuid::new_v4(), owner, title, created_at, unlock_at)
    }

    /// Creates an echo with a caller-provided ID.
    ///
    /// Used by import paths where the identity already exists externally.
    pub fn with_id(
        id: EchoId,
        owner: OwnerId,
        title: impl Into<String>,
        created_at: i64,
        unlock_at: i64,
    ) -> Result<Self, EchoValidationError> {
        let echo = Self {
            id,
            owner,
            title: title.into().trim().to_string(),
            mood: String::new(),
            created_at,
            unlock_at,
            audio_duration_secs: 0,
            notification_shown: false,
        };
        echo.validate()?;
        Ok(echo)
    }

    /// Sets the mood tag, normalizing case and surrounding whitespace.
    pub fn with_mood(mut self, mood: &str) -> Self {
        self.mood = normalize_mood(mood);
        self
    }

    pub fn with_audio_duration(mut self, seconds: u32) -> Self {
        self.audio_duration_secs = seconds;
        self
    }

    /// Checks the time-independent record invariants.
    pub fn validate(&self) -> Result<(), EchoValidationError> {
        if self.id.is_nil() {
            return Err(EchoValidationError::NilId);
        }
        if self.owner.is_nil() {
            return Err(EchoValidationError::NilOwner);
        }
        if self.title.trim().is_empty() {
            return Err(EchoValidationError::BlankTitle);
        }
        if self.created_at < 0 {
            return Err(EchoValidationError::NegativeTimestamp(self.created_at));
        }
        if self.unlock_at < self.created_at {
            return Err(EchoValidationError::UnlockBeforeCreation {
                created_at: self.created_at,
                unlock_at: self.unlock_at,
            });
        }
        Ok(())
    }

    /// Returns whether the echo is playable at `now_ms`.
    ///
    /// `unlock_at == now_ms` counts as unlocked.
    pub fn is_unlocked(&self, now_ms: i64) -> bool {
        now_ms >= self.unlock_at
    }

    pub fn unlock_state(&self, now_ms: i64) -> UnlockState {
        if !self.is_unlocked(now_ms) {
            UnlockState::Locked
        } else if self.notification_shown {
            UnlockState::UnlockedNotified
        } else {
            UnlockState::UnlockedUnnotified
        }
    }

    /// Flips `notification_shown` in memory after the store acknowledged it.
    ///
    /// # Errors
    /// - `NotifiedWhileLocked` when `now_ms` is before `unlock_at`.
    pub fn mark_notified(&mut self, now_ms: i64) -> Result<(), EchoValidationError> {
        if !self.is_unlocked(now_ms) {
            return Err(EchoValidationError::NotifiedWhileLocked {
                unlock_at: self.unlock_at,
                now: now_ms,
            });
        }
        self.notification_shown = true;
        Ok(())
    }
}

/// Normalizes a mood tag for storage and filtering.
pub fn normalize_mood(mood: &str) -> String {
    mood.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{Echo, EchoValidationError, UnlockState};
    use uuid::Uuid;

    #[test]
    fn unlock_boundary_is_inclusive() {
        let echo = Echo::new(Uuid::new_v4(), "note to self", 100, 500).unwrap();
        assert!(!echo.is_unlocked(499));
        assert!(echo.is_unlocked(500));
        assert!(echo.is_unlocked(501));
    }

    #[test]
    fn unlock_state_follows_clock_and_flag() {
        let mut echo = Echo::new(Uuid::new_v4(), "goals", 0, 1_000).unwrap();
        assert_eq!(echo.unlock_state(999), UnlockState::Locked);
        assert_eq!(echo.unlock_state(1_000), UnlockState::UnlockedUnnotified);

        echo.mark_notified(1_000).unwrap();
        assert_eq!(echo.unlock_state(2_000), UnlockState::UnlockedNotified);
    }

    #[test]
    fn mark_notified_rejects_locked_echo() {
        let mut echo = Echo::new(Uuid::new_v4(), "later", 0, 1_000).unwrap();
        let err = echo.mark_notified(10).unwrap_err();
        assert_eq!(
            err,
            EchoValidationError::NotifiedWhileLocked {
                unlock_at: 1_000,
                now: 10
            }
        );
        assert!(!echo.notification_shown);
    }

    #[test]
    fn mood_is_normalized() {
        let echo = Echo::new(Uuid::new_v4(), "trip", 0, 0)
            .unwrap()
            .with_mood("  Joyful ");
        assert_eq!(echo.mood, "joyful");
    }
}
