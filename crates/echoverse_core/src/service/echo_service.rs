//! Echo use-case service.
//!
//! # Responsibility
//! - Record echoes and expose dashboard/timeline read models.
//! - Run the unlock evaluation + notification pass when a view mounts.
//! - Persist settings-page unlock preferences.
//!
//! # Invariants
//! - Store read failures never escape `mount_view`; they become
//!   `ViewState::Error` with an empty list.
//! - Acknowledgments are published to the change feed only after the store
//!   accepted them.

use crate::feed::{ChangeFeed, EchoChange};
use crate::model::echo::{Echo, EchoValidationError, OwnerId};
use crate::model::preferences::UnlockPreferences;
use crate::notify::alert::AlertSink;
use crate::notify::dispatcher::{DispatchReport, NotificationDispatcher};
use crate::repo::echo_repo::{EchoStore, RepoError, RepoResult};
use crate::repo::preferences_repo::PreferencesStore;
use crate::unlock::evaluator::pending_notifications;
use crate::view::card::{dashboard_cards, EchoCard};
use crate::view::mount::{MountToken, RefreshPlan};
use crate::view::timeline::{build_timeline, TimelineGroup, TimelineQuery};
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Service error for echo use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(EchoValidationError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<EchoValidationError> for ServiceError {
    fn from(value: EchoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Request model for recording a new echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEcho {
    pub owner: OwnerId,
    pub title: String,
    pub mood: String,
    /// Epoch ms; must not precede the creation instant.
    pub unlock_at: i64,
    pub audio_duration_secs: u32,
}

/// Render state of a mounted view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ViewState {
    Ready,
    /// Store read failed; the view renders an empty/error state.
    Error(String),
}

/// Everything a view needs after mounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountOutcome {
    pub state: ViewState,
    pub cards: Vec<EchoCard>,
    pub dispatch: DispatchReport,
    pub refresh: RefreshPlan,
}

/// Use-case service over an echo store and a preferences store.
pub struct EchoService<S: EchoStore, P: PreferencesStore> {
    store: S,
    preferences: P,
    feed: Option<Arc<ChangeFeed>>,
}

impl<S: EchoStore, P: PreferencesStore> EchoService<S, P> {
    pub fn new(store: S, preferences: P) -> Self {
        Self {
            store,
            preferences,
            feed: None,
        }
    }

    /// Attaches a change feed that receives `Created`/`Notified` events.
    pub fn with_feed(mut self, feed: Arc<ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Records a new echo created at `now_ms`.
    ///
    /// # Contract
    /// - `unlock_at` must be `>= now_ms`.
    /// - The echo starts with `notification_shown = false`.
    pub fn record_echo(&self, request: &NewEcho, now_ms: i64) -> Result<Echo, ServiceError> {
        let echo = Echo::new(
            request.owner,
            request.title.as_str(),
            now_ms,
            request.unlock_at,
        )?
        .with_mood(&request.mood)
        .with_audio_duration(request.audio_duration_secs);

        self.store.create_echo(&echo)?;
        info!(
            "event=echo_record module=service status=ok echo_id={} unlock_in_ms={}",
            echo.id,
            echo.unlock_at - now_ms
        );
        self.publish(EchoChange::Created {
            owner: echo.owner,
            echo_id: echo.id,
        });
        Ok(echo)
    }

    /// Lists dashboard cards for `owner`, newest first.
    pub fn list_cards(&self, owner: OwnerId, now_ms: i64) -> RepoResult<Vec<EchoCard>> {
        let echoes = self.store.list_echoes(owner)?;
        Ok(dashboard_cards(&echoes, now_ms))
    }

    /// Builds the filtered, month-grouped timeline of `owner`.
    pub fn timeline(
        &self,
        owner: OwnerId,
        query: &TimelineQuery,
        now_ms: i64,
    ) -> RepoResult<Vec<TimelineGroup>> {
        let echoes = self.store.list_echoes(owner)?;
        Ok(build_timeline(&echoes, query, now_ms))
    }

    pub fn preferences(&self, owner: OwnerId) -> RepoResult<UnlockPreferences> {
        self.preferences.get_preferences(owner)
    }

    /// Persists the settings-page "entry unlock notifications" toggle.
    pub fn set_unlock_notifications(
        &self,
        owner: OwnerId,
        enabled: bool,
    ) -> RepoResult<UnlockPreferences> {
        let preferences = UnlockPreferences {
            owner,
            unlock_notifications: enabled,
        };
        self.preferences.save_preferences(&preferences)?;
        Ok(preferences)
    }

    /// Runs the mount-time evaluation pass for one view.
    ///
    /// Lists the owner's echoes, selects unlocked-but-unacknowledged ones,
    /// dispatches at most one alert to `sink` and persists acknowledgments.
    ///
    /// # Side effects
    /// - Writes `notification_shown` for every eligible echo.
    /// - Publishes `Notified` feed events for accepted writes.
    /// - Emits `view_mount` logging events.
    pub fn mount_view(
        &self,
        owner: OwnerId,
        token: &MountToken,
        now_ms: i64,
        sink: &mut dyn AlertSink,
    ) -> MountOutcome {
        let started_at = Instant::now();
        let view = token.surface().as_str();

        let echoes = match self.store.list_echoes(owner) {
            Ok(echoes) => echoes,
            Err(err) => {
                error!(
                    "event=view_mount module=service status=error view={} duration_ms={} error_code=store_read_failed error={}",
                    view,
                    started_at.elapsed().as_millis(),
                    err
                );
                return MountOutcome {
                    state: ViewState::Error(format!("could not load echoes: {err}")),
                    cards: Vec::new(),
                    dispatch: DispatchReport::default(),
                    refresh: RefreshPlan {
                        next_refresh_at: None,
                    },
                };
            }
        };

        let pending = pending_notifications(&echoes, now_ms);
        let dispatch = if pending.is_empty() {
            DispatchReport::default()
        } else {
            let alerts_enabled = self.alerts_enabled(owner);
            NotificationDispatcher::new(&self.store).dispatch(
                &pending,
                now_ms,
                alerts_enabled,
                token,
                sink,
            )
        };

        for echo_id in &dispatch.acknowledged {
            self.publish(EchoChange::Notified {
                owner,
                echo_id: *echo_id,
            });
        }

        info!(
            "event=view_mount module=service status=ok view={} duration_ms={} echoes={} pending={}",
            view,
            started_at.elapsed().as_millis(),
            echoes.len(),
            pending.len()
        );

        MountOutcome {
            state: ViewState::Ready,
            cards: dashboard_cards(&echoes, now_ms),
            refresh: RefreshPlan::after(&echoes, now_ms),
            dispatch,
        }
    }

    fn alerts_enabled(&self, owner: OwnerId) -> bool {
        match self.preferences.get_preferences(owner) {
            Ok(preferences) => preferences.unlock_notifications,
            Err(err) => {
                // Unreadable preferences fall back to alerting.
                warn!(
                    "event=preferences_read module=service status=error error={}",
                    err
                );
                true
            }
        }
    }

    fn publish(&self, change: EchoChange) {
        if let Some(feed) = &self.feed {
            feed.publish(change);
        }
    }
}
