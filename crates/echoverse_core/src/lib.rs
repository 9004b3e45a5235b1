//! Core domain logic for EchoVerse.
//! This crate is the single source of truth for echo unlock and
//! notification invariants.

pub mod db;
pub mod feed;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod unlock;
pub mod view;

pub use feed::{ChangeFeed, EchoChange, SubscriptionId};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::echo::{normalize_mood, Echo, EchoId, EchoValidationError, OwnerId, UnlockState};
pub use model::preferences::UnlockPreferences;
pub use notify::alert::{AlertSink, CollectingSink, UnlockAlert};
pub use notify::dispatcher::{AckFailure, DispatchReport, NotificationDispatcher, SuppressReason};
pub use repo::echo_repo::{EchoStore, RepoError, RepoResult, SqliteEchoStore};
pub use repo::preferences_repo::{PreferencesStore, SqlitePreferencesStore};
pub use service::echo_service::{EchoService, MountOutcome, NewEcho, ServiceError, ViewState};
pub use unlock::evaluator::{next_unlock_at, pending_notifications, unlocked_echoes};
pub use view::card::{dashboard_cards, time_until_unlock, EchoCard};
pub use view::mount::{MountToken, RefreshPlan, ViewSurface};
pub use view::timeline::{build_timeline, TimelineGroup, TimelineQuery};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
