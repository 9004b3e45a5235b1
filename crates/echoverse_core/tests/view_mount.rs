use echoverse_core::db::open_db_in_memory;
use echoverse_core::{
    ChangeFeed, CollectingSink, Echo, EchoChange, EchoId, EchoService, EchoStore, MountToken,
    NewEcho, OwnerId, RepoError, RepoResult, ServiceError, SqliteEchoStore,
    SqlitePreferencesStore, TimelineQuery, ViewState, ViewSurface,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const DAY_MS: i64 = 86_400_000;
// 2025-05-12T00:00:00Z
const NOW: i64 = 1_747_008_000_000;

/// Store that is unreachable for reads.
struct OfflineStore;

impl EchoStore for OfflineStore {
    fn create_echo(&self, _echo: &Echo) -> RepoResult<EchoId> {
        Err(RepoError::InvalidData("offline".to_string()))
    }

    fn get_echo(&self, _id: EchoId) -> RepoResult<Option<Echo>> {
        Err(RepoError::InvalidData("offline".to_string()))
    }

    fn list_echoes(&self, _owner: OwnerId) -> RepoResult<Vec<Echo>> {
        Err(RepoError::InvalidData("offline".to_string()))
    }

    fn mark_notified(&self, _id: EchoId, _now_ms: i64) -> RepoResult<()> {
        Err(RepoError::InvalidData("offline".to_string()))
    }
}

fn new_echo(owner: OwnerId, title: &str, mood: &str, unlock_at: i64) -> NewEcho {
    NewEcho {
        owner,
        title: title.to_string(),
        mood: mood.to_string(),
        unlock_at,
        audio_duration_secs: 94,
    }
}

#[test]
fn mount_alerts_for_unlocked_echo_and_reports_cards() {
    let conn = open_db_in_memory().unwrap();
    let service = EchoService::new(
        SqliteEchoStore::new(&conn),
        SqlitePreferencesStore::new(&conn),
    );
    let owner = Uuid::new_v4();

    let goals = service
        .record_echo(&new_echo(owner, "Reflection on my goals", "motivated", NOW + DAY_MS), NOW)
        .unwrap();
    let letter = service
        .record_echo(&new_echo(owner, "Letter to myself", "hopeful", NOW + 365 * DAY_MS), NOW + 1)
        .unwrap();

    let later = NOW + 2 * DAY_MS;
    let token = MountToken::new(ViewSurface::Dashboard);
    let mut sink = CollectingSink::new();
    let outcome = service.mount_view(owner, &token, later, &mut sink);

    assert_eq!(outcome.state, ViewState::Ready);
    assert_eq!(sink.alerts().len(), 1);
    assert_eq!(sink.alerts()[0].echo_id, goals.id);

    let ids = outcome.cards.iter().map(|card| card.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![letter.id, goals.id]);
    assert!(!outcome.cards[0].unlocked);
    assert_eq!(outcome.cards[0].countdown.as_deref(), Some("12 months"));
    assert!(outcome.cards[1].unlocked);
    assert_eq!(outcome.refresh.next_refresh_at, Some(letter.unlock_at));

    let again = service.mount_view(owner, &MountToken::new(ViewSurface::Navbar), later, &mut sink);
    assert!(again.dispatch.is_noop());
    assert_eq!(sink.alerts().len(), 1);
}

#[test]
fn record_rejects_unlock_in_the_past() {
    let conn = open_db_in_memory().unwrap();
    let service = EchoService::new(
        SqliteEchoStore::new(&conn),
        SqlitePreferencesStore::new(&conn),
    );

    let err = service
        .record_echo(&new_echo(Uuid::new_v4(), "too late", "", NOW - 1), NOW)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn store_read_failure_renders_error_state() {
    let conn = open_db_in_memory().unwrap();
    let service = EchoService::new(OfflineStore, SqlitePreferencesStore::new(&conn));

    let token = MountToken::new(ViewSurface::Timeline);
    let mut sink = CollectingSink::new();
    let outcome = service.mount_view(Uuid::new_v4(), &token, NOW, &mut sink);

    assert!(matches!(outcome.state, ViewState::Error(ref message) if message.contains("offline")));
    assert!(outcome.cards.is_empty());
    assert!(outcome.dispatch.is_noop());
    assert!(sink.alerts().is_empty());
}

#[test]
fn disabled_preference_suppresses_alert_through_service() {
    let conn = open_db_in_memory().unwrap();
    let service = EchoService::new(
        SqliteEchoStore::new(&conn),
        SqlitePreferencesStore::new(&conn),
    );
    let owner = Uuid::new_v4();
    service
        .record_echo(&new_echo(owner, "quiet", "", NOW + 10), NOW)
        .unwrap();
    let preferences = service.set_unlock_notifications(owner, false).unwrap();
    assert!(!preferences.unlock_notifications);

    let mut sink = CollectingSink::new();
    let outcome = service.mount_view(owner, &MountToken::new(ViewSurface::Dashboard), NOW + 10, &mut sink);

    assert!(sink.alerts().is_empty());
    assert_eq!(outcome.dispatch.acknowledged.len(), 1);
    assert!(!service.preferences(owner).unwrap().unlock_notifications);
}

#[test]
fn feed_receives_created_and_notified_events() {
    let conn = open_db_in_memory().unwrap();
    let feed = Arc::new(ChangeFeed::new());
    let service = EchoService::new(
        SqliteEchoStore::new(&conn),
        SqlitePreferencesStore::new(&conn),
    )
    .with_feed(Arc::clone(&feed));
    let owner = Uuid::new_v4();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let subscription = feed.subscribe(owner, move |change| {
        recorder.lock().unwrap().push(*change);
    });

    let echo = service
        .record_echo(&new_echo(owner, "feed", "", NOW), NOW)
        .unwrap();
    let mut sink = CollectingSink::new();
    service.mount_view(owner, &MountToken::new(ViewSurface::Navbar), NOW, &mut sink);
    // Re-triggering after the Notified event must be a no-op.
    let retrigger = service.mount_view(owner, &MountToken::new(ViewSurface::Navbar), NOW, &mut sink);
    assert!(retrigger.dispatch.is_noop());

    let events = seen.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            EchoChange::Created {
                owner,
                echo_id: echo.id
            },
            EchoChange::Notified {
                owner,
                echo_id: echo.id
            },
        ]
    );
    assert!(feed.unsubscribe(subscription));
}

#[test]
fn timeline_filters_by_title_and_mood() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEchoStore::new(&conn);
    let owner = Uuid::new_v4();
    // 2025-04-15 and 2025-05-05, both UTC midnight.
    let april = Echo::new(owner, "Birthday thoughts", 1_744_675_200_000, NOW + 60 * DAY_MS)
        .unwrap()
        .with_mood("grateful");
    let may = Echo::new(owner, "Reflection on my goals", 1_746_403_200_000, NOW)
        .unwrap()
        .with_mood("motivated");
    store.create_echo(&april).unwrap();
    store.create_echo(&may).unwrap();

    let service = EchoService::new(store, SqlitePreferencesStore::new(&conn));

    let all = service.timeline(owner, &TimelineQuery::default(), NOW).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].label, "May 2025");

    let by_title = TimelineQuery {
        search: Some("BIRTHDAY".to_string()),
        ..TimelineQuery::default()
    };
    let groups = service.timeline(owner, &by_title, NOW).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].echoes[0].id, april.id);

    let by_mood = TimelineQuery {
        mood: Some("Motivated".to_string()),
        ..TimelineQuery::default()
    };
    let groups = service.timeline(owner, &by_mood, NOW).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "May 2025");
    assert!(groups[0].echoes[0].unlocked);
}
