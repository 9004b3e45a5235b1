use echoverse_core::{Echo, EchoValidationError};
use uuid::Uuid;

#[test]
fn echo_new_sets_defaults() {
    let owner = Uuid::new_v4();
    let echo = Echo::new(owner, "  Letter to myself  ", 1_000, 5_000).unwrap();

    assert!(!echo.id.is_nil());
    assert_eq!(echo.owner, owner);
    assert_eq!(echo.title, "Letter to myself");
    assert_eq!(echo.mood, "");
    assert_eq!(echo.audio_duration_secs, 0);
    assert!(!echo.notification_shown);
}

#[test]
fn unlock_before_creation_is_rejected() {
    let err = Echo::new(Uuid::new_v4(), "backwards", 5_000, 1_000).unwrap_err();
    assert_eq!(
        err,
        EchoValidationError::UnlockBeforeCreation {
            created_at: 5_000,
            unlock_at: 1_000,
        }
    );
}

#[test]
fn blank_title_and_nil_ids_are_rejected() {
    assert_eq!(
        Echo::new(Uuid::new_v4(), "   ", 0, 0).unwrap_err(),
        EchoValidationError::BlankTitle
    );
    assert_eq!(
        Echo::with_id(Uuid::nil(), Uuid::new_v4(), "x", 0, 0).unwrap_err(),
        EchoValidationError::NilId
    );
    assert_eq!(
        Echo::new(Uuid::nil(), "x", 0, 0).unwrap_err(),
        EchoValidationError::NilOwner
    );
}

#[test]
fn serialization_uses_expected_wire_fields_and_omits_derived_state() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let owner = Uuid::parse_str("66666666-7777-4888-9999-aaaaaaaaaaaa").unwrap();
    let echo = Echo::with_id(id, owner, "Reflection on my goals", 1_746_403_200_000, 1_747_008_000_000)
        .unwrap()
        .with_mood("Motivated")
        .with_audio_duration(165);

    let json = serde_json::to_value(&echo).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["owner"], owner.to_string());
    assert_eq!(json["mood"], "motivated");
    assert_eq!(json["unlock_at"], 1_747_008_000_000_i64);
    assert_eq!(json["audio_duration_secs"], 165);
    assert_eq!(json["notification_shown"], false);
    assert!(json.get("unlocked").is_none());

    let decoded: Echo = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, echo);
}

#[test]
fn deserialize_rejects_unlock_before_creation() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "owner": "66666666-7777-4888-9999-aaaaaaaaaaaa",
        "title": "bad",
        "created_at": 200,
        "unlock_at": 100
    });

    let err = serde_json::from_value::<Echo>(value).unwrap_err();
    assert!(
        err.to_string()
            .contains("unlock_at (100) must be >= created_at (200)"),
        "unexpected error: {err}"
    );
}
