//! CLI end-to-end tests against a temporary database.

use std::path::Path;
use std::process::Command;

fn run_cli(db: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_echoverse_cli"))
        .arg("--db")
        .arg(db)
        .args(args)
        .env_remove("ECHOVERSE_LOG_DIR")
        .output()
        .expect("failed to execute CLI");

    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn ping_prints_linkage() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(&dir.path().join("cli.db"), &["ping"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("ping=pong"));
}

#[test]
fn check_alerts_once_for_echo_unlocking_now() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cli.db");
    let owner = "11111111-2222-4333-8444-555555555555";

    let (code, stdout, stderr) = run_cli(
        &db,
        &["record", "--owner", owner, "--title", "Reflection on my goals"],
    );
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.contains("Echo recorded:"));

    let (code, stdout, stderr) = run_cli(&db, &["check", "--owner", owner]);
    assert_eq!(code, 0, "{stderr}");
    assert_eq!(stdout.matches("ALERT").count(), 1);
    assert!(stdout.contains("acknowledged=1"));

    let (code, stdout, _) = run_cli(&db, &["check", "--owner", owner, "--view", "navbar"]);
    assert_eq!(code, 0);
    assert!(!stdout.contains("ALERT"));
}

#[test]
fn list_json_reports_locked_echo() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cli.db");
    let owner = "66666666-7777-4888-9999-aaaaaaaaaaaa";

    let (code, _, stderr) = run_cli(
        &db,
        &["record", "--owner", owner, "--title", "Letter", "--unlock-in-days", "365"],
    );
    assert_eq!(code, 0, "{stderr}");

    let (code, stdout, _) = run_cli(&db, &["list", "--owner", owner, "--json"]);
    assert_eq!(code, 0);
    let cards: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(cards[0]["title"], "Letter");
    assert_eq!(cards[0]["unlocked"], false);
}

#[test]
fn check_rejects_unknown_view() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        &dir.path().join("cli.db"),
        &["check", "--owner", "11111111-2222-4333-8444-555555555555", "--view", "settings"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown view"));
}

#[test]
fn record_rejects_out_of_range_unlock_offset() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cli.db");
    let owner = "11111111-2222-4333-8444-555555555555";

    for days in ["1000000000", "1000000000000000"] {
        let (code, stdout, stderr) = run_cli(
            &db,
            &["record", "--owner", owner, "--title", "t", "--unlock-in-days", days],
        );
        assert_eq!(code, 1, "{stderr}");
        assert!(stderr.contains("error: unlock-in-days out of range"), "{stderr}");
        assert!(!stderr.contains("panicked"));
        assert!(!stdout.contains("Echo recorded:"));
    }

    let (code, stdout, _) = run_cli(&db, &["list", "--owner", owner, "--json"]);
    assert_eq!(code, 0);
    let cards: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(cards.as_array().map(Vec::len), Some(0));
}
