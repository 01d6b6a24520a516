use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn sprint_team(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sprint-team").unwrap();
    cmd.env("SPRINT_CONFIG", dir.join("config.toml"))
        .env("SPRINT_STORE", dir.join("session.json"))
        .env("SPRINT_API_URL", "http://127.0.0.1:9")
        .env_remove("SPRINT_LOG_FORMAT")
        .env_remove("RUST_LOG");
    for proxy in ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"] {
        cmd.env_remove(proxy);
    }
    cmd
}

#[test]
fn test_whoami_without_team_exits_3() {
    let temp = TempDir::new().unwrap();
    sprint_team(temp.path())
        .arg("whoami")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Team ID not found"));
}

#[test]
fn test_whoami_reads_saved_identity() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("session.json"),
        r#"{"teamID": "42", "teamName": "Speedsters"}"#,
    )
    .unwrap();

    sprint_team(temp.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Speedsters (#42)"));

    let output = sprint_team(temp.path())
        .args(["--format", "json", "whoami"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["team_id"], "42");
}

#[test]
fn test_logout_forgets_identity_but_keeps_code() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("session.json");
    fs::write(&store, r#"{"teamID": "42", "teamName": "Speedsters", "code": "print(1)"}"#).unwrap();

    sprint_team(temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Team identity removed."));

    sprint_team(temp.path()).arg("whoami").assert().code(3);

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(saved["code"], "print(1)");
    assert!(saved.get("teamID").is_none());
}

#[test]
fn test_logout_without_team_succeeds() {
    let temp = TempDir::new().unwrap();
    sprint_team(temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("No team was saved."));
}

#[test]
fn test_register_blank_name_exits_3_without_network() {
    let temp = TempDir::new().unwrap();
    sprint_team(temp.path())
        .args(["register", "   "])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Team name cannot be empty"));
}

#[test]
fn test_join_unreachable_backend_exits_1() {
    let temp = TempDir::new().unwrap();
    sprint_team(temp.path())
        .args(["join", "Speedsters"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("An unexpected error occurred"));

    // Nothing was saved
    sprint_team(temp.path()).arg("whoami").assert().code(3);
}
