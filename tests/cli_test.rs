// CLI tests for the scraper-registry binary
// Each test runs the binary against a mock metadata server and a temporary
// storage directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn registry_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scraper-registry").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("no-config.json"))
        .arg("--storage-dir")
        .arg(dir.path());
    cmd
}

async fn mock_module(server: &mut mockito::ServerGuard) -> (mockito::Mock, mockito::Mock) {
    let body = json!({
        "sourceName": "A",
        "scriptURL": format!("{}/s1", server.url()),
        "version": "1"
    })
    .to_string();

    let meta = server
        .mock("GET", "/meta1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;
    let script = server
        .mock("GET", "/s1")
        .with_status(200)
        .with_body("console.log(1)")
        .create_async()
        .await;
    (meta, script)
}

fn add_module(dir: &TempDir, url: &str) -> String {
    let output = registry_cmd(dir).arg("add").arg(url).output().unwrap();
    assert!(output.status.success());
    let record: Value = serde_json::from_slice(&output.stdout).unwrap();
    record["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_add_list_and_content() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_module(&mut server).await;
    let dir = TempDir::new().unwrap();

    let id = add_module(&dir, &format!("{}/meta1", server.url()));

    registry_cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("\"name\": \"A\""));

    registry_cmd(&dir)
        .arg("content")
        .arg(&id)
        .assert()
        .success()
        .stdout("console.log(1)");
}

#[tokio::test]
async fn test_add_duplicate_fails() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_module(&mut server).await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/meta1", server.url());

    add_module(&dir, &url);

    registry_cmd(&dir)
        .arg("add")
        .arg(&url)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Module already exists"));
}

#[tokio::test]
async fn test_delete_and_refresh() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_module(&mut server).await;
    let dir = TempDir::new().unwrap();

    let id = add_module(&dir, &format!("{}/meta1", server.url()));

    registry_cmd(&dir)
        .arg("refresh")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"unchanged\""));

    registry_cmd(&dir)
        .arg("delete")
        .arg(&id)
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted successfully"));

    registry_cmd(&dir)
        .arg("delete")
        .arg(&id)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Module not found"));
}

#[test]
fn test_invalid_id_is_rejected() {
    let dir = TempDir::new().unwrap();

    registry_cmd(&dir)
        .arg("content")
        .arg("not-a-uuid")
        .assert()
        .failure();
}

#[test]
fn test_empty_registry_lists_nothing() {
    let dir = TempDir::new().unwrap();

    registry_cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}
