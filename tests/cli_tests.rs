mod common;

use assert_cmd::Command;
use common::upstream_fixture;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Binary run from an empty directory with no credentials in scope
fn bare_command(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rw-release-report").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("GITHUB_TOKEN")
        .env_remove("BUILDKITE_TOKEN")
        .env_remove("RELEASE_REPORT_GITHUB__TOKEN")
        .env_remove("RELEASE_REPORT_BUILDKITE__TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    bare_command(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("timeline"))
        .stdout(predicate::str::contains("changelog"))
        .stdout(predicate::str::contains("show-config"));
}

#[test]
fn test_timeline_without_token_fails_before_any_work() {
    let dir = TempDir::new().unwrap();
    bare_command(&dir)
        .arg("timeline")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_TOKEN is not set"))
        .stderr(predicate::str::contains("Discovering").not());

    assert!(!dir.path().join("release_timeline.svg").exists());
    assert!(!dir.path().join("release_timeline.md").exists());
}

#[test]
fn test_changelog_requires_buildkite_token() {
    let dir = TempDir::new().unwrap();
    bare_command(&dir)
        .env("GITHUB_TOKEN", "gh-token")
        .arg("changelog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BUILDKITE_TOKEN is not set"));
}

#[test]
fn test_show_config_masks_credentials() {
    let dir = TempDir::new().unwrap();
    bare_command(&dir)
        .env("GITHUB_TOKEN", "super-secret-token")
        .env("RELEASE_REPORT_TIMELINE__MAX_WORKERS", "3")
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_workers = 3"))
        .stdout(predicate::str::contains("***"))
        .stdout(predicate::str::contains("super-secret-token").not());
}

#[test]
fn test_config_file_is_layered_over_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("release-report.toml"),
        "[github]\nowner = \"someone-else\"\n",
    )
    .unwrap();

    bare_command(&dir)
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("owner = \"someone-else\""))
        .stdout(predicate::str::contains("repo = \"risingwave\""));
}

#[test]
fn test_env_file_load_is_logged() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".env"), "GITHUB_TOKEN=from-dotenv\n").unwrap();

    bare_command(&dir)
        .env("RUST_LOG", "info")
        .arg("show-config")
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded environment variables from .env file"))
        .stdout(predicate::str::contains("from-dotenv").not());
}

async fn mount_upstream_api(server: &MockServer) {
    let repo = "/repos/risingwavelabs/risingwave";
    Mock::given(method("GET"))
        .and(path(format!("{repo}/branches")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "main" },
            { "name": "release-2.1" },
            { "name": "release-2.2" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{repo}/releases")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "tag_name": "v2.1.0", "created_at": "2024-01-20T00:00:00Z", "draft": false }
        ])))
        .mount(server)
        .await;
    for (branch, date) in [("release-2.1", "2024-01-13T00:00:00Z"), ("release-2.2", "2024-02-15T00:00:00Z")] {
        Mock::given(method("GET"))
            .and(path(format!("{repo}/commits/{branch}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": format!("{branch}-head"),
                "commit": { "message": "head", "author": { "name": "dev", "date": date } }
            })))
            .mount(server)
            .await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeline_run_removes_temporary_mirror() {
    let server = MockServer::start().await;
    mount_upstream_api(&server).await;

    let dir = TempDir::new().unwrap();
    let upstream = TempDir::new().unwrap();
    upstream_fixture(upstream.path());
    let scratch = TempDir::new().unwrap();

    let mut cmd = bare_command(&dir);
    cmd.env("GITHUB_TOKEN", "gh-token")
        .env("RELEASE_REPORT_GITHUB__API_URL", server.uri())
        .env("RELEASE_REPORT_TIMELINE__LOCAL_MIRROR", dir.path().join("no-checkout"))
        .env("RELEASE_REPORT_TIMELINE__CLONE_URL", upstream.path())
        .env("TMPDIR", scratch.path())
        .arg("timeline");
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "timeline failed: {stderr}");
    assert!(stderr.contains("Cloned temporary mirror"), "{stderr}");

    let leftovers: Vec<_> = std::fs::read_dir(scratch.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "mirror left behind: {leftovers:?}");

    let markdown = std::fs::read_to_string(dir.path().join("release_timeline.md")).unwrap();
    assert!(markdown.contains("| v2.2 | 2024-02-10 |"), "{markdown}");
    assert!(markdown.contains("| v2.1 | 2024-01-11 |"), "{markdown}");
    assert!(dir.path().join("release_timeline.svg").is_file());
}
