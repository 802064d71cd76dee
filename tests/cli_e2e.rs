//! End-to-end CLI tests for the imgfetch binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

mod support;

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use support::fixtures::{mount_page, mount_png, mount_robots, page_with_images};
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Command with config lookup pointed at an empty directory.
fn imgfetch(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("imgfetch").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.join("xdg-config"))
        .env("HOME", home)
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(home: &Path, contents: &str) {
    let dir = home.join("xdg-config").join("imgfetch");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    imgfetch(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--same-domain"))
        .stdout(predicate::str::contains("--no-robots"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    imgfetch(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("imgfetch"));
}

#[test]
fn test_binary_missing_url_is_usage_error() {
    let home = TempDir::new().unwrap();
    imgfetch(home.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--url"));
}

#[test]
fn test_binary_invalid_url_exits_one() {
    let home = TempDir::new().unwrap();
    imgfetch(home.path())
        .args(["--url", "not a url", "--out"])
        .arg(home.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid URL"));
}

#[test]
fn test_binary_bad_config_exits_one() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "concurrency = 4\n");
    imgfetch(home.path())
        .args(["--url", "http://127.0.0.1:9/"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[tokio::test]
async fn test_binary_downloads_and_prints_summary() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&server, "/page", page_with_images(&["/a.png", "/b.png", "/a.png"])).await;
    mount_png(&server, "/a.png", 1).await;
    mount_png(&server, "/b.png", 1).await;
    let home = TempDir::new().unwrap();
    let out = home.path().join("pics");

    imgfetch(home.path())
        .arg("--url")
        .arg(format!("{}/page", server.uri()))
        .arg("--out")
        .arg(&out)
        .args(["--delay", "0", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("succeeded 2"));

    assert!(out.join("a.png").exists());
    assert!(out.join("b.png").exists());
}

#[tokio::test]
async fn test_binary_partial_failure_still_exits_zero() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&server, "/page", page_with_images(&["/ok.png", "/gone.png"])).await;
    mount_png(&server, "/ok.png", 1).await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    imgfetch(home.path())
        .arg("--url")
        .arg(format!("{}/page", server.uri()))
        .arg("--out")
        .arg(home.path().join("out"))
        .args(["--delay", "0", "-q"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("failed 1"));
}

#[tokio::test]
async fn test_binary_robots_denial_exits_two() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_robots(&server, "User-agent: *\nDisallow: /images/\n").await;
    let home = TempDir::new().unwrap();
    let out = home.path().join("out");

    imgfetch(home.path())
        .arg("--url")
        .arg(format!("{}/images/gallery", server.uri()))
        .arg("--out")
        .arg(&out)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("robots.txt disallows"));

    assert!(!out.exists());
}

#[tokio::test]
async fn test_binary_json_report() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&server, "/page", page_with_images(&["/a.png"])).await;
    mount_png(&server, "/a.png", 1).await;
    let home = TempDir::new().unwrap();

    let output = imgfetch(home.path())
        .arg("--url")
        .arg(format!("{}/page", server.uri()))
        .arg("--out")
        .arg(home.path().join("out"))
        .args(["--json", "-q"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["candidates"], 1);
    assert_eq!(json["saved"][0]["source"], "img_src");
}

#[tokio::test]
async fn test_binary_config_file_supplies_output_dir() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&server, "/page", page_with_images(&["/a.png"])).await;
    mount_png(&server, "/a.png", 1).await;
    let home = TempDir::new().unwrap();
    let out = home.path().join("from-config");
    write_config(
        home.path(),
        &format!("output_dir = \"{}\"\ndelay_secs = 0\n", out.display()),
    );

    imgfetch(home.path())
        .arg("--url")
        .arg(format!("{}/page", server.uri()))
        .arg("-q")
        .assert()
        .success();

    assert!(out.join("a.png").exists());
}
