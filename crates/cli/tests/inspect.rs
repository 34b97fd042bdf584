// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Integration tests for `replaykit inspect`.

#![allow(deprecated)] // Command::cargo_bin is deprecated but still functional

mod common;

use assert_cmd::Command;
use common::{arena_with_audio, json_lines, recording, write_json};
use predicates::prelude::*;

#[test]
fn test_inspect_lists_turns() {
    let rec = recording(&[("hi", "hello"), ("bye", "goodbye")]);

    let output = Command::cargo_bin("replaykit")
        .unwrap()
        .args(["inspect", rec.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["user_content"], "hi");
    assert_eq!(lines[1]["content"], "goodbye");
    assert_eq!(lines[1]["offset_ms"], 1000);
}

#[test]
fn test_inspect_arena_counts_media() {
    let arena = arena_with_audio("spoken", "AAEC");

    let output = Command::cargo_bin("replaykit")
        .unwrap()
        .args(["inspect", arena.path().to_str().unwrap(), "--format", "arena"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["media_parts"], 1);
}

#[test]
fn test_inspect_recording_without_turns_fails() {
    let rec = write_json(&serde_json::json!({
        "metadata": {"session_id": "empty", "version": "1.0"},
        "events": []
    }));

    Command::cargo_bin("replaykit")
        .unwrap()
        .args(["inspect", rec.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no assistant responses"));
}

#[test]
fn test_inspect_reads_options_file() {
    let rec = recording(&[("q", "a")]);
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("replay.toml");
    std::fs::write(
        &config,
        format!("path = {:?}\nformat = \"recording\"\n", rec.path().to_str().unwrap()),
    )
    .unwrap();

    Command::cargo_bin("replaykit")
        .unwrap()
        .args(["inspect", "--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"content\":\"a\""));
}
