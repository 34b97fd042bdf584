// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Integration tests for `replaykit play`.

#![allow(deprecated)] // Command::cargo_bin is deprecated but still functional

mod common;

use assert_cmd::Command;
use common::{arena_with_audio, json_lines, recording};
use predicates::prelude::*;

fn replaykit() -> Command {
    Command::cargo_bin("replaykit").unwrap()
}

#[test]
fn test_play_replays_every_turn_in_order() {
    let rec = recording(&[
        ("Question A", "Response A"),
        ("Question B", "Response B"),
        ("Question C", "Response C"),
    ]);

    let output = replaykit()
        .args(["play", rec.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output.stdout);
    let contents: Vec<&str> = lines
        .iter()
        .filter_map(|l| l["content"].as_str())
        .collect();
    assert_eq!(contents, vec!["Response A", "Response B", "Response C"]);
    let finished = lines
        .iter()
        .filter(|l| l["finish_reason"] == "complete")
        .count();
    assert_eq!(finished, 3);
}

#[test]
fn test_play_content_match_selects_by_text() {
    let rec = recording(&[("ping", "pong"), ("hello", "world")]);

    let output = replaykit()
        .args([
            "play",
            rec.path().to_str().unwrap(),
            "--match",
            "content",
            "--text",
            "hello",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert_eq!(json_lines(&output.stdout)[0]["content"], "world");
}

#[test]
fn test_play_arena_emits_text_media_then_complete() {
    // "AAEC" decodes to [0, 1, 2]
    let arena = arena_with_audio("Hello from audio", "AAEC");

    let output = replaykit()
        .args(["play", arena.path().to_str().unwrap(), "--format", "arena"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["content"], "Hello from audio");
    assert_eq!(lines[1]["media"]["mime_type"], "audio/pcm");
    assert_eq!(lines[2]["finish_reason"], "complete");
}

#[test]
fn test_play_past_end_emits_stop() {
    let rec = recording(&[("q", "only answer")]);

    let output = replaykit()
        .args([
            "play",
            rec.path().to_str().unwrap(),
            "--text",
            "first",
            "--text",
            "second",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output.stdout);
    assert_eq!(lines.last().unwrap()["finish_reason"], "stop");
}

#[test]
fn test_play_missing_file_fails() {
    replaykit()
        .args(["play", "/does/not/exist.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: failed to load"));
}

#[test]
fn test_play_requires_source() {
    replaykit()
        .args(["play"])
        .env_remove("REPLAYKIT_CONFIG")
        .assert()
        .failure()
        .stderr(predicate::str::contains("a recording file or --config is required"));
}

#[test]
fn test_play_rejects_invalid_speed() {
    let rec = recording(&[("q", "a")]);
    replaykit()
        .args([
            "play",
            rec.path().to_str().unwrap(),
            "--timing",
            "accelerated",
            "--speed",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_play_writes_capture_log() {
    let rec = recording(&[("q1", "a1"), ("q2", "a2")]);
    let dir = tempfile::tempdir().unwrap();
    let capture = dir.path().join("capture.jsonl");

    replaykit()
        .args([
            "play",
            rec.path().to_str().unwrap(),
            "--capture",
            capture.to_str().unwrap(),
        ])
        .assert()
        .success();

    let captured = std::fs::read_to_string(&capture).unwrap();
    let deliveries = json_lines(captured.as_bytes());
    assert_eq!(deliveries.len(), 2);
}
