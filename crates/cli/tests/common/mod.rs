// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Shared fixtures for binary tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

const NANOS_PER_MILLI: u64 = 1_000_000;

pub fn write_json(value: &Value) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(value.to_string().as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn event(seq: i64, kind: &str, offset_ms: u64, data: Value) -> Value {
    json!({
        "seq": seq,
        "type": kind,
        "timestamp": "2026-01-01T00:00:00Z",
        "offset": offset_ms * NANOS_PER_MILLI,
        "session_id": "fixture",
        "data": data,
    })
}

/// Recording with one user/assistant pair per entry, one second apart
pub fn recording(pairs: &[(&str, &str)]) -> NamedTempFile {
    let mut events = Vec::new();
    for (i, (user, assistant)) in pairs.iter().enumerate() {
        let seq = (i as i64) * 2 + 1;
        let offset = (i as u64) * 1000;
        events.push(event(
            seq,
            "message.created",
            offset,
            json!({"role": "user", "content": user}),
        ));
        events.push(event(
            seq + 1,
            "message.created",
            offset,
            json!({"role": "assistant", "content": assistant}),
        ));
    }
    write_json(&json!({
        "metadata": {
            "session_id": "fixture",
            "version": "1.0",
            "event_count": events.len(),
        },
        "events": events,
    }))
}

/// Arena run whose single assistant turn carries inline audio
pub fn arena_with_audio(text: &str, audio_base64: &str) -> NamedTempFile {
    write_json(&json!({
        "RunID": "run-1",
        "ScenarioID": "audio",
        "ProviderID": "mock",
        "Messages": [
            {"role": "user", "content": "speak"},
            {
                "role": "assistant",
                "content": text,
                "parts": [
                    {"type": "audio", "media": {"mime_type": "audio/pcm", "data": audio_base64}}
                ]
            }
        ]
    }))
}

/// Parse stdout as JSON lines
pub fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
