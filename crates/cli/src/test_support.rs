// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Recording fixtures shared by unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, Utc};
use serde_json::json;
use std::time::Duration;

use crate::recording::{
    EventKind, Metadata, RecordedEvent, SessionRecording, RECORDING_VERSION,
};

fn event(seq: i64, kind: EventKind, offset: Duration, data: serde_json::Value) -> RecordedEvent {
    RecordedEvent {
        sequence: seq,
        parent_sequence: None,
        kind,
        timestamp: DateTime::<Utc>::default() + chrono::Duration::from_std(offset).unwrap(),
        offset,
        session_id: "test-session".to_string(),
        conversation_id: None,
        run_id: None,
        data_type: None,
        data,
    }
}

pub(crate) fn message(seq: i64, role: &str, content: &str, offset: Duration) -> RecordedEvent {
    event(
        seq,
        EventKind::MessageCreated,
        offset,
        json!({"role": role, "content": content}),
    )
}

pub(crate) fn message_with(seq: i64, offset: Duration, data: serde_json::Value) -> RecordedEvent {
    event(seq, EventKind::MessageCreated, offset, data)
}

pub(crate) fn provider_call(
    seq: i64,
    output_tokens: u64,
    cost: f64,
    offset: Duration,
) -> RecordedEvent {
    event(
        seq,
        EventKind::ProviderCallCompleted,
        offset,
        json!({
            "duration": 250_000_000i64,
            "input_tokens": 12,
            "output_tokens": output_tokens,
            "cost": cost,
        }),
    )
}

pub(crate) fn recording(events: Vec<RecordedEvent>) -> SessionRecording {
    SessionRecording {
        metadata: Metadata {
            session_id: "test-session".to_string(),
            event_count: events.len(),
            version: RECORDING_VERSION.to_string(),
            ..Default::default()
        },
        events,
    }
}

/// One user/assistant pair per entry; pair `i` sits at `i * spacing`.
pub(crate) fn conversation(pairs: &[(&str, &str)], spacing: Duration) -> SessionRecording {
    let mut events = Vec::new();
    for (i, (user, assistant)) in pairs.iter().enumerate() {
        let offset = spacing * i as u32;
        let seq = (i as i64) * 2 + 1;
        events.push(message(seq, "user", user, offset));
        events.push(message(seq + 1, "assistant", assistant, offset));
    }
    recording(events)
}

/// Three turns "Response A/B/C" at 0s, 1s and 2s
pub(crate) fn three_turns() -> SessionRecording {
    conversation(
        &[
            ("Question A", "Response A"),
            ("Question B", "Response B"),
            ("Question C", "Response C"),
        ],
        Duration::from_secs(1),
    )
}
