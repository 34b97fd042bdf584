// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use serde_json::json;

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn document() -> serde_json::Value {
    json!({
        "metadata": {
            "session_id": "sess-1",
            "start_time": "2026-01-01T00:00:00Z",
            "end_time": "2026-01-01T00:00:03Z",
            "duration": 3_000_000_000i64,
            "event_count": 2,
            "version": "1.0",
            "created_at": "2026-01-01T00:00:04Z"
        },
        "events": [
            {
                "seq": 1,
                "type": "message.created",
                "timestamp": "2026-01-01T00:00:00Z",
                "offset": 0,
                "session_id": "sess-1",
                "data": {"role": "user", "content": "Hello"}
            },
            {
                "seq": 2,
                "type": "message.created",
                "timestamp": "2026-01-01T00:00:01.5Z",
                "offset": 1_500_000_000i64,
                "session_id": "sess-1",
                "data": {"role": "assistant", "content": "Hi there"}
            }
        ]
    })
}

#[test]
fn test_load_json_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "rec.json", &document().to_string());

    let rec = SessionRecording::load(&path).unwrap();
    assert_eq!(rec.metadata.session_id, "sess-1");
    assert_eq!(rec.metadata.duration, Duration::from_secs(3));
    assert_eq!(rec.events.len(), 2);
    assert_eq!(rec.events[1].offset, Duration::from_millis(1500));
    assert_eq!(rec.events[1].kind, EventKind::MessageCreated);
}

#[test]
fn test_load_json_lines() {
    let doc = document();
    let mut contents = json!({"type": "metadata", "metadata": doc["metadata"]}).to_string();
    for event in doc["events"].as_array().unwrap() {
        contents.push('\n');
        contents.push_str(&json!({"type": "event", "event": event}).to_string());
    }

    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "rec.jsonl", &contents);
    let rec = SessionRecording::load(&path).unwrap();
    assert_eq!(rec.metadata.version, "1.0");
    assert_eq!(rec.events.len(), 2);
}

#[test]
fn test_load_event_store_computes_offsets() {
    let lines = [
        json!({"seq": 1, "event": {
            "type": "message.created",
            "timestamp": "2026-01-01T00:00:10Z",
            "session_id": "store-sess",
            "data": {"role": "user", "content": "q"}
        }}),
        json!({"seq": 2, "parent_id": 1, "event": {
            "type": "message.created",
            "timestamp": "2026-01-01T00:00:12Z",
            "session_id": "store-sess",
            "data": {"role": "assistant", "content": "a"}
        }}),
    ];
    let contents = lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("\n");

    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "store.jsonl", &contents);
    let rec = SessionRecording::load(&path).unwrap();

    assert_eq!(rec.metadata.version, RECORDING_VERSION);
    assert_eq!(rec.metadata.session_id, "store-sess");
    assert_eq!(rec.metadata.event_count, 2);
    assert_eq!(rec.metadata.duration, Duration::from_secs(2));
    assert_eq!(rec.events[0].offset, Duration::ZERO);
    assert_eq!(rec.events[1].offset, Duration::from_secs(2));
    assert_eq!(rec.events[1].parent_sequence, Some(1));
}

#[test]
fn test_save_and_reload_both_formats() {
    let rec: SessionRecording = serde_json::from_value(document()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    for (name, format) in [
        ("out.json", RecordingFormat::Json),
        ("out.jsonl", RecordingFormat::JsonLines),
    ] {
        let path = dir.path().join(name);
        rec.save_to(&path, format).unwrap();
        let reloaded = SessionRecording::load(&path).unwrap();
        assert_eq!(reloaded, rec, "format {:?}", format);
    }
}

#[test]
fn test_jsonl_without_metadata_is_rejected() {
    let event = &document()["events"][0];
    let contents = json!({"type": "event", "event": event}).to_string();
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "bad.jsonl", &contents);

    let err = SessionRecording::load(&path).unwrap_err();
    assert!(err.to_string().contains("missing metadata"), "{err}");
}

#[test]
fn test_empty_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "empty.json", "\n\n");
    let err = SessionRecording::load(&path).unwrap_err();
    assert!(matches!(err, ReplayError::Load { .. }));
    assert!(err.to_string().contains("empty recording file"));
}

#[test]
fn test_missing_file_is_load_error() {
    let err = SessionRecording::load(Path::new("/nonexistent/rec.json")).unwrap_err();
    assert!(matches!(err, ReplayError::Load { .. }));
}

#[test]
fn test_file_loader_delegates() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "rec.json", &document().to_string());
    let rec = FileRecordingLoader.load(&path).unwrap();
    assert_eq!(rec.events.len(), 2);
}

#[test]
fn test_event_kind_names() {
    assert_eq!(
        EventKind::from("provider.call.completed".to_string()),
        EventKind::ProviderCallCompleted
    );
    assert_eq!(
        EventKind::from("tool.call.started".to_string()),
        EventKind::Other("tool.call.started".to_string())
    );
    assert_eq!(EventKind::MessageCreated.as_str(), "message.created");
}

#[test]
fn test_payload_decoding() {
    let rec: SessionRecording = serde_json::from_value(document()).unwrap();
    match rec.events[1].payload() {
        Some(EventPayload::Message(msg)) => {
            assert_eq!(msg.role, "assistant");
            assert_eq!(msg.content, "Hi there");
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    let call = RecordedEvent {
        kind: EventKind::ProviderCallCompleted,
        data: json!({"input_tokens": 10, "output_tokens": 5, "cost": 0.25}),
        ..rec.events[0].clone()
    };
    match call.payload() {
        Some(EventPayload::ProviderCall(data)) => {
            let cost = data.cost_info();
            assert_eq!(cost.input_tokens, 10);
            assert_eq!(cost.output_tokens, 5);
            assert_eq!(cost.total_cost, 0.25);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn test_malformed_payload_is_none() {
    let rec: SessionRecording = serde_json::from_value(document()).unwrap();
    let broken = RecordedEvent {
        data: json!({"content": 42}),
        ..rec.events[0].clone()
    };
    assert!(broken.payload().is_none());
}
