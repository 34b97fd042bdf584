// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use crate::test_support::{
    conversation, message, message_with, provider_call, recording, three_turns,
};
use serde_json::json;

const SEC: Duration = Duration::from_secs(1);

#[test]
fn test_one_turn_per_assistant_message_in_order() {
    let table = TurnTable::from_recording(&three_turns(), None).unwrap();
    let contents: Vec<&str> = table.turns().iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["Response A", "Response B", "Response C"]);
    for (i, turn) in table.turns().iter().enumerate() {
        assert_eq!(turn.ordinal, i);
        assert_eq!(turn.offset, SEC * i as u32);
    }
}

#[test]
fn test_turn_carries_preceding_user_content() {
    let table = TurnTable::from_recording(&three_turns(), None).unwrap();
    assert_eq!(table.get(1).unwrap().preceding_user_content, "Question B");
    assert_eq!(table.get(1).unwrap().source_sequence, Some(4));
}

#[test]
fn test_events_sorted_by_sequence_before_indexing() {
    let mut rec = three_turns();
    rec.events.reverse();
    let table = TurnTable::from_recording(&rec, None).unwrap();
    assert_eq!(table.get(0).unwrap().content, "Response A");
    assert_eq!(table.get(2).unwrap().content, "Response C");
}

#[test]
fn test_assistant_without_user_has_empty_preceding_content() {
    let rec = recording(vec![message(1, "assistant", "Welcome!", Duration::ZERO)]);
    let table = TurnTable::from_recording(&rec, None).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0).unwrap().preceding_user_content, "");
    assert!(!table.has_content_index());
}

#[test]
fn test_provider_call_attaches_to_pending_turn() {
    let rec = recording(vec![
        message(1, "user", "hi", Duration::ZERO),
        message(2, "assistant", "hello", Duration::ZERO),
        provider_call(3, 7, 0.5, Duration::ZERO),
        message(4, "user", "more", SEC),
        message(5, "assistant", "sure", SEC),
    ]);
    let table = TurnTable::from_recording(&rec, None).unwrap();

    let first = table.get(0).unwrap();
    let cost = first.cost_info.as_ref().unwrap();
    assert_eq!(cost.output_tokens, 7);
    assert_eq!(cost.input_tokens, 12);
    assert_eq!(cost.total_cost, 0.5);
    assert_eq!(first.latency, Some(Duration::from_millis(250)));
    assert!(table.get(1).unwrap().cost_info.is_none());
}

#[test]
fn test_provider_call_without_pending_turn_is_ignored() {
    let rec = recording(vec![
        provider_call(1, 3, 0.1, Duration::ZERO),
        message(2, "user", "hi", Duration::ZERO),
        message(3, "assistant", "hello", Duration::ZERO),
        provider_call(4, 9, 0.2, Duration::ZERO),
        provider_call(5, 99, 9.9, Duration::ZERO),
    ]);
    let table = TurnTable::from_recording(&rec, None).unwrap();
    let cost = table.get(0).unwrap().cost_info.as_ref().unwrap();
    assert_eq!(cost.output_tokens, 9);
}

#[test]
fn test_provider_call_finish_reason_overrides_default() {
    let mut call = provider_call(3, 1, 0.0, Duration::ZERO);
    call.data["finish_reason"] = json!("length");
    let rec = recording(vec![
        message(1, "user", "hi", Duration::ZERO),
        message(2, "assistant", "cut", Duration::ZERO),
        call,
    ]);
    let table = TurnTable::from_recording(&rec, None).unwrap();
    assert_eq!(table.get(0).unwrap().finish_reason.as_deref(), Some("length"));
}

#[test]
fn test_no_assistant_messages_fails_construction() {
    let rec = recording(vec![message(1, "user", "anyone?", Duration::ZERO)]);
    let err = TurnTable::from_recording(&rec, None).unwrap_err();
    assert!(matches!(err, ReplayError::Construction(_)));
}

#[test]
fn test_malformed_payloads_are_skipped() {
    let rec = recording(vec![
        message_with(1, Duration::ZERO, json!({"content": "no role"})),
        message(2, "user", "hi", Duration::ZERO),
        message_with(3, Duration::ZERO, json!("not an object")),
        message(4, "assistant", "hello", Duration::ZERO),
    ]);
    let table = TurnTable::from_recording(&rec, None).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0).unwrap().preceding_user_content, "hi");
}

#[test]
fn test_tool_calls_and_parts_carried() {
    let rec = recording(vec![
        message(1, "user", "weather?", Duration::ZERO),
        message_with(
            2,
            Duration::ZERO,
            json!({
                "role": "assistant",
                "content": "",
                "tool_calls": [{"id": "c1", "name": "get_weather", "args": {"city": "Oslo"}}],
                "parts": [{"type": "audio", "media": {"mime_type": "audio/wav", "data": "AAEC"}}]
            }),
        ),
    ]);
    let table = TurnTable::from_recording(&rec, None).unwrap();
    let turn = table.get(0).unwrap();
    assert_eq!(turn.tool_calls.len(), 1);
    assert_eq!(turn.tool_calls[0].name, "get_weather");
    assert_eq!(turn.media_parts.len(), 1);
    assert!(turn.media_parts[0].is_media());
}

#[test]
fn test_content_index_last_occurrence_wins() {
    let rec = conversation(
        &[("hello", "first"), ("other", "second"), ("hello", "third")],
        SEC,
    );
    let table = TurnTable::from_recording(&rec, None).unwrap();
    assert_eq!(table.lookup("hello"), Some(2));
    assert_eq!(table.lookup("other"), Some(1));
    assert_eq!(table.lookup("missing"), None);
}

#[test]
fn test_content_index_trims_whitespace() {
    let rec = conversation(&[("  spaced out \n", "ok")], SEC);
    let table = TurnTable::from_recording(&rec, None).unwrap();
    assert_eq!(table.lookup("spaced out"), Some(0));
    assert_eq!(table.lookup("\tspaced out  "), Some(0));
}

#[test]
fn test_gap_before_uses_recorded_offsets() {
    let rec = recording(vec![
        message(1, "assistant", "a", Duration::from_millis(500)),
        message(2, "assistant", "b", Duration::from_millis(2000)),
        message(3, "assistant", "c", Duration::from_millis(1500)),
    ]);
    let table = TurnTable::from_recording(&rec, None).unwrap();
    assert_eq!(table.gap_before(0), Duration::ZERO);
    assert_eq!(table.gap_before(1), Duration::from_millis(1500));
    // Out-of-order offsets saturate rather than go negative
    assert_eq!(table.gap_before(2), Duration::ZERO);
    assert_eq!(table.gap_before(9), Duration::ZERO);
}

#[test]
fn test_arena_messages_filter_to_assistant() {
    let messages = vec![
        ArenaMessage {
            role: "system".to_string(),
            content: "be brief".to_string(),
            ..Default::default()
        },
        ArenaMessage {
            role: "user".to_string(),
            content: "hi".to_string(),
            ..Default::default()
        },
        ArenaMessage {
            role: "assistant".to_string(),
            content: "hello".to_string(),
            ..Default::default()
        },
        ArenaMessage {
            role: "assistant".to_string(),
            content: "again".to_string(),
            meta: [("finish_reason".to_string(), json!("length"))].into(),
            ..Default::default()
        },
    ];
    let table = TurnTable::from_arena_messages(&messages, Some(PathBuf::from("/runs"))).unwrap();

    assert_eq!(table.len(), 2);
    assert!(!table.has_content_index());
    assert_eq!(table.get(1).unwrap().finish_reason.as_deref(), Some("length"));
    assert_eq!(table.get(1).unwrap().offset, ARENA_TURN_SPACING);
    assert_eq!(table.base_dir(), Some(std::path::Path::new("/runs")));
}

#[test]
fn test_arena_without_assistant_fails_construction() {
    let messages = vec![ArenaMessage {
        role: "user".to_string(),
        content: "hi".to_string(),
        ..Default::default()
    }];
    let err = TurnTable::from_arena_messages(&messages, None).unwrap_err();
    assert!(matches!(err, ReplayError::Construction(_)));
}
