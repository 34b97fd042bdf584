// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk encodings of session recordings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventKind, Metadata, RecordedEvent, SessionRecording, RECORDING_VERSION};

/// Recording file encoding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingFormat {
    /// One JSON document (human-readable)
    #[default]
    Json,
    /// Metadata line followed by one event per line
    #[serde(rename = "jsonl")]
    JsonLines,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RecordingLine {
    Metadata { metadata: Box<Metadata> },
    Event { event: Box<RecordedEvent> },
}

/// Line shape written by an event store: `{"seq":N,"parent_id":M,"event":{...}}`
#[derive(Deserialize)]
struct StoredEventLine {
    seq: i64,
    #[serde(default)]
    parent_id: Option<i64>,
    event: StoredEvent,
}

#[derive(Deserialize)]
struct StoredEvent {
    #[serde(rename = "type")]
    kind: EventKind,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    run_id: Option<String>,
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    data_type: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct StoreProbe {
    #[serde(default)]
    seq: i64,
    #[serde(default)]
    event: Option<serde_json::Value>,
}

pub(super) fn parse(data: &str) -> Result<SessionRecording, String> {
    if let Ok(rec) = serde_json::from_str::<SessionRecording>(data) {
        if !rec.metadata.version.is_empty() {
            return Ok(rec);
        }
    }

    let lines: Vec<(usize, &str)> = data
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();
    let Some((_, first)) = lines.first() else {
        return Err("empty recording file".to_string());
    };

    let is_store_format = serde_json::from_str::<StoreProbe>(first)
        .is_ok_and(|probe| probe.seq > 0 && probe.event.is_some());
    if is_store_format {
        parse_event_store_lines(&lines)
    } else {
        parse_recording_lines(&lines)
    }
}

fn parse_recording_lines(lines: &[(usize, &str)]) -> Result<SessionRecording, String> {
    let mut rec = SessionRecording::default();
    for (idx, line) in lines {
        let parsed: RecordingLine =
            serde_json::from_str(line).map_err(|e| format!("parse line {}: {}", idx + 1, e))?;
        match parsed {
            RecordingLine::Metadata { metadata } => rec.metadata = *metadata,
            RecordingLine::Event { event } => rec.events.push(*event),
        }
    }

    if rec.metadata.version.is_empty() {
        return Err("invalid recording: missing metadata".to_string());
    }
    Ok(rec)
}

fn parse_event_store_lines(lines: &[(usize, &str)]) -> Result<SessionRecording, String> {
    let mut rec = SessionRecording {
        metadata: Metadata {
            version: RECORDING_VERSION.to_string(),
            ..Default::default()
        },
        events: Vec::with_capacity(lines.len()),
    };
    let mut start: Option<DateTime<Utc>> = None;
    let mut end: Option<DateTime<Utc>> = None;

    for (idx, line) in lines {
        let stored: StoredEventLine =
            serde_json::from_str(line).map_err(|e| format!("parse line {}: {}", idx + 1, e))?;
        let e = stored.event;

        start = Some(start.map_or(e.timestamp, |s| s.min(e.timestamp)));
        end = Some(end.map_or(e.timestamp, |s| s.max(e.timestamp)));

        if rec.metadata.session_id.is_empty() && !e.session_id.is_empty() {
            rec.metadata.session_id = e.session_id.clone();
        }
        if rec.metadata.conversation_id.is_none() {
            rec.metadata.conversation_id = e.conversation_id.clone();
        }

        rec.events.push(RecordedEvent {
            sequence: stored.seq,
            parent_sequence: stored.parent_id,
            kind: e.kind,
            timestamp: e.timestamp,
            offset: Default::default(),
            session_id: e.session_id,
            conversation_id: e.conversation_id,
            run_id: e.run_id,
            data_type: e.data_type,
            data: e.data,
        });
    }

    let (Some(start), Some(end)) = (start, end) else {
        return Err("no events found in recording".to_string());
    };
    rec.metadata.start_time = start;
    rec.metadata.end_time = end;
    rec.metadata.duration = (end - start).to_std().unwrap_or_default();
    rec.metadata.event_count = rec.events.len();
    rec.metadata.created_at = Utc::now();
    for event in &mut rec.events {
        event.offset = (event.timestamp - start).to_std().unwrap_or_default();
    }
    Ok(rec)
}

pub(super) fn encode(rec: &SessionRecording, format: RecordingFormat) -> Result<String, String> {
    match format {
        RecordingFormat::Json => serde_json::to_string_pretty(rec).map_err(|e| e.to_string()),
        RecordingFormat::JsonLines => {
            let mut out = String::new();
            let header = RecordingLine::Metadata {
                metadata: Box::new(rec.metadata.clone()),
            };
            out.push_str(&serde_json::to_string(&header).map_err(|e| e.to_string())?);
            out.push('\n');
            for event in &rec.events {
                let line = RecordingLine::Event {
                    event: Box::new(event.clone()),
                };
                out.push_str(&serde_json::to_string(&line).map_err(|e| e.to_string())?);
                out.push('\n');
            }
            Ok(out)
        }
    }
}
