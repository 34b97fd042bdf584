// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session recordings: ordered, typed events captured from a live session.

mod format;
pub(crate) mod nanos;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::ReplayError;
use crate::media::ContentPart;
use crate::types::{CostInfo, ToolCall};

pub use format::RecordingFormat;

/// Current recording format version
pub const RECORDING_VERSION: &str = "1.0";

/// Self-contained artifact for replay
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SessionRecording {
    pub metadata: Metadata,
    #[serde(default)]
    pub events: Vec<RecordedEvent>,
}

/// Session-level information
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Metadata {
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: DateTime<Utc>,
    #[serde(default, with = "nanos")]
    pub duration: Duration,
    #[serde(default)]
    pub event_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom: HashMap<String, serde_json::Value>,
}

/// Kind of a recorded event.
///
/// Only the kinds the turn indexer consumes are named; everything else is
/// carried through as [`EventKind::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    MessageCreated,
    ProviderCallCompleted,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::MessageCreated => "message.created",
            Self::ProviderCallCompleted => "provider.call.completed",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "message.created" => Self::MessageCreated,
            "provider.call.completed" => Self::ProviderCallCompleted,
            _ => Self::Other(name),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// An event plus recording-specific placement data
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RecordedEvent {
    #[serde(rename = "seq")]
    pub sequence: i64,
    #[serde(rename = "parent_seq", default, skip_serializing_if = "Option::is_none")]
    pub parent_sequence: Option<i64>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    /// Time since session start
    #[serde(default, with = "nanos")]
    pub offset: Duration,
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl RecordedEvent {
    /// Decode the payload according to the event kind.
    ///
    /// Returns `None` for kinds the replay engine ignores and for payloads
    /// that fail to parse.
    pub fn payload(&self) -> Option<EventPayload> {
        match self.kind {
            EventKind::MessageCreated => serde_json::from_value(self.data.clone())
                .ok()
                .map(EventPayload::Message),
            EventKind::ProviderCallCompleted => serde_json::from_value(self.data.clone())
                .ok()
                .map(EventPayload::ProviderCall),
            EventKind::Other(_) => None,
        }
    }
}

/// Typed payload of a recorded event
#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
    Message(MessageCreatedData),
    ProviderCall(ProviderCallCompletedData),
}

/// Payload of a `message.created` event
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MessageCreatedData {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

/// Payload of a `provider.call.completed` event
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ProviderCallCompletedData {
    #[serde(default, with = "nanos")]
    pub duration: Duration,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cached_tokens: u64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl ProviderCallCompletedData {
    pub fn cost_info(&self) -> CostInfo {
        CostInfo {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            cached_tokens: self.cached_tokens,
            total_cost: self.cost,
        }
    }
}

impl SessionRecording {
    /// Read a recording from a file in any supported encoding.
    ///
    /// Supports a single JSON document, JSONL with a metadata header line,
    /// and event-store JSONL (`{"seq":N,"event":{...}}` per line).
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let data = std::fs::read_to_string(path).map_err(|e| ReplayError::load(path, e))?;
        format::parse(&data).map_err(|e| ReplayError::load(path, e))
    }

    /// Write the recording to a file.
    pub fn save_to(&self, path: &Path, format: RecordingFormat) -> Result<(), ReplayError> {
        let data = format::encode(self, format).map_err(|e| ReplayError::load(path, e))?;
        std::fs::write(path, data).map_err(|e| ReplayError::load(path, e))
    }

    pub fn duration(&self) -> Duration {
        self.metadata.duration
    }
}

impl std::fmt::Display for SessionRecording {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SessionRecording{{session={}, events={}, duration={:?}}}",
            self.metadata.session_id, self.metadata.event_count, self.metadata.duration
        )
    }
}

/// Source of session recordings
pub trait RecordingLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<SessionRecording, ReplayError>;
}

/// Loads recordings from the local filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct FileRecordingLoader;

impl RecordingLoader for FileRecordingLoader {
    fn load(&self, path: &Path) -> Result<SessionRecording, ReplayError> {
        SessionRecording::load(path)
    }
}

#[cfg(test)]
#[path = "recording_tests.rs"]
mod tests;
