// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Chunk, media, and prediction types exchanged with providers.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::ReplayError;

/// Finish reason for a replayed turn without a recorded override
pub const FINISH_REASON_COMPLETE: &str = "complete";
/// Finish reason signalling no further turns (or a finished pull stream)
pub const FINISH_REASON_STOP: &str = "stop";
/// Finish reason attached to a terminal pipeline failure
pub const FINISH_REASON_ERROR: &str = "error";

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// Token usage and cost for one provider call
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CostInfo {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cached_tokens: u64,
    #[serde(default)]
    pub total_cost: f64,
}

/// Tool call carried by an assistant message
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Conversation message handed to a pull-style provider
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_ASSISTANT.to_string(),
            content: content.into(),
        }
    }
}

/// Request for a single pull-style prediction
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct PredictionRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub system: Option<String>,
}

impl PredictionRequest {
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            system: None,
        }
    }

    /// Content of the final message, used for content matching
    pub fn last_content(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

/// Result of a pull-style prediction
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct PredictionResponse {
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    pub cost_info: CostInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,
}

/// Media payload on an output chunk
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MediaContent {
    pub mime_type: String,
    #[serde(serialize_with = "serialize_base64")]
    pub data: Vec<u8>,
}

/// Raw media input sent to a duplex session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: Vec<u8>,
    pub sequence: u64,
}

/// One record on a duplex response channel
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct StreamChunk {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub delta: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_info: Option<CostInfo>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<ReplayError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<Box<PredictionResponse>>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl StreamChunk {
    /// Text content chunk
    pub fn text(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            delta: content.clone(),
            content,
            ..Default::default()
        }
    }

    /// Media chunk
    pub fn media(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media: Some(MediaContent {
                mime_type: mime_type.into(),
                data,
            }),
            ..Default::default()
        }
    }

    /// Chunk carrying only a finish reason
    pub fn finished(reason: impl Into<String>) -> Self {
        Self {
            finish_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Terminal error chunk
    pub fn failed(error: ReplayError) -> Self {
        Self {
            finish_reason: Some(FINISH_REASON_ERROR.to_string()),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn with_cost(mut self, cost: Option<CostInfo>) -> Self {
        self.cost_info = cost;
        self
    }

    /// Whether the chunk ends a turn (or the whole stream)
    pub fn is_terminal(&self) -> bool {
        self.finish_reason.is_some()
    }
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    use base64::Engine as _;
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
}

fn serialize_error<S: Serializer>(
    error: &Option<ReplayError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}
