// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Turn table construction.
//!
//! A turn is one recorded assistant response together with the user content
//! that preceded it. Turn tables are immutable once built; all replay state
//! lives in the cursor owned by whoever selects from the table.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::arena::ArenaMessage;
use crate::error::ReplayError;
use crate::media::ContentPart;
use crate::recording::{EventKind, EventPayload, SessionRecording};
use crate::types::{CostInfo, ToolCall, ROLE_ASSISTANT, ROLE_USER};

/// Spacing between arena turns, which carry no timestamps of their own
pub const ARENA_TURN_SPACING: Duration = Duration::from_millis(100);

/// One replayable assistant response
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Turn {
    /// Position in the table, stable for sequential matching
    pub ordinal: usize,
    /// Sequence number of the event this turn was built from
    pub source_sequence: Option<i64>,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub cost_info: Option<CostInfo>,
    /// Recorded finish reason overriding the default
    pub finish_reason: Option<String>,
    /// Recorded provider-call latency
    pub latency: Option<Duration>,
    pub media_parts: Vec<ContentPart>,
    pub preceding_user_content: String,
    /// Time since session start
    pub offset: Duration,
}

/// Ordered turns plus the content lookup used for content matching
#[derive(Clone, Debug, Default)]
pub struct TurnTable {
    turns: Vec<Turn>,
    content_index: HashMap<String, usize>,
    base_dir: Option<PathBuf>,
}

/// Key under which preceding user content is indexed
pub fn normalize_content(content: &str) -> &str {
    content.trim()
}

impl TurnTable {
    /// Index a session recording.
    ///
    /// Events are walked once in sequence order. A `provider.call.completed`
    /// event attaches its cost to the most recent turn that has not yet
    /// received one; with no such turn it is ignored.
    pub fn from_recording(
        recording: &SessionRecording,
        base_dir: Option<PathBuf>,
    ) -> Result<Self, ReplayError> {
        let mut events: Vec<_> = recording.events.iter().collect();
        events.sort_by_key(|e| e.sequence);

        let mut table = Self {
            base_dir,
            ..Default::default()
        };
        let mut last_user_content = String::new();
        let mut pending: Option<usize> = None;

        for event in events {
            if matches!(event.kind, EventKind::Other(_)) {
                continue;
            }
            let Some(payload) = event.payload() else {
                warn!(
                    seq = event.sequence,
                    kind = event.kind.as_str(),
                    "skipping malformed event payload"
                );
                continue;
            };

            match payload {
                EventPayload::Message(msg) if msg.role == ROLE_USER => {
                    last_user_content = msg.content;
                }
                EventPayload::Message(msg) if msg.role == ROLE_ASSISTANT => {
                    let ordinal = table.turns.len();
                    table.index_content(&last_user_content, ordinal);
                    table.turns.push(Turn {
                        ordinal,
                        source_sequence: Some(event.sequence),
                        content: msg.content,
                        tool_calls: msg.tool_calls,
                        media_parts: msg.parts,
                        preceding_user_content: last_user_content.clone(),
                        offset: event.offset,
                        ..Default::default()
                    });
                    pending = Some(ordinal);
                }
                EventPayload::Message(_) => {}
                EventPayload::ProviderCall(call) => {
                    let Some(ordinal) = pending.take() else {
                        continue;
                    };
                    if let Some(turn) = table.turns.get_mut(ordinal) {
                        turn.cost_info = Some(call.cost_info());
                        turn.latency = Some(call.duration);
                        turn.finish_reason = call.finish_reason;
                    }
                }
            }
        }

        if table.turns.is_empty() {
            return Err(ReplayError::Construction(
                "no assistant responses found in recording".to_string(),
            ));
        }
        debug!(
            turns = table.turns.len(),
            indexed = table.content_index.len(),
            "indexed recording"
        );
        Ok(table)
    }

    /// Build a table from arena messages.
    ///
    /// Only assistant messages become turns. No content index is built, so
    /// arena tables support sequential matching only.
    pub fn from_arena_messages(
        messages: &[ArenaMessage],
        base_dir: Option<PathBuf>,
    ) -> Result<Self, ReplayError> {
        let turns: Vec<Turn> = messages
            .iter()
            .filter(|m| m.role == ROLE_ASSISTANT)
            .enumerate()
            .map(|(ordinal, msg)| Turn {
                ordinal,
                content: msg.content.clone(),
                cost_info: msg.cost_info.clone(),
                finish_reason: msg.finish_reason().map(str::to_string),
                media_parts: msg.parts.clone(),
                offset: ARENA_TURN_SPACING * ordinal as u32,
                ..Default::default()
            })
            .collect();

        if turns.is_empty() {
            return Err(ReplayError::Construction(
                "no assistant messages found for replay".to_string(),
            ));
        }
        Ok(Self {
            turns,
            content_index: HashMap::new(),
            base_dir,
        })
    }

    /// Last occurrence wins on duplicate content.
    fn index_content(&mut self, user_content: &str, ordinal: usize) {
        let key = normalize_content(user_content);
        if !key.is_empty() {
            self.content_index.insert(key.to_string(), ordinal);
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Turn> {
        self.turns.get(ordinal)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Ordinal of the turn recorded after the given user content
    pub fn lookup(&self, user_content: &str) -> Option<usize> {
        self.content_index
            .get(normalize_content(user_content))
            .copied()
    }

    pub fn has_content_index(&self) -> bool {
        !self.content_index.is_empty()
    }

    /// Directory external media references are resolved against
    pub fn base_dir(&self) -> Option<&std::path::Path> {
        self.base_dir.as_deref()
    }

    /// Recorded gap between a turn and the one before it.
    ///
    /// Zero for the first turn and for out-of-range ordinals.
    pub fn gap_before(&self, ordinal: usize) -> Duration {
        if ordinal == 0 {
            return Duration::ZERO;
        }
        match (self.turns.get(ordinal), self.turns.get(ordinal - 1)) {
            (Some(turn), Some(prev)) => turn.offset.saturating_sub(prev.offset),
            _ => Duration::ZERO,
        }
    }
}

#[cfg(test)]
#[path = "turns_tests.rs"]
mod tests;
