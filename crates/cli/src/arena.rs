// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Arena run output as a replay source.
//!
//! An arena output is a flat message list rather than an event log. Its
//! assistant messages feed the same duplex session machinery as recordings,
//! with sequential matching only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::MatchMode;
use crate::error::ReplayError;
use crate::media::{ContentPart, CONTENT_TYPE_AUDIO};
use crate::session::{
    replay_capabilities, StreamInputSession, StreamInputSupport, StreamingCapabilities,
};
use crate::settings::ReplaySettings;
use crate::stream::StreamSession;
use crate::turns::TurnTable;
use crate::types::CostInfo;

/// Message as written by an arena run
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ArenaMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_info: Option<CostInfo>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, serde_json::Value>,
}

impl ArenaMessage {
    /// Finish reason recorded under `meta.finish_reason`
    pub fn finish_reason(&self) -> Option<&str> {
        self.meta.get("finish_reason").and_then(|v| v.as_str())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ArenaParams {
    #[serde(default)]
    pub system_prompt: String,
}

/// Arena run output document
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ArenaOutput {
    #[serde(rename = "RunID", default)]
    pub run_id: String,
    #[serde(rename = "ScenarioID", default)]
    pub scenario_id: String,
    #[serde(rename = "ProviderID", default)]
    pub provider_id: String,
    #[serde(default)]
    pub messages: Vec<ArenaMessage>,
    #[serde(default)]
    pub params: ArenaParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl ArenaOutput {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let data = std::fs::read_to_string(path).map_err(|e| ReplayError::load(path, e))?;
        serde_json::from_str(&data).map_err(|e| ReplayError::load(path, e))
    }
}

/// Stream provider replaying an arena output
pub struct ArenaProvider {
    output: ArenaOutput,
    table: Arc<TurnTable>,
    settings: ReplaySettings,
}

impl ArenaProvider {
    pub const ID: &'static str = "replay-arena";

    /// Load an arena output file; media references resolve against its directory.
    pub fn from_file(path: &Path, settings: ReplaySettings) -> Result<Self, ReplayError> {
        let output = ArenaOutput::load(path)?;
        Self::new(output, path.parent().map(Path::to_path_buf), settings)
    }

    pub fn new(
        output: ArenaOutput,
        base_dir: Option<PathBuf>,
        mut settings: ReplaySettings,
    ) -> Result<Self, ReplayError> {
        if output.messages.is_empty() {
            return Err(ReplayError::Construction(
                "arena output contains no messages".to_string(),
            ));
        }
        let table = TurnTable::from_arena_messages(&output.messages, base_dir)?;

        if settings.config.match_mode != MatchMode::Sequential {
            debug!("arena replay supports sequential matching only");
            settings.config.match_mode = MatchMode::Sequential;
        }

        Ok(Self {
            output,
            table: Arc::new(table),
            settings,
        })
    }

    pub fn output(&self) -> &ArenaOutput {
        &self.output
    }

    pub fn table(&self) -> &TurnTable {
        &self.table
    }

    pub fn turn_count(&self) -> usize {
        self.table.len()
    }

    /// Open a concrete session over this provider's turns
    pub fn open_session(&self) -> StreamSession {
        StreamSession::new(Arc::clone(&self.table), self.settings.clone())
    }
}

impl StreamInputSupport for ArenaProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn create_stream_session(&self) -> Result<Arc<dyn StreamInputSession>, ReplayError> {
        Ok(Arc::new(self.open_session()))
    }

    fn supported_input_media(&self) -> Vec<String> {
        vec![CONTENT_TYPE_AUDIO.to_string()]
    }

    fn capabilities(&self) -> StreamingCapabilities {
        replay_capabilities()
    }
}

#[cfg(test)]
#[path = "arena_tests.rs"]
mod tests;
