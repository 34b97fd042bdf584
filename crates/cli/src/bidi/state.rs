// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation state persistence for bidirectional sessions.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ReplayError, Result};
use crate::types::Message;

/// Persisted state of one conversation
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ConversationState {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ConversationState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load a conversation; `None` when it does not exist
    async fn load(&self, id: &str) -> Result<Option<ConversationState>>;

    /// Insert or replace a conversation
    async fn save(&self, state: ConversationState) -> Result<()>;

    /// Copy a conversation under a new id
    async fn fork(&self, source_id: &str, fork_id: &str) -> Result<()>;
}

/// In-process state store
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: RwLock<HashMap<String, ConversationState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, id: &str) -> Result<Option<ConversationState>> {
        Ok(self.states.read().get(id).cloned())
    }

    async fn save(&self, state: ConversationState) -> Result<()> {
        self.states.write().insert(state.id.clone(), state);
        Ok(())
    }

    async fn fork(&self, source_id: &str, fork_id: &str) -> Result<()> {
        let mut states = self.states.write();
        let Some(source) = states.get(source_id) else {
            return Err(ReplayError::State(format!(
                "conversation '{source_id}' not found"
            )));
        };
        let forked = ConversationState {
            id: fork_id.to_string(),
            ..source.clone()
        };
        states.insert(fork_id.to_string(), forked);
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
