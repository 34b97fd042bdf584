// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared by providers, sessions, and the registry.

use thiserror::Error;

/// Errors produced by the replay runtime.
///
/// Construction failures abort creation and are never retried. Everything
/// else is returned to the immediate caller and leaves the session usable.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ReplayError {
    #[error("construction failed: {0}")]
    Construction(String),

    #[error("failed to load '{path}': {message}")]
    Load { path: String, message: String },

    #[error("replay exhausted: no more recorded responses (turn {turn})")]
    Exhausted { turn: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("session is closed")]
    SessionClosed,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to load media from {origin}: {message}")]
    Media { origin: String, message: String },

    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("state store error: {0}")]
    State(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ReplayError {
    pub(crate) fn load(path: impl AsRef<std::path::Path>, message: impl ToString) -> Self {
        Self::Load {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// True when a pull-style selection ran past the last turn.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// True when a wait or send was interrupted by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ReplayError> = std::result::Result<T, E>;
