// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Captured delivery data types.

use super::duration_serde;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// One turn-selection outcome as observed by a replay provider or session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapturedDelivery {
    /// Sequence number
    pub seq: u64,

    /// Wall-clock timestamp
    pub timestamp: SystemTime,

    /// Elapsed time since capture started
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,

    /// What asked for the turn
    pub request: CapturedRequest,

    /// What the selector resolved to
    pub outcome: CapturedOutcome,
}

/// How the turn was requested
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStyle {
    /// Caller waits for the turn and gets an error on exhaustion
    Pull,
    /// Turn is pushed onto a response channel; exhaustion is a terminal chunk
    Push,
}

/// Captured request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapturedRequest {
    pub style: RequestStyle,
    /// User content used for content matching, if any
    pub content: Option<String>,
}

impl CapturedRequest {
    pub fn pull(content: Option<&str>) -> Self {
        Self {
            style: RequestStyle::Pull,
            content: content.map(str::to_string),
        }
    }

    pub fn push(content: Option<&str>) -> Self {
        Self {
            style: RequestStyle::Push,
            content: content.map(str::to_string),
        }
    }
}

/// Captured outcome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CapturedOutcome {
    Delivered {
        ordinal: usize,
        content: String,
        delay_ms: u64,
    },
    Exhausted {
        turn: usize,
    },
    Cancelled {
        ordinal: usize,
    },
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
