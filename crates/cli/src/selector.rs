// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Turn selection.
//!
//! Content matching overrides *which* turn is returned on a hit. It never
//! touches the cursor on a hit, and a miss consumes a cursor slot exactly
//! like sequential matching.

use tracing::debug;

use crate::config::MatchMode;
use crate::error::ReplayError;
use crate::turns::TurnTable;

/// Next sequential ordinal. Only moves forward, except on reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    next: usize,
}

impl Cursor {
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Turns not yet claimed sequentially
    pub fn remaining(&self, table: &TurnTable) -> usize {
        table.len().saturating_sub(self.next)
    }

    fn advance(&mut self) -> usize {
        let ordinal = self.next;
        self.next += 1;
        ordinal
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TurnSelector {
    mode: MatchMode,
}

impl TurnSelector {
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Resolve the next turn.
    ///
    /// Callers hold the lock guarding `cursor` for the whole call.
    pub fn select(
        &self,
        table: &TurnTable,
        cursor: &mut Cursor,
        content: Option<&str>,
    ) -> Result<usize, ReplayError> {
        let hit = match (self.mode, content) {
            (MatchMode::ContentMatch, Some(content)) => table.lookup(content),
            _ => None,
        };
        let ordinal = match hit {
            Some(ordinal) => ordinal,
            None => cursor.advance(),
        };

        if ordinal >= table.len() {
            return Err(ReplayError::Exhausted { turn: ordinal + 1 });
        }
        debug!(ordinal, content_hit = hit.is_some(), "selected turn");
        Ok(ordinal)
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
