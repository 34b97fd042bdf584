// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inter-turn pacing measured on the recording's own clock.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{ReplayConfig, TimingMode};
use crate::error::ReplayError;
use crate::time::Clock;
use crate::turns::TurnTable;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingEngine {
    mode: TimingMode,
    speed: f64,
}

impl TimingEngine {
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            mode: config.timing,
            speed: config.speed,
        }
    }

    /// Delay before emitting the given turn.
    ///
    /// Depends only on recorded offsets, never on how quickly earlier turns
    /// were consumed. A non-positive speed disables acceleration.
    pub fn delay_for(&self, table: &TurnTable, ordinal: usize) -> Duration {
        match self.mode {
            TimingMode::Instant => Duration::ZERO,
            TimingMode::RealTime => table.gap_before(ordinal),
            TimingMode::Accelerated => {
                let gap = table.gap_before(ordinal);
                if self.speed > 0.0 && self.speed.is_finite() {
                    Duration::try_from_secs_f64(gap.as_secs_f64() / self.speed)
                        .unwrap_or(Duration::MAX)
                } else {
                    gap
                }
            }
        }
    }

    /// Wait out a delay unless `cancel` fires first.
    pub async fn wait(
        &self,
        clock: &dyn Clock,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), ReplayError> {
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ReplayError::Cancelled),
            _ = clock.sleep(delay) => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "timing_tests.rs"]
mod tests;
