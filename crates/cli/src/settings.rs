// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime settings shared by providers and the sessions they open.

use std::sync::Arc;

use replaykit_capture::CaptureLog;

use crate::config::ReplayConfig;
use crate::media::{FsMediaReader, MediaReader};
use crate::time::ClockHandle;

/// Config plus the collaborators a replay needs at runtime
#[derive(Clone)]
pub struct ReplaySettings {
    pub config: ReplayConfig,
    pub clock: ClockHandle,
    pub media_reader: Arc<dyn MediaReader>,
    pub capture: Option<CaptureLog>,
}

impl ReplaySettings {
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            config,
            clock: ClockHandle::default(),
            media_reader: Arc::new(FsMediaReader),
            capture: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Into<ClockHandle>) -> Self {
        self.clock = clock.into();
        self
    }

    pub fn with_media_reader(mut self, reader: Arc<dyn MediaReader>) -> Self {
        self.media_reader = reader;
        self
    }

    pub fn with_capture(mut self, capture: CaptureLog) -> Self {
        self.capture = Some(capture);
        self
    }
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}

impl From<ReplayConfig> for ReplaySettings {
    fn from(config: ReplayConfig) -> Self {
        Self::new(config)
    }
}

impl std::fmt::Debug for ReplaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySettings")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("capture", &self.capture.is_some())
            .finish_non_exhaustive()
    }
}
