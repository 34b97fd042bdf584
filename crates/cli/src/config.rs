// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Replay configuration types.
//!
//! Configuration arrives either as a typed [`ReplayConfig`], as a generic
//! key/value option map (`timing`, `speed`, `match`), or as a TOML/JSON
//! [`ReplayOptions`] file naming the recording to replay.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ReplayError;

/// Default playback speed multiplier for accelerated timing
pub const DEFAULT_SPEED: f64 = 2.0;

/// How response timing is reproduced during replay
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimingMode {
    /// Deliver responses immediately
    #[default]
    Instant,
    /// Preserve the recorded inter-turn gaps
    #[serde(rename = "realtime", alias = "real_time")]
    #[value(name = "realtime")]
    RealTime,
    /// Recorded gaps divided by the speed multiplier
    Accelerated,
}

/// How incoming requests are matched to recorded turns
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Recorded order via an advancing cursor
    #[default]
    #[serde(rename = "turn", alias = "sequential")]
    #[value(name = "turn")]
    Sequential,
    /// Look up by the triggering user content, falling back to order
    #[serde(rename = "content")]
    #[value(name = "content")]
    ContentMatch,
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

/// Replay configuration
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReplayConfig {
    #[serde(default)]
    pub timing: TimingMode,

    /// Multiplier for accelerated timing (default: 2.0)
    #[serde(default = "default_speed")]
    pub speed: f64,

    #[serde(default, rename = "match")]
    pub match_mode: MatchMode,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            timing: TimingMode::Instant,
            speed: DEFAULT_SPEED,
            match_mode: MatchMode::Sequential,
        }
    }
}

impl ReplayConfig {
    /// Build a config from a generic option map.
    ///
    /// Recognized keys are `timing`, `speed`, and `match`; other keys belong
    /// to the caller (e.g. `path`) and are ignored here.
    pub fn from_options(options: &HashMap<String, serde_json::Value>) -> Result<Self, ReplayError> {
        let mut map = serde_json::Map::new();
        for key in ["timing", "speed", "match"] {
            if let Some(value) = options.get(key) {
                map.insert(key.to_string(), value.clone());
            }
        }
        let config: Self = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| ReplayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject speeds that cannot be a playback multiplier.
    pub fn validate(&self) -> Result<(), ReplayError> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ReplayError::Config(format!(
                "speed must be a positive number, got {}",
                self.speed
            )));
        }
        Ok(())
    }

    pub fn with_timing(mut self, timing: TimingMode) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }
}

/// Input format of a replay source
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Event-sequence session recording
    #[default]
    Recording,
    /// Flat message list produced by an arena run
    Arena,
}

/// Options naming a replay source, as read from a TOML or JSON file
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReplayOptions {
    /// Recording or arena output file
    pub path: PathBuf,

    #[serde(default)]
    pub format: SourceFormat,

    #[serde(flatten)]
    pub config: ReplayConfig,
}

impl ReplayOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: SourceFormat::Recording,
            config: ReplayConfig::default(),
        }
    }

    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Load options from a TOML or JSON file.
    ///
    /// A relative `path` is resolved against the options file's directory.
    pub fn load(file: &Path) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(file).map_err(|e| ReplayError::load(file, e))?;
        let mut options: Self = if file.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content).map_err(|e| ReplayError::load(file, e))?
        } else {
            toml::from_str(&content).map_err(|e| ReplayError::load(file, e))?
        };
        options.config.validate()?;

        if options.path.is_relative() {
            let base = file.parent().unwrap_or(Path::new("."));
            options.path = base.join(&options.path);
        }
        Ok(options)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
