// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{MatchMode, ReplayOptions, SourceFormat, TimingMode};
use crate::error::ReplayError;

/// Replay recorded provider sessions
#[derive(Parser, Debug)]
#[command(
    name = "replaykit",
    version,
    about = "Deterministic replay of recorded provider sessions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging on stderr
    #[arg(long, global = true, env = "REPLAYKIT_DEBUG")]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a recording and print each output chunk as a JSON line
    Play(PlayArgs),
    /// Print the turn table of a recording as JSON lines
    Inspect(SourceArgs),
}

/// Replay source selection
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Recording or arena output file
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Source format
    #[arg(long, value_enum)]
    pub format: Option<SourceFormat>,

    /// Options file (TOML or JSON) naming the source and replay settings
    #[arg(long, value_name = "PATH", env = "REPLAYKIT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PlayArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Timing mode
    #[arg(long, value_enum)]
    pub timing: Option<TimingMode>,

    /// Speed multiplier for accelerated timing
    #[arg(long)]
    pub speed: Option<f64>,

    /// Turn matching mode
    #[arg(long = "match", value_enum)]
    pub match_mode: Option<MatchMode>,

    /// Text input to send (repeatable); without it every turn is replayed
    #[arg(long = "text", value_name = "TEXT")]
    pub texts: Vec<String>,

    /// Append one JSON line per delivery to this file
    #[arg(long, value_name = "PATH")]
    pub capture: Option<PathBuf>,
}

impl SourceArgs {
    /// Resolve options from the options file and the positional file.
    ///
    /// The positional file and `--format` override the options file.
    pub fn resolve(&self) -> Result<ReplayOptions, ReplayError> {
        let mut options = match (&self.config, &self.file) {
            (Some(config), _) => ReplayOptions::load(config)?,
            (None, Some(file)) => ReplayOptions::new(file),
            (None, None) => {
                return Err(ReplayError::InvalidInput(
                    "a recording file or --config is required".to_string(),
                ))
            }
        };
        if let Some(file) = &self.file {
            options.path = file.clone();
        }
        if let Some(format) = self.format {
            options.format = format;
        }
        Ok(options)
    }
}

impl PlayArgs {
    /// Resolve options, applying timing and matching flags on top.
    pub fn resolve(&self) -> Result<ReplayOptions, ReplayError> {
        let mut options = self.source.resolve()?;
        if let Some(timing) = self.timing {
            options.config.timing = timing;
        }
        if let Some(speed) = self.speed {
            options.config.speed = speed;
        }
        if let Some(match_mode) = self.match_mode {
            options.config.match_mode = match_mode;
        }
        options.config.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
