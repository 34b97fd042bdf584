// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Implementations of the `play` and `inspect` commands.

use serde::Serialize;
use std::io::Write;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use replaykit_capture::CaptureLog;

use crate::arena::ArenaProvider;
use crate::cli::{PlayArgs, SourceArgs};
use crate::config::{ReplayOptions, SourceFormat};
use crate::error::ReplayError;
use crate::output::write_json_line;
use crate::provider::ReplayProvider;
use crate::session::StreamInputSession;
use crate::settings::ReplaySettings;
use crate::stream::StreamSession;
use crate::turns::TurnTable;

/// Characters of turn content shown by `inspect`
const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Open a duplex session over the configured source.
fn open_session(
    options: &ReplayOptions,
    settings: ReplaySettings,
) -> Result<StreamSession, ReplayError> {
    let session = match options.format {
        SourceFormat::Recording => {
            ReplayProvider::from_file(&options.path, settings)?.open_session()
        }
        SourceFormat::Arena => ArenaProvider::from_file(&options.path, settings)?.open_session(),
    };
    Ok(session)
}

fn load_table(options: &ReplayOptions) -> Result<TurnTable, ReplayError> {
    let settings = ReplaySettings::new(options.config);
    let table = match options.format {
        SourceFormat::Recording => ReplayProvider::from_file(&options.path, settings)?
            .table()
            .clone(),
        SourceFormat::Arena => ArenaProvider::from_file(&options.path, settings)?
            .table()
            .clone(),
    };
    Ok(table)
}

/// Replay a source, writing every output chunk as a JSON line.
///
/// Each `--text` is sent in order; without any, every turn is triggered in
/// turn. Returns the number of chunks written.
pub async fn run_play<W: Write>(args: &PlayArgs, out: &mut W) -> Result<usize, CommandError> {
    let options = args.resolve()?;
    let mut settings = ReplaySettings::new(options.config);
    if let Some(path) = &args.capture {
        let log = CaptureLog::with_file(path).map_err(|e| ReplayError::load(path, e))?;
        settings = settings.with_capture(log);
    }

    let session = open_session(&options, settings)?;
    let Some(mut rx) = session.response() else {
        return Err(ReplayError::SessionClosed.into());
    };
    info!(path = %options.path.display(), turns = session.remaining_turns(), "replaying");

    let cancel = CancellationToken::new();
    let producer = async {
        let result = if args.texts.is_empty() {
            trigger_all(&session, &cancel).await
        } else {
            send_all(&session, &args.texts, &cancel).await
        };
        session.close().await?;
        result
    };
    let consumer = async {
        let mut written = 0;
        let mut failure = None;
        while let Some(chunk) = rx.recv().await {
            if failure.is_some() {
                continue;
            }
            match write_json_line(&mut *out, &chunk) {
                Ok(()) => written += 1,
                Err(e) => failure = Some(e),
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(written),
        }
    };

    let (produced, consumed) = tokio::join!(producer, consumer);
    produced?;
    Ok(consumed?)
}

async fn trigger_all(
    session: &StreamSession,
    cancel: &CancellationToken,
) -> Result<(), ReplayError> {
    while session.remaining_turns() > 0 {
        session.trigger_next_response(cancel).await?;
    }
    Ok(())
}

async fn send_all(
    session: &StreamSession,
    texts: &[String],
    cancel: &CancellationToken,
) -> Result<(), ReplayError> {
    for text in texts {
        session.send_text(text, cancel).await?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct TurnSummary<'a> {
    ordinal: usize,
    offset_ms: u64,
    user_content: &'a str,
    content: String,
    media_parts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<f64>,
}

/// Write one summary line per turn. Returns the number of turns.
pub fn run_inspect<W: Write>(args: &SourceArgs, out: &mut W) -> Result<usize, CommandError> {
    let options = args.resolve()?;
    let table = load_table(&options)?;
    for turn in table.turns() {
        let summary = TurnSummary {
            ordinal: turn.ordinal,
            offset_ms: turn.offset.as_millis() as u64,
            user_content: &turn.preceding_user_content,
            content: preview(&turn.content),
            media_parts: turn.media_parts.iter().filter(|p| p.is_media()).count(),
            cost: turn.cost_info.as_ref().map(|c| c.total_cost),
        };
        write_json_line(out, &summary)?;
    }
    Ok(table.len())
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
