// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pull-style replay provider.
//!
//! Each prediction claims the next turn under the provider's cursor lock,
//! waits out the recorded pacing, and returns the recorded response.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use replaykit_capture::{CapturedOutcome, CapturedRequest};

use crate::error::{ReplayError, Result};
use crate::media::CONTENT_TYPE_AUDIO;
use crate::recording::{RecordingLoader, SessionRecording};
use crate::selector::{Cursor, TurnSelector};
use crate::session::{
    replay_capabilities, StreamInputSession, StreamInputSupport, StreamingCapabilities,
};
use crate::settings::ReplaySettings;
use crate::stream::StreamSession;
use crate::timing::TimingEngine;
use crate::turns::{Turn, TurnTable};
use crate::types::{
    CostInfo, PredictionRequest, PredictionResponse, StreamChunk, FINISH_REASON_STOP,
};

/// Characters per output token when a turn has no recorded usage
const CHARS_PER_TOKEN: u64 = 4;

/// Replays a session recording one prediction at a time
pub struct ReplayProvider {
    recording: Arc<SessionRecording>,
    table: Arc<TurnTable>,
    selector: TurnSelector,
    timing: TimingEngine,
    settings: ReplaySettings,
    cursor: Mutex<Cursor>,
}

impl ReplayProvider {
    pub const ID: &'static str = "replay";

    /// Build a provider from a recording already in memory.
    ///
    /// External media references resolve against the working directory.
    pub fn new(recording: Arc<SessionRecording>, settings: ReplaySettings) -> Result<Self> {
        Self::with_base_dir(recording, None, settings)
    }

    /// Load a recording file; media references resolve against its directory.
    pub fn from_file(path: &Path, settings: ReplaySettings) -> Result<Self> {
        Self::from_loader(&crate::recording::FileRecordingLoader, path, settings)
    }

    pub fn from_loader(
        loader: &dyn RecordingLoader,
        path: &Path,
        settings: ReplaySettings,
    ) -> Result<Self> {
        let recording = loader.load(path)?;
        Self::with_base_dir(
            Arc::new(recording),
            path.parent().map(Path::to_path_buf),
            settings,
        )
    }

    fn with_base_dir(
        recording: Arc<SessionRecording>,
        base_dir: Option<std::path::PathBuf>,
        settings: ReplaySettings,
    ) -> Result<Self> {
        let table = TurnTable::from_recording(&recording, base_dir)?;
        debug!(
            session = %recording.metadata.session_id,
            turns = table.len(),
            "replay provider ready"
        );
        Ok(Self {
            selector: TurnSelector::new(settings.config.match_mode),
            timing: TimingEngine::new(&settings.config),
            recording,
            table: Arc::new(table),
            settings,
            cursor: Mutex::new(Cursor::default()),
        })
    }

    pub fn recording(&self) -> &SessionRecording {
        &self.recording
    }

    pub fn table(&self) -> &TurnTable {
        &self.table
    }

    pub fn turn_count(&self) -> usize {
        self.table.len()
    }

    /// Next sequential ordinal (0-based)
    pub fn current_turn(&self) -> usize {
        self.cursor.lock().position()
    }

    /// Replay from the beginning
    pub fn reset(&self) {
        self.cursor.lock().reset();
    }

    /// Return the next recorded response.
    pub async fn predict(
        &self,
        request: &PredictionRequest,
        cancel: &CancellationToken,
    ) -> Result<PredictionResponse> {
        let turn = self.claim(request)?;
        self.pace(turn, request, cancel).await?;
        Ok(build_response(turn))
    }

    /// Return the next recorded response as a single-chunk stream.
    ///
    /// The turn is claimed before this returns, so exhaustion is reported
    /// here. The chunk is sent after the pacing delay; a cancelled wait
    /// closes the stream without a chunk.
    pub async fn predict_stream(
        &self,
        request: &PredictionRequest,
        cancel: &CancellationToken,
    ) -> Result<mpsc::Receiver<StreamChunk>> {
        let turn = self.claim(request)?.clone();
        let (tx, rx) = mpsc::channel(1);

        let timing = self.timing;
        let delay = timing.delay_for(&self.table, turn.ordinal);
        let clock = self.settings.clock.clone();
        let capture = self.settings.capture.clone();
        let captured = CapturedRequest::pull(request.last_content());
        let cancel = cancel.clone();

        tokio::spawn(async move {
            if timing.wait(&clock, delay, &cancel).await.is_err() {
                if let Some(log) = &capture {
                    let outcome = CapturedOutcome::Cancelled {
                        ordinal: turn.ordinal,
                    };
                    log.record(captured, outcome);
                }
                return;
            }
            if let Some(log) = &capture {
                log.record(captured, delivered(&turn, delay));
            }

            let response = build_response(&turn);
            let chunk = StreamChunk {
                finish_reason: Some(FINISH_REASON_STOP.to_string()),
                cost_info: Some(response.cost_info.clone()),
                final_result: Some(Box::new(response)),
                ..StreamChunk::text(turn.content.clone())
            };
            if tx.send(chunk).await.is_err() {
                debug!(ordinal = turn.ordinal, "prediction stream receiver dropped");
            }
        });
        Ok(rx)
    }

    /// Replays incur no cost.
    pub fn calculate_cost(
        &self,
        input_tokens: u64,
        output_tokens: u64,
        cached_tokens: u64,
    ) -> CostInfo {
        CostInfo {
            input_tokens,
            output_tokens,
            cached_tokens,
            total_cost: 0.0,
        }
    }

    /// Open a concrete duplex session over this provider's turns.
    ///
    /// The session has its own cursor; pulls on the provider do not move it.
    pub fn open_session(&self) -> StreamSession {
        StreamSession::new(Arc::clone(&self.table), self.settings.clone())
    }

    fn claim(&self, request: &PredictionRequest) -> Result<&Turn> {
        let selected = {
            let mut cursor = self.cursor.lock();
            self.selector
                .select(&self.table, &mut cursor, request.last_content())
        };
        match selected {
            Ok(ordinal) => self
                .table
                .get(ordinal)
                .ok_or(ReplayError::Exhausted { turn: ordinal + 1 }),
            Err(err) => {
                let capture = &self.settings.capture;
                if let (ReplayError::Exhausted { turn }, Some(log)) = (&err, capture) {
                    log.record(
                        CapturedRequest::pull(request.last_content()),
                        CapturedOutcome::Exhausted { turn: *turn },
                    );
                }
                Err(err)
            }
        }
    }

    async fn pace(
        &self,
        turn: &Turn,
        request: &PredictionRequest,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let delay = self.timing.delay_for(&self.table, turn.ordinal);
        let waited = self.timing.wait(&self.settings.clock, delay, cancel).await;
        if let Some(log) = &self.settings.capture {
            let outcome = match &waited {
                Ok(()) => delivered(turn, delay),
                Err(_) => CapturedOutcome::Cancelled {
                    ordinal: turn.ordinal,
                },
            };
            log.record(CapturedRequest::pull(request.last_content()), outcome);
        }
        waited
    }
}

fn delivered(turn: &Turn, delay: std::time::Duration) -> CapturedOutcome {
    CapturedOutcome::Delivered {
        ordinal: turn.ordinal,
        content: turn.content.clone(),
        delay_ms: delay.as_millis() as u64,
    }
}

fn build_response(turn: &Turn) -> PredictionResponse {
    PredictionResponse {
        content: turn.content.clone(),
        tool_calls: turn.tool_calls.clone(),
        cost_info: turn
            .cost_info
            .clone()
            .unwrap_or_else(|| estimate_cost(&turn.content)),
        latency: turn.latency,
    }
}

/// Rough usage for turns recorded without provider-call data
pub fn estimate_cost(content: &str) -> CostInfo {
    CostInfo {
        input_tokens: 0,
        output_tokens: (content.len() as u64 / CHARS_PER_TOKEN).max(1),
        cached_tokens: 0,
        total_cost: 0.0,
    }
}

impl StreamInputSupport for ReplayProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn create_stream_session(&self) -> Result<Arc<dyn StreamInputSession>> {
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
#[path = "provider_tests.rs"]
mod tests;
