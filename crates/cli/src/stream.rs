// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Duplex replay session.
//!
//! Input arrives through [`StreamInputSession`] calls; recorded turns leave
//! through a bounded output channel. A turn is emitted as an optional text
//! chunk, then its media chunks, then exactly one completion chunk.
//!
//! # Close protocol
//!
//! Closing happens in two phases so that no send ever races the channel
//! being closed:
//!
//! 1. Under the state lock, mark the session closed and cancel the `done`
//!    token. New sends observe `closed` and bail; sends blocked on a full
//!    channel observe `done` and bail.
//! 2. Whoever brings the in-flight send count to zero while the session is
//!    closed drops the last sender under the same lock. That is either the
//!    closing call itself or the last finishing send, so the channel closes
//!    even if every `close()` future is dropped mid-wait. Every `close()`
//!    call returns only once the channel is closed.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use replaykit_capture::{CapturedOutcome, CapturedRequest};

use crate::error::{ReplayError, Result};
use crate::media::load_media;
use crate::selector::{Cursor, TurnSelector};
use crate::session::StreamInputSession;
use crate::settings::ReplaySettings;
use crate::timing::TimingEngine;
use crate::turns::{Turn, TurnTable};
use crate::types::{MediaChunk, StreamChunk, FINISH_REASON_COMPLETE, FINISH_REASON_STOP};

/// Capacity of the output channel
pub const RESPONSE_CHANNEL_CAPACITY: usize = 100;

/// What to do when a request finds no turn left
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OnExhausted {
    /// Emit a single "stop" chunk (push-style input)
    Stop,
    /// Do nothing (end of input)
    Ignore,
    /// Return the exhaustion error (explicit trigger)
    Fail,
}

#[derive(Debug, PartialEq, Eq)]
enum SendOutcome {
    Sent,
    Closed,
    Cancelled,
}

struct SessionState {
    cursor: Cursor,
    closed: bool,
    in_flight: usize,
    tx: Option<mpsc::Sender<StreamChunk>>,
    input_chunks: u64,
    error: Option<ReplayError>,
}

struct Inner {
    table: Arc<TurnTable>,
    selector: TurnSelector,
    timing: TimingEngine,
    settings: ReplaySettings,
    state: Mutex<SessionState>,
    rx: Mutex<Option<mpsc::Receiver<StreamChunk>>>,
    /// Serializes claim-and-emit so delivery order equals claim order
    emit_lock: tokio::sync::Mutex<()>,
    done: CancellationToken,
    /// Cancelled once the last sender has been dropped
    channel_closed: CancellationToken,
}

/// Duplex session replaying a turn table
#[derive(Clone)]
pub struct StreamSession {
    inner: Arc<Inner>,
}

impl StreamSession {
    pub fn new(table: Arc<TurnTable>, settings: ReplaySettings) -> Self {
        let (tx, rx) = mpsc::channel(RESPONSE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                selector: TurnSelector::new(settings.config.match_mode),
                timing: TimingEngine::new(&settings.config),
                table,
                settings,
                state: Mutex::new(SessionState {
                    cursor: Cursor::default(),
                    closed: false,
                    in_flight: 0,
                    tx: Some(tx),
                    input_chunks: 0,
                    error: None,
                }),
                rx: Mutex::new(Some(rx)),
                emit_lock: tokio::sync::Mutex::new(()),
                done: CancellationToken::new(),
                channel_closed: CancellationToken::new(),
            }),
        }
    }

    /// Emit the next turn, failing with `Exhausted` when none remain.
    pub async fn trigger_next_response(&self, cancel: &CancellationToken) -> Result<()> {
        self.inner
            .respond(None, cancel, OnExhausted::Fail, CapturedRequest::push(None))
            .await
    }

    /// Turns not yet claimed sequentially
    pub fn remaining_turns(&self) -> usize {
        self.inner.state.lock().cursor.remaining(&self.inner.table)
    }

    pub fn input_chunk_count(&self) -> u64 {
        self.inner.state.lock().input_chunks
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Close the session: stop new sends, let in-flight ones finish, then
    /// close the output channel.
    ///
    /// Returns once the output channel is closed, for every caller.
    pub async fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            if !state.closed {
                state.closed = true;
                self.inner.done.cancel();
                debug!(in_flight = state.in_flight, "session closing");
            }
            if state.in_flight == 0 {
                self.inner.release_sender(&mut state);
            }
        }
        self.inner.channel_closed.cancelled().await;
    }
}

impl Inner {
    /// Claim a turn and emit it.
    async fn respond(
        &self,
        content: Option<&str>,
        cancel: &CancellationToken,
        on_exhausted: OnExhausted,
        request: CapturedRequest,
    ) -> Result<()> {
        let _emitting = tokio::select! {
            biased;
            _ = self.done.cancelled() => return Err(ReplayError::SessionClosed),
            _ = cancel.cancelled() => return Err(ReplayError::Cancelled),
            guard = self.emit_lock.lock() => guard,
        };

        let claimed = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(ReplayError::SessionClosed);
            }
            self.selector.select(&self.table, &mut state.cursor, content)
        };

        let ordinal = match claimed {
            Ok(ordinal) => ordinal,
            Err(err) => {
                if let ReplayError::Exhausted { turn } = err {
                    self.capture(request, CapturedOutcome::Exhausted { turn });
                }
                return match on_exhausted {
                    OnExhausted::Stop => {
                        debug!("no turns remain, sending stop");
                        self.safe_send(StreamChunk::finished(FINISH_REASON_STOP), cancel)
                            .await;
                        Ok(())
                    }
                    OnExhausted::Ignore => Ok(()),
                    OnExhausted::Fail => Err(err),
                };
            }
        };

        let Some(turn) = self.table.get(ordinal) else {
            return Err(ReplayError::Exhausted { turn: ordinal + 1 });
        };
        self.emit_turn(turn, cancel, request).await
    }

    async fn emit_turn(
        &self,
        turn: &Turn,
        cancel: &CancellationToken,
        request: CapturedRequest,
    ) -> Result<()> {
        let delay = self.timing.delay_for(&self.table, turn.ordinal);
        let waited = tokio::select! {
            biased;
            _ = self.done.cancelled() => Err(ReplayError::Cancelled),
            r = self.timing.wait(&self.settings.clock, delay, cancel) => r,
        };
        if let Err(err) = waited {
            debug!(ordinal = turn.ordinal, "turn cancelled during timing wait");
            self.capture(request, CapturedOutcome::Cancelled { ordinal: turn.ordinal });
            return Err(err);
        }

        debug!(
            ordinal = turn.ordinal,
            delay_ms = delay.as_millis() as u64,
            "emitting turn"
        );
        self.capture(
            request,
            CapturedOutcome::Delivered {
                ordinal: turn.ordinal,
                content: turn.content.clone(),
                delay_ms: delay.as_millis() as u64,
            },
        );

        if !turn.content.is_empty() {
            self.forward(StreamChunk::text(turn.content.clone()), cancel)
                .await?;
        }

        for part in turn.media_parts.iter().filter(|p| p.is_media()) {
            let Some(media) = &part.media else {
                continue;
            };
            let data = match load_media(
                media,
                self.table.base_dir(),
                self.settings.media_reader.as_ref(),
            )
            .await
            {
                Ok(data) => data,
                Err(err) => {
                    warn!(
                        ordinal = turn.ordinal,
                        part = %part.part_type,
                        error = %err,
                        "skipping media part"
                    );
                    continue;
                }
            };
            self.forward(StreamChunk::media(media.mime_type.clone(), data), cancel)
                .await?;
        }

        let reason = turn
            .finish_reason
            .clone()
            .unwrap_or_else(|| FINISH_REASON_COMPLETE.to_string());
        self.forward(
            StreamChunk::finished(reason).with_cost(turn.cost_info.clone()),
            cancel,
        )
        .await
    }

    /// Send one chunk of a turn. A closed session ends the turn quietly.
    async fn forward(&self, chunk: StreamChunk, cancel: &CancellationToken) -> Result<()> {
        match self.safe_send(chunk, cancel).await {
            SendOutcome::Sent => Ok(()),
            SendOutcome::Closed => Err(ReplayError::SessionClosed),
            SendOutcome::Cancelled => Err(ReplayError::Cancelled),
        }
    }

    /// Send a chunk unless the session is closed or closes mid-send.
    ///
    /// The send registers as in flight under the state lock, so the sender
    /// cannot be released while a send is pending.
    async fn safe_send(&self, chunk: StreamChunk, cancel: &CancellationToken) -> SendOutcome {
        let slot = {
            let mut state = self.state.lock();
            if state.closed {
                return SendOutcome::Closed;
            }
            let Some(tx) = state.tx.clone() else {
                return SendOutcome::Closed;
            };
            state.in_flight += 1;
            InFlightSend {
                inner: self,
                tx: Some(tx),
            }
        };
        let Some(tx) = slot.tx.as_ref() else {
            return SendOutcome::Closed;
        };

        let outcome = tokio::select! {
            biased;
            _ = self.done.cancelled() => SendOutcome::Closed,
            _ = cancel.cancelled() => SendOutcome::Cancelled,
            sent = tx.send(chunk) => match sent {
                Ok(()) => SendOutcome::Sent,
                Err(_) => SendOutcome::Closed,
            },
        };
        drop(slot);
        outcome
    }

    /// Drop the session's sender. Called with the state lock held once the
    /// session is closed and no send is in flight.
    fn release_sender(&self, state: &mut SessionState) {
        if state.tx.take().is_some() {
            debug!("output channel closed");
        }
        self.channel_closed.cancel();
    }

    fn capture(&self, request: CapturedRequest, outcome: CapturedOutcome) {
        if let Some(log) = &self.settings.capture {
            log.record(request, outcome);
        }
    }
}

/// A registered in-flight send. Dropping it (on completion or when the
/// sending future is abandoned) unregisters the send.
struct InFlightSend<'a> {
    inner: &'a Inner,
    tx: Option<mpsc::Sender<StreamChunk>>,
}

impl Drop for InFlightSend<'_> {
    fn drop(&mut self) {
        // The clone goes first so releasing the last sender closes the channel.
        drop(self.tx.take());
        let mut state = self.inner.state.lock();
        state.in_flight -= 1;
        if state.closed && state.in_flight == 0 {
            self.inner.release_sender(&mut state);
        }
    }
}

#[async_trait]
impl StreamInputSession for StreamSession {
    async fn send_chunk(&self, _chunk: MediaChunk) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.closed {
            return Err(ReplayError::SessionClosed);
        }
        state.input_chunks += 1;
        Ok(())
    }

    async fn send_text(&self, text: &str, cancel: &CancellationToken) -> Result<()> {
        if self.is_closed() {
            return Err(ReplayError::SessionClosed);
        }
        self.inner
            .respond(
                Some(text),
                cancel,
                OnExhausted::Stop,
                CapturedRequest::push(Some(text)),
            )
            .await
    }

    async fn send_system_context(&self, _text: &str) -> Result<()> {
        if self.is_closed() {
            return Err(ReplayError::SessionClosed);
        }
        Ok(())
    }

    /// Emit the next turn in the background. No-op when closed or exhausted.
    fn end_input(&self) {
        {
            let state = self.inner.state.lock();
            if state.closed || state.cursor.remaining(&self.inner.table) == 0 {
                return;
            }
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("end_input called outside a tokio runtime");
            return;
        };

        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            let cancel = inner.done.clone();
            let result = inner
                .respond(None, &cancel, OnExhausted::Ignore, CapturedRequest::push(None))
                .await;
            match result {
                Ok(()) | Err(ReplayError::Cancelled) | Err(ReplayError::SessionClosed) => {}
                Err(err) => {
                    warn!(error = %err, "background emission failed");
                    inner.state.lock().error = Some(err);
                }
            }
        });
    }

    fn response(&self) -> Option<mpsc::Receiver<StreamChunk>> {
        self.inner.rx.lock().take()
    }

    async fn close(&self) -> Result<()> {
        self.shutdown().await;
        Ok(())
    }

    fn done(&self) -> CancellationToken {
        self.inner.done.child_token()
    }

    fn error(&self) -> Option<ReplayError> {
        self.inner.state.lock().error.clone()
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
