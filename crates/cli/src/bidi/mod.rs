// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bidirectional sessions.
//!
//! A [`BidirectionalSession`] puts one API in front of either a provider's
//! duplex session or a middleware [`Pipeline`]. In pipeline mode the session
//! owns an input and an output channel; the pipeline starts on the first
//! inbound chunk and the output channel closes once the pipeline returns.

mod state;

pub use state::{ConversationState, MemoryStateStore, StateStore};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ReplayError, Result};
use crate::session::StreamInputSession;
use crate::types::{MediaChunk, StreamChunk};

/// Capacity of the pipeline-mode input and output channels
pub const PIPELINE_CHANNEL_CAPACITY: usize = 100;

/// A streaming middleware pipeline.
///
/// The pipeline reads `input` until it closes and writes results to
/// `output`. Dropping `output` (by returning) ends the response stream.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn execute_stream_with_input(
        &self,
        cancel: CancellationToken,
        input: mpsc::Receiver<StreamChunk>,
        output: mpsc::Sender<StreamChunk>,
    ) -> Result<()>;
}

/// Builder for [`BidirectionalSession`]
#[derive(Default)]
pub struct SessionBuilder {
    id: Option<String>,
    user_id: Option<String>,
    metadata: HashMap<String, serde_json::Value>,
    variables: HashMap<String, String>,
    store: Option<Arc<dyn StateStore>>,
    cancel: Option<CancellationToken>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation id; a UUID is generated when unset
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables.extend(variables);
        self
    }

    /// State store; an in-memory store is used when unset
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Token the pipeline runs under (pipeline mode only)
    pub fn cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Wrap a provider's duplex session.
    pub async fn provider(
        self,
        session: Arc<dyn StreamInputSession>,
    ) -> Result<BidirectionalSession> {
        self.build(Mode::Provider(ProviderMode {
            session,
            media_sequence: AtomicU64::new(0),
        }))
        .await
    }

    /// Drive a pipeline. Execution starts on the first inbound chunk.
    pub async fn pipeline(self, pipeline: Arc<dyn Pipeline>) -> Result<BidirectionalSession> {
        let cancel = self.cancel.clone().unwrap_or_default();
        self.build(Mode::Pipeline(PipelineMode::new(pipeline, cancel)))
            .await
    }

    async fn build(self, mode: Mode) -> Result<BidirectionalSession> {
        let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStateStore::new()));

        if store.load(&id).await?.is_none() {
            store
                .save(ConversationState {
                    id: id.clone(),
                    user_id: self.user_id,
                    messages: Vec::new(),
                    metadata: self.metadata,
                })
                .await?;
        }
        debug!(session = %id, "bidirectional session created");

        Ok(BidirectionalSession {
            id,
            store,
            variables: RwLock::new(self.variables),
            closed: Mutex::new(false),
            mode,
        })
    }
}

enum Mode {
    Provider(ProviderMode),
    Pipeline(PipelineMode),
}

struct ProviderMode {
    session: Arc<dyn StreamInputSession>,
    media_sequence: AtomicU64,
}

struct PipelineMode {
    pipeline: Arc<dyn Pipeline>,
    cancel: CancellationToken,
    input_tx: Mutex<Option<mpsc::Sender<StreamChunk>>>,
    /// Channel ends handed to the pipeline when it starts
    pending: Mutex<Option<PendingRun>>,
    output_rx: Mutex<Option<mpsc::Receiver<StreamChunk>>>,
    done: CancellationToken,
    error: Arc<Mutex<Option<ReplayError>>>,
}

struct PendingRun {
    input: mpsc::Receiver<StreamChunk>,
    output: mpsc::Sender<StreamChunk>,
}

impl PipelineMode {
    fn new(pipeline: Arc<dyn Pipeline>, cancel: CancellationToken) -> Self {
        let (input_tx, input) = mpsc::channel(PIPELINE_CHANNEL_CAPACITY);
        let (output, output_rx) = mpsc::channel(PIPELINE_CHANNEL_CAPACITY);
        Self {
            pipeline,
            cancel,
            input_tx: Mutex::new(Some(input_tx)),
            pending: Mutex::new(Some(PendingRun { input, output })),
            output_rx: Mutex::new(Some(output_rx)),
            done: CancellationToken::new(),
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the pipeline if it has not started yet.
    fn ensure_started(&self) {
        let Some(PendingRun { input, output }) = self.pending.lock().take() else {
            return;
        };
        debug!("starting pipeline execution");

        let pipeline = Arc::clone(&self.pipeline);
        let cancel = self.cancel.clone();
        let done = self.done.clone();
        let error = Arc::clone(&self.error);
        tokio::spawn(async move {
            let result = pipeline
                .execute_stream_with_input(cancel, input, output.clone())
                .await;
            if let Err(err) = result {
                warn!(error = %err, "pipeline failed");
                *error.lock() = Some(err.clone());
                if output.try_send(StreamChunk::failed(err)).is_err() {
                    debug!("error chunk dropped, output full or closed");
                }
            }
            drop(output);
            done.cancel();
        });
    }

    async fn send(&self, chunk: StreamChunk, cancel: &CancellationToken) -> Result<()> {
        self.ensure_started();
        let Some(tx) = self.input_tx.lock().clone() else {
            return Err(ReplayError::SessionClosed);
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ReplayError::Cancelled),
            sent = tx.send(chunk) => sent.map_err(|_| {
                ReplayError::Pipeline("pipeline stopped reading input".to_string())
            }),
        }
    }

    fn close(&self) {
        drop(self.input_tx.lock().take());
        // A pipeline that never started cannot close the output itself.
        if self.pending.lock().take().is_some() {
            self.done.cancel();
        }
    }
}

/// Uniform streaming session over a provider or a pipeline
pub struct BidirectionalSession {
    id: String,
    store: Arc<dyn StateStore>,
    variables: RwLock<HashMap<String, String>>,
    closed: Mutex<bool>,
    mode: Mode,
}

impl BidirectionalSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_pipeline(&self) -> bool {
        matches!(self.mode, Mode::Pipeline(_))
    }

    /// Send a chunk. Text goes out as text input and media as raw input.
    pub async fn send_chunk(
        &self,
        chunk: StreamChunk,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.ensure_open()?;
        if chunk.content.is_empty() && chunk.delta.is_empty() && chunk.media.is_none() {
            return Err(ReplayError::InvalidInput("chunk has no content".to_string()));
        }

        match &self.mode {
            Mode::Pipeline(pipeline) => pipeline.send(chunk, cancel).await,
            Mode::Provider(provider) => {
                if let Some(media) = chunk.media {
                    let sequence = provider.media_sequence.fetch_add(1, Ordering::Relaxed);
                    provider
                        .session
                        .send_chunk(MediaChunk {
                            mime_type: media.mime_type,
                            data: media.data,
                            sequence,
                        })
                        .await?;
                }
                let text = if chunk.delta.is_empty() {
                    chunk.content
                } else {
                    chunk.delta
                };
                if text.is_empty() {
                    return Ok(());
                }
                provider.session.send_text(&text, cancel).await
            }
        }
    }

    pub async fn send_text(&self, text: &str, cancel: &CancellationToken) -> Result<()> {
        self.ensure_open()?;
        match &self.mode {
            Mode::Provider(provider) => provider.session.send_text(text, cancel).await,
            Mode::Pipeline(_) => self.send_chunk(StreamChunk::text(text), cancel).await,
        }
    }

    /// Take the response channel. Returns `None` once taken.
    pub fn response(&self) -> Option<mpsc::Receiver<StreamChunk>> {
        match &self.mode {
            Mode::Provider(provider) => provider.session.response(),
            Mode::Pipeline(pipeline) => pipeline.output_rx.lock().take(),
        }
    }

    /// Close the session. Idempotent.
    ///
    /// In pipeline mode only the input channel is closed; the response
    /// channel closes when the pipeline finishes.
    pub async fn close(&self) -> Result<()> {
        {
            let mut closed = self.closed.lock();
            if *closed {
                return Ok(());
            }
            *closed = true;
        }
        match &self.mode {
            Mode::Provider(provider) => provider.session.close().await,
            Mode::Pipeline(pipeline) => {
                pipeline.close();
                Ok(())
            }
        }
    }

    /// Token cancelled when the session has finished
    pub fn done(&self) -> CancellationToken {
        match &self.mode {
            Mode::Provider(provider) => provider.session.done(),
            Mode::Pipeline(pipeline) => pipeline.done.child_token(),
        }
    }

    pub fn error(&self) -> Option<ReplayError> {
        match &self.mode {
            Mode::Provider(provider) => provider.session.error(),
            Mode::Pipeline(pipeline) => pipeline.error.lock().clone(),
        }
    }

    pub fn get_var(&self, name: &str) -> Option<String> {
        self.variables.read().get(name).cloned()
    }

    pub fn set_var(&self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.write().insert(name.into(), value.into());
    }

    /// Snapshot of the session variables
    pub fn variables(&self) -> HashMap<String, String> {
        self.variables.read().clone()
    }

    pub fn state_store(&self) -> Arc<dyn StateStore> {
        Arc::clone(&self.store)
    }

    /// Messages persisted for this conversation
    pub async fn messages(&self) -> Result<Vec<crate::types::Message>> {
        Ok(self
            .store
            .load(&self.id)
            .await?
            .map(|state| state.messages)
            .unwrap_or_default())
    }

    /// Copy this conversation under `fork_id`.
    ///
    /// The returned builder shares this session's store and carries a copy
    /// of its variables; finish it with a provider session or a pipeline.
    pub async fn fork(&self, fork_id: impl Into<String>) -> Result<SessionBuilder> {
        let fork_id = fork_id.into();
        self.store.fork(&self.id, &fork_id).await?;
        debug!(session = %self.id, fork = %fork_id, "conversation forked");
        Ok(SessionBuilder::new()
            .id(fork_id)
            .store(Arc::clone(&self.store))
            .variables(self.variables()))
    }

    /// Drop every persisted message, keeping the rest of the state
    pub async fn clear(&self) -> Result<()> {
        let mut state = self
            .store
            .load(&self.id)
            .await?
            .unwrap_or_else(|| ConversationState::new(self.id.clone()));
        state.messages.clear();
        self.store.save(state).await
    }

    fn ensure_open(&self) -> Result<()> {
        if *self.closed.lock() {
            return Err(ReplayError::SessionClosed);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "bidi_tests.rs"]
mod tests;
