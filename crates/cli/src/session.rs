// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Provider-session contract shared by replayed and live providers.
//!
//! The rest of the runtime talks to a [`StreamInputSession`] without knowing
//! whether turns come from a model or a recording.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::media::CONTENT_TYPE_AUDIO;
use crate::types::{MediaChunk, StreamChunk};

/// Preferred output sample rate for replayed audio
pub const PREFERRED_SAMPLE_RATE: u32 = 24_000;

/// A duplex exchange of chunks with a provider
#[async_trait]
pub trait StreamInputSession: Send + Sync {
    /// Send raw media input
    async fn send_chunk(&self, chunk: MediaChunk) -> Result<()>;

    /// Send text input and receive the next response on the output channel
    async fn send_text(&self, text: &str, cancel: &CancellationToken) -> Result<()>;

    /// Send system context; providers may ignore it
    async fn send_system_context(&self, text: &str) -> Result<()>;

    /// Signal end of input without waiting for the response
    fn end_input(&self);

    /// Take the output channel. Returns `None` once taken.
    fn response(&self) -> Option<mpsc::Receiver<StreamChunk>>;

    /// Close the session. Idempotent.
    async fn close(&self) -> Result<()>;

    /// Token cancelled when the session ends
    fn done(&self) -> CancellationToken;

    /// Terminal error, if any
    fn error(&self) -> Option<crate::error::ReplayError>;
}

/// A provider that can open duplex sessions
pub trait StreamInputSupport: Send + Sync {
    fn id(&self) -> &str;

    fn create_stream_session(&self) -> Result<Arc<dyn StreamInputSession>>;

    /// Media types accepted as streaming input
    fn supported_input_media(&self) -> Vec<String>;

    fn capabilities(&self) -> StreamingCapabilities;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StreamingCapabilities {
    pub supported_media_types: Vec<String>,
    pub audio: Option<AudioCapabilities>,
    pub bidirectional: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AudioCapabilities {
    pub supported_encodings: Vec<String>,
    pub supported_sample_rates: Vec<u32>,
    pub supported_channels: Vec<u16>,
    pub preferred_encoding: String,
    pub preferred_sample_rate: u32,
}

/// Capabilities advertised by replay providers
pub fn replay_capabilities() -> StreamingCapabilities {
    StreamingCapabilities {
        supported_media_types: vec![CONTENT_TYPE_AUDIO.to_string()],
        audio: Some(AudioCapabilities {
            supported_encodings: ["pcm", "pcm_linear16", "wav"]
                .into_iter()
                .map(String::from)
                .collect(),
            supported_sample_rates: vec![16_000, PREFERRED_SAMPLE_RATE],
            supported_channels: vec![1],
            preferred_encoding: "pcm".to_string(),
            preferred_sample_rate: PREFERRED_SAMPLE_RATE,
        }),
        bidirectional: true,
    }
}
