// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic replay of recorded provider sessions.
//!
//! A recording (an ordered event log) or an arena output (a flat message
//! list) is indexed into a [`turns::TurnTable`]. Turns are then served either
//! pull-style through [`provider::ReplayProvider`] or over a duplex
//! [`stream::StreamSession`] that satisfies the same
//! [`session::StreamInputSession`] contract a live provider would.
//!
//! ```no_run
//! use replaykit::config::ReplayConfig;
//! use replaykit::provider::ReplayProvider;
//! use replaykit::types::{Message, PredictionRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> replaykit::error::Result<()> {
//! let provider = ReplayProvider::from_file(
//!     std::path::Path::new("session.recording.json"),
//!     ReplayConfig::default().into(),
//! )?;
//! let request = PredictionRequest::with_messages(vec![Message::user("Hello")]);
//! let response = provider.predict(&request, &CancellationToken::new()).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod arena;
pub mod bidi;
/// Re-exported capture types from the replaykit-capture crate.
pub mod capture {
    pub use replaykit_capture::{CaptureLog, CapturedDelivery, CapturedOutcome, CapturedRequest};
}
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod media;
pub mod output;
pub mod provider;
pub mod recording;
pub mod registry;
pub mod selector;
pub mod session;
pub mod settings;
pub mod stream;
#[cfg(test)]
pub(crate) mod test_support;
pub mod time;
pub mod timing;
pub mod turns;
pub mod types;
