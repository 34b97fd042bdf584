// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery capture and recording for test assertions.
//!
//! This crate records which recorded turn a replay provider handed out for
//! each request, so tests can assert on selection order and exhaustion without
//! draining response channels themselves.

mod delivery;
mod duration_serde;
mod log;

pub use delivery::{CapturedDelivery, CapturedOutcome, CapturedRequest, RequestStyle};
pub use log::CaptureLog;
