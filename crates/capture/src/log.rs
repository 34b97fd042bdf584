// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared, append-only log of turn deliveries.
//!
//! Clones of a [`CaptureLog`] append to the same entries. When opened with
//! [`CaptureLog::with_file`] every entry is also written as one JSON line and
//! flushed, so a crashed replay still leaves a readable trail.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use parking_lot::Mutex;

use crate::delivery::{CapturedDelivery, CapturedOutcome, CapturedRequest};

/// Which turn each replay request received
#[derive(Clone)]
pub struct CaptureLog {
    shared: Arc<Shared>,
}

struct Shared {
    opened: Instant,
    entries: Mutex<Vec<CapturedDelivery>>,
    sink: Option<Mutex<BufWriter<File>>>,
    failed_writes: AtomicUsize,
}

impl CaptureLog {
    pub fn new() -> Self {
        Self::open(None)
    }

    /// Log that mirrors every entry to `path` as JSONL. Truncates the file.
    pub fn with_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::open(Some(BufWriter::new(file))))
    }

    fn open(sink: Option<BufWriter<File>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                opened: Instant::now(),
                entries: Mutex::new(Vec::new()),
                sink: sink.map(Mutex::new),
                failed_writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Append one delivery and return its sequence number.
    ///
    /// Sequence numbers follow append order; the entries lock is held while
    /// the line is written so the file keeps the same order.
    pub fn record(&self, request: CapturedRequest, outcome: CapturedOutcome) -> u64 {
        let mut entries = self.shared.entries.lock();
        let entry = CapturedDelivery {
            seq: entries.len() as u64,
            timestamp: SystemTime::now(),
            elapsed: self.shared.opened.elapsed(),
            request,
            outcome,
        };
        if let Some(sink) = &self.shared.sink {
            if append_line(&mut sink.lock(), &entry).is_err() {
                self.shared.failed_writes.fetch_add(1, Ordering::Relaxed);
            }
        }
        let seq = entry.seq;
        entries.push(entry);
        seq
    }

    pub fn deliveries(&self) -> Vec<CapturedDelivery> {
        self.shared.entries.lock().clone()
    }

    /// The most recent `n` entries, oldest first
    pub fn last(&self, n: usize) -> Vec<CapturedDelivery> {
        let entries = self.shared.entries.lock();
        let skip = entries.len().saturating_sub(n);
        entries[skip..].to_vec()
    }

    pub fn count(&self, pred: impl Fn(&CapturedDelivery) -> bool) -> usize {
        self.shared.entries.lock().iter().filter(|d| pred(d)).count()
    }

    /// Ordinals of the turns handed out, in delivery order
    pub fn delivered_ordinals(&self) -> Vec<usize> {
        self.shared
            .entries
            .lock()
            .iter()
            .filter_map(|d| match d.outcome {
                CapturedOutcome::Delivered { ordinal, .. } => Some(ordinal),
                _ => None,
            })
            .collect()
    }

    pub fn find_delivered(&self) -> Vec<CapturedDelivery> {
        self.matching(|o| matches!(o, CapturedOutcome::Delivered { .. }))
    }

    /// Requests made after the recording ran out
    pub fn find_exhausted(&self) -> Vec<CapturedDelivery> {
        self.matching(|o| matches!(o, CapturedOutcome::Exhausted { .. }))
    }

    pub fn len(&self) -> usize {
        self.shared.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.entries.lock().is_empty()
    }

    /// Forget the in-memory entries. Lines already written stay in the file.
    pub fn clear(&self) {
        self.shared.entries.lock().clear();
    }

    /// Entries that could not be written to the file
    pub fn failed_writes(&self) -> usize {
        self.shared.failed_writes.load(Ordering::Relaxed)
    }

    fn matching(&self, keep: impl Fn(&CapturedOutcome) -> bool) -> Vec<CapturedDelivery> {
        self.shared
            .entries
            .lock()
            .iter()
            .filter(|d| keep(&d.outcome))
            .cloned()
            .collect()
    }
}

fn append_line(sink: &mut BufWriter<File>, entry: &CapturedDelivery) -> std::io::Result<()> {
    serde_json::to_writer(&mut *sink, entry)?;
    sink.write_all(b"\n")?;
    sink.flush()
}

impl Default for CaptureLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CaptureLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureLog")
            .field("entries", &self.len())
            .field("file", &self.shared.sink.is_some())
            .field("failed_writes", &self.failed_writes())
            .finish()
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
