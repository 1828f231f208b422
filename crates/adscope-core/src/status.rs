// ── Status channel ──
//
// The console's outward-facing report stream. Every user-visible outcome
// becomes one `StatusMessage` on a broadcast channel (and in an
// in-memory log). Directory errors raised inside a batch are held back
// and surfaced once when the batch ends. A busy counter on a `watch`
// channel brackets every blocking directory call.

use std::sync::Arc;

use serde::Serialize;
use strum::Display;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::error::CoreError;

const STATUS_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Broadcast status stream with batching and a busy indicator.
pub struct StatusChannel {
    sender: broadcast::Sender<StatusMessage>,
    log: Vec<StatusMessage>,
    batch_depth: usize,
    batch_errors: Vec<String>,
    busy: Arc<watch::Sender<usize>>,
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        let (busy, _) = watch::channel(0usize);
        Self {
            sender,
            log: Vec::new(),
            batch_depth: 0,
            batch_errors: Vec::new(),
            busy: Arc::new(busy),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusMessage> {
        self.sender.subscribe()
    }

    /// Every message emitted so far, oldest first.
    pub fn messages(&self) -> &[StatusMessage] {
        &self.log
    }

    /// Remove and return the logged messages.
    pub fn take_messages(&mut self) -> Vec<StatusMessage> {
        std::mem::take(&mut self.log)
    }

    pub fn add_message(&mut self, message: StatusMessage) {
        match message.kind {
            StatusKind::Success => info!(text = %message.text, "status"),
            StatusKind::Error => warn!(text = %message.text, "status"),
        }
        // No subscribers is fine; the log still records it.
        let _ = self.sender.send(message.clone());
        self.log.push(message);
    }

    /// Report a failure. Inside a batch the error is held for `end_batch`;
    /// otherwise it becomes an error message immediately.
    pub fn report_error(&mut self, err: &CoreError) {
        if self.in_batch() {
            warn!(error = %err, "error inside batch");
            self.batch_errors.push(err.to_string());
        } else {
            self.add_message(StatusMessage::error(err.to_string()));
        }
    }

    // ── Batches ──────────────────────────────────────────────────────

    pub fn start_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch ends, returns the errors
    /// collected while it was open.
    pub fn end_batch(&mut self) -> Vec<String> {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 {
            std::mem::take(&mut self.batch_errors)
        } else {
            Vec::new()
        }
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    // ── Busy indicator ───────────────────────────────────────────────

    /// Mark the console busy until the returned guard drops.
    pub fn busy(&self) -> BusyGuard {
        self.busy.send_modify(|count| *count += 1);
        BusyGuard {
            busy: Arc::clone(&self.busy),
        }
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow() > 0
    }

    pub fn subscribe_busy(&self) -> watch::Receiver<usize> {
        self.busy.subscribe()
    }
}

/// Holds the busy indicator on while alive.
#[must_use = "the console is only busy while the guard is alive"]
pub struct BusyGuard {
    busy: Arc<watch::Sender<usize>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}
