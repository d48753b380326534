//! User-facing notices
//!
//! Any component may publish a `{severity, message}` notice through a
//! cloned `NoticeEmitter`. A single `NoticeBoard` subscriber shows the latest
//! notices and expires each one independently once its lifetime has passed.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
}

/// Publishing half. Cheap to clone; publishing never fails.
#[derive(Debug, Clone, Default)]
pub struct NoticeEmitter {
    tx: Option<mpsc::UnboundedSender<Notice>>,
    next_id: Arc<AtomicU64>,
}

impl NoticeEmitter {
    /// An emitter with no subscriber. Notices are dropped.
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn publish(&self, severity: Severity, message: impl Into<String>) {
        let Some(tx) = &self.tx else {
            return;
        };
        let notice = Notice {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            severity,
            message: message.into(),
        };
        // A closed board means nobody is watching anymore.
        let _ = tx.send(notice);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Severity::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Severity::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Severity::Info, message);
    }
}

/// Subscribing half: the notices currently on screen.
#[derive(Debug)]
pub struct NoticeBoard {
    rx: mpsc::UnboundedReceiver<Notice>,
    shown: VecDeque<(Notice, Instant)>,
    lifetime: Duration,
    capacity: usize,
}

/// Create a connected emitter/board pair.
pub fn channel(lifetime: Duration, capacity: usize) -> (NoticeEmitter, NoticeBoard) {
    let (tx, rx) = mpsc::unbounded_channel();
    let emitter = NoticeEmitter {
        tx: Some(tx),
        next_id: Arc::new(AtomicU64::new(0)),
    };
    let board = NoticeBoard {
        rx,
        shown: VecDeque::new(),
        lifetime,
        capacity: capacity.max(1),
    };
    (emitter, board)
}

impl NoticeBoard {
    /// Notices visible at `now`, oldest first.
    ///
    /// Newly published notices are stamped with `now` on arrival.
    pub fn visible(&mut self, now: Instant) -> Vec<Notice> {
        while let Ok(notice) = self.rx.try_recv() {
            self.shown.push_back((notice, now));
        }
        self.prune(now);
        self.shown.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Wait for the next notice and put it on the board.
    pub async fn next(&mut self) -> Option<Notice> {
        let notice = self.rx.recv().await?;
        let now = Instant::now();
        self.shown.push_back((notice.clone(), now));
        self.prune(now);
        Some(notice)
    }

    /// Drop expired notices, then the oldest beyond `capacity`.
    fn prune(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.shown
            .retain(|(_, arrived)| now.saturating_duration_since(*arrived) < lifetime);
        while self.shown.len() > self.capacity {
            self.shown.pop_front();
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}
