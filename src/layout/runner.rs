//! Drives the layout engine on a fixed cadence

use super::engine::{ForceLayoutEngine, LayoutSnapshot};
use crate::graph::Point;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

fn lock(engine: &Mutex<ForceLayoutEngine>) -> MutexGuard<'_, ForceLayoutEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ticks a `ForceLayoutEngine` in a background task.
///
/// Each tick publishes the latest positions to a `watch` channel. Readers
/// see the newest snapshot and never slow the simulation down. Once the
/// layout settles the task idles until a drag reheats it. Dropping the
/// runner stops the task.
pub struct LayoutRunner {
    engine: Arc<Mutex<ForceLayoutEngine>>,
    snapshots: watch::Receiver<LayoutSnapshot>,
    task: JoinHandle<()>,
}

impl LayoutRunner {
    /// Start ticking every `interval`. Returns `None` for an empty graph.
    pub fn spawn(engine: ForceLayoutEngine, interval: Duration) -> Option<Self> {
        if engine.is_empty() {
            debug!("empty graph; layout not started");
            return None;
        }
        let (tx, rx) = watch::channel(engine.snapshot());
        let engine = Arc::new(Mutex::new(engine));
        let task = tokio::spawn(drive(Arc::clone(&engine), tx, interval));
        Some(Self {
            engine,
            snapshots: rx,
            task,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<LayoutSnapshot> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> LayoutSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait until a settled snapshot is published.
    pub async fn settled(&self) -> Option<LayoutSnapshot> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx.wait_for(|s| s.settled).await.ok()?;
        Some(snapshot.clone())
    }

    pub fn drag_start(&self, index: usize) -> bool {
        lock(&self.engine).drag_start(index)
    }

    pub fn drag_move(&self, index: usize, to: Point) -> bool {
        lock(&self.engine).drag_move(index, to)
    }

    pub fn drag_end(&self, index: usize) -> bool {
        lock(&self.engine).drag_end(index)
    }

    pub fn node_at(&self, point: Point, radius: f64) -> Option<usize> {
        lock(&self.engine).node_at(point, radius)
    }
}

impl Drop for LayoutRunner {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive(engine: Arc<Mutex<ForceLayoutEngine>>, tx: watch::Sender<LayoutSnapshot>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let snapshot = {
            let mut engine = lock(&engine);
            engine.tick().then(|| engine.snapshot())
        };
        if let Some(snapshot) = snapshot {
            if tx.send(snapshot).is_err() {
                break;
            }
        }
    }
}
