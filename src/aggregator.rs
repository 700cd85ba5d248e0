use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;

use crate::node::{DiscoveredNode, NodeReceiver, NodeSnapshot};
use crate::reporter::{Delivery, Reporter};

/// Folds discovered nodes into a snapshot and periodically flushes it.
///
/// The drain and flush loops run as separate tasks over the same snapshot;
/// every access goes through one lock, and the lock is released before the
/// flushed copy is handed to the reporter.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    snapshot: Arc<Mutex<NodeSnapshot>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fold(&self, node: DiscoveredNode) {
        self.snapshot.lock().await.insert(node);
    }

    /// Takes the current snapshot, leaving an empty one behind.
    pub async fn take(&self) -> NodeSnapshot {
        std::mem::take(&mut *self.snapshot.lock().await)
    }

    /// Folds nodes from the queue in arrival order until every sender is gone.
    pub async fn drain(&self, mut queue: NodeReceiver) {
        while let Some(node) = queue.recv().await {
            self.fold(node).await;
        }
        debug!("node queue closed");
    }

    pub async fn flush(&self, reporter: &Reporter) -> Delivery {
        let snapshot = self.take().await;
        reporter.report(&snapshot).await
    }

    /// Flushes, then sleeps for `period`, forever.
    pub async fn flush_every(&self, reporter: &Reporter, period: Duration) {
        loop {
            self.flush(reporter).await;
            tokio::time::sleep(period).await;
        }
    }
}
