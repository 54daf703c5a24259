//! Debounced autosave of order form edits.
//!
//! Patches submitted for an order are merged and written as one update once
//! no new patch has arrived for the debounce interval. A failed write is
//! logged and dropped: it is neither retried nor rolled back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::OrderPatch;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Destination of flushed patches.
pub trait PatchSink: Send + Sync + 'static {
    fn apply_patch(&self, order_id: Uuid, patch: OrderPatch) -> Result<(), DomainError>;
}

struct Pending {
    generation: u64,
    patch: OrderPatch,
}

#[derive(Clone)]
pub struct AutosaveQueue {
    sink: Arc<dyn PatchSink>,
    delay: Duration,
    pending: Arc<Mutex<HashMap<Uuid, Pending>>>,
}

impl AutosaveQueue {
    pub fn new(sink: Arc<dyn PatchSink>, delay: Duration) -> Self {
        Self {
            sink,
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of orders with a patch waiting for its timer.
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Queues `patch` for `order_id`, restarting that order's timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, order_id: Uuid, patch: OrderPatch) {
        if patch.is_empty() {
            return;
        }

        let generation = {
            let mut pending = self.lock();
            let entry = pending.entry(order_id).or_insert_with(|| Pending {
                generation: 0,
                patch: OrderPatch::default(),
            });
            entry.generation += 1;
            entry.patch.merge(patch);
            entry.generation
        };

        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(queue.delay).await;
            queue.flush_if_current(order_id, generation).await;
        });
    }

    async fn flush_if_current(&self, order_id: Uuid, generation: u64) {
        let patch = {
            let mut pending = self.lock();
            match pending.get(&order_id) {
                Some(p) if p.generation == generation => {
                    pending.remove(&order_id).map(|p| p.patch)
                }
                // Superseded by a newer submit; its own timer will flush.
                _ => None,
            }
        };
        let Some(patch) = patch else {
            return;
        };

        let sink = Arc::clone(&self.sink);
        let result = tokio::task::spawn_blocking(move || sink.apply_patch(order_id, patch)).await;
        match result {
            Ok(Ok(())) => log::info!("autosaved order {order_id}"),
            Ok(Err(e)) => log::warn!("autosave of order {order_id} failed: {e}"),
            Err(e) => log::error!("autosave task for order {order_id} panicked: {e}"),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Pending>> {
        // Poisoning leaves the map itself intact.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(Uuid, OrderPatch)>>,
        fail: bool,
    }

    impl PatchSink for RecordingSink {
        fn apply_patch(&self, order_id: Uuid, patch: OrderPatch) -> Result<(), DomainError> {
            self.calls.lock().expect("lock").push((order_id, patch));
            if self.fail {
                return Err(DomainError::Internal("db down".into()));
            }
            Ok(())
        }
    }

    const TEST_DELAY: Duration = Duration::from_millis(40);

    async fn settle() {
        tokio::time::sleep(TEST_DELAY * 5).await;
    }

    #[tokio::test]
    async fn burst_of_patches_is_written_once_merged() {
        let sink = Arc::new(RecordingSink::default());
        let queue = AutosaveQueue::new(sink.clone(), TEST_DELAY);
        let order_id = Uuid::new_v4();

        queue.submit(
            order_id,
            OrderPatch {
                urgent: Some(true),
                ..Default::default()
            },
        );
        queue.submit(
            order_id,
            OrderPatch {
                status: Some("ready".into()),
                ..Default::default()
            },
        );
        assert_eq!(queue.pending_count(), 1);

        settle().await;

        let calls = sink.calls.lock().expect("lock");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, order_id);
        assert_eq!(calls[0].1.urgent, Some(true));
        assert_eq!(calls[0].1.status.as_deref(), Some("ready"));
        drop(calls);
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn different_orders_flush_independently() {
        let sink = Arc::new(RecordingSink::default());
        let queue = AutosaveQueue::new(sink.clone(), TEST_DELAY);

        for _ in 0..3 {
            queue.submit(
                Uuid::new_v4(),
                OrderPatch {
                    urgent: Some(false),
                    ..Default::default()
                },
            );
        }
        settle().await;

        assert_eq!(sink.calls.lock().expect("lock").len(), 3);
    }

    #[tokio::test]
    async fn empty_patch_is_ignored() {
        let sink = Arc::new(RecordingSink::default());
        let queue = AutosaveQueue::new(sink.clone(), TEST_DELAY);
        queue.submit(Uuid::new_v4(), OrderPatch::default());
        assert_eq!(queue.pending_count(), 0);
        settle().await;
        assert!(sink.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn failed_write_is_not_retried() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let queue = AutosaveQueue::new(sink.clone(), TEST_DELAY);
        queue.submit(
            Uuid::new_v4(),
            OrderPatch {
                urgent: Some(true),
                ..Default::default()
            },
        );
        settle().await;
        settle().await;

        assert_eq!(sink.calls.lock().expect("lock").len(), 1);
        assert_eq!(queue.pending_count(), 0);
    }
}
