//! # ActionQueue: durable, ordered store of pending actions.
//!
//! The queue is the single mutable resource of the engine. All mutating
//! operations take the write lock, apply the in-memory change, then re-persist
//! the **entire** serialized queue in one atomic write — a crash mid-write
//! leaves either the new snapshot or the prior one, never a partial update.
//!
//! ## Rules
//! - Strict FIFO insertion order; ids are unique within the queue.
//! - `retry_count` never decreases; lower values passed to
//!   [`ActionQueue::update_retry`] are ignored.
//! - Persistence is **best-effort**: a failed save keeps the in-memory
//!   update, emits [`EventKind::StoreWriteFailed`] and logs a warning. The
//!   next successful mutation re-persists the full queue anyway.
//! - Rehydration never fails the host: unreadable or corrupt bytes produce an
//!   empty queue plus [`EventKind::StoreLoadFailed`].

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use crate::events::{Bus, Event, EventKind};
use crate::store::action::{ActionId, OfflineAction};
use crate::store::storage::Storage;

/// Durable FIFO queue of pending actions.
pub struct ActionQueue {
    items: RwLock<Vec<OfflineAction>>,
    storage: Arc<dyn Storage>,
    bus: Bus,
}

impl ActionQueue {
    /// Creates an empty queue over the given storage backend.
    ///
    /// Call [`ActionQueue::load`] before first use to rehydrate persisted
    /// actions.
    pub fn new(storage: Arc<dyn Storage>, bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            items: RwLock::new(Vec::new()),
            storage,
            bus,
        })
    }

    /// Rehydrates the in-memory queue from persisted bytes.
    ///
    /// Corrupt or unreadable bytes are fatal for rehydration only: the queue
    /// starts empty, a diagnostic is logged and `StoreLoadFailed` published,
    /// and the host application keeps running.
    pub async fn load(&self) {
        let loaded = match self.storage.load().await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<OfflineAction>>(&bytes) {
                Ok(actions) => actions,
                Err(e) => {
                    warn!(error = %e, "persisted queue is corrupt; starting empty");
                    self.bus.publish(
                        Event::now(EventKind::StoreLoadFailed).with_reason(e.to_string()),
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read persisted queue; starting empty");
                self.bus
                    .publish(Event::now(EventKind::StoreLoadFailed).with_reason(e.to_string()));
                Vec::new()
            }
        };

        let mut items = self.items.write().await;
        *items = loaded;
    }

    /// Appends a fresh action and persists the queue. Returns the new id.
    ///
    /// Never fails: a persistence error downgrades to best-effort durability
    /// (in-memory update kept, `StoreWriteFailed` emitted).
    pub async fn enqueue(&self, kind: impl Into<String>, payload: Value) -> ActionId {
        let action = OfflineAction::new(kind, payload);
        let id = action.id;
        let action_kind = action.kind.clone();

        {
            let mut items = self.items.write().await;
            items.push(action);
            self.persist(&items).await;
        }

        self.bus.publish(
            Event::now(EventKind::ActionEnqueued)
                .with_action(action_kind)
                .with_id(id),
        );
        id
    }

    /// Removes the action with the given id (any position) and re-persists.
    ///
    /// Returns the removed action, or `None` if the id was absent (no-op).
    pub async fn remove(&self, id: ActionId) -> Option<OfflineAction> {
        let mut items = self.items.write().await;
        let pos = items.iter().position(|a| a.id == id)?;
        let removed = items.remove(pos);
        self.persist(&items).await;
        Some(removed)
    }

    /// Raises the retry count of the given action and re-persists.
    ///
    /// Counts are monotonic: a `new_count` at or below the current value is
    /// ignored. Absent ids are a no-op.
    pub async fn update_retry(&self, id: ActionId, new_count: u32) {
        let mut items = self.items.write().await;
        let Some(action) = items.iter_mut().find(|a| a.id == id) else {
            return;
        };
        if new_count <= action.retry_count {
            return;
        }
        action.retry_count = new_count;
        self.persist(&items).await;
    }

    /// Read-only FIFO snapshot of the queue.
    pub async fn list(&self) -> Vec<OfflineAction> {
        self.items.read().await.clone()
    }

    /// True if an action with this id is still queued.
    pub async fn contains(&self, id: ActionId) -> bool {
        self.items.read().await.iter().any(|a| a.id == id)
    }

    /// Number of pending actions.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// True if no actions are pending.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Empties the queue and the persisted bytes.
    ///
    /// Destructive; reserved for an explicit user-initiated "discard pending
    /// changes". Emits `QueueCleared` with the discarded count.
    pub async fn clear_all(&self) {
        let discarded = {
            let mut items = self.items.write().await;
            let n = items.len();
            items.clear();
            if let Err(e) = self.storage.clear().await {
                warn!(error = %e, "failed to clear persisted queue");
                self.bus
                    .publish(Event::now(EventKind::StoreWriteFailed).with_reason(e.to_string()));
            }
            n
        };

        self.bus
            .publish(Event::now(EventKind::QueueCleared).with_count(discarded));
    }

    /// Serializes and writes the full queue; must be called under the write
    /// lock so snapshots never interleave.
    async fn persist(&self, items: &[OfflineAction]) {
        let bytes = match serde_json::to_vec(items) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "failed to serialize queue");
                self.bus
                    .publish(Event::now(EventKind::StoreWriteFailed).with_reason(e.to_string()));
                return;
            }
        };

        if let Err(e) = self.storage.save(&bytes).await {
            warn!(error = %e, "failed to persist queue; in-memory state kept");
            self.bus
                .publish(Event::now(EventKind::StoreWriteFailed).with_reason(e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::storage::MemoryStorage;
    use async_trait::async_trait;
    use serde_json::json;

    fn queue_over(storage: Arc<dyn Storage>) -> (Arc<ActionQueue>, Bus) {
        let bus = Bus::new(64);
        (ActionQueue::new(storage, bus.clone()), bus)
    }

    #[tokio::test]
    async fn test_enqueue_preserves_fifo_order() {
        let (q, _bus) = queue_over(Arc::new(MemoryStorage::new()));
        q.enqueue("A", json!(1)).await;
        q.enqueue("B", json!(2)).await;
        q.enqueue("C", json!(3)).await;

        let kinds: Vec<String> = q.list().await.into_iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_remove_middle_keeps_order() {
        let (q, _bus) = queue_over(Arc::new(MemoryStorage::new()));
        q.enqueue("A", json!(null)).await;
        let b = q.enqueue("B", json!(null)).await;
        q.enqueue("C", json!(null)).await;

        assert!(q.remove(b).await.is_some());
        let kinds: Vec<String> = q.list().await.into_iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_contains_tracks_membership() {
        let (q, _bus) = queue_over(Arc::new(MemoryStorage::new()));
        let id = q.enqueue("A", json!(null)).await;

        assert!(q.contains(id).await);
        assert!(!q.contains(ActionId::new()).await);

        q.remove(id).await;
        assert!(!q.contains(id).await);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let (q, _bus) = queue_over(Arc::new(MemoryStorage::new()));
        q.enqueue("A", json!(null)).await;
        assert!(q.remove(ActionId::new()).await.is_none());
        assert_eq!(q.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_retry_is_monotonic() {
        let (q, _bus) = queue_over(Arc::new(MemoryStorage::new()));
        let id = q.enqueue("A", json!(null)).await;

        q.update_retry(id, 2).await;
        assert_eq!(q.list().await[0].retry_count, 2);

        // lower or equal values are ignored
        q.update_retry(id, 1).await;
        q.update_retry(id, 2).await;
        assert_eq!(q.list().await[0].retry_count, 2);

        q.update_retry(id, 3).await;
        assert_eq!(q.list().await[0].retry_count, 3);
    }

    #[tokio::test]
    async fn test_persistence_round_trip_across_restart() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

        let (q, _bus) = queue_over(storage.clone());
        q.enqueue("A", json!({"n": 1})).await;
        let b = q.enqueue("B", json!({"n": 2})).await;
        q.update_retry(b, 1).await;
        let before = q.list().await;

        // simulated restart: new queue rehydrated from the same bytes
        let (q2, _bus2) = queue_over(storage);
        q2.load().await;
        let after = q2.list().await;

        assert_eq!(after.len(), before.len());
        for (x, y) in before.iter().zip(after.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.kind, y.kind);
            assert_eq!(x.payload, y.payload);
            assert_eq!(x.retry_count, y.retry_count);
        }
    }

    #[tokio::test]
    async fn test_corrupt_bytes_rehydrate_empty_with_event() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(b"{not json").await.unwrap();

        let (q, bus) = queue_over(storage);
        let mut rx = bus.subscribe();
        q.load().await;

        assert!(q.is_empty().await);
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::StoreLoadFailed);
    }

    #[tokio::test]
    async fn test_clear_all_wipes_memory_and_bytes() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let (q, bus) = queue_over(storage.clone());
        let mut rx = bus.subscribe();

        q.enqueue("A", json!(null)).await;
        q.enqueue("B", json!(null)).await;
        q.clear_all().await;

        assert!(q.is_empty().await);
        assert!(storage.load().await.unwrap().is_none());

        // ActionEnqueued x2, then QueueCleared with the discarded count
        let mut cleared = None;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::QueueCleared {
                cleared = ev.count;
            }
        }
        assert_eq!(cleared, Some(2));
    }

    /// Storage stub whose writes always fail.
    struct BrokenStorage;

    #[async_trait]
    impl Storage for BrokenStorage {
        async fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }
        async fn save(&self, _bytes: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
        async fn clear(&self) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
    }

    #[tokio::test]
    async fn test_enqueue_survives_write_failure_best_effort() {
        let (q, bus) = queue_over(Arc::new(BrokenStorage));
        let mut rx = bus.subscribe();

        let id = q.enqueue("A", json!(null)).await;

        // in-memory state kept and the id is usable
        assert_eq!(q.len().await, 1);
        assert_eq!(q.list().await[0].id, id);

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::StoreWriteFailed);
    }
}
