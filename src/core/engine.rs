//! # Engine: the public facade consumed by the UI layer.
//!
//! The [`Engine`] wires the four components together and owns the long-lived
//! listener tasks:
//!
//! ```text
//! queue_action() ──► ActionQueue ── persist ──► Storage
//!        │
//!        └─ online? ──► spawn SyncCoordinator::drain()
//!
//! platform signal ──► ConnectivityMonitor ── WentOnline ──► drain()
//!
//! Bus ──► engine listener ──► SubscriberSet ──► UI badges / notifications
//! ```
//!
//! The engine is deliberately decoupled from any UI render cycle: it holds
//! its own queue reference and a single long-lived connectivity subscription,
//! so no stale closure can observe an outdated queue snapshot.
//!
//! ## Rules
//! - Every public method is safe to call at any time; none of them panic or
//!   propagate handler errors.
//! - `sync_now` is coalesced while a drain is in flight and rejected while
//!   offline (see [`SyncStatus`]).
//! - Listener tasks end when [`Engine::shutdown`] cancels the engine token.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::connectivity::ConnectivityMonitor;
use crate::core::builder::EngineBuilder;
use crate::core::coordinator::{SyncCoordinator, SyncStatus};
use crate::events::{Bus, Event, EventKind};
use crate::handlers::{HandlerRef, HandlerRegistry};
use crate::store::{ActionId, ActionQueue};
use crate::subscribers::SubscriberSet;

/// Offline action queue and synchronization engine.
///
/// Construct via [`Engine::builder`], then call [`Engine::start`] once to
/// rehydrate the persisted queue before queueing actions.
pub struct Engine {
    pub(crate) bus: Bus,
    pub(crate) queue: Arc<ActionQueue>,
    pub(crate) registry: Arc<HandlerRegistry>,
    pub(crate) monitor: Arc<ConnectivityMonitor>,
    pub(crate) coordinator: Arc<SyncCoordinator>,
    pub(crate) subs: Arc<SubscriberSet>,
    pub(crate) token: CancellationToken,
}

impl Engine {
    /// Starts building an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Rehydrates the queue from persisted bytes.
    ///
    /// Call once after construction, before queueing actions. Corrupt bytes
    /// degrade to an empty queue (`StoreLoadFailed`), never a crash.
    pub async fn start(&self) {
        self.queue.load().await;
    }

    /// Registers a handler for an action kind.
    pub async fn register_handler(&self, kind: impl Into<String>, handler: HandlerRef) {
        self.registry.register(kind, handler).await;
    }

    /// Current connectivity state (read-only, reactive via events).
    #[inline]
    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// True while a drain run is in progress.
    #[inline]
    pub fn is_syncing(&self) -> bool {
        self.coordinator.is_syncing()
    }

    /// Number of pending actions.
    pub async fn pending_count(&self) -> usize {
        self.queue.len().await
    }

    /// Records a user mutation for (eventual) delivery. Returns the action
    /// id, which doubles as the idempotency key seen by the handler.
    ///
    /// If currently online, a drain is triggered in the background; the call
    /// itself never waits for remote effects.
    pub async fn queue_action(&self, kind: impl Into<String>, payload: Value) -> ActionId {
        let id = self.queue.enqueue(kind, payload).await;
        if self.monitor.is_online() {
            let coordinator = Arc::clone(&self.coordinator);
            tokio::spawn(async move {
                let _ = coordinator.drain().await;
            });
        }
        id
    }

    /// Manually triggers a drain. Safe to call anytime: coalesced if a drain
    /// is already running, a no-op while offline.
    pub async fn sync_now(&self) -> SyncStatus {
        self.coordinator.drain().await
    }

    /// Cancels a pending action by id.
    ///
    /// Returns `true` if removed. Refused while that action is in flight.
    pub async fn cancel_action(&self, id: ActionId) -> bool {
        self.coordinator.cancel(id).await
    }

    /// Discards all pending actions and their persisted bytes.
    ///
    /// Destructive; intended for an explicit user-initiated "discard pending
    /// changes".
    pub async fn clear_pending_actions(&self) {
        self.queue.clear_all().await;
    }

    /// Feeds one raw connectivity signal (debounced by the monitor).
    ///
    /// Platforms with a push-style signal should prefer the `watch` feed
    /// configured on the builder.
    pub fn set_online(&self, online: bool) {
        self.monitor.set_online(online);
    }

    /// Raw event tap: every lifecycle event the engine publishes.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops the engine's listener tasks. Pending actions stay persisted.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Spawns the listener that fans events out to subscribers and triggers
    /// a drain on each offline→online transition.
    pub(crate) fn spawn_listeners(&self) {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        let coordinator = Arc::clone(&self.coordinator);
        let token = self.token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => {
                            subs.emit(&ev);
                            if ev.kind == EventKind::WentOnline {
                                let _ = coordinator.drain().await;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "engine listener lagged");
                            continue;
                        }
                    }
                }
            }
        });
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
