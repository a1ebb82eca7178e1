//! # SyncCoordinator: drives replay of pending actions.
//!
//! One [`SyncCoordinator::drain`] call processes the current queue snapshot
//! strictly in FIFO order, one action fully resolved before the next begins —
//! this preserves per-entity mutation ordering (a favorite-toggle followed by
//! a profile update for the same user applies in that order).
//!
//! ## Per-action flow
//! ```text
//! resolve handler by kind
//!   ├─ none registered ──► remove + UnknownActionDropped (terminal)
//!   └─ found:
//! loop {
//!   ├─► attempt = retry_count + 1
//!   ├─► publish ActionAttempting
//!   ├─► run_attempt(handler, action, timeout)
//!   │       ├─ Ok            ─► remove, delivered += 1, next action
//!   │       ├─ Err(Fatal)    ─► remove + ActionTerminallyFailed, next action
//!   │       └─ Err(retryable):
//!   │            ├─ attempt >= budget ─► remove + ActionTerminallyFailed
//!   │            └─ else ─► update_retry(attempt)
//!   │                       publish RetryScheduled
//!   │                       sleep(backoff) ── offline? ─► stop drain,
//!   │                       action stays queued for the next drain
//!   └─ repeat with attempt + 1
//! }
//! ```
//!
//! ## Rules
//! - **Reentrancy**: an atomic in-progress flag, set before the snapshot is
//!   taken and cleared on every exit path (drop guard), coalesces concurrent
//!   drain requests into [`SyncStatus::AlreadyRunning`].
//! - **Offline**: a drain while offline is rejected up front; going offline
//!   mid-drain stops the run with [`SyncStatus::Interrupted`], surviving
//!   actions keep their relative order.
//! - **Stale snapshot entries**: an action cancelled or cleared after the
//!   snapshot was taken is skipped, never handed to its handler.
//! - **Isolation**: per-action failures never abort the rest of the run and
//!   never propagate out of `drain` — the UI layer may call it at any time.
//! - **Racing enqueues**: actions enqueued while a drain is running are not
//!   picked up by that run; the next trigger drains them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::time;
use tracing::warn;

use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::core::attempt::run_attempt;
use crate::events::{Bus, Event, EventKind};
use crate::handlers::HandlerRegistry;
use crate::store::{ActionId, ActionQueue, OfflineAction};

/// Outcome of a drain request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// The run finished; `delivered` actions were confirmed by their handlers.
    Completed {
        /// Actions removed on success during this run.
        delivered: usize,
    },
    /// Connectivity dropped mid-run; the remaining actions stay queued in
    /// order for the next drain.
    Interrupted {
        /// Actions removed on success before the interruption.
        delivered: usize,
    },
    /// Another drain is in flight; this request was coalesced into a no-op.
    AlreadyRunning,
    /// The client is offline; no attempts were made.
    Offline,
}

/// Orchestrates queue draining with ordering, retry and reentrancy guarantees.
pub struct SyncCoordinator {
    queue: Arc<ActionQueue>,
    registry: Arc<HandlerRegistry>,
    monitor: Arc<ConnectivityMonitor>,
    bus: Bus,
    cfg: Config,
    draining: AtomicBool,
    in_flight: Mutex<Option<ActionId>>,
}

/// Clears the in-progress flag on every exit path, including panics.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncCoordinator {
    /// Creates a new coordinator over the given collaborators.
    pub fn new(
        queue: Arc<ActionQueue>,
        registry: Arc<HandlerRegistry>,
        monitor: Arc<ConnectivityMonitor>,
        bus: Bus,
        cfg: Config,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            registry,
            monitor,
            bus,
            cfg,
            draining: AtomicBool::new(false),
            in_flight: Mutex::new(None),
        })
    }

    /// True while a drain run is in progress.
    #[inline]
    pub fn is_syncing(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Cancels a **pending** action by id.
    ///
    /// Returns `true` if the action was removed. Refused (`false`) while the
    /// action is in flight: racing an outstanding remote call would make the
    /// outcome ambiguous.
    pub async fn cancel(&self, id: ActionId) -> bool {
        if *self.in_flight_slot() == Some(id) {
            return false;
        }
        match self.queue.remove(id).await {
            Some(removed) => {
                self.bus.publish(
                    Event::now(EventKind::ActionCancelled)
                        .with_action(removed.kind)
                        .with_id(id),
                );
                true
            }
            None => false,
        }
    }

    /// Drains the current queue snapshot.
    ///
    /// Never returns an error and never panics outward; all per-action
    /// failures are converted into events and classifications.
    pub async fn drain(&self) -> SyncStatus {
        if self.draining.swap(true, Ordering::SeqCst) {
            return SyncStatus::AlreadyRunning;
        }
        let _guard = DrainGuard(&self.draining);

        if !self.monitor.is_online() {
            return SyncStatus::Offline;
        }

        self.bus.publish(Event::now(EventKind::SyncStarted));

        let snapshot = self.queue.list().await;
        let mut delivered = 0usize;
        let mut interrupted = false;

        for action in snapshot {
            if !self.monitor.is_online() {
                interrupted = true;
                break;
            }
            if !self.process_action(action, &mut delivered).await {
                interrupted = true;
                break;
            }
        }

        if interrupted {
            let remaining = self.queue.len().await;
            warn!(remaining, "drain interrupted; queue order preserved");
            self.bus.publish(
                Event::now(EventKind::SyncCompleted)
                    .with_count(delivered)
                    .with_reason("went offline"),
            );
            return SyncStatus::Interrupted { delivered };
        }

        self.bus
            .publish(Event::now(EventKind::SyncCompleted).with_count(delivered));
        SyncStatus::Completed { delivered }
    }

    /// Resolves one action to a terminal outcome (success, terminal failure,
    /// unknown kind) or leaves it queued when the run is interrupted.
    ///
    /// Returns `false` when the drain should stop (went offline).
    async fn process_action(&self, mut action: OfflineAction, delivered: &mut usize) -> bool {
        // the snapshot can be stale: skip anything cancelled or cleared
        // while an earlier action was being resolved
        if !self.queue.contains(action.id).await {
            return true;
        }

        let Some(handler) = self.registry.resolve(&action.kind).await else {
            // retrying cannot make a handler appear
            warn!(kind = %action.kind, id = %action.id, "no handler registered; dropping");
            self.queue.remove(action.id).await;
            self.bus.publish(
                Event::now(EventKind::UnknownActionDropped)
                    .with_action(action.kind)
                    .with_id(action.id),
            );
            return true;
        };

        let budget = self.cfg.retry_budget();

        loop {
            let attempt = action.retry_count + 1;

            self.set_in_flight(Some(action.id));
            self.bus.publish(
                Event::now(EventKind::ActionAttempting)
                    .with_action(action.kind.clone())
                    .with_id(action.id)
                    .with_attempt(attempt),
            );
            let res = run_attempt(
                handler.as_ref(),
                &action,
                self.cfg.attempt_timeout_opt(),
                attempt,
                &self.bus,
            )
            .await;
            self.set_in_flight(None);

            match res {
                Ok(()) => {
                    self.queue.remove(action.id).await;
                    *delivered += 1;
                    return true;
                }
                Err(e) if !e.is_retryable() => {
                    self.remove_terminal(&action, attempt, &e.to_string()).await;
                    return true;
                }
                Err(e) => {
                    if attempt >= budget {
                        self.remove_terminal(&action, attempt, &e.to_string()).await;
                        return true;
                    }

                    self.queue.update_retry(action.id, attempt).await;
                    action.retry_count = attempt;

                    let delay = self.cfg.backoff.next(attempt - 1);
                    self.bus.publish(
                        Event::now(EventKind::RetryScheduled)
                            .with_action(action.kind.clone())
                            .with_id(action.id)
                            .with_attempt(attempt)
                            .with_delay(delay),
                    );
                    if !delay.is_zero() {
                        time::sleep(delay).await;
                    }
                    // connectivity may have flipped during the wait; the
                    // action stays queued for the next drain in that case
                    if !self.monitor.is_online() {
                        return false;
                    }
                    // the action is Pending during the wait, so it may have
                    // been cancelled out from under us
                    if !self.queue.contains(action.id).await {
                        return true;
                    }
                }
            }
        }
    }

    /// Removes an action permanently and emits exactly one terminal-failure
    /// notification for it.
    async fn remove_terminal(&self, action: &OfflineAction, attempts: u32, reason: &str) {
        self.queue.remove(action.id).await;
        self.bus.publish(
            Event::now(EventKind::ActionTerminallyFailed)
                .with_action(action.kind.clone())
                .with_id(action.id)
                .with_attempt(attempts)
                .with_reason(reason),
        );
    }

    fn set_in_flight(&self, id: Option<ActionId>) {
        *self.in_flight_slot() = id;
    }

    fn in_flight_slot(&self) -> std::sync::MutexGuard<'_, Option<ActionId>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use crate::handlers::HandlerFn;
    use crate::store::MemoryStorage;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct Rig {
        bus: Bus,
        queue: Arc<ActionQueue>,
        registry: Arc<HandlerRegistry>,
        monitor: Arc<ConnectivityMonitor>,
        coordinator: Arc<SyncCoordinator>,
    }

    fn rig_with(cfg: Config, online: bool) -> Rig {
        let bus = Bus::new(256);
        let queue = ActionQueue::new(Arc::new(MemoryStorage::new()), bus.clone());
        let registry = HandlerRegistry::new();
        let monitor = ConnectivityMonitor::new(bus.clone(), online);
        let coordinator = SyncCoordinator::new(
            queue.clone(),
            registry.clone(),
            monitor.clone(),
            bus.clone(),
            cfg,
        );
        Rig {
            bus,
            queue,
            registry,
            monitor,
            coordinator,
        }
    }

    fn rig(online: bool) -> Rig {
        rig_with(Config::default(), online)
    }

    #[tokio::test]
    async fn test_drain_rejected_while_offline() {
        let r = rig(false);
        r.queue.enqueue("A", json!(null)).await;
        assert_eq!(r.coordinator.drain().await, SyncStatus::Offline);
        assert_eq!(r.queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_fifo_invocation_order() {
        let r = rig(true);
        let order: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));
        for kind in ["A", "B", "C"] {
            let order = order.clone();
            r.registry
                .register(
                    kind,
                    HandlerFn::arc(move |a: OfflineAction| {
                        let order = order.clone();
                        async move {
                            order.lock().unwrap().push(a.kind);
                            Ok(())
                        }
                    }),
                )
                .await;
        }

        r.queue.enqueue("A", json!(1)).await;
        r.queue.enqueue("B", json!(2)).await;
        r.queue.enqueue("C", json!(3)).await;

        let status = r.coordinator.drain().await;
        assert_eq!(status, SyncStatus::Completed { delivered: 3 });
        assert_eq!(*order.lock().unwrap(), vec!["A", "B", "C"]);
        assert!(r.queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_retry_bound_exactly_three_invocations() {
        let r = rig(true);
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let c = calls.clone();
        r.registry
            .register(
                "FAILS",
                HandlerFn::arc(move |a: OfflineAction| {
                    let c = c.clone();
                    async move {
                        c.lock().unwrap().push(a.id);
                        Err(ActionError::fail("always"))
                    }
                }),
            )
            .await;

        let mut rx = r.bus.subscribe();
        let id = r.queue.enqueue("FAILS", json!(null)).await;

        r.coordinator.drain().await;

        // exactly max_retries invocations, all with the same id
        let seen = calls.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|i| *i == id));
        assert!(r.queue.is_empty().await);

        // exactly one terminal-failure event, reporting 3 attempts
        let mut terminal = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::ActionTerminallyFailed {
                terminal.push(ev);
            }
        }
        assert_eq!(terminal.len(), 1);
        assert_eq!(terminal[0].id, Some(id));
        assert_eq!(terminal[0].attempt, Some(3));
        assert_eq!(terminal[0].action.as_deref(), Some("FAILS"));
    }

    #[tokio::test]
    async fn test_fatal_failure_is_not_retried() {
        let r = rig(true);
        let calls = Arc::new(StdMutex::new(0u32));
        let c = calls.clone();
        r.registry
            .register(
                "FATAL",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let c = c.clone();
                    async move {
                        *c.lock().unwrap() += 1;
                        Err(ActionError::fatal("no such account"))
                    }
                }),
            )
            .await;

        let mut rx = r.bus.subscribe();
        r.queue.enqueue("FATAL", json!(null)).await;
        r.coordinator.drain().await;

        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(r.queue.is_empty().await);

        let mut saw_terminal = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::ActionTerminallyFailed {
                saw_terminal = true;
                assert_eq!(ev.attempt, Some(1));
            }
        }
        assert!(saw_terminal);
    }

    #[tokio::test]
    async fn test_unknown_kind_dropped_without_handler_call() {
        let r = rig(true);
        let mut rx = r.bus.subscribe();
        let id = r.queue.enqueue("NOBODY_HOME", json!(null)).await;

        let status = r.coordinator.drain().await;
        assert_eq!(status, SyncStatus::Completed { delivered: 0 });
        assert!(r.queue.is_empty().await);

        let mut saw_drop = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::UnknownActionDropped {
                saw_drop = true;
                assert_eq!(ev.id, Some(id));
            }
        }
        assert!(saw_drop);
    }

    #[tokio::test]
    async fn test_failing_head_does_not_block_terminal_resolution_of_tail() {
        let r = rig(true);
        let order = Arc::new(StdMutex::new(Vec::new()));
        let o1 = order.clone();
        r.registry
            .register(
                "FAILS",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let o = o1.clone();
                    async move {
                        o.lock().unwrap().push("FAILS");
                        Err(ActionError::fail("down"))
                    }
                }),
            )
            .await;
        let o2 = order.clone();
        r.registry
            .register(
                "OK",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let o = o2.clone();
                    async move {
                        o.lock().unwrap().push("OK");
                        Ok(())
                    }
                }),
            )
            .await;

        r.queue.enqueue("FAILS", json!(null)).await;
        r.queue.enqueue("OK", json!(null)).await;

        let status = r.coordinator.drain().await;
        assert_eq!(status, SyncStatus::Completed { delivered: 1 });

        // head resolves (exhausts its budget) before the tail is touched
        let seen = order.lock().unwrap().clone();
        assert_eq!(seen, vec!["FAILS", "FAILS", "FAILS", "OK"]);
    }

    #[tokio::test]
    async fn test_reentrancy_coalesces_concurrent_drains() {
        let r = rig(true);
        let calls = Arc::new(StdMutex::new(0u32));
        let c = calls.clone();
        r.registry
            .register(
                "SLOW",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let c = c.clone();
                    async move {
                        *c.lock().unwrap() += 1;
                        tokio::task::yield_now().await;
                        Ok(())
                    }
                }),
            )
            .await;
        r.queue.enqueue("SLOW", json!(null)).await;

        let (first, second) = tokio::join!(r.coordinator.drain(), r.coordinator.drain());

        let statuses = [first, second];
        assert!(statuses.contains(&SyncStatus::AlreadyRunning));
        assert!(
            statuses
                .iter()
                .any(|s| matches!(s, SyncStatus::Completed { delivered: 1 }))
        );
        assert_eq!(*calls.lock().unwrap(), 1, "handler dispatched once");
    }

    #[tokio::test]
    async fn test_guard_cleared_after_drain() {
        let r = rig(true);
        assert!(!r.coordinator.is_syncing());
        r.coordinator.drain().await;
        assert!(!r.coordinator.is_syncing());
        // a second drain must not be wedged
        assert!(matches!(
            r.coordinator.drain().await,
            SyncStatus::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn test_guard_cleared_when_offline_rejected() {
        let r = rig(false);
        assert_eq!(r.coordinator.drain().await, SyncStatus::Offline);
        assert!(!r.coordinator.is_syncing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delay_respected_between_attempts() {
        let cfg = Config {
            backoff: crate::policies::BackoffPolicy {
                first: Duration::from_millis(500),
                max: Duration::from_secs(5),
                factor: 1.0,
                jitter: crate::policies::JitterPolicy::None,
            },
            ..Config::default()
        };
        let r = rig_with(cfg, true);

        let stamps = Arc::new(StdMutex::new(Vec::new()));
        let s = stamps.clone();
        r.registry
            .register(
                "FAILS",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let s = s.clone();
                    async move {
                        s.lock().unwrap().push(tokio::time::Instant::now());
                        Err(ActionError::fail("down"))
                    }
                }),
            )
            .await;

        r.queue.enqueue("FAILS", json!(null)).await;
        r.coordinator.drain().await;

        let stamps = stamps.lock().unwrap().clone();
        assert_eq!(stamps.len(), 3);
        assert!(stamps[1] - stamps[0] >= Duration::from_millis(500));
        assert!(stamps[2] - stamps[1] >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_handler_waits_for_first_to_resolve() {
        let r = rig(true);
        let log = Arc::new(StdMutex::new(Vec::new()));
        for kind in ["FIRST", "SECOND"] {
            let log = log.clone();
            r.registry
                .register(
                    kind,
                    HandlerFn::arc(move |a: OfflineAction| {
                        let log = log.clone();
                        async move {
                            log.lock().unwrap().push(format!("{}:start", a.kind));
                            tokio::time::sleep(Duration::from_millis(500)).await;
                            log.lock().unwrap().push(format!("{}:end", a.kind));
                            Ok(())
                        }
                    }),
                )
                .await;
        }

        r.queue.enqueue("FIRST", json!(null)).await;
        r.queue.enqueue("SECOND", json!(null)).await;
        r.coordinator.drain().await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["FIRST:start", "FIRST:end", "SECOND:start", "SECOND:end"]
        );
    }

    #[tokio::test]
    async fn test_cancel_pending_action() {
        let r = rig(false);
        let mut rx = r.bus.subscribe();
        let id = r.queue.enqueue("A", json!(null)).await;

        assert!(r.coordinator.cancel(id).await);
        assert!(r.queue.is_empty().await);
        assert!(!r.coordinator.cancel(id).await, "already gone");

        let mut saw_cancelled = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::ActionCancelled {
                saw_cancelled = true;
                assert_eq!(ev.id, Some(id));
            }
        }
        assert!(saw_cancelled);
    }

    #[tokio::test]
    async fn test_mid_drain_offline_preserves_remaining_order() {
        let r = rig(true);
        let monitor = r.monitor.clone();
        r.registry
            .register(
                "DROPS_LINK",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let monitor = monitor.clone();
                    async move {
                        // connection lost right after this action succeeds
                        monitor.set_online(false);
                        Ok(())
                    }
                }),
            )
            .await;
        r.registry
            .register("NEXT", HandlerFn::arc(|_a: OfflineAction| async { Ok(()) }))
            .await;

        r.queue.enqueue("DROPS_LINK", json!(null)).await;
        let b = r.queue.enqueue("NEXT", json!(null)).await;
        let c = r.queue.enqueue("NEXT", json!(null)).await;

        let mut rx = r.bus.subscribe();
        let status = r.coordinator.drain().await;
        assert_eq!(status, SyncStatus::Interrupted { delivered: 1 });

        let remaining: Vec<ActionId> = r.queue.list().await.iter().map(|a| a.id).collect();
        assert_eq!(remaining, vec![b, c]);

        // the completion event carries a reason so the UI can tell a partial
        // run from a finished one
        let mut completed = None;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::SyncCompleted {
                completed = Some(ev);
            }
        }
        let completed = completed.unwrap();
        assert_eq!(completed.count, Some(1));
        assert!(completed.reason.is_some());
    }

    #[tokio::test]
    async fn test_cancel_mid_drain_skips_undelivered_action() {
        let r = rig(true);
        let entered = Arc::new(tokio::sync::Notify::new());
        let gate = Arc::new(tokio::sync::Notify::new());

        let (e, g) = (entered.clone(), gate.clone());
        r.registry
            .register(
                "SLOW",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let (e, g) = (e.clone(), g.clone());
                    async move {
                        e.notify_one();
                        g.notified().await;
                        Ok(())
                    }
                }),
            )
            .await;

        let calls = Arc::new(StdMutex::new(0u32));
        let c = calls.clone();
        r.registry
            .register(
                "B",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let c = c.clone();
                    async move {
                        *c.lock().unwrap() += 1;
                        Ok(())
                    }
                }),
            )
            .await;

        r.queue.enqueue("SLOW", json!(null)).await;
        let b = r.queue.enqueue("B", json!(null)).await;

        let coordinator = r.coordinator.clone();
        let drain = tokio::spawn(async move { coordinator.drain().await });

        // cancel B while the drain is busy with the earlier action
        entered.notified().await;
        assert!(r.coordinator.cancel(b).await);
        gate.notify_one();

        let status = drain.await.unwrap();
        assert_eq!(status, SyncStatus::Completed { delivered: 1 });
        assert_eq!(
            *calls.lock().unwrap(),
            0,
            "cancelled action must never reach its handler"
        );
        assert!(r.queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_cancel_refused_while_in_flight() {
        let r = rig(true);
        let entered = Arc::new(tokio::sync::Notify::new());
        let gate = Arc::new(tokio::sync::Notify::new());

        let (e, g) = (entered.clone(), gate.clone());
        r.registry
            .register(
                "SLOW",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let (e, g) = (e.clone(), g.clone());
                    async move {
                        e.notify_one();
                        g.notified().await;
                        Ok(())
                    }
                }),
            )
            .await;

        let id = r.queue.enqueue("SLOW", json!(null)).await;
        let coordinator = r.coordinator.clone();
        let drain = tokio::spawn(async move { coordinator.drain().await });

        entered.notified().await;
        assert!(
            !r.coordinator.cancel(id).await,
            "in-flight actions cannot be cancelled"
        );
        assert_eq!(r.queue.len().await, 1);

        gate.notify_one();
        let status = drain.await.unwrap();
        assert_eq!(status, SyncStatus::Completed { delivered: 1 });
        assert!(r.queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_racing_enqueue_not_drained_by_same_run() {
        let r = rig(true);
        let entered = Arc::new(tokio::sync::Notify::new());
        let gate = Arc::new(tokio::sync::Notify::new());
        let calls = Arc::new(StdMutex::new(0u32));

        let (e, g, c) = (entered.clone(), gate.clone(), calls.clone());
        r.registry
            .register(
                "SLOW",
                HandlerFn::arc(move |_a: OfflineAction| {
                    let (e, g, c) = (e.clone(), g.clone(), c.clone());
                    async move {
                        let first = {
                            let mut n = c.lock().unwrap();
                            *n += 1;
                            *n == 1
                        };
                        if first {
                            e.notify_one();
                            g.notified().await;
                        }
                        Ok(())
                    }
                }),
            )
            .await;

        r.queue.enqueue("SLOW", json!(null)).await;
        let coordinator = r.coordinator.clone();
        let drain = tokio::spawn(async move { coordinator.drain().await });

        // enqueue while the drain is mid-run; the snapshot predates it
        entered.notified().await;
        let late = r.queue.enqueue("SLOW", json!(null)).await;
        gate.notify_one();

        let status = drain.await.unwrap();
        assert_eq!(status, SyncStatus::Completed { delivered: 1 });
        assert_eq!(*calls.lock().unwrap(), 1, "late enqueue waits for the next run");

        let remaining: Vec<ActionId> = r.queue.list().await.iter().map(|a| a.id).collect();
        assert_eq!(remaining, vec![late]);
    }
}
