//! # ConnectivityMonitor: debounced online/offline state.
//!
//! The platform delivers raw boolean signals — repeated, bursty, sometimes
//! redundant. The monitor collapses them into a single current state plus one
//! transition event per actual change, so redundant signals never trigger
//! redundant drains.
//!
//! ## Rules
//! - Purely observational: no side effects beyond publishing events.
//! - [`ConnectivityMonitor::is_online`] never fails and never blocks.
//! - Raw signals arrive either via [`ConnectivityMonitor::set_online`] or a
//!   long-lived [`tokio::sync::watch`] feed owned by the platform layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};

/// Debounced source of truth for client connectivity.
pub struct ConnectivityMonitor {
    online: AtomicBool,
    bus: Bus,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial state. No event is published
    /// for the initial state.
    pub fn new(bus: Bus, initially_online: bool) -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(initially_online),
            bus,
        })
    }

    /// Current connectivity state.
    #[inline]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Feeds one raw platform signal.
    ///
    /// Debounced: publishes `WentOnline`/`WentOffline` only when the state
    /// actually flips. Returns `true` if a transition occurred.
    pub fn set_online(&self, online: bool) -> bool {
        let prev = self.online.swap(online, Ordering::SeqCst);
        if prev == online {
            return false;
        }
        let kind = if online {
            EventKind::WentOnline
        } else {
            EventKind::WentOffline
        };
        self.bus.publish(Event::now(kind));
        true
    }

    /// Spawns a long-lived listener over a platform `watch` stream.
    ///
    /// The subscription outlives any UI render cycle; it ends only when the
    /// sender side is dropped or `token` is cancelled.
    pub fn spawn_feed(self: &Arc<Self>, mut rx: watch::Receiver<bool>, token: CancellationToken) {
        let me = Arc::clone(self);
        tokio::spawn(async move {
            // apply the value present at subscription time
            me.set_online(*rx.borrow_and_update());
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        me.set_online(*rx.borrow_and_update());
                    }
                }
            }
        });
    }
}
