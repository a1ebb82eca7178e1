//! # EngineBuilder: fluent construction of an [`Engine`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use syncline::{Engine, FileStorage, LogWriter};
//!
//! # async fn build() {
//! let engine = Engine::builder()
//!     .with_storage(Arc::new(FileStorage::new("queue.json")))
//!     .with_subscriber(Arc::new(LogWriter::new()))
//!     .initially_online(false)
//!     .build();
//! engine.start().await;
//! # }
//! ```
//!
//! ## Rules
//! - `build` must run inside a tokio runtime: it spawns the subscriber
//!   workers and the engine listener task.
//! - Defaults: in-memory storage, no subscribers, initially offline,
//!   [`Config::default`]. Starting offline is the safe assumption for a
//!   client app; feed the real signal via [`with_connectivity_feed`] or
//!   [`Engine::set_online`].
//!
//! [`with_connectivity_feed`]: EngineBuilder::with_connectivity_feed

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::core::coordinator::SyncCoordinator;
use crate::core::engine::Engine;
use crate::events::Bus;
use crate::handlers::HandlerRegistry;
use crate::store::{ActionQueue, MemoryStorage, Storage};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Fluent builder for [`Engine`].
pub struct EngineBuilder {
    cfg: Config,
    storage: Option<Arc<dyn Storage>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    initially_online: bool,
    feed: Option<watch::Receiver<bool>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Creates a builder with defaults (in-memory storage, offline).
    pub fn new() -> Self {
        Self {
            cfg: Config::default(),
            storage: None,
            subscribers: Vec::new(),
            initially_online: false,
            feed: None,
        }
    }

    /// Sets retry/timeout/backoff configuration.
    #[must_use]
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the persistence backend. Defaults to [`MemoryStorage`].
    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Adds an event subscriber (may be called repeatedly).
    #[must_use]
    pub fn with_subscriber(mut self, sub: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(sub);
        self
    }

    /// Sets the initial connectivity assumption.
    #[must_use]
    pub fn initially_online(mut self, online: bool) -> Self {
        self.initially_online = online;
        self
    }

    /// Attaches a push-style connectivity signal.
    ///
    /// The engine consumes the receiver: each observed value is fed through
    /// the debouncing monitor, so repeated identical signals are harmless.
    #[must_use]
    pub fn with_connectivity_feed(mut self, feed: watch::Receiver<bool>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Wires the components and spawns the listener tasks.
    pub fn build(self) -> Engine {
        let bus = Bus::new(self.cfg.bus_capacity);
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));

        let queue = ActionQueue::new(storage, bus.clone());
        let registry = HandlerRegistry::new();
        let monitor = ConnectivityMonitor::new(bus.clone(), self.initially_online);
        let coordinator = SyncCoordinator::new(
            Arc::clone(&queue),
            Arc::clone(&registry),
            Arc::clone(&monitor),
            bus.clone(),
            self.cfg,
        );
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let token = CancellationToken::new();

        if let Some(feed) = self.feed {
            monitor.spawn_feed(feed, token.clone());
        }

        let engine = Engine {
            bus,
            queue,
            registry,
            monitor,
            coordinator,
            subs,
            token,
        };
        engine.spawn_listeners();
        engine
    }
}
