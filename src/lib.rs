//! # syncline
//!
//! **Syncline** is an offline-first action queue and synchronization engine
//! for Rust clients.
//!
//! It records user mutations as durable queued actions while the client is
//! offline, and replays them in order against registered handlers once
//! connectivity returns. The crate is designed as the sync layer underneath
//! a UI: every state change is observable through events.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        queue_action()          register_handler()        set_online()
//!              │                        │                       │
//!              ▼                        ▼                       ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Engine (facade)                                                     │
//! │  - ActionQueue (durable FIFO, full-snapshot persistence)             │
//! │  - HandlerRegistry (action kind ──► Handler)                         │
//! │  - ConnectivityMonitor (debounced online/offline)                    │
//! │  - SyncCoordinator (drain loop: ordering, retries, reentrancy)       │
//! └──────┬───────────────────────────────────────────────────────┬───────┘
//!        │                                                       │
//!        ▼                                                       ▼
//! ┌──────────────┐     load / save (atomic)      ┌──────────────────────┐
//! │   Storage    │◄──────────────────────────────│   SyncCoordinator    │
//! │ (File / Mem) │                               │  (one action a time) │
//! └──────────────┘                               └──────────┬───────────┘
//!                                                           │
//!                                     Publishes: SyncStarted, ActionAttempting,
//!                                     ActionSucceeded, RetryScheduled,
//!                                     ActionTerminallyFailed, SyncCompleted, ...
//!                                                           ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                       │
//! │                   (capacity: Config::bus_capacity)                   │
//! └───────────────────────────────────┬──────────────────────────────────┘
//!                                     ▼
//!                         ┌────────────────────────┐
//!                         │    engine listener     │
//!                         └───┬────────────────┬───┘
//!                             ▼                ▼
//!                   WentOnline ─► drain   SubscriberSet
//!                                        (per-sub queues)
//!                                     ┌─────────┼─────────┐
//!                                     ▼         ▼         ▼
//!                                  worker1   worker2   workerN
//!                                     ▼         ▼         ▼
//!                                 sub1.on   sub2.on   subN.on
//!                                  _event()  _event()  _event()
//! ```
//!
//! ### Drain lifecycle
//! ```text
//! WentOnline / sync_now() ──► SyncCoordinator::drain()
//!
//! for each queued action (FIFO) {
//!   ├─► resolve handler by kind (none ─► drop + UnknownActionDropped)
//!   └─► loop {
//!         ├─► attempt = retry_count + 1
//!         ├─► publish ActionAttempting{ action, id, attempt }
//!         ├─► run attempt (optional timeout, panics caught)
//!         │       ├─ Ok           ─► remove from queue, next action
//!         │       ├─ Fatal error  ─► remove + ActionTerminallyFailed
//!         │       └─ retryable:
//!         │            ├─ budget exhausted ─► remove + ActionTerminallyFailed
//!         │            └─ else ─► persist retry_count
//!         │                       publish RetryScheduled{ delay }
//!         │                       sleep(backoff.next(...))
//!         │                       went offline? ─► stop drain, action stays
//!         └─ continue with attempt + 1
//!       }
//! }
//!
//! On exit: publish SyncCompleted{ delivered }; queue keeps whatever did not
//! resolve, in order, for the next drain.
//! ```
//!
//! ## Features
//! | Area               | Description                                                        | Key types / traits                       |
//! |--------------------|--------------------------------------------------------------------|------------------------------------------|
//! | **Engine**         | Facade: queue, trigger syncs, observe state.                       | [`Engine`], [`EngineBuilder`]            |
//! | **Queue**          | Durable FIFO of pending actions with atomic persistence.           | [`ActionQueue`], [`OfflineAction`]       |
//! | **Storage**        | Pluggable persistence backends.                                    | [`Storage`], [`FileStorage`], [`MemoryStorage`] |
//! | **Handlers**       | Map action kinds to async delivery logic.                          | [`Handler`], [`HandlerFn`], [`HandlerRegistry`] |
//! | **Connectivity**   | Debounced online/offline state and transitions.                    | [`ConnectivityMonitor`]                  |
//! | **Sync**           | Ordered replay with retries, backoff and reentrancy guard.         | [`SyncCoordinator`], [`SyncStatus`]      |
//! | **Policies**       | Retry backoff and jitter strategies.                               | [`BackoffPolicy`], [`JitterPolicy`]      |
//! | **Subscriber API** | Hook into engine events (logging, badges, notifications).          | [`Subscribe`], [`LogWriter`]             |
//! | **Errors**         | Typed errors for handlers and persistence.                         | [`ActionError`], [`StoreError`]          |
//! | **Configuration**  | Centralize retry/timeout/backoff settings.                         | [`Config`]                               |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use syncline::{ActionError, Engine, EventKind, HandlerFn, LogWriter, MemoryStorage, OfflineAction};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let engine = Engine::builder()
//!         .with_storage(Arc::new(MemoryStorage::new()))
//!         .with_subscriber(Arc::new(LogWriter::new()))
//!         .initially_online(false)
//!         .build();
//!     engine.start().await;
//!
//!     // Delivery logic for one action kind; the action id doubles as an
//!     // idempotency key for the remote call.
//!     engine
//!         .register_handler(
//!             "FAVORITE_CAFE",
//!             HandlerFn::arc(|action: OfflineAction| async move {
//!                 println!("delivering {} ({})", action.kind, action.id);
//!                 Ok::<(), ActionError>(())
//!             }),
//!         )
//!         .await;
//!
//!     // Queued while offline: persisted, not delivered.
//!     engine.queue_action("FAVORITE_CAFE", json!({ "cafeId": 42 })).await;
//!     assert_eq!(engine.pending_count().await, 1);
//!
//!     // Connectivity returns: the queue drains in order.
//!     let mut events = engine.subscribe();
//!     engine.set_online(true);
//!     while let Ok(ev) = events.recv().await {
//!         if ev.kind == EventKind::SyncCompleted {
//!             break;
//!         }
//!     }
//!     assert_eq!(engine.pending_count().await, 0);
//! }
//! ```

mod config;
mod connectivity;
mod core;
mod error;
mod events;
mod handlers;
mod policies;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use connectivity::ConnectivityMonitor;
pub use core::{Engine, EngineBuilder, SyncCoordinator, SyncStatus};
pub use error::{ActionError, StoreError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{Handler, HandlerFn, HandlerRef, HandlerRegistry};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use store::{ActionId, ActionQueue, FileStorage, MemoryStorage, OfflineAction, Storage};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
