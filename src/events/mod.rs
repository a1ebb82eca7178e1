//! Engine events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the queue, connectivity
//! monitor, coordinator and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ActionQueue`, `ConnectivityMonitor`, `SyncCoordinator`,
//!   attempt runner, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the engine's subscriber listener (fans out to
//!   `SubscriberSet`) and its connectivity listener (drains on `WentOnline`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
