//! Durable action store.
//!
//! This module provides the persistent half of the engine:
//! - [`ActionId`], [`OfflineAction`] — the unit of deferred work
//! - [`Storage`] — raw byte persistence seam, with [`FileStorage`] and
//!   [`MemoryStorage`] backends
//! - [`ActionQueue`] — durable, ordered, single-writer queue of pending
//!   actions, rewritten wholesale after every mutation

mod action;
mod queue;
mod storage;

pub use action::{ActionId, OfflineAction};
pub use queue::ActionQueue;
pub use storage::{FileStorage, MemoryStorage, Storage};
