//! Engine core: orchestration of queue draining.
//!
//! The public API from this module is [`Engine`] (facade consumed by the UI
//! layer), [`EngineBuilder`] and [`SyncStatus`].
//!
//! Internal modules:
//! - [`attempt`]: executes one handler attempt with timeout/panic isolation
//!   and event publishing;
//! - [`coordinator`]: drains the queue with ordering, retry and reentrancy
//!   guarantees;
//! - [`engine`]: the facade wiring queue, registry, monitor and coordinator;
//! - [`builder`]: fluent construction of an [`Engine`].

mod attempt;
mod builder;
mod coordinator;
mod engine;

pub use builder::EngineBuilder;
pub use coordinator::{SyncCoordinator, SyncStatus};
pub use engine::Engine;
