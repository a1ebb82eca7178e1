//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery
//! for consuming engine events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   queue / monitor / coordinator ── publish(Event) ──► Bus
//!                                                        │
//!                                          engine listener (one receiver)
//!                                                        │
//!                                              SubscriberSet::emit(&Event)
//!                                           ┌────────────┼────────────┐
//!                                           ▼            ▼            ▼
//!                                       [queue S1]   [queue S2]   [queue SN]
//!                                           ▼            ▼            ▼
//!                                       worker S1    worker S2    worker SN
//!                                           ▼            ▼            ▼
//!                                      on_event()   on_event()   on_event()
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** - observe and react to events (logging, metrics,
//!   pending-count badges)
//! - The UI layer typically implements a subscriber that maps
//!   `SyncStarted` / `SyncCompleted` / `ActionTerminallyFailed` to user
//!   notifications.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
