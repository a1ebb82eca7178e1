//! Connectivity observation.
//!
//! [`ConnectivityMonitor`] is the single source of truth for "is the client
//! currently connected". It debounces the platform's (possibly noisy) signal
//! into exactly one `WentOnline`/`WentOffline` event per real state change.

mod monitor;

pub use monitor::ConnectivityMonitor;
