//! # Global engine configuration.
//!
//! Provides [`Config`], centralized settings for the sync engine.
//!
//! Config is consumed once at [`EngineBuilder::build`](crate::EngineBuilder)
//! time and handed to the coordinator.
//!
//! ## Sentinel values
//! - `attempt_timeout = 0s` → no per-attempt timeout
//! - `bus_capacity` is clamped to a minimum of 1 by the [`Bus`](crate::Bus)

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for the sync engine.
///
/// Defines:
/// - **Retry budget**: how many handler invocations an action gets
/// - **Attempt bound**: per-attempt timeout for remote calls
/// - **Retry pacing**: backoff policy between attempts of the same action
/// - **Event system**: bus capacity for event delivery
///
/// ## Field semantics
/// - `max_retries`: total handler invocations per action before it is dropped
///   with a terminal-failure notification (`0` is treated as `1`: every
///   action gets at least one attempt)
/// - `attempt_timeout`: per-attempt bound (`0s` = no timeout)
/// - `backoff`: delay curve slept between retries of the same action; the
///   default is no delay (immediate retry)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum handler invocations per action.
    ///
    /// An always-failing handler is invoked exactly `max_retries` times for a
    /// given action id; afterwards the action is removed and exactly one
    /// terminal-failure event is emitted.
    pub max_retries: u32,

    /// Per-attempt timeout for handler invocations.
    ///
    /// - `Duration::ZERO` = no timeout (attempt runs until completion)
    /// - `> 0` = exceeding it is classified as a retryable failure
    pub attempt_timeout: Duration,

    /// Delay curve between attempts of the same action.
    ///
    /// The drain sleeps this delay in place before retrying, so a failing
    /// action never lets later actions overtake it.
    pub backoff: BackoffPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will receive `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the per-attempt timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per attempt
    #[inline]
    pub fn attempt_timeout_opt(&self) -> Option<Duration> {
        if self.attempt_timeout == Duration::ZERO {
            None
        } else {
            Some(self.attempt_timeout)
        }
    }

    /// Returns the retry budget clamped to a minimum of one invocation.
    #[inline]
    pub fn retry_budget(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_retries = 3`
    /// - `attempt_timeout = 10s`
    /// - `backoff = BackoffPolicy::immediate()` (immediate retry, no delay)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_retries: 3,
            attempt_timeout: Duration::from_secs(10),
            backoff: BackoffPolicy::immediate(),
            bus_capacity: 1024,
        }
    }
}
