//! # Lifecycle events emitted by the engine.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Connectivity events**: debounced online/offline transitions
//! - **Queue events**: enqueue, cancel, clear, storage faults
//! - **Drain events**: sync run boundaries and per-attempt outcomes
//! - **Subscriber events**: fan-out overflow and panic isolation
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! action kind and id, attempt numbers, reasons, and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use syncline::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::ActionFailed)
//!     .with_action("CREATE_REVIEW")
//!     .with_reason("connection refused")
//!     .with_attempt(2);
//!
//! assert_eq!(ev.kind, EventKind::ActionFailed);
//! assert_eq!(ev.action.as_deref(), Some("CREATE_REVIEW"));
//! assert_eq!(ev.attempt, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::store::ActionId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Connectivity events ===
    /// Client transitioned offline→online (debounced, one per real change).
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    WentOnline,

    /// Client transitioned online→offline (debounced, one per real change).
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    WentOffline,

    // === Queue events ===
    /// Action appended to the queue and persisted.
    ///
    /// Sets:
    /// - `action`: action kind
    /// - `id`: action id
    ActionEnqueued,

    /// Pending action cancelled by the caller before any successful delivery.
    ///
    /// Sets:
    /// - `action`: action kind
    /// - `id`: action id
    ActionCancelled,

    /// Queue and persisted bytes wiped by an explicit user request.
    ///
    /// Sets:
    /// - `count`: number of actions discarded
    QueueCleared,

    /// Persisted bytes could not be decoded at startup; engine rehydrated empty.
    ///
    /// Sets:
    /// - `reason`: decoder/storage error
    StoreLoadFailed,

    /// A queue mutation could not be persisted; in-memory state was kept.
    ///
    /// Sets:
    /// - `reason`: storage error
    StoreWriteFailed,

    // === Drain events ===
    /// A drain run started processing the queue snapshot.
    SyncStarted,

    /// A drain run finished.
    ///
    /// Sets:
    /// - `count`: actions successfully delivered by this run
    /// - `reason`: present only when the run was interrupted by going
    ///   offline mid-drain
    SyncCompleted,

    /// Handler attempt is starting for an action.
    ///
    /// Sets:
    /// - `action`: action kind
    /// - `id`: action id
    /// - `attempt`: attempt number (1-based)
    ActionAttempting,

    /// Handler confirmed the remote effect; action removed from the queue.
    ///
    /// Sets:
    /// - `action`: action kind
    /// - `id`: action id
    /// - `attempt`: attempt number that succeeded
    ActionSucceeded,

    /// Handler attempt failed (retryable or not; classification follows).
    ///
    /// Sets:
    /// - `action`: action kind
    /// - `id`: action id
    /// - `attempt`: attempt number
    /// - `reason`: failure message
    ActionFailed,

    /// Handler attempt exceeded the per-attempt timeout.
    ///
    /// Published **in addition to** `ActionFailed` for that attempt.
    ///
    /// Sets:
    /// - `action`: action kind
    /// - `id`: action id
    /// - `timeout_ms`: configured attempt timeout (ms)
    AttemptTimedOut,

    /// Retryable failure with budget remaining; action stays queued.
    ///
    /// Sets:
    /// - `action`: action kind
    /// - `id`: action id
    /// - `attempt`: attempts used so far
    /// - `delay_ms`: backoff delay before the action is eligible again (ms)
    RetryScheduled,

    /// Action removed permanently: retry budget exhausted or fatal failure.
    ///
    /// Emitted exactly once per action id.
    ///
    /// Sets:
    /// - `action`: action kind
    /// - `id`: action id
    /// - `attempt`: total attempts made
    /// - `reason`: last failure message
    ActionTerminallyFailed,

    /// No handler registered for the action's kind; dropped without retry.
    ///
    /// Sets:
    /// - `action`: action kind
    /// - `id`: action id
    UnknownActionDropped,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `action`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `action`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,
}

/// Engine event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Action kind (or subscriber name for subscriber events).
    pub action: Option<Arc<str>>,
    /// Action id, if applicable.
    pub id: Option<ActionId>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Attempt timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Generic count (delivered actions, discarded actions).
    pub count: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            action: None,
            id: None,
            attempt: None,
            reason: None,
            delay_ms: None,
            timeout_ms: None,
            count: None,
        }
    }

    /// Attaches an action kind (or subscriber name).
    #[inline]
    pub fn with_action(mut self, action: impl Into<Arc<str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Attaches an action id.
    #[inline]
    pub fn with_id(mut self, id: ActionId) -> Self {
        self.id = Some(id);
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_action(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_action(subscriber)
            .with_reason(info)
    }

    /// True for terminal per-action outcomes (success or permanent drop).
    ///
    /// These are the only outcomes surfaced to users; transient failures stay
    /// silent until the action either succeeds or exhausts its budget.
    #[inline]
    pub fn is_terminal_outcome(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ActionSucceeded
                | EventKind::ActionTerminallyFailed
                | EventKind::UnknownActionDropped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::now(EventKind::SyncStarted);
        let b = Event::now(EventKind::SyncCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builder_fields() {
        let id = ActionId::new();
        let ev = Event::now(EventKind::RetryScheduled)
            .with_action("FAVORITE_CAFE")
            .with_id(id)
            .with_attempt(2)
            .with_delay(Duration::from_millis(250))
            .with_reason("boom");

        assert_eq!(ev.action.as_deref(), Some("FAVORITE_CAFE"));
        assert_eq!(ev.id, Some(id));
        assert_eq!(ev.attempt, Some(2));
        assert_eq!(ev.delay_ms, Some(250));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    #[test]
    fn test_terminal_outcome_classification() {
        assert!(Event::now(EventKind::ActionSucceeded).is_terminal_outcome());
        assert!(Event::now(EventKind::ActionTerminallyFailed).is_terminal_outcome());
        assert!(Event::now(EventKind::UnknownActionDropped).is_terminal_outcome());
        assert!(!Event::now(EventKind::ActionFailed).is_terminal_outcome());
        assert!(!Event::now(EventKind::RetryScheduled).is_terminal_outcome());
    }
}
