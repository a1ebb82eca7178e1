//! # The unit of deferred work.
//!
//! An [`OfflineAction`] records one user-initiated mutation made while the
//! client may be disconnected. It is created at enqueue time, persisted
//! immediately, and destroyed on confirmed success or on exhausting its
//! retry budget.
//!
//! ## Wire format
//! The queue persists as a single JSON array of records:
//! ```json
//! [{"id": "…", "type": "FAVORITE_CAFE", "payload": {"cafeId": 42},
//!   "enqueuedAt": 1756400000000, "retryCount": 0}]
//! ```
//! Field names are fixed; renaming them breaks rehydration of queues written
//! by earlier builds.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Globally unique action identifier.
///
/// Assigned once at enqueue time and stable across retries, which makes it
/// usable as an **idempotency key**: a handler that passes the id to the
/// remote service lets the backend deduplicate redelivered attempts whose
/// earlier success acknowledgment was lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(Uuid);

impl ActionId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One deferred mutation awaiting a successful remote effect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OfflineAction {
    /// Unique id, assigned at enqueue time, immutable.
    pub id: ActionId,

    /// Tag identifying which handler processes this action.
    #[serde(rename = "type")]
    pub kind: String,

    /// Opaque, handler-specific data.
    pub payload: Value,

    /// Creation timestamp, epoch milliseconds, immutable.
    #[serde(rename = "enqueuedAt")]
    pub enqueued_at_ms: u64,

    /// Attempts already consumed. Starts at 0; only the coordinator raises it.
    #[serde(rename = "retryCount")]
    pub retry_count: u32,
}

impl OfflineAction {
    /// Creates a fresh action with a new id, current timestamp and zero
    /// retries.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            id: ActionId::new(),
            kind: kind.into(),
            payload,
            enqueued_at_ms: epoch_millis(),
            retry_count: 0,
        }
    }
}

/// Current wall-clock time as epoch milliseconds.
fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}
