//! # Logging subscriber.
//!
//! [`LogWriter`] renders engine events through `tracing` in a compact,
//! human-readable form. Useful during development and as a reference for
//! custom subscribers (metrics, UI notification bridges).
//!
//! ## Output shape
//! ```text
//! INFO sync started
//! INFO attempting action=FAVORITE_CAFE id=… attempt=1
//! WARN attempt failed action=CREATE_REVIEW id=… attempt=2 reason="connection refused"
//! WARN terminally failed action=CREATE_REVIEW id=… attempts=3
//! INFO sync completed delivered=1
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use super::Subscribe;
use crate::events::{Event, EventKind};

/// Subscriber that logs every engine event via `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new log writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let action = e.action.as_deref().unwrap_or("-");
        let id = e.id.map(|i| i.to_string()).unwrap_or_default();
        match e.kind {
            EventKind::WentOnline => info!("connectivity: online"),
            EventKind::WentOffline => info!("connectivity: offline"),
            EventKind::ActionEnqueued => info!(action, %id, "enqueued"),
            EventKind::ActionCancelled => info!(action, %id, "cancelled"),
            EventKind::QueueCleared => info!(discarded = ?e.count, "queue cleared"),
            EventKind::StoreLoadFailed => {
                warn!(reason = ?e.reason, "persisted queue unreadable; started empty");
            }
            EventKind::StoreWriteFailed => {
                warn!(reason = ?e.reason, "queue persist failed; in-memory state kept");
            }
            EventKind::SyncStarted => info!("sync started"),
            EventKind::SyncCompleted => info!(delivered = ?e.count, "sync completed"),
            EventKind::ActionAttempting => {
                info!(action, %id, attempt = ?e.attempt, "attempting");
            }
            EventKind::ActionSucceeded => {
                info!(action, %id, attempt = ?e.attempt, "succeeded");
            }
            EventKind::ActionFailed => {
                warn!(action, %id, attempt = ?e.attempt, reason = ?e.reason, "attempt failed");
            }
            EventKind::AttemptTimedOut => {
                warn!(action, %id, timeout_ms = ?e.timeout_ms, "attempt timed out");
            }
            EventKind::RetryScheduled => {
                info!(action, %id, attempt = ?e.attempt, delay_ms = ?e.delay_ms, "retry scheduled");
            }
            EventKind::ActionTerminallyFailed => {
                warn!(action, %id, attempts = ?e.attempt, reason = ?e.reason, "terminally failed");
            }
            EventKind::UnknownActionDropped => {
                warn!(action, %id, "no handler registered; dropped");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                warn!(subscriber = action, reason = ?e.reason, "subscriber fault");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
