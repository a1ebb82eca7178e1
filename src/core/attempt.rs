//! # Run a single handler attempt.
//!
//! Executes one attempt of an action's handler with optional timeout,
//! publishes lifecycle events to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:
//!   handler.call() → Ok(()) → publish ActionSucceeded
//!
//! Failure:
//!   handler.call() → Err(Fail/Fatal) → publish ActionFailed
//!
//! Panic:
//!   handler.call() panics → caught → publish ActionFailed (retryable)
//!
//! Timeout:
//!   timeout exceeded → publish AttemptTimedOut
//!                    → return Timeout error
//!                    → publish ActionFailed (timeout)
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event per attempt:
//!   `ActionSucceeded` or `ActionFailed`.
//! - `AttemptTimedOut` is published **in addition to** `ActionFailed` on
//!   timeout.
//! - Panics never escape: the coordinator boundary converts them into a
//!   retryable failure, so a drain can always continue with the next action.

use std::any::Any;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;

use crate::error::ActionError;
use crate::events::{Bus, Event, EventKind};
use crate::handlers::Handler;
use crate::store::OfflineAction;

/// Executes a single attempt of `action`'s handler, publishing lifecycle
/// events to `bus`.
///
/// ### Timeout behavior
/// If `timeout` is `Some(dur)` and `dur > 0`, the call is wrapped in
/// `tokio::time::timeout`; expiry is classified identically to a reported
/// retryable failure.
pub(crate) async fn run_attempt(
    handler: &dyn Handler,
    action: &OfflineAction,
    timeout: Option<Duration>,
    attempt: u32,
    bus: &Bus,
) -> Result<(), ActionError> {
    let call = std::panic::AssertUnwindSafe(handler.call(action)).catch_unwind();

    let res = if let Some(dur) = timeout.filter(|d| *d > Duration::ZERO) {
        match time::timeout(dur, call).await {
            Ok(r) => flatten_panic(r),
            Err(_elapsed) => {
                publish_timeout(bus, action, dur);
                Err(ActionError::Timeout { timeout: dur })
            }
        }
    } else {
        flatten_panic(call.await)
    };

    match res {
        Ok(()) => {
            publish_succeeded(bus, action, attempt);
            Ok(())
        }
        Err(e) => {
            publish_failed(bus, action, attempt, &e);
            Err(e)
        }
    }
}

/// Converts a caught handler panic into a retryable failure.
fn flatten_panic(
    res: Result<Result<(), ActionError>, Box<dyn Any + Send>>,
) -> Result<(), ActionError> {
    match res {
        Ok(inner) => inner,
        Err(panic) => Err(ActionError::fail(format!(
            "handler panicked: {}",
            panic_message(panic.as_ref())
        ))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Publishes `ActionSucceeded`.
fn publish_succeeded(bus: &Bus, action: &OfflineAction, attempt: u32) {
    bus.publish(
        Event::now(EventKind::ActionSucceeded)
            .with_action(action.kind.clone())
            .with_id(action.id)
            .with_attempt(attempt),
    );
}

/// Publishes `ActionFailed` with error details.
fn publish_failed(bus: &Bus, action: &OfflineAction, attempt: u32, err: &ActionError) {
    bus.publish(
        Event::now(EventKind::ActionFailed)
            .with_action(action.kind.clone())
            .with_id(action.id)
            .with_attempt(attempt)
            .with_reason(err.to_string()),
    );
}

/// Publishes `AttemptTimedOut` (always followed by `ActionFailed`).
fn publish_timeout(bus: &Bus, action: &OfflineAction, dur: Duration) {
    bus.publish(
        Event::now(EventKind::AttemptTimedOut)
            .with_action(action.kind.clone())
            .with_id(action.id)
            .with_timeout(dur),
    );
}
