//! Error types used by the sync engine and action handlers.
//!
//! This module defines two main error enums:
//!
//! - [`ActionError`] — outcomes reported by (or imposed on) a handler attempt.
//! - [`StoreError`] — failures of the durable storage substrate.
//!
//! [`ActionError`] provides helper methods (`as_label`, `as_message`) for
//! logging/metrics and [`ActionError::is_retryable`] for the coordinator's
//! failure classification.

use std::time::Duration;
use thiserror::Error;

/// # Outcomes of a single handler attempt.
///
/// Handlers report structured failures; the coordinator additionally produces
/// `Timeout` when an attempt exceeds its budget and converts handler panics
/// into `Fail`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ActionError {
    /// Attempt exceeded the configured per-attempt timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable failure (the action will never succeed by retrying).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Transient failure; the action may succeed on a later attempt.
    #[error("attempt failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl ActionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use syncline::ActionError;
    /// use std::time::Duration;
    ///
    /// let err = ActionError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "attempt_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Timeout { .. } => "attempt_timeout",
            ActionError::Fatal { .. } => "attempt_fatal",
            ActionError::Fail { .. } => "attempt_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            ActionError::Fatal { error } => format!("fatal: {error}"),
            ActionError::Fail { error } => format!("error: {error}"),
        }
    }

    /// Indicates whether the failure is safe to retry.
    ///
    /// Returns `true` for [`ActionError::Fail`] and [`ActionError::Timeout`],
    /// `false` for [`ActionError::Fatal`].
    ///
    /// # Example
    /// ```
    /// use syncline::ActionError;
    ///
    /// let retryable = ActionError::Fail { error: "connection refused".into() };
    /// assert!(retryable.is_retryable());
    ///
    /// let fatal = ActionError::Fatal { error: "unknown account".into() };
    /// assert!(!fatal.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ActionError::Fail { .. } | ActionError::Timeout { .. }
        )
    }

    /// Convenience constructor for a retryable failure.
    pub fn fail(error: impl Into<String>) -> Self {
        ActionError::Fail {
            error: error.into(),
        }
    }

    /// Convenience constructor for a non-retryable failure.
    pub fn fatal(error: impl Into<String>) -> Self {
        ActionError::Fatal {
            error: error.into(),
        }
    }
}

/// # Failures of the durable storage substrate.
///
/// Raised by [`Storage`](crate::Storage) backends and by queue rehydration
/// when persisted bytes cannot be decoded.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying I/O failure while reading or writing the persisted queue.
    #[error("storage i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted bytes could not be decoded into a queue snapshot.
    #[error("corrupt queue snapshot: {error}")]
    Corrupt {
        /// Decoder error message.
        error: String,
    },
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Io(_) => "store_io",
            StoreError::Corrupt { .. } => "store_corrupt",
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt {
            error: err.to_string(),
        }
    }
}
