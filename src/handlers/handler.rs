//! # Handler abstraction.
//!
//! A [`Handler`] performs the actual remote effect for one action kind:
//! posting a review, toggling a favorite, redeeming a code. The engine treats
//! its outcome as opaque success/failure; no business-rule validation happens
//! on this side of the seam.
//!
//! ## Idempotency
//! A retried action is redelivered with the same `id` and `payload` on every
//! attempt. Handlers should forward the id to the remote service as a
//! deduplication key so that a retry after a lost acknowledgment does not
//! produce a duplicate side effect.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ActionError;
use crate::store::OfflineAction;

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;

/// # Remote-effect executor for one action kind.
///
/// Well-behaved handlers report structured failures via [`ActionError`]
/// instead of panicking; a panic that does occur is caught at the attempt
/// boundary and classified as retryable.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use syncline::{ActionError, Handler, OfflineAction};
///
/// struct FavoriteCafe;
///
/// #[async_trait]
/// impl Handler for FavoriteCafe {
///     async fn call(&self, action: &OfflineAction) -> Result<(), ActionError> {
///         // POST to the favorites endpoint, passing action.id as the
///         // deduplication key...
///         let _ = &action.payload;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Applies the action's remote effect.
    ///
    /// Return [`ActionError::Fail`] for transient problems worth retrying and
    /// [`ActionError::Fatal`] for failures that cannot succeed by retrying.
    async fn call(&self, action: &OfflineAction) -> Result<(), ActionError>;
}
