//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(OfflineAction) -> Fut`, producing a
//! fresh future per invocation. This avoids shared mutable state; if a
//! handler needs shared state, capture an `Arc<...>` explicitly inside the
//! closure.
//!
//! ## Example
//! ```rust
//! use syncline::{ActionError, HandlerFn, HandlerRef, OfflineAction};
//!
//! let h: HandlerRef = HandlerFn::arc(|action: OfflineAction| async move {
//!     // talk to the remote service, using action.id for deduplication
//!     let _ = action.payload;
//!     Ok::<_, ActionError>(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::handlers::handler::Handler;
use crate::store::OfflineAction;

/// Function-backed handler implementation.
///
/// Wraps a closure that *creates* a new future per invocation. The closure
/// receives an owned clone of the action so the future is `'static`.
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a
    /// [`HandlerRef`](crate::HandlerRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(OfflineAction) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    async fn call(&self, action: &OfflineAction) -> Result<(), ActionError> {
        (self.f)(action.clone()).await
    }
}
