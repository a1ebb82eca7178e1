//! # HandlerRegistry: data-driven dispatch from action kind to handler.
//!
//! New action kinds are added by registration, never by editing a central
//! dispatch function. The registry is injected into the coordinator, which
//! resolves a handler per action during a drain.
//!
//! ## Rules
//! - Registering an already-present kind replaces the previous handler.
//! - Resolving an unknown kind returns `None`; the coordinator classifies
//!   such actions as terminal (retrying cannot make a handler appear).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::handlers::handler::HandlerRef;

/// Lookup table from action kind to handler.
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, HandlerRef>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handlers: RwLock::new(HashMap::new()),
        })
    }

    /// Registers a handler for the given kind, replacing any previous one.
    pub async fn register(&self, kind: impl Into<String>, handler: HandlerRef) {
        let mut handlers = self.handlers.write().await;
        handlers.insert(kind.into(), handler);
    }

    /// Resolves the handler for a kind, if one is registered.
    pub async fn resolve(&self, kind: &str) -> Option<HandlerRef> {
        let handlers = self.handlers.read().await;
        handlers.get(kind).cloned()
    }

    /// Returns the sorted list of registered kinds (for diagnostics).
    pub async fn kinds(&self) -> Vec<String> {
        let handlers = self.handlers.read().await;
        let mut kinds: Vec<String> = handlers.keys().cloned().collect();
        kinds.sort_unstable();
        kinds
    }
}
