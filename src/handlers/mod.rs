//! Action handlers and their registry.
//!
//! This module provides the remote-effect seam of the engine:
//! - [`Handler`] - trait implemented by collaborators that know how to talk
//!   to the remote service
//! - [`HandlerFn`] - closure-backed handler implementation
//! - [`HandlerRef`] - shared handle (`Arc<dyn Handler>`)
//! - [`HandlerRegistry`] - data-driven map from action kind to handler

mod handler;
mod handler_fn;
mod registry;

pub use handler::{Handler, HandlerRef};
pub use handler_fn::HandlerFn;
pub use registry::HandlerRegistry;
