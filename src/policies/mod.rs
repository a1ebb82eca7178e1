//! Retry pacing policies.
//!
//! - [`BackoffPolicy`] computes the delay before a retried action becomes
//!   eligible again, indexed by how many attempts it has used.
//! - [`JitterPolicy`] randomizes those delays to avoid synchronized retries.
//!
//! The engine default is [`BackoffPolicy::immediate`]: a retried action is
//! attempted again right away, with no imposed delay.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
