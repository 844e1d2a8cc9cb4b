//! Typed errors for internal plumbing.
//!
//! These never cross a component boundary raw: transports and the execution
//! service convert them into fixed user-visible strings (see `message` and
//! the serve crate) and log the cause with `tracing::warn!`.

use thiserror::Error;

/// Errors inside a transport exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http exchange: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(u16),
}

/// Errors from an external capability call (generation or code execution).
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability request: {0}")]
    Http(#[from] reqwest::Error),
    #[error("capability returned status {0}")]
    Status(u16),
}
