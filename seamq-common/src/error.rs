//! Common error types for seamq
//!
//! Only construction-time failures are represented here. Out-of-range
//! seek/locate offsets are recoverable and reported through `bool` or
//! `Option` returns, never as an `Err` across the public surface, and
//! media resource faults are surfaced as events for the host to react to.

use thiserror::Error;

/// Common result type for seamq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for queue construction and slot resolution
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed duration string, slot without media, empty slot list
    #[error("Configuration error: {0}")]
    Config(String),
}
