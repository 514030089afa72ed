//! Error types for value-debouncer.

use thiserror::Error;

/// Errors raised by the timer facility or by observers of a torn-down holder.
///
/// The holder itself never fails: bad delays are clamped, repeated values are
/// ignored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DebounceError {
    /// No Tokio runtime is available to drive timers
    #[error("no tokio runtime available to schedule timers")]
    NoRuntime,

    /// The holder behind a subscription has been closed
    #[error("debounced value has been closed")]
    Closed,
}
