//! Error types for the cadence adapter.
//!
//! Contract violations (out-of-range layer indices, non-serialized ingress
//! calls) are programming errors and panic. This module covers the
//! recoverable surface: configuration handed in from outside and the
//! lifecycle of the worker task.

use thiserror::Error;

/// Result type alias for cadence operations.
pub type Result<T, E = CadenceError> = std::result::Result<T, E>;

/// Error surface of the cadence adapter.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CadenceError {
    /// The worker task has stopped; the adapter no longer processes input.
    #[error("cadence worker is not running")]
    WorkerGone,

    /// Constraint values outside their documented domain.
    #[error("invalid source constraints: {reason}")]
    InvalidConstraints { reason: String },
}

impl CadenceError {
    /// Helper constructor for constraint validation failures.
    pub fn invalid_constraints(reason: impl Into<String>) -> Self {
        CadenceError::InvalidConstraints { reason: reason.into() }
    }
}
