//! # Domain Error Types
//!
//! Typed errors for the pure data model. Network, storage, and session
//! errors live in their own crates; this module only covers what can go
//! wrong without leaving the process: malformed input and unknown domains.

use thiserror::Error;

/// Errors produced by the pure data model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A required field was empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// A field exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// A field did not match the expected shape.
    #[error("{field} is invalid: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// A secret shorter than the minimum length.
    #[error("secret must be at least {min} characters")]
    SecretTooShort { min: usize },

    /// A domain name that is not part of the fixed aggregate.
    #[error("unknown data domain: '{0}'")]
    UnknownDomain(String),
}
