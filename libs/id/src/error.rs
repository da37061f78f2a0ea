//! Error types for key parsing and name validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating identities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("identifier cannot be empty")]
    Empty,

    /// An object key is missing the `/` between namespace and name.
    #[error("object key missing '/' separator: '{0}'")]
    MissingSeparator(String),

    /// A namespace or name contains characters outside `[a-z0-9.-]`, or
    /// does not start and end with an alphanumeric character.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidName {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// A UID is missing its prefix.
    #[error("invalid UID prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The ULID portion of a UID is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
}
