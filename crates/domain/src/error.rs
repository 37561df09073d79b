//! Common error types used across the workspace.
//!
//! Each layer defines typed errors and converts upward via `#[from]`.
//! Absence of a match (an unresolved role, an empty device bucket) is a
//! normal value, never an error — only malformed configuration and
//! collaborator failures surface here.

use thiserror::Error;

/// Top-level error for the autocard core.
#[derive(Debug, Error)]
pub enum AutocardError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("registry error")]
    Registry(#[from] RegistryError),
}

/// Configuration and input invariant violations, detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("entity id must not be empty")]
    EmptyEntityId,

    #[error("entity id `{0}` is missing its `<kind>.` prefix")]
    MissingKind(String),

    #[error("integration name must not be empty")]
    EmptyIntegration,

    #[error("role name must not be empty")]
    EmptyRoleName,

    #[error("role `{0}` is declared twice in the role table")]
    DuplicateRole(String),

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("grid column count must be non-zero")]
    ZeroColumns,

    #[error("section `{0}` names no roles")]
    EmptySection(String),
}

/// Failure reported by the external registry/state collaborator.
///
/// The core never retries or recovers; the message is surfaced to the
/// host's own error reporting.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RegistryError {
    pub message: String,
}

impl RegistryError {
    /// Wrap a collaborator failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
