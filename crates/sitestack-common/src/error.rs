//! Unified error types for the sitestack workspace.
//!
//! Every failure the composer can raise is synchronous and non-retryable:
//! it points at a malformed declaration set that has to be fixed by the
//! caller.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum SiteStackError {
    /// An argument was empty or otherwise malformed.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected input.
        message: String,
    },

    /// A declaration is missing a required option or carries an invalid one.
    #[error("invalid configuration for \"{declaration}\": option \"{option}\" {reason}")]
    InvalidConfiguration {
        /// Name of the declaration being built.
        declaration: String,
        /// Option that failed validation.
        option: String,
        /// What is wrong with the option.
        reason: String,
    },

    /// A dependency or config reference names a declaration that does not exist.
    #[error("declaration \"{from}\" references undeclared resource \"{missing}\"")]
    DanglingReference {
        /// Declaration holding the reference.
        from: String,
        /// Referenced name that could not be found.
        missing: String,
    },

    /// The dependency graph is not acyclic.
    #[error("cyclic dependency detected between: {}", names.join(", "))]
    CycleDetected {
        /// Every declaration participating in a cycle, sorted.
        names: Vec<String>,
    },

    /// An output was resolved before the apply step bound it.
    #[error("output \"{output_id}\" has not been bound yet")]
    UnboundOutput {
        /// Output that was queried.
        output_id: String,
    },

    /// An output was bound a second time.
    #[error("output \"{output_id}\" is already bound")]
    DuplicateBinding {
        /// Output that was bound twice.
        output_id: String,
    },

    /// A lifecycle report does not follow the declaration state machine.
    #[error("invalid state transition for \"{name}\": {from} -> {to}")]
    InvalidTransition {
        /// Declaration name.
        name: String,
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },

    /// A required item was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing item.
        kind: &'static str,
        /// Identifier of the missing item.
        id: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML deserialization failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

impl SiteStackError {
    /// Shorthand for [`SiteStackError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, SiteStackError>;
