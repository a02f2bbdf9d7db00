//! Error types for diagnostics

use thiserror::Error;

/// Errors raised while setting up logging or producing reports
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    /// The log filter directive could not be parsed
    #[error("Invalid log filter {directive}: {reason}")]
    InvalidFilter {
        /// Directive as given
        directive: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed
    #[error("Logging already initialised: {reason}")]
    AlreadyInitialized {
        /// Reason reported by the subscriber registry
        reason: String,
    },

    /// A report could not be encoded or decoded
    #[error("Report serialization failed: {source}")]
    Serialization {
        /// Underlying error
        #[from]
        source: serde_json::Error,
    },
}

/// Result type alias for diagnostics operations
pub type DiagnosticsResult<T> = Result<T, DiagnosticsError>;
