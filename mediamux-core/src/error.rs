//! Error types for media sinks

use thiserror::Error;

/// Main error type for media sink operations
///
/// Only `start` reports errors across the sink interface. Every other
/// operation absorbs failures inside the concrete sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// A sink could not initialise its output device or surface
    #[error("Sink {sink} failed to start: {reason}")]
    StartFailure {
        /// Name of the sink that failed
        sink: String,
        /// Reason for the failure
        reason: String,
    },

    /// Aggregate failure: every owned sink failed to start
    #[error("All sinks failed to start")]
    GenericFailure,

    /// Operation issued in a lifecycle state that does not allow it
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// Audio output device could not be opened
    #[error("Audio device unavailable: {device}")]
    DeviceUnavailable {
        /// Device identifier
        device: String,
    },
}

/// Result type alias for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

impl SinkError {
    /// Check if error is recoverable
    ///
    /// A single sink failing to start is absorbed by a multiplexer as long
    /// as its sibling started.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SinkError::StartFailure { .. } => true,
            SinkError::DeviceUnavailable { .. } => true,
            SinkError::GenericFailure => false,
            SinkError::InvalidState { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            SinkError::StartFailure { .. } => ErrorCategory::Start,
            SinkError::GenericFailure => ErrorCategory::Start,
            SinkError::InvalidState { .. } => ErrorCategory::State,
            SinkError::DeviceUnavailable { .. } => ErrorCategory::Device,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Output initialisation errors
    Start,
    /// Lifecycle state errors
    State,
    /// Device and hardware errors
    Device,
}
