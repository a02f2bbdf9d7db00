//! # mediamux Diagnostics
//!
//! Debugging and diagnostic tools for mediamux.
//! Provides structured logging setup and timestamped sink reports.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;
pub mod error;
pub mod report;

// Re-export main types
pub use debug_logger::{DebugLogger, DEFAULT_DIRECTIVE};
pub use error::{DiagnosticsError, DiagnosticsResult};
pub use report::SinkReport;
