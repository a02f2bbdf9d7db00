//! Structured debug logging system

use crate::error::{DiagnosticsError, DiagnosticsResult};
use tracing_subscriber::EnvFilter;

/// Filter used when neither the caller nor `RUST_LOG` sets one
pub const DEFAULT_DIRECTIVE: &str =
    "mediamux=info,mediamux_core=info,mediamux_media=info,mediamux_diagnostics=info";

/// Debug logger for structured logging
#[derive(Debug, Clone)]
pub struct DebugLogger {
    directive: String,
    with_target: bool,
}

impl DebugLogger {
    /// Create a logger with the default filter
    pub fn new() -> Self {
        Self {
            directive: DEFAULT_DIRECTIVE.to_string(),
            with_target: true,
        }
    }

    /// Use `directive` instead of the default filter
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = directive.into();
        self
    }

    /// Show or hide the event target in log lines
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Filter directive in effect when `RUST_LOG` is unset
    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// Build the filter: `RUST_LOG` wins over the configured directive
    pub fn filter(&self) -> DiagnosticsResult<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.directive).map_err(|e| {
                DiagnosticsError::InvalidFilter {
                    directive: self.directive.clone(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// Install this logger as the global subscriber
    pub fn init(&self) -> DiagnosticsResult<()> {
        let filter = self.filter()?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.with_target)
            .try_init()
            .map_err(|e| DiagnosticsError::AlreadyInitialized {
                reason: e.to_string(),
            })?;
        tracing::debug!(directive = %self.directive, "Logging initialised");
        Ok(())
    }

    /// Initialize logging system with the default filter
    pub fn init_logging() -> DiagnosticsResult<()> {
        Self::new().init()
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}
