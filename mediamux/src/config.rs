//! Configuration types and defaults

use mediamux_media::{CaptureConfig, PresentationConfig};

/// Configuration of a media output
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Local presentation sink settings
    pub presentation: PresentationConfig,
    /// Capture sink settings; `None` plays locally only
    pub capture: Option<CaptureConfig>,
    /// Install the debug logger when the output is built
    pub debug_logging: bool,
    /// Label used in logs and debug reports
    pub label: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            presentation: PresentationConfig::default(),
            capture: None,
            debug_logging: false,
            label: "media".to_string(),
        }
    }
}

impl OutputConfig {
    /// Local playback mirrored to a capture sink with default settings
    pub fn with_capture() -> Self {
        Self {
            capture: Some(CaptureConfig::default()),
            ..Self::default()
        }
    }
}
