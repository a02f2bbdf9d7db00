//! Debug-info records filled in by sinks
//!
//! A caller hands an empty [`MediaSinkDebugInfo`] to a sink; each concrete
//! sink fills in its own section and leaves the others untouched.

use crate::time::TimeUnit;
use serde::{Deserialize, Serialize};

/// Diagnostic snapshot of a sink tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaSinkDebugInfo {
    /// Presentation sink section
    pub presentation: Option<PresentationSinkDebugInfo>,
    /// Capture sink section
    pub capture: Option<CaptureSinkDebugInfo>,
}

impl MediaSinkDebugInfo {
    /// Whether no sink filled in anything
    pub fn is_empty(&self) -> bool {
        self.presentation.is_none() && self.capture.is_none()
    }
}

/// Presentation sink diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentationSinkDebugInfo {
    /// Sink instance identifier
    pub sink_id: String,
    /// Whether a session is running
    pub is_started: bool,
    /// Whether the clock is advancing
    pub is_playing: bool,
    /// Current playback position
    pub position: TimeUnit,
    /// End of the last played audio frame
    pub audio_end_time: TimeUnit,
    /// End of the last presented video frame
    pub video_end_time: TimeUnit,
    /// Video frames handed to the container
    pub frames_presented: u64,
    /// Video frames skipped because a newer frame was already due
    pub frames_dropped: u64,
    /// Output volume
    pub volume: f64,
    /// Playback rate
    pub playback_rate: f64,
    /// Whether pitch is preserved when the rate changes
    pub preserves_pitch: bool,
    /// Stream name given to the audio device
    pub stream_name: String,
    /// Open audio device, if any
    pub audio_device: Option<String>,
    /// Whether a secondary video container is attached
    pub has_secondary_container: bool,
}

/// Capture sink diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureSinkDebugInfo {
    /// Sink instance identifier
    pub sink_id: String,
    /// Whether a session is running
    pub is_started: bool,
    /// Whether the clock is advancing
    pub is_playing: bool,
    /// Current playback position
    pub position: TimeUnit,
    /// End of the last captured audio frame
    pub audio_end_time: TimeUnit,
    /// End of the last captured video frame
    pub video_end_time: TimeUnit,
    /// Frames published to consumers
    pub frames_published: u64,
    /// Number of attached consumers
    pub consumers: usize,
    /// Volume applied to captured audio
    pub volume: f64,
    /// Playback rate
    pub playback_rate: f64,
    /// Stream name of the captured track
    pub stream_name: String,
}
