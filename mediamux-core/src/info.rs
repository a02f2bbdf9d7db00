//! Track and stream descriptions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Track discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackType {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

impl TrackType {
    /// Both track types, audio first
    pub const ALL: [TrackType; 2] = [TrackType::Audio, TrackType::Video];

    /// Lowercase track name
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Audio => "audio",
            TrackType::Video => "video",
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio track description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Codec name (e.g. "opus", "aac")
    pub codec: String,
    /// Number of channels
    pub channels: u16,
    /// Sample rate in Hz
    pub rate: u32,
}

impl Default for AudioInfo {
    fn default() -> Self {
        Self {
            codec: "opus".to_string(),
            channels: 2,
            rate: 48000,
        }
    }
}

/// Video track geometry and codec description
///
/// Also passed to `redraw`, where only the geometry matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Codec name (e.g. "h264", "vp9")
    pub codec: String,
    /// Display width in pixels
    pub display_width: u32,
    /// Display height in pixels
    pub display_height: u32,
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self {
            codec: "h264".to_string(),
            display_width: 1280,
            display_height: 720,
        }
    }
}

/// Description of the stream handed to `start`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Audio track, if present
    pub audio: Option<AudioInfo>,
    /// Video track, if present
    pub video: Option<VideoInfo>,
}

impl MediaInfo {
    /// Stream with default audio and video tracks
    pub fn audio_video() -> Self {
        Self {
            audio: Some(AudioInfo::default()),
            video: Some(VideoInfo::default()),
        }
    }

    /// Stream with only a default audio track
    pub fn audio_only() -> Self {
        Self {
            audio: Some(AudioInfo::default()),
            video: None,
        }
    }

    /// Stream with only a default video track
    pub fn video_only() -> Self {
        Self {
            audio: None,
            video: Some(VideoInfo::default()),
        }
    }

    /// Whether the stream has an audio track
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Whether the stream has a video track
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    /// Whether the given track is present
    pub fn has_track(&self, track: TrackType) -> bool {
        match track {
            TrackType::Audio => self.has_audio(),
            TrackType::Video => self.has_video(),
        }
    }
}

/// Audio output device description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDeviceInfo {
    /// Device identifier
    pub id: String,
    /// Human-readable device name
    pub name: String,
    /// Output channel count
    pub channels: u16,
    /// Output sample rate in Hz
    pub rate: u32,
}

impl Default for AudioDeviceInfo {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Default Audio Output".to_string(),
            channels: 2,
            rate: 48000,
        }
    }
}
