//! The media sink capability interface
//!
//! Every output the playback driver can talk to implements [`MediaSink`]:
//! the presentation sink, the capture sink and the multiplexer that fans a
//! stream out to both.
//!
//! Lifecycle: `Idle --start--> Started --stop--> Idle`, and `shutdown` moves
//! any state to the terminal `Shutdown`. The driver starts a sink at most
//! once per session. Only `start` can fail; every other mutator takes
//! effect before it returns and absorbs its own errors.

use crate::output::VideoFrameContainer;
use mediamux_core::{
    AudioDeviceInfo, EndedPromise, MediaInfo, MediaSinkDebugInfo, SinkResult, TimeUnit,
    TrackType, VideoInfo,
};
use std::fmt;
use tokio::time::Instant;

/// Lifecycle state of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// Constructed or stopped
    Idle,
    /// A playback session is running
    Started,
    /// Resources released; terminal
    Shutdown,
}

impl fmt::Display for SinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SinkState::Idle => "Idle",
            SinkState::Started => "Started",
            SinkState::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

/// Capability interface of a media output
pub trait MediaSink: Send {
    /// Begin a playback session at `start_time`
    fn start(&mut self, start_time: TimeUnit, info: &MediaInfo) -> SinkResult<()>;

    /// End the current session
    fn stop(&mut self);

    /// Release every resource; terminal and best-effort
    fn shutdown(&mut self);

    /// Whether a session is running
    fn is_started(&self) -> bool;

    /// Whether a session is running and not paused
    fn is_playing(&self) -> bool;

    /// Current position and the wall time it was sampled at
    fn position_at(&self) -> (TimeUnit, Instant);

    /// Current position
    fn position(&self) -> TimeUnit {
        self.position_at().0
    }

    /// End time of the media played so far on `track`
    fn end_time(&self, track: TrackType) -> TimeUnit;

    /// Duration of media queued but not yet played on `track`
    fn unplayed_duration(&self, track: TrackType) -> TimeUnit;

    /// Whether `track` still has frames to play
    fn has_unplayed_frames(&self, track: TrackType) -> bool;

    /// Promise settled when `track` ends; `None` outside a session or for
    /// a track the session does not carry. Repeated calls within a session
    /// return the same promise.
    fn on_ended(&self, track: TrackType) -> Option<EndedPromise>;

    /// Set output volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f64);

    /// Set playback rate
    fn set_playback_rate(&mut self, rate: f64);

    /// Keep pitch unchanged when the rate changes
    fn set_preserves_pitch(&mut self, preserves_pitch: bool);

    /// Pause or resume
    fn set_playing(&mut self, playing: bool);

    /// Name the output stream (shown by the audio backend)
    fn set_stream_name(&mut self, _name: &str) {}

    /// Re-display the current video frame
    fn redraw(&mut self, _info: &VideoInfo) {}

    /// Mirror presented video into an additional container
    fn set_secondary_video_container(&mut self, _container: Option<VideoFrameContainer>) {}

    /// Current playback rate
    fn playback_rate(&self) -> f64;

    /// Audio device in use, if any
    fn audio_device(&self) -> Option<&AudioDeviceInfo>;

    /// Fill in this sink's diagnostics
    fn debug_info(&self, _info: &mut MediaSinkDebugInfo) {}
}
