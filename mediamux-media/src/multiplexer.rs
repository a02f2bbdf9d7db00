//! Composite sink fanning one stream out to a primary and a secondary sink
//!
//! The primary (local presentation) is the authority for every query. The
//! secondary (capture) mirrors the primary's mutations and never shapes
//! what the driver observes, with one exception: `start` succeeds when
//! either sink starts. The driver can therefore see `is_started() == false`
//! after a successful `start` when only the secondary came up.

use crate::output::VideoFrameContainer;
use crate::sink::MediaSink;
use mediamux_core::{
    AudioDeviceInfo, EndedPromise, MediaInfo, MediaSinkDebugInfo, SinkError, SinkResult,
    TimeUnit, TrackType, VideoInfo,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Reduce the start results of the two owned sinks to one.
///
/// Identical results pass through, a single success wins, and two distinct
/// failures collapse into [`SinkError::GenericFailure`].
pub fn merge_start_results(primary: SinkResult<()>, secondary: SinkResult<()>) -> SinkResult<()> {
    if primary == secondary {
        return primary;
    }
    match (primary, secondary) {
        (Ok(()), _) | (_, Ok(())) => Ok(()),
        (Err(_), Err(_)) => Err(SinkError::GenericFailure),
    }
}

/// A sink that drives two owned sinks as one
pub struct MultiplexerSink {
    primary: Box<dyn MediaSink>,
    secondary: Box<dyn MediaSink>,
}

impl MultiplexerSink {
    /// Combine `primary` (timing authority) with `secondary` (mirror)
    pub fn new(primary: Box<dyn MediaSink>, secondary: Box<dyn MediaSink>) -> Self {
        Self { primary, secondary }
    }

    /// The authoritative sink
    pub fn primary(&self) -> &dyn MediaSink {
        self.primary.as_ref()
    }

    /// The mirroring sink
    pub fn secondary(&self) -> &dyn MediaSink {
        self.secondary.as_ref()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn shutdown_sink(role: &str, sink: &mut dyn MediaSink) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.shutdown())) {
        warn!(
            role,
            reason = %panic_message(payload.as_ref()),
            "Sink shutdown panicked; continuing"
        );
    }
}

impl MediaSink for MultiplexerSink {
    fn start(&mut self, start_time: TimeUnit, info: &MediaInfo) -> SinkResult<()> {
        let primary = self.primary.start(start_time, info);
        if let Err(e) = &primary {
            warn!(error = %e, "Primary sink failed to start");
        }

        let secondary = self.secondary.start(start_time, info);
        if let Err(e) = &secondary {
            warn!(error = %e, "Secondary sink failed to start");
        }

        let merged = merge_start_results(primary, secondary);
        debug!(start_time = %start_time, ok = merged.is_ok(), "Multiplexer started");
        merged
    }

    fn stop(&mut self) {
        self.primary.stop();
        self.secondary.stop();
    }

    fn shutdown(&mut self) {
        shutdown_sink("primary", self.primary.as_mut());
        shutdown_sink("secondary", self.secondary.as_mut());
        debug!("Multiplexer shut down");
    }

    fn is_started(&self) -> bool {
        self.primary.is_started()
    }

    fn is_playing(&self) -> bool {
        self.primary.is_playing()
    }

    fn position_at(&self) -> (TimeUnit, Instant) {
        self.primary.position_at()
    }

    fn end_time(&self, track: TrackType) -> TimeUnit {
        self.primary.end_time(track)
    }

    fn unplayed_duration(&self, track: TrackType) -> TimeUnit {
        self.primary.unplayed_duration(track)
    }

    fn has_unplayed_frames(&self, track: TrackType) -> bool {
        self.primary.has_unplayed_frames(track)
    }

    fn on_ended(&self, track: TrackType) -> Option<EndedPromise> {
        self.primary.on_ended(track)
    }

    fn set_volume(&mut self, volume: f64) {
        self.primary.set_volume(volume);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.primary.set_playback_rate(rate);
        self.secondary.set_playback_rate(rate);
    }

    fn set_preserves_pitch(&mut self, preserves_pitch: bool) {
        self.primary.set_preserves_pitch(preserves_pitch);
    }

    fn set_playing(&mut self, playing: bool) {
        self.primary.set_playing(playing);
        self.secondary.set_playing(playing);
    }

    fn set_stream_name(&mut self, name: &str) {
        self.primary.set_stream_name(name);
        self.secondary.set_stream_name(name);
    }

    fn redraw(&mut self, info: &VideoInfo) {
        self.primary.redraw(info);
        self.secondary.redraw(info);
    }

    fn set_secondary_video_container(&mut self, container: Option<VideoFrameContainer>) {
        self.primary.set_secondary_video_container(container.clone());
        self.secondary.set_secondary_video_container(container);
    }

    fn playback_rate(&self) -> f64 {
        self.primary.playback_rate()
    }

    fn audio_device(&self) -> Option<&AudioDeviceInfo> {
        self.primary.audio_device()
    }

    fn debug_info(&self, info: &mut MediaSinkDebugInfo) {
        // Only the primary reports; the secondary's state is not surfaced
        self.primary.debug_info(info);
    }
}
