//! Point-in-time reports of sink diagnostics

use crate::error::DiagnosticsResult;
use chrono::{DateTime, Utc};
use mediamux_core::{CaptureSinkDebugInfo, MediaSinkDebugInfo, PresentationSinkDebugInfo};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Debug info of a sink, stamped with when it was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkReport {
    /// When the snapshot was taken
    pub captured_at: DateTime<Utc>,
    /// Label of the media element or session the sink belongs to
    pub label: String,
    /// What the sink reported
    pub info: MediaSinkDebugInfo,
}

impl SinkReport {
    /// Stamp `info` with the current time
    pub fn new(label: impl Into<String>, info: MediaSinkDebugInfo) -> Self {
        Self {
            captured_at: Utc::now(),
            label: label.into(),
            info,
        }
    }

    /// Encode as pretty-printed JSON
    pub fn to_json(&self) -> DiagnosticsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a report produced by [`SinkReport::to_json`]
    pub fn from_json(json: &str) -> DiagnosticsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Human-readable multi-line summary
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} @ {}\n",
            self.label,
            self.captured_at.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        );
        if self.info.is_empty() {
            out.push_str("  no sink reported\n");
        }
        if let Some(presentation) = &self.info.presentation {
            write_presentation(&mut out, presentation);
        }
        if let Some(capture) = &self.info.capture {
            write_capture(&mut out, capture);
        }
        out
    }
}

// Writing to a String cannot fail
fn write_presentation(out: &mut String, info: &PresentationSinkDebugInfo) {
    let _ = writeln!(
        out,
        "  presentation {}: started={} playing={} position={}",
        info.sink_id, info.is_started, info.is_playing, info.position
    );
    let _ = writeln!(
        out,
        "    audio_end={} video_end={} presented={} dropped={}",
        info.audio_end_time, info.video_end_time, info.frames_presented, info.frames_dropped
    );
    let _ = writeln!(
        out,
        "    volume={:.2} rate={:.2} preserves_pitch={} device={} stream={}",
        info.volume,
        info.playback_rate,
        info.preserves_pitch,
        info.audio_device.as_deref().unwrap_or("none"),
        info.stream_name
    );
}

fn write_capture(out: &mut String, info: &CaptureSinkDebugInfo) {
    let _ = writeln!(
        out,
        "  capture {}: started={} playing={} position={}",
        info.sink_id, info.is_started, info.is_playing, info.position
    );
    let _ = writeln!(
        out,
        "    audio_end={} video_end={} published={} consumers={} stream={}",
        info.audio_end_time,
        info.video_end_time,
        info.frames_published,
        info.consumers,
        info.stream_name
    );
}
