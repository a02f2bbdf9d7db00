//! Decoded media frame types

use bytes::Bytes;
use mediamux_core::TimeUnit;

/// A decoded frame with a position on the media timeline
pub trait TimedFrame: Send + Sync + 'static {
    /// Presentation time of the first sample
    fn time(&self) -> TimeUnit;

    /// Duration covered by the frame
    fn duration(&self) -> TimeUnit;

    /// Time just after the last sample
    fn end_time(&self) -> TimeUnit {
        self.time() + self.duration()
    }
}

/// Decoded audio frame
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Presentation time
    pub time: TimeUnit,
    /// Frame duration
    pub duration: TimeUnit,
    /// Sample rate in Hz
    pub rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Interleaved f32 PCM samples
    pub samples: Vec<f32>,
}

impl AudioData {
    /// Create a frame, deriving its duration from the sample count
    pub fn new(time: TimeUnit, rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        let frames = samples.len() as i64 / channels.max(1) as i64;
        let duration = TimeUnit::from_micros(frames * 1_000_000 / rate.max(1) as i64);
        Self {
            time,
            duration,
            rate,
            channels,
            samples,
        }
    }

    /// Create a silent frame covering `duration`.
    ///
    /// An indefinite or negative duration yields no samples.
    pub fn silence(time: TimeUnit, duration: TimeUnit, rate: u32, channels: u16) -> Self {
        let samples = if duration.is_definite() && duration > TimeUnit::ZERO {
            let frames = (duration.as_seconds() * rate as f64).round() as usize;
            vec![0.0; frames.saturating_mul(channels as usize)]
        } else {
            Vec::new()
        };
        Self {
            time,
            duration,
            rate,
            channels,
            samples,
        }
    }
}

impl TimedFrame for AudioData {
    fn time(&self) -> TimeUnit {
        self.time
    }

    fn duration(&self) -> TimeUnit {
        self.duration
    }
}

/// Decoded video frame
#[derive(Debug, Clone)]
pub struct VideoData {
    /// Presentation time
    pub time: TimeUnit,
    /// Display duration
    pub duration: TimeUnit,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Raw picture data
    pub data: Bytes,
    /// Whether this is a keyframe
    pub is_keyframe: bool,
}

impl TimedFrame for VideoData {
    fn time(&self) -> TimeUnit {
        self.time
    }

    fn duration(&self) -> TimeUnit {
        self.duration
    }
}
