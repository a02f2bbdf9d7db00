//! # mediamux Media
//!
//! Media sinks for mediamux: the [`MediaSink`] capability interface, the
//! local [`PresentationSink`], the [`CaptureSink`] that republishes a
//! stream for capture consumers, and the [`MultiplexerSink`] that drives
//! both as one. Decoded frames reach the sinks through [`MediaQueues`].

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod capture;
pub mod clock;
pub mod frame;
pub mod multiplexer;
pub mod output;
pub mod presentation;
pub mod queue;
pub mod sink;
mod track;

// Re-export main types
pub use capture::{CaptureConfig, CaptureHandle, CaptureSink, CapturedFrame};
pub use clock::PlaybackClock;
pub use frame::{AudioData, TimedFrame, VideoData};
pub use multiplexer::{merge_start_results, MultiplexerSink};
pub use output::{
    AudioOutput, AudioOutputHandle, AudioOutputStats, SimulatedAudioOutput,
    SimulatedOutputConfig, VideoFrameContainer,
};
pub use presentation::{PresentationConfig, PresentationSink};
pub use queue::{MediaQueue, MediaQueues, QueueReader};
pub use sink::{MediaSink, SinkState};

// Core types sinks are expressed in
pub use mediamux_core::{
    AudioDeviceInfo, AudioInfo, EndedPromise, MediaInfo, MediaSinkDebugInfo, SinkError,
    SinkResult, TimeUnit, TrackEnd, TrackType, VideoInfo,
};
