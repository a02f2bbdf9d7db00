//! # mediamux - Multiplexed Media Output
//!
//! mediamux plays a decoded audio/video stream locally and, optionally,
//! mirrors it into a capturable stream at the same time. The local
//! presentation sink stays the timing authority; the capture sink follows
//! along and never affects what the listener hears.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediamux::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SinkError> {
//!     let queues = MediaQueues::new();
//!     let mut output = MediaOutput::builder(&queues)
//!         .config(OutputConfig::with_capture())
//!         .build();
//!
//!     // Consumers attach before the session starts
//!     let mut captured = output.capture_handle().unwrap().subscribe();
//!
//!     let sink = output.sink_mut();
//!     sink.set_playing(true);
//!     sink.start(TimeUnit::ZERO, &MediaInfo::audio_video())?;
//!
//!     while let Ok(frame) = captured.recv().await {
//!         println!("captured {:?}", frame);
//!     }
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use mediamux_core::{
    AudioDeviceInfo, AudioInfo, CaptureSinkDebugInfo, EndedPromise, ErrorCategory, MediaInfo,
    MediaSinkDebugInfo, PresentationSinkDebugInfo, SinkError, SinkResult, TimeUnit, TrackEnd,
    TrackType, VideoInfo,
};

pub use mediamux_media::{
    merge_start_results, AudioData, AudioOutput, AudioOutputHandle, AudioOutputStats,
    CaptureConfig, CaptureHandle, CaptureSink, CapturedFrame, MediaQueue, MediaQueues,
    MediaSink, MultiplexerSink, PresentationConfig, PresentationSink, SimulatedAudioOutput,
    SimulatedOutputConfig, SinkState, VideoData, VideoFrameContainer,
};

#[cfg(feature = "diagnostics")]
pub use mediamux_diagnostics::{DebugLogger, DiagnosticsError, SinkReport};

// Public API modules
pub mod config;

// Re-export main API types
pub use config::OutputConfig;

use tracing::info;

/// Fluent builder for a [`MediaOutput`]
pub struct MediaOutputBuilder {
    queues: MediaQueues,
    audio_output: Option<Box<dyn AudioOutput>>,
    container: Option<VideoFrameContainer>,
    config: OutputConfig,
}

impl MediaOutputBuilder {
    fn new(queues: &MediaQueues) -> Self {
        Self {
            queues: queues.clone(),
            audio_output: None,
            container: None,
            config: OutputConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: OutputConfig) -> Self {
        self.config = config;
        self
    }

    /// Audio backend for local playback (a simulated device by default)
    pub fn audio_output(mut self, output: Box<dyn AudioOutput>) -> Self {
        self.audio_output = Some(output);
        self
    }

    /// Surface local video is presented into
    pub fn video_container(mut self, container: VideoFrameContainer) -> Self {
        self.container = Some(container);
        self
    }

    /// Mirror the stream into a capture sink
    pub fn capture(mut self, config: CaptureConfig) -> Self {
        self.config.capture = Some(config);
        self
    }

    /// Label used in logs and debug reports
    pub fn label(mut self, label: &str) -> Self {
        self.config.label = label.to_string();
        self
    }

    /// Assemble the sinks
    ///
    /// Sinks subscribe to the queues here, so frames pushed before `build`
    /// are not seen by them.
    pub fn build(self) -> MediaOutput {
        #[cfg(feature = "diagnostics")]
        if self.config.debug_logging {
            if let Err(e) = DebugLogger::init_logging() {
                tracing::warn!(error = %e, "Debug logging not installed");
            }
        }

        let container = self.container.unwrap_or_default();
        let audio_output = self
            .audio_output
            .unwrap_or_else(|| Box::new(SimulatedAudioOutput::new()));
        let presentation = PresentationSink::with_config(
            &self.queues,
            audio_output,
            container.clone(),
            self.config.presentation.clone(),
        );

        let mut capture = None;
        let sink: Box<dyn MediaSink> = match self.config.capture.clone() {
            Some(capture_config) => {
                let capture_sink = CaptureSink::with_config(&self.queues, capture_config);
                capture = Some(capture_sink.handle());
                Box::new(MultiplexerSink::new(
                    Box::new(presentation),
                    Box::new(capture_sink),
                ))
            }
            None => Box::new(presentation),
        };

        info!(
            label = %self.config.label,
            capture = capture.is_some(),
            "Media output built"
        );

        MediaOutput {
            sink,
            capture,
            container,
            config: self.config,
        }
    }
}

/// A sink ready to be driven by a playback state machine
pub struct MediaOutput {
    sink: Box<dyn MediaSink>,
    capture: Option<CaptureHandle>,
    container: VideoFrameContainer,
    config: OutputConfig,
}

impl MediaOutput {
    /// Start building an output fed from `queues`
    pub fn builder(queues: &MediaQueues) -> MediaOutputBuilder {
        MediaOutputBuilder::new(queues)
    }

    /// The sink the driver talks to
    pub fn sink(&self) -> &dyn MediaSink {
        self.sink.as_ref()
    }

    /// Mutable access to the sink
    pub fn sink_mut(&mut self) -> &mut dyn MediaSink {
        self.sink.as_mut()
    }

    /// Whether the stream is mirrored to a capture sink
    pub fn is_multiplexed(&self) -> bool {
        self.capture.is_some()
    }

    /// Subscription point of the capture sink, if any
    pub fn capture_handle(&self) -> Option<&CaptureHandle> {
        self.capture.as_ref()
    }

    /// Surface local video is presented into
    pub fn video_container(&self) -> &VideoFrameContainer {
        &self.container
    }

    /// Configuration the output was built with
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Snapshot of the sink's diagnostics
    #[cfg(feature = "diagnostics")]
    pub fn debug_report(&self) -> SinkReport {
        let mut info = MediaSinkDebugInfo::default();
        self.sink.debug_info(&mut info);
        SinkReport::new(self.config.label.clone(), info)
    }
}

impl Drop for MediaOutput {
    fn drop(&mut self) {
        self.sink.shutdown();
    }
}
