//! # mediamux Core
//!
//! Foundational types shared by every media sink: playback time values,
//! track and stream descriptions, end-of-track promises, sink errors and
//! the debug-info records sinks fill in for diagnostics.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug;
pub mod ended;
pub mod error;
pub mod info;
pub mod time;

// Re-export main types
pub use debug::{CaptureSinkDebugInfo, MediaSinkDebugInfo, PresentationSinkDebugInfo};
pub use ended::{EndedPromise, EndedResolver, TrackEnd};
pub use error::{ErrorCategory, SinkError, SinkResult};
pub use info::{AudioDeviceInfo, AudioInfo, MediaInfo, TrackType, VideoInfo};
pub use time::TimeUnit;
