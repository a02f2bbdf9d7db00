//! Audio output and video surface endpoints used by the presentation sink
//!
//! [`AudioOutput`] is the seam to a real audio backend. The crate ships a
//! [`SimulatedAudioOutput`] that behaves like a device (volume, channel
//! mapping, a bounded playout buffer) without touching hardware, which is
//! what tests and headless deployments use. [`VideoFrameContainer`] is the
//! handle a compositor reads the current picture from.

use crate::frame::{AudioData, VideoData};
use mediamux_core::{AudioDeviceInfo, AudioInfo, SinkError, SinkResult, VideoInfo};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Trait for audio output implementations
pub trait AudioOutput: Send {
    /// Open the device for a stream
    fn open(&mut self, info: &AudioInfo, stream_name: &str) -> SinkResult<()>;

    /// Write a frame for playout
    fn write(&mut self, frame: &AudioData);

    /// Close the device; safe to call when not open
    fn close(&mut self);

    /// Set output volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f64);

    /// Keep pitch unchanged when the playback rate changes
    fn set_preserves_pitch(&mut self, preserves_pitch: bool);

    /// Device in use while open
    fn device(&self) -> Option<&AudioDeviceInfo>;
}

/// Simulated output configuration
#[derive(Debug, Clone)]
pub struct SimulatedOutputConfig {
    /// Device the output pretends to be
    pub device: AudioDeviceInfo,
    /// Playout buffer capacity in samples (all channels)
    pub buffer_size: usize,
    /// Whether opening succeeds
    pub available: bool,
}

impl Default for SimulatedOutputConfig {
    fn default() -> Self {
        Self {
            device: AudioDeviceInfo::default(),
            buffer_size: 48000 * 2, // one second of stereo
            available: true,
        }
    }
}

/// Observable state of a simulated output
#[derive(Debug, Clone)]
pub struct AudioOutputStats {
    /// Whether the device is open
    pub is_open: bool,
    /// Stream name given at open
    pub stream_name: String,
    /// Frames written
    pub frames_written: u64,
    /// Samples that did not fit in the playout buffer
    pub samples_dropped: u64,
    /// Buffer fill level (0.0 to 1.0)
    pub buffer_level: f32,
    /// RMS level of the last written frame
    pub output_level: f32,
    /// Current volume
    pub volume: f64,
    /// Current pitch preservation flag
    pub preserves_pitch: bool,
}

impl Default for AudioOutputStats {
    fn default() -> Self {
        Self {
            is_open: false,
            stream_name: String::new(),
            frames_written: 0,
            samples_dropped: 0,
            buffer_level: 0.0,
            output_level: 0.0,
            volume: 1.0,
            preserves_pitch: true,
        }
    }
}

/// Cloneable read handle on a [`SimulatedAudioOutput`]
#[derive(Debug, Clone)]
pub struct AudioOutputHandle {
    stats: Arc<Mutex<AudioOutputStats>>,
}

impl AudioOutputHandle {
    /// Snapshot of the output state
    pub fn stats(&self) -> AudioOutputStats {
        self.stats.lock().clone()
    }
}

/// Bounded ring of samples standing in for the device buffer
#[derive(Debug)]
struct PlayoutBuffer {
    samples: Vec<f32>,
    write_pos: usize,
    len: usize,
}

impl PlayoutBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)],
            write_pos: 0,
            len: 0,
        }
    }

    /// Returns how many samples fit
    fn write(&mut self, data: &[f32]) -> usize {
        let capacity = self.samples.len();
        let to_write = data.len().min(capacity - self.len);
        for &sample in &data[..to_write] {
            self.samples[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % capacity;
        }
        self.len += to_write;
        to_write
    }

    /// The simulated device plays out everything it holds between writes
    fn drain(&mut self) {
        self.len = 0;
    }

    fn level(&self) -> f32 {
        self.len as f32 / self.samples.len() as f32
    }
}

/// Audio output that renders into memory
pub struct SimulatedAudioOutput {
    config: SimulatedOutputConfig,
    buffer: Option<PlayoutBuffer>,
    stats: Arc<Mutex<AudioOutputStats>>,
    volume: f64,
}

impl SimulatedAudioOutput {
    /// Create an available output
    pub fn new() -> Self {
        Self::with_config(SimulatedOutputConfig::default())
    }

    /// Create an output whose `open` always fails
    pub fn unavailable() -> Self {
        Self::with_config(SimulatedOutputConfig {
            available: false,
            ..SimulatedOutputConfig::default()
        })
    }

    /// Create with custom configuration
    pub fn with_config(config: SimulatedOutputConfig) -> Self {
        Self {
            config,
            buffer: None,
            stats: Arc::new(Mutex::new(AudioOutputStats::default())),
            volume: 1.0,
        }
    }

    /// Read handle that stays valid after the output is boxed into a sink
    pub fn handle(&self) -> AudioOutputHandle {
        AudioOutputHandle {
            stats: self.stats.clone(),
        }
    }

    /// Apply volume, clamping to the valid sample range
    fn process_audio(&self, samples: &mut [f32]) {
        let volume = self.volume as f32;
        for sample in samples.iter_mut() {
            *sample = (*sample * volume).clamp(-1.0, 1.0);
        }
    }

    /// Map the frame's channel layout onto the device's
    fn convert_channels(input: &[f32], input_channels: u16, output_channels: u16) -> Vec<f32> {
        match (input_channels, output_channels) {
            (1, 2) => input.iter().flat_map(|&s| [s, s]).collect(),
            (2, 1) => input
                .chunks_exact(2)
                .map(|pair| (pair[0] + pair[1]) * 0.5)
                .collect(),
            _ => input.to_vec(),
        }
    }
}

impl Default for SimulatedAudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for SimulatedAudioOutput {
    fn open(&mut self, info: &AudioInfo, stream_name: &str) -> SinkResult<()> {
        if !self.config.available {
            return Err(SinkError::DeviceUnavailable {
                device: self.config.device.id.clone(),
            });
        }

        self.buffer = Some(PlayoutBuffer::new(self.config.buffer_size));
        let mut stats = self.stats.lock();
        stats.is_open = true;
        stats.stream_name = stream_name.to_string();
        debug!(
            device = %self.config.device.id,
            channels = info.channels,
            rate = info.rate,
            "Opened simulated audio output"
        );
        Ok(())
    }

    fn write(&mut self, frame: &AudioData) {
        let mut samples =
            Self::convert_channels(&frame.samples, frame.channels, self.config.device.channels);
        self.process_audio(&mut samples);

        let Some(buffer) = self.buffer.as_mut() else {
            warn!("Audio written to a closed output, dropping frame");
            return;
        };

        buffer.drain();
        let written = buffer.write(&samples);
        let level = buffer.level();

        let mut stats = self.stats.lock();
        stats.frames_written += 1;
        stats.samples_dropped += (samples.len() - written) as u64;
        stats.buffer_level = level;
        stats.output_level = if samples.is_empty() {
            0.0
        } else {
            (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
        };
    }

    fn close(&mut self) {
        if self.buffer.take().is_some() {
            debug!(device = %self.config.device.id, "Closed simulated audio output");
        }
        let mut stats = self.stats.lock();
        stats.is_open = false;
        stats.buffer_level = 0.0;
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
        self.stats.lock().volume = self.volume;
    }

    fn set_preserves_pitch(&mut self, preserves_pitch: bool) {
        self.stats.lock().preserves_pitch = preserves_pitch;
    }

    fn device(&self) -> Option<&AudioDeviceInfo> {
        self.buffer.as_ref().map(|_| &self.config.device)
    }
}

#[derive(Debug, Default)]
struct ContainerState {
    current: Option<Arc<VideoData>>,
    frames_presented: u64,
    redraws: u64,
    display_size: Option<(u32, u32)>,
}

/// Shared handle on the picture a compositor displays
#[derive(Debug, Clone, Default)]
pub struct VideoFrameContainer {
    state: Arc<Mutex<ContainerState>>,
}

impl VideoFrameContainer {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current picture
    pub fn present(&self, frame: Arc<VideoData>) {
        let mut state = self.state.lock();
        state.current = Some(frame);
        state.frames_presented += 1;
    }

    /// Re-display the current picture at new display geometry
    pub fn redraw(&self, info: &VideoInfo) {
        let mut state = self.state.lock();
        state.display_size = Some((info.display_width, info.display_height));
        if state.current.is_some() {
            state.redraws += 1;
        }
    }

    /// Remove the current picture
    pub fn clear(&self) {
        self.state.lock().current = None;
    }

    /// Current picture
    pub fn current_frame(&self) -> Option<Arc<VideoData>> {
        self.state.lock().current.clone()
    }

    /// Pictures presented so far
    pub fn frames_presented(&self) -> u64 {
        self.state.lock().frames_presented
    }

    /// Redraws performed with a picture present
    pub fn redraws(&self) -> u64 {
        self.state.lock().redraws
    }

    /// Display geometry from the last redraw
    pub fn display_size(&self) -> Option<(u32, u32)> {
        self.state.lock().display_size
    }

    /// Whether both handles refer to the same container
    pub fn ptr_eq(&self, other: &VideoFrameContainer) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediamux_core::TimeUnit;

    #[test]
    fn test_unavailable_output_fails_to_open() {
        let mut output = SimulatedAudioOutput::unavailable();
        let err = output.open(&AudioInfo::default(), "test").unwrap_err();
        assert!(matches!(err, SinkError::DeviceUnavailable { .. }));
        assert!(output.device().is_none());
    }

    #[test]
    fn test_volume_scales_output() {
        let mut output = SimulatedAudioOutput::new();
        let handle = output.handle();
        output.open(&AudioInfo::default(), "stream").unwrap();
        output.set_volume(0.5);

        let frame = AudioData::new(TimeUnit::ZERO, 48000, 2, vec![0.8; 960]);
        output.write(&frame);

        let stats = handle.stats();
        assert!(stats.is_open);
        assert_eq!(stats.stream_name, "stream");
        assert_eq!(stats.frames_written, 1);
        assert!((stats.output_level - 0.4).abs() < 1e-4);
    }

    #[test]
    fn test_mono_is_upmixed() {
        let stereo = SimulatedAudioOutput::convert_channels(&[0.1, 0.2], 1, 2);
        assert_eq!(stereo, vec![0.1, 0.1, 0.2, 0.2]);

        let mono = SimulatedAudioOutput::convert_channels(&[0.2, 0.4], 2, 1);
        assert!((mono[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_overflow_counts_dropped_samples() {
        let mut output = SimulatedAudioOutput::with_config(SimulatedOutputConfig {
            buffer_size: 100,
            ..SimulatedOutputConfig::default()
        });
        let handle = output.handle();
        output.open(&AudioInfo::default(), "").unwrap();
        output.write(&AudioData::new(TimeUnit::ZERO, 48000, 2, vec![0.0; 160]));

        let stats = handle.stats();
        assert_eq!(stats.samples_dropped, 60);
        assert!((stats.buffer_level - 1.0).abs() < f32::EPSILON);

        output.close();
        assert!(!handle.stats().is_open);
    }

    #[test]
    fn test_container_redraw() {
        let container = VideoFrameContainer::new();
        let info = VideoInfo::default();
        container.redraw(&info);
        assert_eq!(container.redraws(), 0);

        container.present(Arc::new(VideoData {
            time: TimeUnit::ZERO,
            duration: TimeUnit::from_millis(33),
            width: 4,
            height: 4,
            data: bytes::Bytes::from_static(&[0; 24]),
            is_keyframe: true,
        }));
        container.redraw(&info);
        assert_eq!(container.redraws(), 1);
        assert_eq!(container.display_size(), Some((1280, 720)));
        assert!(container.ptr_eq(&container.clone()));
    }
}
