//! Local presentation sink
//!
//! Plays a decoded stream to the audio output and the video frame
//! container. Its clock is the timing authority for local playback.

use crate::clock::PlaybackClock;
use crate::frame::VideoData;
use crate::output::{AudioOutput, VideoFrameContainer};
use crate::queue::MediaQueues;
use crate::sink::{MediaSink, SinkState};
use crate::track::TrackPair;
use mediamux_core::{
    AudioDeviceInfo, EndedPromise, MediaInfo, MediaSinkDebugInfo, PresentationSinkDebugInfo,
    SinkError, SinkResult, TimeUnit, TrackType, VideoInfo,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Presentation sink configuration
#[derive(Debug, Clone)]
pub struct PresentationConfig {
    /// Name used in logs and errors
    pub name: String,
    /// Period of the render loop
    pub render_interval: Duration,
    /// Initial stream name handed to the audio output
    pub stream_name: String,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            name: "presentation".to_string(),
            render_interval: Duration::from_millis(10),
            stream_name: "mediamux".to_string(),
        }
    }
}

struct PresentationState {
    clock: PlaybackClock,
    playing: bool,
    tracks: TrackPair,
    output: Box<dyn AudioOutput>,
    container: VideoFrameContainer,
    secondary: Option<VideoFrameContainer>,
    frames_dropped: u64,
    volume: f64,
    preserves_pitch: bool,
    stream_name: String,
}

impl PresentationState {
    /// Play everything due at `now`; returns true once no track has work left
    fn render(&mut self, now: Instant) -> bool {
        let position = self.clock.position_at(now);

        if self.clock.is_running() {
            for frame in self.tracks.audio.take_due(position) {
                self.output.write(&frame);
            }

            let mut due = self.tracks.video.take_due(position);
            if let Some(latest) = due.pop() {
                self.frames_dropped += due.len() as u64;
                self.present(latest);
            }
        }

        self.tracks.check_ended(position);
        self.tracks.is_done()
    }

    fn present(&self, frame: Arc<VideoData>) {
        if let Some(secondary) = &self.secondary {
            secondary.present(frame.clone());
        }
        self.container.present(frame);
    }
}

/// Sink that renders to the local audio output and video surface
pub struct PresentationSink {
    id: Uuid,
    config: PresentationConfig,
    state: SinkState,
    shared: Arc<Mutex<PresentationState>>,
    render_task: Option<JoinHandle<()>>,
    device: Option<AudioDeviceInfo>,
}

impl PresentationSink {
    /// Create a sink reading from `queues`
    pub fn new(
        queues: &MediaQueues,
        output: Box<dyn AudioOutput>,
        container: VideoFrameContainer,
    ) -> Self {
        Self::with_config(queues, output, container, PresentationConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(
        queues: &MediaQueues,
        output: Box<dyn AudioOutput>,
        container: VideoFrameContainer,
        config: PresentationConfig,
    ) -> Self {
        let shared = PresentationState {
            clock: PlaybackClock::new(TimeUnit::ZERO, 1.0),
            playing: false,
            tracks: TrackPair::new(queues),
            output,
            container,
            secondary: None,
            frames_dropped: 0,
            volume: 1.0,
            preserves_pitch: true,
            stream_name: config.stream_name.clone(),
        };

        Self {
            id: Uuid::new_v4(),
            config,
            state: SinkState::Idle,
            shared: Arc::new(Mutex::new(shared)),
            render_task: None,
            device: None,
        }
    }

    /// Sink instance identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Primary video container
    pub fn container(&self) -> VideoFrameContainer {
        self.shared.lock().container.clone()
    }

    fn begin_session(&mut self, start_time: TimeUnit, info: &MediaInfo) -> SinkResult<()> {
        let runtime = Handle::try_current()
            .map_err(|_| self.start_failure("no async runtime available for rendering"))?;

        {
            let mut guard = self.shared.lock();
            let shared = &mut *guard;

            if let Some(audio) = &info.audio {
                shared
                    .output
                    .open(audio, &shared.stream_name)
                    .map_err(|e| self.start_failure(e.to_string()))?;
                shared.output.set_volume(shared.volume);
                shared.output.set_preserves_pitch(shared.preserves_pitch);
                self.device = shared.output.device().cloned();
            }

            let now = Instant::now();
            shared.clock = PlaybackClock::new(start_time, shared.clock.rate());
            shared.clock.set_running(shared.playing, now);
            shared.tracks.begin(start_time, info);
        }

        self.render_task = Some(runtime.spawn(render_loop(
            self.shared.clone(),
            self.config.render_interval,
        )));
        self.state = SinkState::Started;

        info!(
            sink_id = %self.id,
            start_time = %start_time,
            audio = info.has_audio(),
            video = info.has_video(),
            "Presentation sink started"
        );
        Ok(())
    }

    fn start_failure(&self, reason: impl Into<String>) -> SinkError {
        SinkError::StartFailure {
            sink: self.config.name.clone(),
            reason: reason.into(),
        }
    }
}

async fn render_loop(shared: Arc<Mutex<PresentationState>>, period: Duration) {
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if shared.lock().render(Instant::now()) {
            debug!("Presentation render loop finished");
            break;
        }
    }
}

impl MediaSink for PresentationSink {
    fn start(&mut self, start_time: TimeUnit, info: &MediaInfo) -> SinkResult<()> {
        if self.state != SinkState::Idle {
            return Err(SinkError::InvalidState {
                expected: SinkState::Idle.to_string(),
                actual: self.state.to_string(),
            });
        }

        let result = self.begin_session(start_time, info);
        if result.is_err() {
            // Stop buffering for a sink that will not consume
            self.shared.lock().tracks.end();
        }
        result
    }

    fn stop(&mut self) {
        if self.state != SinkState::Started {
            return;
        }

        if let Some(task) = self.render_task.take() {
            task.abort();
        }

        {
            let mut shared = self.shared.lock();
            shared.clock.set_running(false, Instant::now());
            shared.tracks.end();
            shared.output.close();
        }

        self.device = None;
        self.state = SinkState::Idle;
        info!(sink_id = %self.id, "Presentation sink stopped");
    }

    fn shutdown(&mut self) {
        if self.state == SinkState::Shutdown {
            return;
        }

        self.stop();
        {
            let mut shared = self.shared.lock();
            shared.output.close();
            shared.tracks.end();
            shared.secondary = None;
        }
        self.state = SinkState::Shutdown;
        info!(sink_id = %self.id, "Presentation sink shut down");
    }

    fn is_started(&self) -> bool {
        self.state == SinkState::Started
    }

    fn is_playing(&self) -> bool {
        self.is_started() && self.shared.lock().playing
    }

    fn position_at(&self) -> (TimeUnit, Instant) {
        let now = Instant::now();
        (self.shared.lock().clock.position_at(now), now)
    }

    fn end_time(&self, track: TrackType) -> TimeUnit {
        self.shared.lock().tracks.end_time(track)
    }

    fn unplayed_duration(&self, track: TrackType) -> TimeUnit {
        self.shared.lock().tracks.unplayed_duration(track)
    }

    fn has_unplayed_frames(&self, track: TrackType) -> bool {
        self.shared.lock().tracks.has_unplayed_frames(track)
    }

    fn on_ended(&self, track: TrackType) -> Option<EndedPromise> {
        if !self.is_started() {
            return None;
        }
        self.shared.lock().tracks.promise(track)
    }

    fn set_volume(&mut self, volume: f64) {
        if self.state == SinkState::Shutdown {
            return;
        }
        let mut shared = self.shared.lock();
        shared.volume = volume.clamp(0.0, 1.0);
        let volume = shared.volume;
        shared.output.set_volume(volume);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        if self.state == SinkState::Shutdown {
            return;
        }
        if !rate.is_finite() || rate <= 0.0 {
            warn!(sink_id = %self.id, rate, "Ignoring invalid playback rate");
            return;
        }
        self.shared.lock().clock.set_rate(rate, Instant::now());
        debug!(sink_id = %self.id, rate, "Playback rate changed");
    }

    fn set_preserves_pitch(&mut self, preserves_pitch: bool) {
        if self.state == SinkState::Shutdown {
            return;
        }
        let mut shared = self.shared.lock();
        shared.preserves_pitch = preserves_pitch;
        shared.output.set_preserves_pitch(preserves_pitch);
    }

    fn set_playing(&mut self, playing: bool) {
        if self.state == SinkState::Shutdown {
            return;
        }
        let started = self.is_started();
        let mut shared = self.shared.lock();
        shared.playing = playing;
        if started {
            shared.clock.set_running(playing, Instant::now());
        }
        debug!(sink_id = %self.id, playing, "Play state changed");
    }

    fn set_stream_name(&mut self, name: &str) {
        if self.state == SinkState::Shutdown {
            return;
        }
        // Takes effect the next time the output is opened
        self.shared.lock().stream_name = name.to_string();
    }

    fn redraw(&mut self, info: &VideoInfo) {
        if self.state == SinkState::Shutdown {
            return;
        }
        let shared = self.shared.lock();
        shared.container.redraw(info);
        if let Some(secondary) = &shared.secondary {
            secondary.redraw(info);
        }
    }

    fn set_secondary_video_container(&mut self, container: Option<VideoFrameContainer>) {
        if self.state == SinkState::Shutdown {
            return;
        }
        let mut shared = self.shared.lock();
        if let (Some(secondary), Some(frame)) = (&container, shared.container.current_frame()) {
            secondary.present(frame);
        }
        shared.secondary = container;
    }

    fn playback_rate(&self) -> f64 {
        self.shared.lock().clock.rate()
    }

    fn audio_device(&self) -> Option<&AudioDeviceInfo> {
        self.device.as_ref()
    }

    fn debug_info(&self, info: &mut MediaSinkDebugInfo) {
        let (position, _) = self.position_at();
        let shared = self.shared.lock();
        info.presentation = Some(PresentationSinkDebugInfo {
            sink_id: self.id.to_string(),
            is_started: self.is_started(),
            is_playing: self.is_started() && shared.playing,
            position,
            audio_end_time: shared.tracks.end_time(TrackType::Audio),
            video_end_time: shared.tracks.end_time(TrackType::Video),
            frames_presented: shared.container.frames_presented(),
            frames_dropped: shared.frames_dropped,
            volume: shared.volume,
            playback_rate: shared.clock.rate(),
            preserves_pitch: shared.preserves_pitch,
            stream_name: shared.stream_name.clone(),
            audio_device: self.device.as_ref().map(|device| device.name.clone()),
            has_secondary_container: shared.secondary.is_some(),
        });
    }
}

impl Drop for PresentationSink {
    fn drop(&mut self) {
        if let Some(task) = self.render_task.take() {
            task.abort();
        }
    }
}
