//! Capture sink
//!
//! Mirrors a decoded stream into a capturable track: every frame the clock
//! passes is published on a broadcast channel that any number of consumers
//! can subscribe to. Nothing here is audible or visible locally.

use crate::clock::PlaybackClock;
use crate::frame::{AudioData, VideoData};
use crate::queue::MediaQueues;
use crate::sink::{MediaSink, SinkState};
use crate::track::TrackPair;
use mediamux_core::{
    AudioDeviceInfo, CaptureSinkDebugInfo, EndedPromise, MediaInfo, MediaSinkDebugInfo,
    SinkError, SinkResult, TimeUnit, TrackType,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capture sink configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Name used in logs and errors
    pub name: String,
    /// Period of the capture loop
    pub render_interval: Duration,
    /// Capacity of the broadcast channel, in frames
    pub channel_capacity: usize,
    /// Fail `start` when nobody subscribed
    pub require_consumer: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            name: "capture".to_string(),
            render_interval: Duration::from_millis(10),
            channel_capacity: 256,
            require_consumer: true,
        }
    }
}

/// What the capture sink publishes
#[derive(Debug, Clone)]
pub enum CapturedFrame {
    /// Captured audio
    Audio(Arc<AudioData>),
    /// Captured video
    Video(Arc<VideoData>),
    /// The track played through
    Ended(TrackType),
}

/// Cloneable subscription point of a capture sink
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    sender: broadcast::Sender<CapturedFrame>,
}

impl CaptureHandle {
    /// Attach a consumer
    pub fn subscribe(&self) -> broadcast::Receiver<CapturedFrame> {
        self.sender.subscribe()
    }

    /// Number of attached consumers
    pub fn consumer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

struct CaptureState {
    clock: PlaybackClock,
    playing: bool,
    tracks: TrackPair,
    sender: broadcast::Sender<CapturedFrame>,
    frames_published: u64,
    volume: f64,
    stream_name: String,
}

impl CaptureState {
    /// Publish everything due at `now`; returns true once no track has work left
    fn render(&mut self, now: Instant) -> bool {
        let position = self.clock.position_at(now);

        if self.clock.is_running() {
            for frame in self.tracks.audio.take_due(position) {
                let frame = self.apply_volume(frame);
                self.publish(CapturedFrame::Audio(frame));
            }
            for frame in self.tracks.video.take_due(position) {
                self.publish(CapturedFrame::Video(frame));
            }
        }

        for track in self.tracks.check_ended(position) {
            self.publish(CapturedFrame::Ended(track));
        }
        self.tracks.is_done()
    }

    fn apply_volume(&self, frame: Arc<AudioData>) -> Arc<AudioData> {
        if self.volume >= 1.0 {
            return frame;
        }
        let volume = self.volume as f32;
        let mut scaled = AudioData::clone(&frame);
        for sample in scaled.samples.iter_mut() {
            *sample *= volume;
        }
        Arc::new(scaled)
    }

    fn publish(&mut self, frame: CapturedFrame) {
        // A send error only means nobody is listening right now
        if self.sender.send(frame).is_ok() {
            self.frames_published += 1;
        }
    }
}

/// Sink that republishes the stream for capture consumers
pub struct CaptureSink {
    id: Uuid,
    config: CaptureConfig,
    state: SinkState,
    shared: Arc<Mutex<CaptureState>>,
    sender: broadcast::Sender<CapturedFrame>,
    render_task: Option<JoinHandle<()>>,
    preserves_pitch: bool,
}

impl CaptureSink {
    /// Create a sink reading from `queues`
    pub fn new(queues: &MediaQueues) -> Self {
        Self::with_config(queues, CaptureConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(queues: &MediaQueues, config: CaptureConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        let shared = CaptureState {
            clock: PlaybackClock::new(TimeUnit::ZERO, 1.0),
            playing: false,
            tracks: TrackPair::new(queues),
            sender: sender.clone(),
            frames_published: 0,
            volume: 1.0,
            stream_name: String::new(),
        };

        Self {
            id: Uuid::new_v4(),
            config,
            state: SinkState::Idle,
            shared: Arc::new(Mutex::new(shared)),
            sender,
            render_task: None,
            preserves_pitch: true,
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

    /// Subscription point that outlives boxing the sink
    pub fn handle(&self) -> CaptureHandle {
        CaptureHandle {
            sender: self.sender.clone(),
        }
    }

    /// Attach a consumer
    pub fn subscribe(&self) -> broadcast::Receiver<CapturedFrame> {
        self.sender.subscribe()
    }

    /// Stream name of the captured track
    pub fn stream_name(&self) -> String {
        self.shared.lock().stream_name.clone()
    }

    /// Whether pitch preservation was requested
    pub fn preserves_pitch(&self) -> bool {
        self.preserves_pitch
    }

    /// Volume applied to captured audio
    pub fn volume(&self) -> f64 {
        self.shared.lock().volume
    }

    fn begin_session(&mut self, start_time: TimeUnit, info: &MediaInfo) -> SinkResult<()> {
        if self.config.require_consumer && self.sender.receiver_count() == 0 {
            return Err(self.start_failure("no capture consumer attached"));
        }

        let runtime = Handle::try_current()
            .map_err(|_| self.start_failure("no async runtime available for capture"))?;

        {
            let mut guard = self.shared.lock();
            let shared = &mut *guard;
            shared.clock = PlaybackClock::new(start_time, shared.clock.rate());
            shared.clock.set_running(shared.playing, Instant::now());
            shared.tracks.begin(start_time, info);
        }

        self.render_task = Some(runtime.spawn(capture_loop(
            self.shared.clone(),
            self.config.render_interval,
        )));
        self.state = SinkState::Started;

        info!(
            sink_id = %self.id,
            start_time = %start_time,
            consumers = self.sender.receiver_count(),
            "Capture sink started"
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

async fn capture_loop(shared: Arc<Mutex<CaptureState>>, period: Duration) {
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if shared.lock().render(Instant::now()) {
            debug!("Capture loop finished");
            break;
        }
    }
}

impl MediaSink for CaptureSink {
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
        }

        self.state = SinkState::Idle;
        info!(sink_id = %self.id, "Capture sink stopped");
    }

    fn shutdown(&mut self) {
        if self.state == SinkState::Shutdown {
            return;
        }

        self.stop();
        self.shared.lock().tracks.end();
        self.state = SinkState::Shutdown;
        info!(sink_id = %self.id, "Capture sink shut down");
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
        self.shared.lock().volume = volume.clamp(0.0, 1.0);
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
    }

    fn set_preserves_pitch(&mut self, preserves_pitch: bool) {
        if self.state == SinkState::Shutdown {
            return;
        }
        // Captured audio is always time-stretched; the flag is only reported
        self.preserves_pitch = preserves_pitch;
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
    }

    fn set_stream_name(&mut self, name: &str) {
        if self.state == SinkState::Shutdown {
            return;
        }
        self.shared.lock().stream_name = name.to_string();
    }

    fn playback_rate(&self) -> f64 {
        self.shared.lock().clock.rate()
    }

    fn audio_device(&self) -> Option<&AudioDeviceInfo> {
        None
    }

    fn debug_info(&self, info: &mut MediaSinkDebugInfo) {
        let (position, _) = self.position_at();
        let shared = self.shared.lock();
        info.capture = Some(CaptureSinkDebugInfo {
            sink_id: self.id.to_string(),
            is_started: self.is_started(),
            is_playing: self.is_started() && shared.playing,
            position,
            audio_end_time: shared.tracks.end_time(TrackType::Audio),
            video_end_time: shared.tracks.end_time(TrackType::Video),
            frames_published: shared.frames_published,
            consumers: self.sender.receiver_count(),
            volume: shared.volume,
            playback_rate: shared.clock.rate(),
            stream_name: shared.stream_name.clone(),
        });
    }
}

impl Drop for CaptureSink {
    fn drop(&mut self) {
        if let Some(task) = self.render_task.take() {
            task.abort();
        }
    }
}
