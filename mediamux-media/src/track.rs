//! Per-track playout bookkeeping shared by the concrete sinks

use crate::frame::{AudioData, TimedFrame, VideoData};
use crate::queue::{MediaQueues, QueueReader};
use mediamux_core::{EndedPromise, EndedResolver, MediaInfo, TimeUnit, TrackType};
use std::sync::Arc;
use tracing::debug;

/// Consumes one track's frames as the clock passes them
#[derive(Debug)]
pub(crate) struct TrackRenderer<T> {
    track: TrackType,
    reader: QueueReader<T>,
    active: bool,
    played_end: TimeUnit,
    resolver: Option<EndedResolver>,
    promise: Option<EndedPromise>,
}

impl<T: TimedFrame> TrackRenderer<T> {
    pub(crate) fn new(track: TrackType, reader: QueueReader<T>) -> Self {
        Self {
            track,
            reader,
            active: false,
            played_end: TimeUnit::ZERO,
            resolver: None,
            promise: None,
        }
    }

    /// Begin a session; an absent track stays inactive and buffers nothing
    pub(crate) fn begin(&mut self, start_time: TimeUnit, present: bool) {
        self.reset();
        if !present {
            self.reader.detach();
            return;
        }

        self.reader.attach();
        let discarded = self.reader.discard_before(start_time);
        if discarded > 0 {
            debug!(track = %self.track, discarded, "Discarded frames before start time");
        }
        let (resolver, promise) = EndedPromise::pending();
        self.active = true;
        self.played_end = start_time;
        self.resolver = Some(resolver);
        self.promise = Some(promise);
    }

    /// End the session, abandoning the promise if it has not settled.
    /// Queued frames are released and new ones ignored until the next `begin`.
    pub(crate) fn end(&mut self) {
        self.reset();
        self.reader.detach();
    }

    fn reset(&mut self) {
        self.active = false;
        self.resolver = None;
        self.promise = None;
    }

    /// Take every frame due at `position`
    pub(crate) fn take_due(&mut self, position: TimeUnit) -> Vec<Arc<T>> {
        if !self.active {
            return Vec::new();
        }
        let due = self.reader.pop_due(position);
        if let Some(end) = due.iter().map(|frame| frame.end_time()).max() {
            self.played_end = self.played_end.max(end);
        }
        due
    }

    /// Resolve the promise once the stream is drained and played through.
    /// Returns true on the call that resolved it.
    pub(crate) fn check_ended(&mut self, position: TimeUnit) -> bool {
        if !self.active || !self.reader.is_drained() || position < self.played_end {
            return false;
        }
        match self.resolver.take() {
            Some(resolver) => {
                resolver.resolve();
                debug!(track = %self.track, end = %self.played_end, "Track ended");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the track is inactive or has ended
    pub(crate) fn is_done(&self) -> bool {
        !self.active || self.resolver.is_none()
    }

    pub(crate) fn end_time(&self) -> TimeUnit {
        if self.active {
            self.played_end
        } else {
            TimeUnit::ZERO
        }
    }

    pub(crate) fn unplayed_duration(&self) -> TimeUnit {
        if self.active {
            self.reader.queued_duration()
        } else {
            TimeUnit::ZERO
        }
    }

    pub(crate) fn has_unplayed_frames(&self) -> bool {
        self.active && !self.reader.is_empty()
    }

    pub(crate) fn promise(&self) -> Option<EndedPromise> {
        self.promise.clone()
    }
}

/// The audio and video renderers of one sink
#[derive(Debug)]
pub(crate) struct TrackPair {
    pub(crate) audio: TrackRenderer<AudioData>,
    pub(crate) video: TrackRenderer<VideoData>,
}

impl TrackPair {
    pub(crate) fn new(queues: &MediaQueues) -> Self {
        Self {
            audio: TrackRenderer::new(TrackType::Audio, queues.audio.subscribe()),
            video: TrackRenderer::new(TrackType::Video, queues.video.subscribe()),
        }
    }

    pub(crate) fn begin(&mut self, start_time: TimeUnit, info: &MediaInfo) {
        self.audio.begin(start_time, info.has_audio());
        self.video.begin(start_time, info.has_video());
    }

    pub(crate) fn end(&mut self) {
        self.audio.end();
        self.video.end();
    }

    /// Tracks that ended on this call
    pub(crate) fn check_ended(&mut self, position: TimeUnit) -> Vec<TrackType> {
        let mut ended = Vec::new();
        if self.audio.check_ended(position) {
            ended.push(TrackType::Audio);
        }
        if self.video.check_ended(position) {
            ended.push(TrackType::Video);
        }
        ended
    }

    pub(crate) fn is_done(&self) -> bool {
        self.audio.is_done() && self.video.is_done()
    }

    pub(crate) fn end_time(&self, track: TrackType) -> TimeUnit {
        match track {
            TrackType::Audio => self.audio.end_time(),
            TrackType::Video => self.video.end_time(),
        }
    }

    pub(crate) fn unplayed_duration(&self, track: TrackType) -> TimeUnit {
        match track {
            TrackType::Audio => self.audio.unplayed_duration(),
            TrackType::Video => self.video.unplayed_duration(),
        }
    }

    pub(crate) fn has_unplayed_frames(&self, track: TrackType) -> bool {
        match track {
            TrackType::Audio => self.audio.has_unplayed_frames(),
            TrackType::Video => self.video.has_unplayed_frames(),
        }
    }

    pub(crate) fn promise(&self, track: TrackType) -> Option<EndedPromise> {
        match track {
            TrackType::Audio => self.audio.promise(),
            TrackType::Video => self.video.promise(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MediaQueue;
    use mediamux_core::TrackEnd;

    fn push(queue: &MediaQueue<AudioData>, start_ms: i64) {
        queue.push(AudioData::silence(
            TimeUnit::from_millis(start_ms),
            TimeUnit::from_millis(20),
            48000,
            2,
        ));
    }

    #[test]
    fn test_absent_track_is_inactive() {
        let queue: MediaQueue<AudioData> = MediaQueue::new();
        let mut track = TrackRenderer::new(TrackType::Audio, queue.subscribe());
        track.begin(TimeUnit::ZERO, false);

        assert!(!track.is_active());
        assert!(track.is_done());
        assert!(track.promise().is_none());
        assert_eq!(track.end_time(), TimeUnit::ZERO);
    }

    #[test]
    fn test_played_through_resolves() {
        let queue = MediaQueue::new();
        let mut track = TrackRenderer::new(TrackType::Audio, queue.subscribe());
        push(&queue, 0);
        push(&queue, 20);
        queue.finish();

        track.begin(TimeUnit::ZERO, true);
        let promise = track.promise().unwrap();
        assert_eq!(track.unplayed_duration(), TimeUnit::from_millis(40));

        assert_eq!(track.take_due(TimeUnit::from_millis(25)).len(), 2);
        assert_eq!(track.end_time(), TimeUnit::from_millis(40));
        // Last frame has not finished playing yet
        assert!(!track.check_ended(TimeUnit::from_millis(25)));

        assert!(track.check_ended(TimeUnit::from_millis(40)));
        assert!(!track.check_ended(TimeUnit::from_millis(50)));
        assert_eq!(promise.peek(), Some(TrackEnd::Finished));
        assert!(track.is_done());
    }

    #[test]
    fn test_pair_follows_media_info() {
        let queues = MediaQueues::new();
        let mut pair = TrackPair::new(&queues);
        queues.finish();

        pair.begin(TimeUnit::ZERO, &MediaInfo::audio_only());
        assert!(pair.promise(TrackType::Audio).is_some());
        assert!(pair.promise(TrackType::Video).is_none());

        assert_eq!(pair.check_ended(TimeUnit::ZERO), vec![TrackType::Audio]);
        assert!(pair.is_done());
    }

    #[test]
    fn test_end_abandons_pending_promise() {
        let queue: MediaQueue<AudioData> = MediaQueue::new();
        let mut track = TrackRenderer::new(TrackType::Video, queue.subscribe());
        track.begin(TimeUnit::ZERO, true);
        let promise = track.promise().unwrap();

        track.end();
        assert_eq!(promise.peek(), Some(TrackEnd::Abandoned));
    }

    #[test]
    fn test_end_releases_buffered_frames() {
        let queue = MediaQueue::new();
        let mut track = TrackRenderer::new(TrackType::Audio, queue.subscribe());
        push(&queue, 0);
        track.begin(TimeUnit::ZERO, true);
        push(&queue, 20);

        track.end();
        push(&queue, 40);
        assert!(track.reader.is_empty());

        track.begin(TimeUnit::ZERO, true);
        push(&queue, 60);
        assert_eq!(track.reader.len(), 1);
        assert_eq!(track.unplayed_duration(), TimeUnit::from_millis(20));
    }

    #[test]
    fn test_absent_track_buffers_nothing() {
        let queue = MediaQueue::new();
        let mut track = TrackRenderer::new(TrackType::Audio, queue.subscribe());
        push(&queue, 0);

        track.begin(TimeUnit::ZERO, false);
        push(&queue, 20);
        assert!(!track.reader.is_attached());
        assert!(track.reader.is_empty());
    }
}
