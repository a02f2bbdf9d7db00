//! Fan-out queues of decoded frames
//!
//! The decoder side pushes into a [`MediaQueue`]. Every sink holds its own
//! [`QueueReader`], so two sinks can consume the same stream at their own
//! pace without stealing frames from each other. A reader only sees frames
//! pushed after it subscribed, and none while it is detached.

use crate::frame::{AudioData, TimedFrame, VideoData};
use mediamux_core::TimeUnit;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};

#[derive(Debug)]
struct ReaderBuffer<T> {
    frames: VecDeque<Arc<T>>,
    finished: bool,
    attached: bool,
}

#[derive(Debug)]
struct QueueShared<T> {
    readers: Vec<Weak<Mutex<ReaderBuffer<T>>>>,
    finished: bool,
}

/// Producer side of a decoded frame queue
#[derive(Debug)]
pub struct MediaQueue<T> {
    shared: Arc<Mutex<QueueShared<T>>>,
}

impl<T> Clone for MediaQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: TimedFrame> MediaQueue<T> {
    /// Create an empty, open queue
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(QueueShared {
                readers: Vec::new(),
                finished: false,
            })),
        }
    }

    /// Attach a new reader
    pub fn subscribe(&self) -> QueueReader<T> {
        let mut shared = self.shared.lock();
        let buffer = Arc::new(Mutex::new(ReaderBuffer {
            frames: VecDeque::new(),
            finished: shared.finished,
            attached: true,
        }));
        shared.readers.push(Arc::downgrade(&buffer));
        QueueReader { buffer }
    }

    /// Push a frame to every live, attached reader
    pub fn push(&self, frame: T) {
        let frame = Arc::new(frame);
        let mut shared = self.shared.lock();
        shared.readers.retain(|reader| match reader.upgrade() {
            Some(buffer) => {
                let mut buffer = buffer.lock();
                if buffer.attached {
                    buffer.frames.push_back(frame.clone());
                }
                true
            }
            None => false,
        });
    }

    /// Mark the end of the stream
    pub fn finish(&self) {
        self.set_finished(true);
    }

    /// Clear the end-of-stream mark, e.g. after a seek
    pub fn reopen(&self) {
        self.set_finished(false);
    }

    /// Whether the end of the stream was marked
    pub fn is_finished(&self) -> bool {
        self.shared.lock().finished
    }

    /// Number of live readers
    pub fn reader_count(&self) -> usize {
        let mut shared = self.shared.lock();
        shared.readers.retain(|reader| reader.strong_count() > 0);
        shared.readers.len()
    }

    fn set_finished(&self, finished: bool) {
        let mut shared = self.shared.lock();
        shared.finished = finished;
        for reader in shared.readers.iter().filter_map(Weak::upgrade) {
            reader.lock().finished = finished;
        }
    }
}

impl<T: TimedFrame> Default for MediaQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of a decoded frame queue
#[derive(Debug)]
pub struct QueueReader<T> {
    buffer: Arc<Mutex<ReaderBuffer<T>>>,
}

impl<T: TimedFrame> QueueReader<T> {
    /// Start time of the oldest queued frame
    pub fn front_time(&self) -> Option<TimeUnit> {
        self.buffer.lock().frames.front().map(|frame| frame.time())
    }

    /// Remove and return the oldest queued frame
    pub fn pop_front(&self) -> Option<Arc<T>> {
        self.buffer.lock().frames.pop_front()
    }

    /// Remove every frame starting at or before `position`, oldest first
    pub fn pop_due(&self, position: TimeUnit) -> Vec<Arc<T>> {
        let mut buffer = self.buffer.lock();
        let mut due = Vec::new();
        while buffer
            .frames
            .front()
            .is_some_and(|frame| frame.time() <= position)
        {
            if let Some(frame) = buffer.frames.pop_front() {
                due.push(frame);
            }
        }
        due
    }

    /// Drop frames that end at or before `time`; returns how many were dropped
    pub fn discard_before(&self, time: TimeUnit) -> usize {
        let mut buffer = self.buffer.lock();
        let before = buffer.frames.len();
        buffer.frames.retain(|frame| frame.end_time() > time);
        before - buffer.frames.len()
    }

    /// Summed duration of the queued frames
    pub fn queued_duration(&self) -> TimeUnit {
        self.buffer
            .lock()
            .frames
            .iter()
            .fold(TimeUnit::ZERO, |total, frame| total + frame.duration())
    }

    /// Number of queued frames
    pub fn len(&self) -> usize {
        self.buffer.lock().frames.len()
    }

    /// Whether no frames are queued
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().frames.is_empty()
    }

    /// Whether the end of the stream was marked
    pub fn is_finished(&self) -> bool {
        self.buffer.lock().finished
    }

    /// Drop every queued frame and ignore new ones until [`attach`](Self::attach)
    pub fn detach(&self) {
        let mut buffer = self.buffer.lock();
        buffer.attached = false;
        buffer.frames.clear();
    }

    /// Resume receiving pushed frames
    pub fn attach(&self) {
        self.buffer.lock().attached = true;
    }

    /// Whether pushed frames are being queued
    pub fn is_attached(&self) -> bool {
        self.buffer.lock().attached
    }

    /// Whether the stream ended and every frame was consumed
    pub fn is_drained(&self) -> bool {
        let buffer = self.buffer.lock();
        buffer.finished && buffer.frames.is_empty()
    }
}

/// The audio and video queues of one decoded stream
#[derive(Debug, Clone, Default)]
pub struct MediaQueues {
    /// Decoded audio
    pub audio: MediaQueue<AudioData>,
    /// Decoded video
    pub video: MediaQueue<VideoData>,
}

impl MediaQueues {
    /// Create a pair of empty, open queues
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the end of both streams
    pub fn finish(&self) {
        self.audio.finish();
        self.video.finish();
    }

    /// Clear the end-of-stream mark on both streams
    pub fn reopen(&self) {
        self.audio.reopen();
        self.video.reopen();
    }
}
