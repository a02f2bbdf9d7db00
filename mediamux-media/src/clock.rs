//! Playback clock driven by wall time
//!
//! Uses `tokio::time::Instant` so that paused runtimes advance it
//! deterministically.

use mediamux_core::TimeUnit;
use tokio::time::Instant;

/// Maps wall time onto the media timeline
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    start_time: TimeUnit,
    /// Media position at `anchor`
    anchor_position: TimeUnit,
    /// Wall time the clock was last rebased; `None` while paused
    anchor: Option<Instant>,
    rate: f64,
}

impl PlaybackClock {
    /// Create a paused clock positioned at `start_time`
    pub fn new(start_time: TimeUnit, rate: f64) -> Self {
        Self {
            start_time,
            anchor_position: start_time,
            anchor: None,
            rate,
        }
    }

    /// Position the session started from
    pub fn start_time(&self) -> TimeUnit {
        self.start_time
    }

    /// Media position at `now`
    pub fn position_at(&self, now: Instant) -> TimeUnit {
        match self.anchor {
            Some(anchor) => {
                let elapsed = TimeUnit::from_duration(now.saturating_duration_since(anchor));
                self.anchor_position + elapsed.scale(self.rate)
            }
            None => self.anchor_position,
        }
    }

    /// Whether the clock advances with wall time
    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    /// Current rate
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Resume or pause at `now`
    pub fn set_running(&mut self, running: bool, now: Instant) {
        if running == self.is_running() {
            return;
        }
        self.anchor_position = self.position_at(now);
        self.anchor = running.then_some(now);
    }

    /// Change the rate at `now`, keeping the position continuous
    pub fn set_rate(&mut self, rate: f64, now: Instant) {
        self.anchor_position = self.position_at(now);
        if self.anchor.is_some() {
            self.anchor = Some(now);
        }
        self.rate = rate;
    }
}
