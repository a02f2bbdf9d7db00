//! Playback time values
//!
//! [`TimeUnit`] is the unit every position and duration query is expressed
//! in. It counts microseconds and reserves one value as the indefinite
//! sentinel, which absorbs any arithmetic it takes part in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

/// A playback time value in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeUnit(i64);

impl TimeUnit {
    /// Time zero
    pub const ZERO: TimeUnit = TimeUnit(0);

    /// Indefinite or unknown time; sorts after every definite value
    pub const INDEFINITE: TimeUnit = TimeUnit(i64::MAX);

    /// Create from microseconds
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create from milliseconds
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Create from seconds; non-finite input yields [`TimeUnit::INDEFINITE`]
    pub fn from_seconds(seconds: f64) -> Self {
        if !seconds.is_finite() {
            return Self::INDEFINITE;
        }
        let micros = (seconds * 1_000_000.0).round();
        if micros >= i64::MAX as f64 {
            Self::INDEFINITE
        } else {
            Self(micros.max(i64::MIN as f64) as i64)
        }
    }

    /// Create from a wall-clock duration
    pub fn from_duration(duration: Duration) -> Self {
        i64::try_from(duration.as_micros())
            .map(Self)
            .unwrap_or(Self::INDEFINITE)
    }

    /// Microsecond count
    pub const fn as_micros(&self) -> i64 {
        self.0
    }

    /// Value in seconds; infinite for the indefinite sentinel
    pub fn as_seconds(&self) -> f64 {
        if self.is_indefinite() {
            f64::INFINITY
        } else {
            self.0 as f64 / 1_000_000.0
        }
    }

    /// Convert to a wall-clock duration; `None` when negative or indefinite
    pub fn to_duration(&self) -> Option<Duration> {
        if self.is_indefinite() || self.0 < 0 {
            None
        } else {
            Some(Duration::from_micros(self.0 as u64))
        }
    }

    /// Whether this is the indefinite sentinel
    pub const fn is_indefinite(&self) -> bool {
        self.0 == i64::MAX
    }

    /// Whether this is a definite value
    pub const fn is_definite(&self) -> bool {
        !self.is_indefinite()
    }

    /// Scale by a playback rate
    pub fn scale(&self, rate: f64) -> Self {
        if self.is_indefinite() {
            return *self;
        }
        Self::from_seconds(self.as_seconds() * rate)
    }
}

impl Default for TimeUnit {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for TimeUnit {
    type Output = TimeUnit;

    fn add(self, rhs: TimeUnit) -> TimeUnit {
        if self.is_indefinite() || rhs.is_indefinite() {
            return TimeUnit::INDEFINITE;
        }
        // Saturating at i64::MAX lands on the sentinel, which is what an overflow means here
        TimeUnit(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for TimeUnit {
    fn add_assign(&mut self, rhs: TimeUnit) {
        *self = *self + rhs;
    }
}

impl Sub for TimeUnit {
    type Output = TimeUnit;

    fn sub(self, rhs: TimeUnit) -> TimeUnit {
        if self.is_indefinite() || rhs.is_indefinite() {
            return TimeUnit::INDEFINITE;
        }
        TimeUnit(self.0.saturating_sub(rhs.0).min(i64::MAX - 1))
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_indefinite() {
            write!(f, "indefinite")
        } else {
            write!(f, "{:.6}s", self.as_seconds())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(TimeUnit::from_millis(1500).as_micros(), 1_500_000);
        assert_eq!(TimeUnit::from_seconds(0.25), TimeUnit::from_millis(250));
        assert_eq!(
            TimeUnit::from_duration(Duration::from_millis(40)),
            TimeUnit::from_millis(40)
        );
        assert_eq!(
            TimeUnit::from_millis(40).to_duration(),
            Some(Duration::from_millis(40))
        );
        assert_eq!(TimeUnit::from_millis(-1).to_duration(), None);
        assert_eq!(TimeUnit::from_seconds(f64::NAN), TimeUnit::INDEFINITE);
    }

    #[test]
    fn test_indefinite_absorbs_arithmetic() {
        let t = TimeUnit::from_millis(10);
        assert_eq!(t + TimeUnit::INDEFINITE, TimeUnit::INDEFINITE);
        assert_eq!(TimeUnit::INDEFINITE - t, TimeUnit::INDEFINITE);
        assert_eq!(TimeUnit::INDEFINITE.scale(2.0), TimeUnit::INDEFINITE);
        assert!(TimeUnit::INDEFINITE.to_duration().is_none());
        assert!(TimeUnit::INDEFINITE.as_seconds().is_infinite());
    }

    #[test]
    fn test_ordering_and_arithmetic() {
        let a = TimeUnit::from_millis(10);
        let b = TimeUnit::from_millis(30);
        assert!(a < b);
        assert!(b < TimeUnit::INDEFINITE);
        assert_eq!(a + b, TimeUnit::from_millis(40));
        assert_eq!(b - a, TimeUnit::from_millis(20));
        assert_eq!(a - b, TimeUnit::from_millis(-20));
        assert_eq!(b.scale(0.5), TimeUnit::from_millis(15));

        let mut c = TimeUnit::ZERO;
        c += a;
        c += a;
        assert_eq!(c, TimeUnit::from_millis(20));
    }

    #[test]
    fn test_overflow_saturates_to_indefinite() {
        let near_max = TimeUnit::from_micros(i64::MAX - 5);
        assert!((near_max + TimeUnit::from_micros(10)).is_indefinite());
        // Subtraction never fabricates the sentinel
        assert!((near_max - TimeUnit::from_micros(-10)).is_definite());
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(TimeUnit::default(), TimeUnit::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(TimeUnit::from_millis(1500).to_string(), "1.500000s");
        assert_eq!(TimeUnit::INDEFINITE.to_string(), "indefinite");
    }
}
