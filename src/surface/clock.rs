//! Monotonic microsecond timestamps
//!
//! The surface never reads a clock by itself; callers pass a `Timestamp` into
//! `dispatch` and `tick`. Timestamps wrap around and are only ever compared
//! through `elapsed_since`, which uses wrapping subtraction.

use std::time::{Duration, Instant};

/// A wrapping microsecond counter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp(u32);

impl Timestamp {
    pub const fn from_micros(micros: u32) -> Self {
        Self(micros)
    }

    pub const fn from_millis(millis: u32) -> Self {
        Self(millis.wrapping_mul(1000))
    }

    pub const fn as_micros(self) -> u32 {
        self.0
    }

    /// Microseconds between `earlier` and `self`, tolerant of counter overflow
    pub const fn elapsed_since(self, earlier: Timestamp) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Timestamp `duration` later, wrapping around
    pub fn advanced_by(self, duration: Duration) -> Self {
        Self(self.0.wrapping_add(duration.as_micros() as u32))
    }
}

/// Source of `Timestamp`s anchored at construction time
#[derive(Debug, Clone, Copy)]
pub struct SurfaceClock {
    start: Instant,
}

impl SurfaceClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Current time; truncation to 32 bits is the intended wraparound
    pub fn now(&self) -> Timestamp {
        Timestamp(self.start.elapsed().as_micros() as u32)
    }
}

impl Default for SurfaceClock {
    fn default() -> Self {
        Self::new()
    }
}
