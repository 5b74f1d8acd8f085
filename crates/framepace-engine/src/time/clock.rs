use std::time::Instant;

use crate::logging::FRAME_TIMER;

pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// A monotonic high-resolution counter.
pub trait TickSource {
    /// Current counter value.
    fn ticks(&self) -> i64;

    /// Counter ticks per second. Zero or negative means the counter is unusable.
    fn frequency(&self) -> i64;
}

/// `Instant`-backed counter with nanosecond ticks, zeroed at construction.
#[derive(Debug, Copy, Clone)]
pub struct InstantTicks {
    origin: Instant,
}

impl InstantTicks {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for InstantTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for InstantTicks {
    fn ticks(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }

    fn frequency(&self) -> i64 {
        1_000_000_000
    }
}

/// Clock used by the scheduler.
///
/// Wraps a `TickSource` with a sanitized frequency. A counter reporting a zero
/// frequency is kept running with a divisor of 1 so conversions never divide
/// by zero; readings become meaningless but nothing aborts.
#[derive(Debug, Clone)]
pub struct ClockSource<T: TickSource = InstantTicks> {
    source: T,
    frequency: i64,
    degenerate: bool,
}

impl ClockSource<InstantTicks> {
    pub fn monotonic() -> Self {
        Self::new(InstantTicks::new())
    }
}

impl<T: TickSource> ClockSource<T> {
    pub fn new(source: T) -> Self {
        let reported = source.frequency();
        let degenerate = reported <= 0;
        if degenerate {
            log::warn!(
                target: FRAME_TIMER,
                "tick frequency reported as {reported}; falling back to a divisor of 1"
            );
        }

        Self {
            source,
            frequency: if degenerate { 1 } else { reported },
            degenerate,
        }
    }

    #[inline]
    pub fn now(&self) -> i64 {
        self.source.ticks()
    }

    #[inline]
    pub fn frequency(&self) -> i64 {
        self.frequency
    }

    /// True when the counter reported an unusable frequency.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Converts a tick delta to microseconds, truncating toward zero.
    pub fn ticks_to_us(&self, ticks: i64) -> i64 {
        let us = i128::from(ticks) * i128::from(MICROS_PER_SECOND) / i128::from(self.frequency);
        saturate(us)
    }

    /// Converts microseconds to ticks, rounded to nearest.
    pub fn us_to_ticks(&self, us: i64) -> i64 {
        let half = i128::from(MICROS_PER_SECOND / 2);
        let ticks = (i128::from(us) * i128::from(self.frequency) + half) / i128::from(MICROS_PER_SECOND);
        saturate(ticks)
    }

    /// Microseconds between two counter readings.
    pub fn elapsed_us(&self, from: i64, to: i64) -> i64 {
        self.ticks_to_us(to.saturating_sub(from))
    }

    /// Current counter reading in microseconds since the counter's origin.
    pub fn now_us(&self) -> i64 {
        self.ticks_to_us(self.now())
    }
}

fn saturate(v: i128) -> i64 {
    i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX })
}
