//! Fixed 60 Hz step accumulator.
//!
//! Converts elapsed wall-clock time into a bounded number of 60 Hz
//! simulation steps per presented frame. The host engine reads the step
//! count from its speed cell and runs that many fixed updates.

/// Duration of one 60 Hz simulation step, in microseconds.
pub const REFERENCE_FRAME_US: i64 = 16_667;

/// Upper bound on steps requested in a single frame.
pub const MAX_STEPS: u32 = 3;

/// Accumulated backlog cap, in reference frames.
pub const MAX_BACKLOG_FRAMES: i64 = 16;

const MIN_DEMO_STEPS: u32 = 2;

/// Running microsecond balance of unconsumed simulation time.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FixedStepAccumulator {
    balance_us: i64,
}

impl FixedStepAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_us(&self) -> i64 {
        self.balance_us
    }

    pub fn reset(&mut self) {
        self.balance_us = 0;
    }

    /// Step count for demo playback.
    ///
    /// Demo content is authored for a 30 Hz ceiling, so the result is always
    /// 2 or 3 and the balance is discarded.
    pub fn demo_steps(&mut self, elapsed_us: i64) -> u32 {
        self.balance_us = 0;
        let frames = elapsed_us.max(0) / REFERENCE_FRAME_US + 1;
        (frames.min(i64::from(MAX_STEPS)) as u32).max(MIN_DEMO_STEPS)
    }

    /// Adds `elapsed_us` and commits up to `MAX_STEPS` whole steps.
    ///
    /// With `allow_zero` false the result is at least 1; the forced step is
    /// debited from the balance, which never goes below zero.
    pub fn advance(&mut self, elapsed_us: i64, allow_zero: bool) -> u32 {
        let max_backlog = REFERENCE_FRAME_US * MAX_BACKLOG_FRAMES;
        self.balance_us = self.balance_us.saturating_add(elapsed_us.max(0)).min(max_backlog);

        let desired = (self.balance_us / REFERENCE_FRAME_US).clamp(0, i64::from(MAX_STEPS));
        self.balance_us -= desired * REFERENCE_FRAME_US;

        let floor = if allow_zero { 0 } else { 1 };
        let steps = desired.max(floor);
        if steps > desired {
            self.balance_us = (self.balance_us - (steps - desired) * REFERENCE_FRAME_US).max(0);
        }

        steps as u32
    }
}

/// Treats an elapsed time close to the target frame duration as exactly on target.
///
/// The tolerance is `max(800 µs, frame / 3)`.
pub fn snap_jitter(elapsed_us: i64, frame_us: i64) -> i64 {
    let tolerance = (frame_us / 3).max(800);
    if (elapsed_us - frame_us).abs() <= tolerance {
        frame_us
    } else {
        elapsed_us
    }
}
