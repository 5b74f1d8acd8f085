use super::clock::{ClockSource, TickSource, MICROS_PER_SECOND};

/// Frames of lag tolerated before the deadline is resynchronized to "now".
pub const MAX_LAG_FRAMES: i64 = 4;

/// Blocking primitives used by the pacing loop, coarsest to finest.
pub trait ThreadWait {
    /// Called once before a wait loop starts.
    fn begin(&mut self) {}

    /// Called once after a wait loop finishes.
    fn end(&mut self) {}

    /// Sleep for at least `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u32);

    /// Give up the rest of the current time slice.
    fn yield_slice(&mut self);

    /// Let another ready thread run, if there is one.
    fn switch_thread(&mut self);

    /// One iteration of a busy-wait.
    fn spin(&mut self);
}

/// Operating-system wait primitives.
///
/// On Windows the system timer resolution is raised to its minimum period for
/// the duration of each wait loop.
#[derive(Debug)]
pub struct OsWait {
    timer_period_ms: u32,
}

impl OsWait {
    pub fn new() -> Self {
        Self {
            timer_period_ms: os::min_timer_period_ms(),
        }
    }
}

impl Default for OsWait {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadWait for OsWait {
    fn begin(&mut self) {
        os::begin_period(self.timer_period_ms);
    }

    fn end(&mut self) {
        os::end_period(self.timer_period_ms);
    }

    fn sleep_ms(&mut self, ms: u32) {
        os::sleep_ms(ms);
    }

    fn yield_slice(&mut self) {
        os::sleep_ms(0);
    }

    fn switch_thread(&mut self) {
        os::switch_thread();
    }

    fn spin(&mut self) {
        std::hint::spin_loop();
    }
}

#[cfg(windows)]
mod os {
    use windows_sys::Win32::Media::{timeBeginPeriod, timeEndPeriod, timeGetDevCaps, TIMECAPS, TIMERR_NOERROR};
    use windows_sys::Win32::System::Threading::{Sleep, SwitchToThread};

    pub(super) fn min_timer_period_ms() -> u32 {
        let mut caps = TIMECAPS { wPeriodMin: 0, wPeriodMax: 0 };
        // SAFETY: `caps` is a valid, writable TIMECAPS and the size matches it.
        let status = unsafe { timeGetDevCaps(&mut caps, std::mem::size_of::<TIMECAPS>() as u32) };
        if status != TIMERR_NOERROR || caps.wPeriodMin == 0 {
            1
        } else {
            caps.wPeriodMin
        }
    }

    pub(super) fn begin_period(ms: u32) {
        // SAFETY: plain Win32 call with a value obtained from timeGetDevCaps.
        unsafe {
            timeBeginPeriod(ms);
        }
    }

    pub(super) fn end_period(ms: u32) {
        // SAFETY: paired with `begin_period` using the same period.
        unsafe {
            timeEndPeriod(ms);
        }
    }

    pub(super) fn sleep_ms(ms: u32) {
        // SAFETY: plain Win32 call.
        unsafe { Sleep(ms) }
    }

    pub(super) fn switch_thread() {
        // SAFETY: plain Win32 call; the return value only says whether a switch happened.
        unsafe {
            SwitchToThread();
        }
    }
}

#[cfg(not(windows))]
mod os {
    use std::time::Duration;

    pub(super) fn min_timer_period_ms() -> u32 {
        1
    }

    pub(super) fn begin_period(_ms: u32) {}

    pub(super) fn end_period(_ms: u32) {}

    pub(super) fn sleep_ms(ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }

    pub(super) fn switch_thread() {
        std::thread::yield_now();
    }
}

/// Remaining-time thresholds (µs) that pick the wait strategy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PacingMargins {
    pub sleep_us: i64,
    pub yield_us: i64,
    pub spin_us: i64,
}

impl PacingMargins {
    /// Margins for a pacing frame duration.
    ///
    /// Rates above 100 Hz (frames of 10 ms or less) get proportionally wider
    /// margins: OS sleep granularity is a larger fraction of a short frame.
    pub fn for_frame(pacing_frame_us: i64) -> Self {
        if pacing_frame_us <= 10_000 {
            Self {
                sleep_us: (pacing_frame_us / 2).max(3_500),
                yield_us: (pacing_frame_us / 6).max(1_200),
                spin_us: 300,
            }
        } else {
            Self {
                sleep_us: (pacing_frame_us / 5).max(2_000),
                yield_us: (pacing_frame_us / 10).max(800),
                spin_us: 150,
            }
        }
    }
}

/// Next absolute pacing deadline.
///
/// Normally `previous + frame`. When `now` is already more than
/// `MAX_LAG_FRAMES` frames past that, the deadline is resynchronized to
/// `now + frame` instead of catching up. Returns the deadline and whether a
/// resync happened.
pub fn pacing_deadline(previous: i64, frame_ticks: i64, now: i64) -> (i64, bool) {
    let frame_ticks = frame_ticks.max(1);
    let target = previous.saturating_add(frame_ticks);
    let max_lag = frame_ticks.saturating_mul(MAX_LAG_FRAMES);
    if now > target.saturating_add(max_lag) {
        (now.saturating_add(frame_ticks), true)
    } else {
        (target, false)
    }
}

/// Layered sleep/yield/spin wait loop.
#[derive(Debug)]
pub struct PacingWaiter<W: ThreadWait = OsWait> {
    wait: W,
    last_sleep_ms: u32,
}

impl<W: ThreadWait> PacingWaiter<W> {
    pub fn new(wait: W) -> Self {
        Self { wait, last_sleep_ms: 0 }
    }

    /// Duration of the most recent coarse sleep, 0 if the last wait never slept.
    pub fn last_sleep_ms(&self) -> u32 {
        self.last_sleep_ms
    }

    pub fn wait_primitives(&self) -> &W {
        &self.wait
    }

    /// Blocks until the clock reaches `deadline` and returns the clock reading
    /// taken right after the loop exits.
    pub fn wait_until<T: TickSource>(
        &mut self,
        clock: &ClockSource<T>,
        deadline: i64,
        margins: PacingMargins,
    ) -> i64 {
        self.last_sleep_ms = 0;
        self.wait.begin();

        loop {
            let remaining_ticks = deadline.saturating_sub(clock.now());
            let remaining_us = clock.ticks_to_us(remaining_ticks);
            if remaining_us <= 0 {
                break;
            }

            if remaining_us > margins.sleep_us {
                let candidate_ms = (remaining_us - margins.sleep_us) / (MICROS_PER_SECOND / 1000);
                if candidate_ms > 0 {
                    let ms = u32::try_from(candidate_ms).unwrap_or(u32::MAX);
                    self.last_sleep_ms = ms;
                    self.wait.sleep_ms(ms);
                    continue;
                }
            }

            if remaining_us > margins.yield_us {
                self.wait.yield_slice();
            } else if remaining_us > margins.spin_us {
                self.wait.switch_thread();
            } else {
                self.wait.spin();
            }
        }

        let boundary = clock.now();
        self.wait.end();
        boundary
    }
}

impl Default for PacingWaiter<OsWait> {
    fn default() -> Self {
        Self::new(OsWait::new())
    }
}
