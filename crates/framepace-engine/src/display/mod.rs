//! Display refresh-rate resolution.
//!
//! Probing the desktop or the process window belongs to the platform layer
//! (`DisplayProbe`); this module turns whatever rate comes back into the
//! nominal frame duration the scheduler paces against.

mod winit;

pub use self::winit::{WindowSlot, WinitDisplayProbe};

use crate::config::TimingConfig;
use crate::time::MICROS_PER_SECOND;

pub const MIN_REFRESH_HZ: u32 = 30;
pub const MAX_REFRESH_HZ: u32 = 1000;
pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// Source of display refresh rates.
pub trait DisplayProbe {
    /// Desktop (primary display) rate; 60 when unknown.
    fn desktop_refresh_rate(&self) -> u32;

    /// Rate of the monitor showing the host's window; 0 while unknown.
    fn process_window_refresh_rate(&self) -> u32;
}

/// Constant rates, for headless hosts and tests.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FixedDisplay {
    pub desktop_hz: u32,
    pub window_hz: u32,
}

impl FixedDisplay {
    pub fn new(desktop_hz: u32, window_hz: u32) -> Self {
        Self { desktop_hz, window_hz }
    }
}

impl Default for FixedDisplay {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_HZ, 0)
    }
}

impl DisplayProbe for FixedDisplay {
    fn desktop_refresh_rate(&self) -> u32 {
        self.desktop_hz
    }

    fn process_window_refresh_rate(&self) -> u32 {
        self.window_hz
    }
}

/// An accepted presentation rate and its frame duration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RefreshRate {
    hz: u32,
    frame_time_us: i64,
}

impl RefreshRate {
    /// Rates outside [30, 1000] Hz resolve to 60 Hz.
    pub fn resolve(rate: u32) -> Self {
        let hz = if (MIN_REFRESH_HZ..=MAX_REFRESH_HZ).contains(&rate) { rate } else { DEFAULT_REFRESH_HZ };
        let hz_i = i64::from(hz);
        Self {
            hz,
            frame_time_us: (MICROS_PER_SECOND + hz_i / 2) / hz_i,
        }
    }

    pub fn hz(&self) -> u32 {
        self.hz
    }

    pub fn frame_time_us(&self) -> i64 {
        self.frame_time_us
    }
}

impl Default for RefreshRate {
    fn default() -> Self {
        Self::resolve(DEFAULT_REFRESH_HZ)
    }
}

/// Starting rate for a configuration, plus whether a process-window probe
/// should be retried once the host window exists.
///
/// The explicit override only applies together with `native_refresh`.
pub fn initial_refresh_rate(config: &TimingConfig, probe: &dyn DisplayProbe) -> (u32, bool) {
    if !config.native_refresh {
        return (DEFAULT_REFRESH_HZ, false);
    }

    if config.target_refresh_rate > 0 {
        (config.target_refresh_rate, false)
    } else {
        (probe.desktop_refresh_rate(), true)
    }
}
