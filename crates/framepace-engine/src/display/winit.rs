use std::cell::OnceCell;
use std::rc::Rc;
use std::sync::Arc;

use winit::monitor::MonitorHandle;
use winit::window::Window;

use super::{DisplayProbe, DEFAULT_REFRESH_HZ};
use crate::logging::DISPLAY;

/// Slot the host fills with its render window once it has been created.
///
/// Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct WindowSlot(Rc<OnceCell<Arc<Window>>>);

impl WindowSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the host window. Later calls are ignored.
    pub fn publish(&self, window: Arc<Window>) {
        if self.0.set(window).is_err() {
            log::debug!(target: DISPLAY, "window slot already filled; ignoring");
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.0.get()
    }
}

/// `DisplayProbe` backed by winit monitor handles.
///
/// The desktop rate comes from the primary monitor captured when the probe is
/// built (from an `ActiveEventLoop`); the window rate from whichever monitor
/// currently shows the published window.
#[derive(Debug, Clone)]
pub struct WinitDisplayProbe {
    primary: Option<MonitorHandle>,
    window: WindowSlot,
}

impl WinitDisplayProbe {
    pub fn new(primary: Option<MonitorHandle>, window: WindowSlot) -> Self {
        Self { primary, window }
    }}

impl DisplayProbe for WinitDisplayProbe {
    fn desktop_refresh_rate(&self) -> u32 {
        self.primary
            .as_ref()
            .and_then(monitor_hz)
            .unwrap_or(DEFAULT_REFRESH_HZ)
    }

    fn process_window_refresh_rate(&self) -> u32 {
        self.window
            .window()
            .and_then(|w| w.current_monitor())
            .as_ref()
            .and_then(monitor_hz)
            .unwrap_or(0)
    }
}

fn monitor_hz(monitor: &MonitorHandle) -> Option<u32> {
    let hz = millihertz_to_hz(monitor.refresh_rate_millihertz()?)?;
    log::debug!(
        target: DISPLAY,
        "monitor {:?} reports {hz} Hz",
        monitor.name().unwrap_or_default()
    );
    Some(hz)
}

/// Rounds millihertz to whole hertz; 0 or 1 Hz readings count as unavailable.
fn millihertz_to_hz(mhz: u32) -> Option<u32> {
    let hz = mhz.saturating_add(500) / 1000;
    (hz > 1).then_some(hz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millihertz_rounding() {
        assert_eq!(millihertz_to_hz(59_940), Some(60));
        assert_eq!(millihertz_to_hz(143_856), Some(144));
        assert_eq!(millihertz_to_hz(74_499), Some(74));
    }

    #[test]
    fn degenerate_readings_are_unavailable() {
        assert_eq!(millihertz_to_hz(0), None);
        assert_eq!(millihertz_to_hz(1_000), None);
        assert_eq!(millihertz_to_hz(1_499), None);
    }

    #[test]
    fn empty_slot_has_no_window() {
        let slot = WindowSlot::new();
        assert!(slot.window().is_none());

        let probe = WinitDisplayProbe::new(None, slot);
        assert_eq!(probe.desktop_refresh_rate(), 60);
        assert_eq!(probe.process_window_refresh_rate(), 0);
    }
}
