//! Host capability seams.
//!
//! The host engine owns the simulation-speed cell and the demo-mode flag; the
//! hook layer owns the original timer routine and the call-site tokens. The
//! scheduler only sees them through these traits, never through raw memory.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::time::system_millis;
use crate::timer::{CallsiteId, CallsiteMap};

/// The integer cell the host reads every tick to learn how many 60 Hz steps to run.
pub trait SpeedCell {
    fn get(&self) -> u32;
    fn set(&self, steps: u32);
}

/// The host's demo-playback flag (read-only to the scheduler).
pub trait DemoFlag {
    fn is_demo(&self) -> bool;
}

/// The timing routine the hook replaced.
pub trait OriginalTimer {
    fn call(&mut self, site: CallsiteId, arg: i32) -> i32;
}

impl<F> OriginalTimer for F
where
    F: FnMut(CallsiteId, i32) -> i32,
{
    fn call(&mut self, site: CallsiteId, arg: i32) -> i32 {
        self(site, arg)
    }
}

/// The host's millisecond timer, the clock the original routine's return
/// value is expressed on.
pub trait MillisSource {
    fn millis(&self) -> i32;
}

impl<F> MillisSource for F
where
    F: Fn() -> i32,
{
    fn millis(&self) -> i32 {
        self()
    }
}

/// Shared speed cell. Clones refer to the same value.
#[derive(Debug, Clone, Default)]
pub struct AtomicSpeedCell(Arc<AtomicU32>);

impl AtomicSpeedCell {
    pub fn new(initial: u32) -> Self {
        Self(Arc::new(AtomicU32::new(initial)))
    }
}

impl SpeedCell for AtomicSpeedCell {
    fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, steps: u32) {
        self.0.store(steps, Ordering::Release);
    }
}

/// Shared demo flag. Clones refer to the same value.
#[derive(Debug, Clone, Default)]
pub struct AtomicDemoFlag(Arc<AtomicBool>);

impl AtomicDemoFlag {
    pub fn new(initial: bool) -> Self {
        Self(Arc::new(AtomicBool::new(initial)))
    }

    pub fn set(&self, demo: bool) {
        self.0.store(demo, Ordering::Release);
    }

    /// Flips the flag and returns the new value.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

impl DemoFlag for AtomicDemoFlag {
    fn is_demo(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Everything the hook layer hands over at setup.
///
/// A missing speed cell or demo flag turns the scheduler into a pure
/// passthrough; a missing original routine makes passthrough return 0.
#[derive(Default)]
pub struct HostBindings {
    pub speed: Option<Box<dyn SpeedCell>>,
    pub demo: Option<Box<dyn DemoFlag>>,
    pub original: Option<Box<dyn OriginalTimer>>,
    /// Timestamp source for paced frames; `system_millis` when unset.
    pub millis: Option<Box<dyn MillisSource>>,
    pub callsites: CallsiteMap,
    /// The host's arithmetic has been verified safe against a zero step count.
    pub zero_step_safety_ready: bool,
}

impl HostBindings {
    pub fn new(callsites: CallsiteMap) -> Self {
        Self {
            callsites,
            ..Self::default()
        }
    }

    pub fn with_speed_cell(mut self, cell: impl SpeedCell + 'static) -> Self {
        self.speed = Some(Box::new(cell));
        self
    }

    pub fn with_demo_flag(mut self, flag: impl DemoFlag + 'static) -> Self {
        self.demo = Some(Box::new(flag));
        self
    }

    pub fn with_original(mut self, original: impl OriginalTimer + 'static) -> Self {
        self.original = Some(Box::new(original));
        self
    }

    pub fn with_millis(mut self, millis: impl MillisSource + 'static) -> Self {
        self.millis = Some(Box::new(millis));
        self
    }

    pub fn with_zero_step_safety(mut self, ready: bool) -> Self {
        self.zero_step_safety_ready = ready;
        self
    }

    /// Both host cells are present.
    pub fn has_cells(&self) -> bool {
        self.speed.is_some() && self.demo.is_some()
    }

    pub(crate) fn call_original(&mut self, site: CallsiteId, arg: i32) -> i32 {
        self.original.as_mut().map_or(0, |original| original.call(site, arg))
    }

    pub(crate) fn now_millis(&self) -> i32 {
        self.millis.as_ref().map_or_else(system_millis, |millis| millis.millis())
    }
}

impl std::fmt::Debug for HostBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBindings")
            .field("speed", &self.speed.is_some())
            .field("demo", &self.demo.is_some())
            .field("original", &self.original.is_some())
            .field("millis", &self.millis.is_some())
            .field("callsites", &self.callsites)
            .field("zero_step_safety_ready", &self.zero_step_safety_ready)
            .finish()
    }
}
