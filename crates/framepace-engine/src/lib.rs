//! Framepace engine crate.
//!
//! Adaptive frame pacing for hosts whose simulation is locked to a fixed
//! 60 Hz step. The scheduler replaces the host's per-frame timer routine,
//! tells the host how many 60 Hz steps to run in its speed cell, and paces
//! presentation to the display's refresh rate.

pub mod config;
pub mod display;
pub mod host;
pub mod time;
pub mod timer;

pub mod logging;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{load_config, ConfigError, TimingConfig};
pub use display::{DisplayProbe, FixedDisplay, RefreshRate, WindowSlot, WinitDisplayProbe};
pub use host::{AtomicDemoFlag, AtomicSpeedCell, DemoFlag, HostBindings, MillisSource, OriginalTimer, SpeedCell};
pub use scheduler::{Outcome, Passthrough, Scheduler, TickReport};
pub use timer::{CallsiteId, CallsiteMap, CallsiteToken, TimerMode};
