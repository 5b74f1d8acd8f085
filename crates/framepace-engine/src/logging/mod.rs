//! Logging utilities.
//!
//! Logger initialization plus the log targets and the diagnostics gate used
//! by the scheduler. Everything goes through the `log` facade; `env_logger`
//! is only wired up by `init_logging`.

mod init;

pub use init::{init_logging, LoggingConfig};

/// Log target for scheduler and mode-transition lines.
pub const FRAME_TIMER: &str = "FrameTimer";

/// Log target for configuration loading.
pub const CONFIG: &str = "Config";

/// Log target for display refresh-rate probing.
pub const DISPLAY: &str = "Display";

/// Gate for per-tick diagnostic lines.
///
/// Only decides whether a `debug!` line is emitted; scheduler control flow
/// never reads it.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Emits a `FrameTimer` debug line when diagnostics are on.
    #[inline]
    pub fn emit(self, args: std::fmt::Arguments<'_>) {
        if self.enabled {
            log::debug!(target: FRAME_TIMER, "{args}");
        }
    }
}
