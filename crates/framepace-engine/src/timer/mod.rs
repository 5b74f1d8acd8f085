//! Per-call-site timing state.
//!
//! Everything the scheduler keeps for a single call site lives here: the mode
//! state machine, the 60 Hz step accumulator and the zero-step anomaly
//! counters, plus the process-wide startup guard.

pub mod accumulator;
pub mod anomaly;
pub mod callsite;
pub mod guard;
pub mod mode;

pub use accumulator::{FixedStepAccumulator, MAX_BACKLOG_FRAMES, MAX_STEPS, REFERENCE_FRAME_US};
pub use anomaly::{fallback_mode, AnomalyDetector, AnomalyThresholds};
pub use callsite::{CallsiteId, CallsiteMap, CallsiteToken};
pub use guard::StartupGuard;
pub use mode::{CallsiteState, ModeController, ModePolicy, TimerMode};
