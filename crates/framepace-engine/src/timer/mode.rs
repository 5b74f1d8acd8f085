use std::fmt;
use std::ops::{Index, IndexMut};

use crate::logging::{Diagnostics, FRAME_TIMER};

use super::accumulator::{FixedStepAccumulator, REFERENCE_FRAME_US};
use super::anomaly::AnomalyDetector;
use super::callsite::CallsiteId;

/// How a call site is timed.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TimerMode {
    /// Defer to the original routine.
    #[default]
    LegacyPassthrough,
    /// Custom pacing, at least one simulation step per frame.
    CustomSafe60,
    /// Custom pacing that may request zero steps (above 60 Hz).
    CustomZeroStep,
}

impl TimerMode {
    pub fn name(self) -> &'static str {
        match self {
            TimerMode::LegacyPassthrough => "LegacyPassthrough",
            TimerMode::CustomSafe60 => "CustomSafe60",
            TimerMode::CustomZeroStep => "CustomZeroStep",
        }
    }}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timing state of one call site.
#[derive(Debug, Clone, Default)]
pub struct CallsiteState {
    pub(crate) mode: TimerMode,
    pub(crate) last_time: Option<i64>,
    pub(crate) next_deadline: Option<i64>,
    pub(crate) accumulator: FixedStepAccumulator,
    pub(crate) anomaly: AnomalyDetector,
    pub(crate) switch_count: u32,
}

impl CallsiteState {
    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    /// Clock reading at the end of the last paced frame.
    pub fn last_time(&self) -> Option<i64> {
        self.last_time
    }

    /// Deadline the last paced frame was aimed at.
    pub fn next_deadline(&self) -> Option<i64> {
        self.next_deadline
    }

    pub fn accumulator(&self) -> &FixedStepAccumulator {
        &self.accumulator
    }

    pub fn anomaly(&self) -> &AnomalyDetector {
        &self.anomaly
    }

    /// Mode transitions since initialization.
    pub fn switch_count(&self) -> u32 {
        self.switch_count
    }

    /// Drops timing history; mode and switch count are kept.
    pub fn reset_timing(&mut self) {
        self.last_time = None;
        self.next_deadline = None;
        self.accumulator.reset();
        self.anomaly.clear();
    }
}

/// Inputs that decide a call site's starting mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ModePolicy {
    pub zero_step_safety_ready: bool,
    pub target_frame_us: i64,
    pub frontend_custom_timing: bool,
    pub frontend_zero_step: bool,
}

impl ModePolicy {
    /// Gameplay never starts in legacy mode.
    pub fn preferred_gameplay_mode(&self) -> TimerMode {
        if self.zero_step_safety_ready && self.target_frame_us < REFERENCE_FRAME_US {
            TimerMode::CustomZeroStep
        } else {
            TimerMode::CustomSafe60
        }
    }

    /// Frontend/Menu mode when custom timing is allowed for them.
    pub fn frontend_mode(&self) -> TimerMode {
        if self.frontend_zero_step && self.zero_step_safety_ready {
            TimerMode::CustomZeroStep
        } else {
            TimerMode::CustomSafe60
        }
    }
}

/// Mode state machine for every call site.
///
/// `set_mode` is the only way a mode changes.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    states: [CallsiteState; CallsiteId::COUNT],
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `site` to `mode`, resetting its timing state and logging the
    /// transition. Returns false, touching nothing, if `site` is already there.
    pub fn set_mode(&mut self, site: CallsiteId, mode: TimerMode, reason: &str) -> bool {
        let state = &mut self[site];
        if state.mode == mode {
            return false;
        }

        let old = state.mode;
        state.mode = mode;
        state.switch_count = state.switch_count.saturating_add(1);
        state.reset_timing();

        log::info!(target: FRAME_TIMER, "{site} {old} -> {mode} ({reason})");
        true
    }

    pub fn reset_all_timing(&mut self) {
        for state in &mut self.states {
            state.reset_timing();
        }
    }

    /// Puts every site back to legacy and applies the starting modes.
    pub fn initialize(&mut self, policy: &ModePolicy, diagnostics: Diagnostics) {
        for state in &mut self.states {
            *state = CallsiteState::default();
        }

        self.set_mode(CallsiteId::Gameplay, policy.preferred_gameplay_mode(), "initial setup");

        if policy.frontend_custom_timing {
            let mode = policy.frontend_mode();
            self.set_mode(CallsiteId::Frontend, mode, "initial setup");
            self.set_mode(CallsiteId::Menu, mode, "initial setup");
        } else {
            diagnostics.emit(format_args!("Frontend/Menu frame timer running in legacy mode."));
        }
    }
}

impl Index<CallsiteId> for ModeController {
    type Output = CallsiteState;

    fn index(&self, site: CallsiteId) -> &CallsiteState {
        &self.states[site.index()]
    }
}

impl IndexMut<CallsiteId> for ModeController {
    fn index_mut(&mut self, site: CallsiteId) -> &mut CallsiteState {
        &mut self.states[site.index()]
    }
}
