//! Scheduler entry point.
//!
//! The hook layer calls [`Scheduler::invoke`] in place of the original timer
//! routine, once per frame per call site. Each call either defers to the
//! original routine or runs one paced frame: accumulate 60 Hz steps, publish
//! the step count to the host, check for zero-step anomalies and block until
//! the next pacing deadline.

use crate::config::TimingConfig;
use crate::display::{initial_refresh_rate, DisplayProbe, RefreshRate};
use crate::host::HostBindings;
use crate::logging::{Diagnostics, FRAME_TIMER};
use crate::time::{pacing_deadline, ClockSource, InstantTicks, OsWait, PacingMargins, PacingWaiter, ThreadWait, TickSource};
use crate::timer::accumulator::snap_jitter;
use crate::timer::{
    fallback_mode, AnomalyThresholds, CallsiteId, CallsiteState, CallsiteToken, ModeController, ModePolicy, StartupGuard,
    TimerMode, REFERENCE_FRAME_US,
};

/// Why an invocation deferred to the original routine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Passthrough {
    /// Frame pacing is switched off in the configuration.
    Disabled,
    /// The tick counter reported an unusable frequency.
    ClockDegenerate,
    /// The speed cell or the demo flag was not supplied.
    MissingCapability,
    /// The call origin is not a known call site.
    UnknownCallsite,
    /// Still inside the startup guard window.
    StartupGuardActive,
    /// The call site is in `LegacyPassthrough` mode.
    LegacyMode,
}

/// What a paced frame did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TickReport {
    pub site: CallsiteId,
    /// Mode the frame ran under.
    pub mode: TimerMode,
    /// Step count written to the speed cell.
    pub steps: u32,
    pub elapsed_us: i64,
    pub demo: bool,
    /// Deadline the frame waited for, in clock ticks.
    pub deadline: i64,
    /// The deadline was resynchronized instead of advanced.
    pub resynced: bool,
    /// Set when this frame triggered an anomaly downgrade.
    pub downgraded: Option<TimerMode>,
    /// Host millisecond timer read after the wait.
    pub timestamp_ms: i32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    Passthrough { reason: Passthrough, result: i32 },
    Paced(TickReport),
}

impl Outcome {
    /// Value handed back to the caller of the replaced routine.
    pub fn result(&self) -> i32 {
        match self {
            Outcome::Passthrough { result, .. } => *result,
            Outcome::Paced(report) => report.timestamp_ms,
        }
    }

    pub fn report(&self) -> Option<&TickReport> {
        match self {
            Outcome::Paced(report) => Some(report),
            Outcome::Passthrough { .. } => None,
        }
    }

    pub fn passthrough(&self) -> Option<Passthrough> {
        match self {
            Outcome::Passthrough { reason, .. } => Some(*reason),
            Outcome::Paced(_) => None,
        }
    }
}

/// Adaptive frame-pacing scheduler.
///
/// Owns the per-call-site states and runs entirely on the calling thread.
pub struct Scheduler<T: TickSource = InstantTicks, W: ThreadWait = OsWait> {
    config: TimingConfig,
    host: HostBindings,
    display: Box<dyn DisplayProbe>,
    clock: ClockSource<T>,
    waiter: PacingWaiter<W>,
    modes: ModeController,
    refresh: RefreshRate,
    guard: StartupGuard,
    probe_pending: bool,
    diagnostics: Diagnostics,
}

impl Scheduler {
    pub fn new(config: TimingConfig, host: HostBindings, display: impl DisplayProbe + 'static) -> Self {
        Self::with_clock(config, host, Box::new(display), ClockSource::monotonic(), OsWait::new())
    }
}

impl<T: TickSource, W: ThreadWait> Scheduler<T, W> {
    pub fn with_clock(
        config: TimingConfig,
        host: HostBindings,
        display: Box<dyn DisplayProbe>,
        clock: ClockSource<T>,
        wait: W,
    ) -> Self {
        let config = config.normalized().with_capability(host.zero_step_safety_ready);
        let guard = StartupGuard::new(clock.now_us(), config.startup_guard_ms);
        let (rate, probe_pending) = initial_refresh_rate(&config, display.as_ref());

        let mut scheduler = Self {
            diagnostics: Diagnostics::new(config.diagnostics),
            refresh: RefreshRate::resolve(rate),
            probe_pending,
            guard,
            modes: ModeController::new(),
            waiter: PacingWaiter::new(wait),
            clock,
            config,
            host,
            display,
        };

        let map = &scheduler.host.callsites;
        log::info!(
            target: FRAME_TIMER,
            "Callsites gameplay={:?} frontend={:?} menu={:?}",
            map.token(CallsiteId::Gameplay),
            map.token(CallsiteId::Frontend),
            map.token(CallsiteId::Menu)
        );
        log::info!(
            target: FRAME_TIMER,
            "refresh rate {} Hz ({} us per frame), zero-step safety {}",
            scheduler.refresh.hz(),
            scheduler.refresh.frame_time_us(),
            if scheduler.host.zero_step_safety_ready { "ready" } else { "unavailable" }
        );
        if scheduler.clock.is_degenerate() {
            log::warn!(target: FRAME_TIMER, "unusable tick counter; legacy game timing will be used");
        }
        if !scheduler.host.has_cells() {
            log::warn!(target: FRAME_TIMER, "speed cell or demo flag missing; legacy game timing will be used");
        }

        scheduler.initialize_modes();
        scheduler
    }

    fn policy(&self) -> ModePolicy {
        ModePolicy {
            zero_step_safety_ready: self.host.zero_step_safety_ready,
            target_frame_us: self.refresh.frame_time_us(),
            frontend_custom_timing: self.config.frontend_custom_timing,
            frontend_zero_step: self.config.frontend_zero_step,
        }
    }

    /// Resets every call site to its starting mode.
    pub fn initialize_modes(&mut self) {
        let policy = self.policy();
        self.modes.initialize(&policy, self.diagnostics);
    }

    /// Switches the presentation rate.
    ///
    /// Every call site loses its timing history, and the gameplay site (when
    /// resolved) is moved to the mode preferred at the new rate.
    pub fn apply_refresh_rate(&mut self, rate: u32) -> RefreshRate {
        self.refresh = RefreshRate::resolve(rate);
        self.modes.reset_all_timing();
        log::info!(
            target: FRAME_TIMER,
            "refresh rate {} Hz ({} us per frame)",
            self.refresh.hz(),
            self.refresh.frame_time_us()
        );

        if self.host.callsites.is_resolved(CallsiteId::Gameplay) {
            let mode = self.policy().preferred_gameplay_mode();
            self.modes.set_mode(CallsiteId::Gameplay, mode, "refresh update");
        }

        self.refresh
    }

    /// Re-reads the desktop rate from the display probe and applies it.
    pub fn apply_desktop_refresh_rate(&mut self) -> RefreshRate {
        let rate = self.display.desktop_refresh_rate();
        self.apply_refresh_rate(rate)
    }

    /// Replacement for the original timer routine.
    pub fn invoke(&mut self, token: CallsiteToken, arg: i32) -> i32 {
        self.tick(token, arg).result()
    }

    /// Like [`invoke`](Self::invoke), but reports what happened.
    pub fn tick(&mut self, token: CallsiteToken, arg: i32) -> Outcome {
        let site = self.host.callsites.resolve(token);

        if !self.config.enabled {
            return self.pass(site, arg, Passthrough::Disabled);
        }
        if self.clock.is_degenerate() {
            return self.pass(site, arg, Passthrough::ClockDegenerate);
        }
        if !self.host.has_cells() {
            return self.pass(site, arg, Passthrough::MissingCapability);
        }

        self.retry_refresh_probe();

        if site == CallsiteId::Unknown {
            return self.pass(site, arg, Passthrough::UnknownCallsite);
        }
        if self.guard.is_active(self.clock.now_us()) {
            return self.pass(site, arg, Passthrough::StartupGuardActive);
        }

        let mode = self.modes[site].mode();
        if mode == TimerMode::LegacyPassthrough {
            return self.pass(site, arg, Passthrough::LegacyMode);
        }

        let allow_zero = mode == TimerMode::CustomZeroStep
            && self.host.zero_step_safety_ready
            && self.refresh.frame_time_us() < REFERENCE_FRAME_US;

        self.diagnostics.emit(format_args!("{site} mode={mode} a1={arg}"));
        Outcome::Paced(self.run_custom(site, mode, allow_zero))
    }

    fn pass(&mut self, site: CallsiteId, arg: i32, reason: Passthrough) -> Outcome {
        let result = self.host.call_original(site, arg);
        Outcome::Passthrough { reason, result }
    }

    fn retry_refresh_probe(&mut self) {
        if !self.probe_pending {
            return;
        }

        let rate = self.display.process_window_refresh_rate();
        if rate > 0 {
            self.probe_pending = false;
            self.apply_refresh_rate(rate);
        }
    }

    fn run_custom(&mut self, site: CallsiteId, mode: TimerMode, allow_zero: bool) -> TickReport {
        let frame_us = self.refresh.frame_time_us().max(1);
        let demo = self.host.demo.as_ref().is_some_and(|flag| flag.is_demo());

        // Demo playback paces at 30 Hz or slower; without zero-step
        // simulation the pacing stays at 60 Hz.
        let base_us = if demo || (!allow_zero && frame_us < REFERENCE_FRAME_US) {
            REFERENCE_FRAME_US
        } else {
            frame_us
        };

        let now = self.clock.now();
        let state = &mut self.modes[site];
        let last = *state.last_time.get_or_insert(now);
        let previous_deadline = *state.next_deadline.get_or_insert(last);
        let elapsed_us = self.clock.elapsed_us(last, now).max(0);

        let steps = if demo {
            state.anomaly.clear();
            state.accumulator.demo_steps(elapsed_us)
        } else {
            let delta = if self.config.jitter_snap && allow_zero && frame_us < REFERENCE_FRAME_US {
                snap_jitter(elapsed_us, frame_us)
            } else {
                elapsed_us
            };
            state.accumulator.advance(delta, allow_zero)
        };

        if let Some(speed) = &self.host.speed {
            speed.set(steps);
        }

        let downgraded = if demo { None } else { self.observe_anomaly(site, mode, steps, frame_us) };

        let factor = if demo { steps.max(2) } else { 1 };
        let pacing_us = base_us * i64::from(factor);
        let frame_ticks = self.clock.us_to_ticks(pacing_us).max(1);

        // A downgrade dropped the site's deadline along with the rest of its history.
        let (deadline, resynced) = match downgraded {
            Some(_) => (now.saturating_add(frame_ticks), true),
            None => pacing_deadline(previous_deadline, frame_ticks, now),
        };

        let boundary = self.waiter.wait_until(&self.clock, deadline, PacingMargins::for_frame(pacing_us));

        let state = &mut self.modes[site];
        state.last_time = Some(boundary);
        state.next_deadline = Some(deadline);

        self.diagnostics.emit(format_args!(
            "{site} steps={steps} elapsed={elapsed_us}us pacing={pacing_us}us sleep={}ms{}",
            self.waiter.last_sleep_ms(),
            if resynced { " resync" } else { "" }
        ));

        TickReport {
            site,
            mode,
            steps,
            elapsed_us,
            demo,
            deadline,
            resynced,
            downgraded,
            timestamp_ms: self.host.now_millis(),
        }
    }

    fn anomaly_thresholds(&self, site: CallsiteId) -> Option<AnomalyThresholds> {
        if !self.config.auto_fallback_60 {
            return None;
        }

        if site != CallsiteId::Gameplay && self.guard.is_settling(self.clock.now_us()) {
            Some(AnomalyThresholds::SETTLING)
        } else {
            Some(AnomalyThresholds::NORMAL)
        }
    }

    fn observe_anomaly(&mut self, site: CallsiteId, mode: TimerMode, steps: u32, frame_us: i64) -> Option<TimerMode> {
        if mode != TimerMode::CustomZeroStep {
            self.modes[site].anomaly.clear();
            return None;
        }

        let thresholds = self.anomaly_thresholds(site);
        if !self.modes[site].anomaly.observe(steps, thresholds, frame_us) {
            return None;
        }

        let target = fallback_mode(site);
        self.modes.set_mode(site, target, "anomaly detected");
        Some(target)
    }

    pub fn state(&self, site: CallsiteId) -> &CallsiteState {
        &self.modes[site]
    }

    pub fn mode(&self, site: CallsiteId) -> TimerMode {
        self.modes[site].mode()
    }

    pub fn refresh_rate(&self) -> RefreshRate {
        self.refresh
    }

    pub fn target_frame_time_us(&self) -> i64 {
        self.refresh.frame_time_us()
    }

    /// A process-window probe is still waiting for the host window.
    pub fn is_probe_pending(&self) -> bool {
        self.probe_pending
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }
}
