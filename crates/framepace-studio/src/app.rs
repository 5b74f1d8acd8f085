use std::sync::Arc;
use std::time::{Duration, Instant};

use framepace_engine::{
    AtomicDemoFlag, AtomicSpeedCell, CallsiteId, CallsiteMap, CallsiteToken, HostBindings, Outcome, Scheduler,
    SpeedCell, TimingConfig, WindowSlot, WinitDisplayProbe,
};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::cadence::FixedCadence;

const GAMEPLAY_TOKEN: CallsiteToken = CallsiteToken(1);
const TITLE: &str = "framepace studio";
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Per-interval frame and step counts.
struct FrameStats {
    since: Instant,
    frames: u32,
    steps: u64,
    passthrough: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            since: Instant::now(),
            frames: 0,
            steps: 0,
            passthrough: 0,
        }
    }
}

pub struct StudioApp {
    config: TimingConfig,
    window: Option<Arc<Window>>,
    scheduler: Option<Scheduler>,
    speed: AtomicSpeedCell,
    demo: AtomicDemoFlag,

    /// Total 60 Hz simulation steps run so far.
    sim_steps: u64,
    stats: FrameStats,
    exit_requested: bool,
}

impl StudioApp {
    pub fn new(config: TimingConfig) -> Self {
        Self {
            config,
            window: None,
            scheduler: None,
            speed: AtomicSpeedCell::new(1),
            demo: AtomicDemoFlag::default(),
            sim_steps: 0,
            stats: FrameStats::new(),
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn build_scheduler(&self, event_loop: &ActiveEventLoop, window: &Arc<Window>) -> Scheduler {
        let slot = WindowSlot::new();
        slot.publish(window.clone());
        let probe = WinitDisplayProbe::new(event_loop.primary_monitor(), slot);

        let host = HostBindings::new(CallsiteMap::new().with_gameplay(GAMEPLAY_TOKEN))
            .with_speed_cell(self.speed.clone())
            .with_demo_flag(self.demo.clone())
            .with_original(FixedCadence::new(60, self.speed.clone()))
            .with_zero_step_safety(true);

        Scheduler::new(self.config.clone(), host, probe)
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => self.request_exit(event_loop),
            PhysicalKey::Code(KeyCode::KeyD) => {
                let demo = self.demo.toggle();
                log::info!("demo playback {}", if demo { "on" } else { "off" });
            }
            PhysicalKey::Code(KeyCode::KeyR) => {
                if let Some(scheduler) = self.scheduler.as_mut() {
                    scheduler.apply_desktop_refresh_rate();
                }
            }
            _ => {}
        }
    }

    fn frame(&mut self) {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return;
        };

        let outcome = scheduler.tick(GAMEPLAY_TOKEN, 1);
        if let Outcome::Passthrough { .. } = outcome {
            self.stats.passthrough += 1;
        }

        let steps = self.speed.get();
        self.sim_steps += u64::from(steps);
        self.stats.frames += 1;
        self.stats.steps += u64::from(steps);

        let interval = self.stats.since.elapsed();
        if interval < REPORT_INTERVAL {
            return;
        }

        let secs = interval.as_secs_f64();
        let fps = f64::from(self.stats.frames) / secs;
        let steps_per_sec = self.stats.steps as f64 / secs;
        let mode = scheduler.mode(CallsiteId::Gameplay);
        let hz = scheduler.refresh_rate().hz();

        log::info!(
            "{fps:.1} fps, {steps_per_sec:.1} steps/s, {hz} Hz, gameplay {mode}, {} passthrough frames, {} total steps",
            self.stats.passthrough,
            self.sim_steps
        );
        if let Some(window) = &self.window {
            window.set_title(&format!("{TITLE} | {fps:.0} fps | {steps_per_sec:.0} steps/s | {mode}"));
        }

        self.stats = FrameStats::new();
    }
}

impl ApplicationHandler for StudioApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(640.0, 360.0));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                self.request_exit(event_loop);
                return;
            }
        };

        self.scheduler = Some(self.build_scheduler(event_loop, &window));
        window.request_redraw();
        self.window = Some(window);
        self.stats = FrameStats::new();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; the scheduler does the pacing.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, event),
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }
}
