//! Deterministic clock and wait doubles for unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Once;

use crate::time::{ThreadWait, TickSource};

/// Manually advanced counter. Clones share the same reading.
#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    ticks: Rc<Cell<i64>>,
    frequency: i64,
}

impl ManualClock {
    pub(crate) fn new(frequency: i64) -> Self {
        Self {
            ticks: Rc::new(Cell::new(0)),
            frequency,
        }
    }

    /// Advances the counter by `us` microseconds (ticks at 1 MHz).
    pub(crate) fn advance_us(&self, us: i64) {
        let ticks = us * self.frequency.max(1) / 1_000_000;
        self.ticks.set(self.ticks.get() + ticks);
    }
}

impl TickSource for ManualClock {
    fn ticks(&self) -> i64 {
        self.ticks.get()
    }

    fn frequency(&self) -> i64 {
        self.frequency
    }
}

/// Wait primitives that advance a `ManualClock` instead of blocking.
///
/// Sleep advances by the requested milliseconds, a yield by 100 µs, a thread
/// switch by 20 µs and a spin by 1 µs.
#[derive(Debug)]
pub(crate) struct StepWait {
    clock: ManualClock,
    pub(crate) sleeps: Vec<u32>,
    pub(crate) yields: u32,
    pub(crate) switches: u32,
    pub(crate) spins: u32,
    pub(crate) begins: u32,
    pub(crate) ends: u32,
}

impl StepWait {
    pub(crate) fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            sleeps: Vec::new(),
            yields: 0,
            switches: 0,
            spins: 0,
            begins: 0,
            ends: 0,
        }
    }
}

impl ThreadWait for StepWait {
    fn begin(&mut self) {
        self.begins += 1;
    }

    fn end(&mut self) {
        self.ends += 1;
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.sleeps.push(ms);
        self.clock.advance_us(i64::from(ms) * 1000);
    }

    fn yield_slice(&mut self) {
        self.yields += 1;
        self.clock.advance_us(100);
    }

    fn switch_thread(&mut self) {
        self.switches += 1;
        self.clock.advance_us(20);
    }

    fn spin(&mut self) {
        self.spins += 1;
        self.clock.advance_us(1);
    }
}

/// A log record seen by `capture_logs`.
#[derive(Debug, Clone)]
pub(crate) struct Captured {
    pub(crate) target: String,
    pub(crate) message: String,
}

thread_local! {
    static CAPTURED: RefCell<Option<Vec<Captured>>> = const { RefCell::new(None) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        CAPTURED.with(|captured| {
            if let Some(records) = captured.borrow_mut().as_mut() {
                records.push(Captured {
                    target: record.target().to_owned(),
                    message: record.args().to_string(),
                });
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Runs `f` and returns the log records it emitted on the current thread.
pub(crate) fn capture_logs(f: impl FnOnce()) -> Vec<Captured> {
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });

    CAPTURED.with(|captured| *captured.borrow_mut() = Some(Vec::new()));
    f();
    CAPTURED.with(|captured| captured.borrow_mut().take().unwrap_or_default())
}
