use std::time::{Duration, Instant};

use framepace_engine::time::system_millis;
use framepace_engine::{AtomicSpeedCell, CallsiteId, OriginalTimer, SpeedCell};

/// Stand-in for the host's own timer routine: one step per call, paced to a
/// fixed rate with a plain thread sleep.
pub struct FixedCadence {
    next: Instant,
    period: Duration,
    speed: AtomicSpeedCell,
}

impl FixedCadence {
    pub fn new(rate_hz: u32, speed: AtomicSpeedCell) -> Self {
        let period = Duration::from_secs(1) / rate_hz.max(1);
        Self {
            next: Instant::now() + period,
            period,
            speed,
        }
    }
}

impl OriginalTimer for FixedCadence {
    fn call(&mut self, _site: CallsiteId, _arg: i32) -> i32 {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            self.next = now + self.period;
        }

        self.speed.set(1);
        system_millis()
    }
}
