/// Process-wide window after initialization during which custom pacing stays off.
///
/// Times are microseconds on the scheduler clock. A zero duration disables
/// the guard entirely.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StartupGuard {
    started_at_us: i64,
    duration_us: i64,
}

impl StartupGuard {
    pub const DEFAULT_MS: u32 = 5_000;

    pub fn new(started_at_us: i64, duration_ms: u32) -> Self {
        Self {
            started_at_us,
            duration_us: i64::from(duration_ms) * 1000,
        }
    }

    /// True while every call site must defer to the original routine.
    pub fn is_active(&self, now_us: i64) -> bool {
        self.duration_us > 0 && now_us.saturating_sub(self.started_at_us) < self.duration_us
    }

    /// True while the guard is active and for one more guard duration after it
    /// expires; anomaly thresholds for non-gameplay sites are tightened here.
    pub fn is_settling(&self, now_us: i64) -> bool {
        self.duration_us > 0 && now_us.saturating_sub(self.started_at_us) < self.duration_us.saturating_mul(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_until_duration_elapses() {
        let guard = StartupGuard::new(1_000, 5_000);
        assert!(guard.is_active(1_000));
        assert!(guard.is_active(5_000_999));
        assert!(!guard.is_active(5_001_000));
    }

    #[test]
    fn settling_outlasts_active() {
        let guard = StartupGuard::new(0, 5_000);
        assert!(!guard.is_active(7_000_000));
        assert!(guard.is_settling(7_000_000));
        assert!(!guard.is_settling(10_000_000));
    }

    #[test]
    fn zero_duration_disables() {
        let guard = StartupGuard::new(0, 0);
        assert!(!guard.is_active(0));
        assert!(!guard.is_settling(0));
    }
}
