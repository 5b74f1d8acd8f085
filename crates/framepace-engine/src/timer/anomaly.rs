//! Zero-step anomaly detection.
//!
//! A call site running with zero-step simulation should still see a non-zero
//! step regularly. Long runs of zero steps mean the presentation rate or the
//! call-site identification is wrong, and the site is downgraded.

use super::callsite::CallsiteId;
use super::mode::TimerMode;

/// Limits on a run of zero-step frames.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AnomalyThresholds {
    /// Consecutive zero-step frames.
    pub zero_frames: u32,
    /// Estimated time without a step (frames × frame duration), µs.
    pub zero_time_us: u64,
}

impl AnomalyThresholds {
    pub const NORMAL: Self = Self {
        zero_frames: 120,
        zero_time_us: 2_000_000,
    };

    /// Used for non-gameplay sites right after startup, where a misdetected
    /// rate should be caught quickly.
    pub const SETTLING: Self = Self {
        zero_frames: 24,
        zero_time_us: 400_000,
    };
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AnomalyDetector {
    consecutive_zero_frames: u32,
    frames_since_non_zero: u32,
}

impl AnomalyDetector {
    pub fn consecutive_zero_frames(&self) -> u32 {
        self.consecutive_zero_frames
    }

    pub fn frames_since_non_zero(&self) -> u32 {
        self.frames_since_non_zero
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Records one frame's step count and reports whether a downgrade is due.
    ///
    /// `thresholds` is `None` when automatic fallback is disabled; counting
    /// still happens but nothing ever fires.
    pub fn observe(&mut self, steps: u32, thresholds: Option<AnomalyThresholds>, frame_us: i64) -> bool {
        if steps == 0 {
            self.consecutive_zero_frames = self.consecutive_zero_frames.saturating_add(1);
            self.frames_since_non_zero = self.frames_since_non_zero.saturating_add(1);
        } else {
            self.clear();
        }

        let Some(limits) = thresholds else {
            return false;
        };

        let frame_us = u64::try_from(frame_us.max(1)).unwrap_or(1);
        let no_step_us = u64::from(self.frames_since_non_zero).saturating_mul(frame_us);

        self.consecutive_zero_frames >= limits.zero_frames || no_step_us >= limits.zero_time_us
    }
}

/// Mode a call site drops to when an anomaly fires.
pub fn fallback_mode(site: CallsiteId) -> TimerMode {
    match site {
        CallsiteId::Gameplay => TimerMode::CustomSafe60,
        _ => TimerMode::LegacyPassthrough,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_144HZ: i64 = 6_944;

    #[test]
    fn fires_at_frame_threshold() {
        let mut det = AnomalyDetector::default();
        for _ in 0..119 {
            assert!(!det.observe(0, Some(AnomalyThresholds::NORMAL), FRAME_144HZ));
        }
        assert!(det.observe(0, Some(AnomalyThresholds::NORMAL), FRAME_144HZ));
        assert_eq!(det.consecutive_zero_frames(), 120);
    }

    #[test]
    fn fires_on_time_threshold_first_at_low_rates() {
        // 20 ms frames: 2 s without a step is 100 frames.
        let mut det = AnomalyDetector::default();
        for _ in 0..99 {
            assert!(!det.observe(0, Some(AnomalyThresholds::NORMAL), 20_000));
        }
        assert!(det.observe(0, Some(AnomalyThresholds::NORMAL), 20_000));
    }

    #[test]
    fn settling_thresholds_are_tighter() {
        let mut det = AnomalyDetector::default();
        for _ in 0..23 {
            assert!(!det.observe(0, Some(AnomalyThresholds::SETTLING), FRAME_144HZ));
        }
        assert!(det.observe(0, Some(AnomalyThresholds::SETTLING), FRAME_144HZ));
    }

    #[test]
    fn non_zero_step_resets_counters() {
        let mut det = AnomalyDetector::default();
        for _ in 0..50 {
            det.observe(0, Some(AnomalyThresholds::NORMAL), FRAME_144HZ);
        }
        det.observe(1, Some(AnomalyThresholds::NORMAL), FRAME_144HZ);
        assert_eq!(det.consecutive_zero_frames(), 0);
        assert_eq!(det.frames_since_non_zero(), 0);
    }

    #[test]
    fn disabled_fallback_never_fires() {
        let mut det = AnomalyDetector::default();
        for _ in 0..10_000 {
            assert!(!det.observe(0, None, FRAME_144HZ));
        }
        assert_eq!(det.consecutive_zero_frames(), 10_000);
    }

    #[test]
    fn fallback_targets() {
        assert_eq!(fallback_mode(CallsiteId::Gameplay), TimerMode::CustomSafe60);
        assert_eq!(fallback_mode(CallsiteId::Frontend), TimerMode::LegacyPassthrough);
        assert_eq!(fallback_mode(CallsiteId::Menu), TimerMode::LegacyPassthrough);
    }
}
