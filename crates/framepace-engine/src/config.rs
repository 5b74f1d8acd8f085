//! Timing configuration.
//!
//! Settings live in the `[framerate]` table of a TOML file. Every key has a
//! default, and the PascalCase key names of older configuration files are
//! accepted as aliases.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::logging::CONFIG;
use crate::timer::StartupGuard;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Scheduler settings, immutable once loaded.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct TimingConfig {
    /// Master switch; when off the scheduler always passes through.
    #[serde(default = "default_true", alias = "FixFramerate")]
    pub enabled: bool,

    /// Per-tick diagnostic log lines.
    #[serde(default, alias = "FramerateDiagnostics")]
    pub diagnostics: bool,

    /// Pace to the display's rate instead of a fixed 60 Hz.
    #[serde(default, alias = "NativeRefreshRate")]
    pub native_refresh: bool,

    /// Explicit rate used with `native_refresh`; 0 probes the display.
    #[serde(default, alias = "TargetRefreshRate", deserialize_with = "non_negative")]
    pub target_refresh_rate: u32,

    /// Downgrade zero-step call sites that stop producing steps.
    #[serde(default = "default_true", alias = "AutoFallbackTo60")]
    pub auto_fallback_60: bool,

    #[serde(default = "default_startup_guard_ms", alias = "StartupGuardMs", deserialize_with = "non_negative")]
    pub startup_guard_ms: u32,

    /// Let the frontend and menu call sites use custom timing.
    #[serde(default, alias = "AllowFrontendCustomTiming")]
    pub frontend_custom_timing: bool,

    /// Let them also use zero-step timing.
    #[serde(default, alias = "AllowFrontendZeroStep")]
    pub frontend_zero_step: bool,

    /// Snap near-target elapsed times to the target before accumulating.
    #[serde(default = "default_true")]
    pub jitter_snap: bool,
}

fn default_true() -> bool {
    true
}

fn default_startup_guard_ms() -> u32 {
    StartupGuard::DEFAULT_MS
}

fn non_negative<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    Ok(value.clamp(0, i64::from(u32::MAX)) as u32)
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            diagnostics: false,
            native_refresh: false,
            target_refresh_rate: 0,
            auto_fallback_60: true,
            startup_guard_ms: default_startup_guard_ms(),
            frontend_custom_timing: false,
            frontend_zero_step: false,
            jitter_snap: true,
        }
    }
}

impl TimingConfig {
    /// Parses a TOML document and normalizes it.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(file.framerate.normalized())
    }

    /// Zero-step frontend timing requires frontend custom timing.
    pub fn normalized(mut self) -> Self {
        if !self.frontend_custom_timing && self.frontend_zero_step {
            self.frontend_zero_step = false;
            log::info!(target: CONFIG, "Disabled frontend_zero_step because frontend_custom_timing is off.");
        }
        self
    }

    /// Zero-step frontend timing also requires the host's zero-step safety.
    pub fn with_capability(mut self, zero_step_safety_ready: bool) -> Self {
        if self.frontend_zero_step && !zero_step_safety_ready {
            self.frontend_zero_step = false;
            log::info!(target: CONFIG, "frontend_zero_step disabled because zero-step safety is unavailable.");
        }
        self
    }
}

/// On-disk layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default, alias = "Framerate")]
    pub framerate: TimingConfig,
}

/// Reads, parses and normalizes a config file.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<TimingConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config = TimingConfig::from_toml_str(&text)?;
    log::info!(target: CONFIG, "loaded {}", path.display());
    Ok(config)
}
