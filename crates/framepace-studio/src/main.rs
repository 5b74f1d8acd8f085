mod app;
mod cadence;

use std::path::PathBuf;

use anyhow::{Context, Result};
use framepace_engine::logging::{init_logging, LoggingConfig};
use framepace_engine::{load_config, TimingConfig};
use winit::event_loop::EventLoop;

use crate::app::StudioApp;

fn main() -> Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let loaded = path.as_deref().map(load_config).transpose();
    let config = match &loaded {
        Ok(config) => config.clone().unwrap_or_default(),
        Err(_) => TimingConfig::default(),
    };

    init_logging(LoggingConfig {
        diagnostics: config.diagnostics,
        ..LoggingConfig::default()
    });

    match (&path, &loaded) {
        (Some(path), Ok(_)) => log::info!("config loaded from {}", path.display()),
        (_, Err(e)) => log::warn!("{e}; using default timing config"),
        (None, _) => log::info!("no config file given; using defaults"),
    }
    log::info!("keys: D toggles demo playback, R re-reads the desktop refresh rate, Esc exits");

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut app = StudioApp::new(config);

    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    Ok(())
}
