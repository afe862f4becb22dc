//! Daemon lifecycle -- configuration resolution, engine startup, and shutdown.
//!
//! The [`Daemon`] converts the loaded `TailwatchConfig` into an engine
//! `WatchConfig`, starts a [`WatchManager`] with the given listener, and
//! closes it on shutdown so every tailed file receives its `on_close`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use tailwatch_core::config::TailwatchConfig;
use tailwatch_engine::{Listener, SourceSet, WatchConfig, WatchManager};

use crate::cli::DaemonCli;

/// Load configuration from `path` and apply CLI overrides.
///
/// Precedence: CLI flags > environment variables > config file > defaults.
/// The result is validated with the same checks the engine runs at startup:
/// field bounds and pattern compilation.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the
/// resulting configuration is invalid.
pub async fn load_config(path: &Path, cli: &DaemonCli) -> Result<TailwatchConfig> {
    let mut config = TailwatchConfig::from_file(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
    config.apply_env_overrides();

    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format = format.clone();
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    validate_watch(&config)?;
    Ok(config)
}

fn validate_watch(config: &TailwatchConfig) -> Result<()> {
    let watch = WatchConfig::from_core(&config.watch)
        .and_then(|watch| watch.validate().map(|()| watch))
        .map_err(|e| anyhow::anyhow!("invalid watch config: {}", e))?;
    SourceSet::from_config(&watch)
        .map_err(|e| anyhow::anyhow!("invalid watch pattern: {}", e))?;
    Ok(())
}

/// Running daemon instance.
pub struct Daemon {
    manager: WatchManager,
}

impl Daemon {
    /// Start the watch engine from an already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch section cannot be converted into an
    /// engine configuration or the engine fails to start.
    pub fn start(config: &TailwatchConfig, listener: Arc<dyn Listener>) -> Result<Self> {
        tailwatch_core::metrics::describe_all();

        let watch_config = WatchConfig::from_core(&config.watch)
            .map_err(|e| anyhow::anyhow!("invalid watch config: {}", e))?;
        let manager = WatchManager::start(watch_config, listener)
            .map_err(|e| anyhow::anyhow!("failed to start watch manager: {}", e))?;

        tracing::info!("tailwatch daemon started");
        Ok(Self { manager })
    }

    /// Access the underlying watch manager.
    pub fn manager(&self) -> &WatchManager {
        &self.manager
    }

    /// Wait for Ctrl-C (or SIGTERM on Unix), then shut down.
    pub async fn run_until_shutdown(self) -> Result<()> {
        wait_for_shutdown_signal().await?;
        tracing::info!("shutdown signal received");
        self.shutdown().await;
        Ok(())
    }

    /// Stop the engine and close every tailed file.
    pub async fn shutdown(self) {
        let tailed = self.manager.tailed_files();
        tracing::info!(files = tailed.len(), "closing tailed files");
        self.manager.close().await;
        tracing::info!("tailwatch daemon shut down");
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
