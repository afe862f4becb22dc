use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use tailwatch_daemon::cli::DaemonCli;
use tailwatch_daemon::daemon::{self, Daemon};
use tailwatch_daemon::logging;
use tailwatch_daemon::output::OutputListener;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let config = daemon::load_config(&cli.config, &cli).await?;

    if cli.validate {
        println!("configuration is valid: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(config = %cli.config.display(), "tailwatchd starting");

    let listener = Arc::new(OutputListener::stdout(cli.output));
    let daemon = Daemon::start(&config, listener)?;

    tracing::info!("tailwatchd running");
    daemon.run_until_shutdown().await
}
