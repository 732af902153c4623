//! Campus hub entry-point: loads settings, builds the hub and runs one
//! command.

use std::ffi::OsString;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use campus_hub::app::{Hub, HubSettings};
use campus_hub::inbound::cli::{Cli, run};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    // Command arguments belong to clap; settings come from the environment
    // and config files only.
    let settings = HubSettings::load_from_iter([OsString::from("campus-hub")])
        .wrap_err("failed to load hub settings")?;
    let hub = Hub::from_settings(&settings, Arc::new(DefaultClock))
        .wrap_err("failed to build the hub")?;

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr();
    run(
        &hub,
        cli.command,
        Duration::from_millis(cli.sync_timeout_ms),
        &mut stdout,
        &mut stderr,
    )
    .await?;
    Ok(())
}
