mod catalog;
mod checksum;
mod cli;
mod commands;
mod config;
mod error;
#[cfg(test)]
mod fakes;
mod host;
mod pipeline;
mod platform;
mod shell;
mod types;
mod ui;
mod version;

use anyhow::{Context, Result};
use catalog::HttpCatalog;
use clap::Parser;
use cli::Cli;
use config::{ensure_log_dir, Settings};
use error::GovmError;
use host::LocalHost;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let settings = Settings::from_env();

    if let Err(e) = setup_logging(&cli, &settings) {
        ui::print_error(&format!("Could not set up logging: {:#}", e));
        std::process::exit(1);
    }

    if let Err(e) = run(cli, &settings).await {
        match e.downcast_ref::<GovmError>().and_then(GovmError::fault) {
            Some(fault) => tracing::error!(code = fault.code(), fault = %fault, "Command failed"),
            None => tracing::error!("Command failed: {:#}", e),
        }
        ui::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, settings: &Settings) -> Result<()> {
    tracing::debug!(command = ?cli.command, "Starting govm");

    let platform = platform::get_system_info();
    let catalog = HttpCatalog::new(settings, platform.clone()).context("Could not create HTTP client")?;
    let host = LocalHost::with_home(settings.home_override.clone());
    let progress = console::Term::stderr().is_term();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    commands::execute(cli.command, &catalog, &host, platform, progress, &mut input).await?;
    Ok(())
}

/// JSON entries go to a log file that is truncated on every run; `-v`
/// additionally mirrors readable output to stderr.
fn setup_logging(cli: &Cli, settings: &Settings) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let home = settings.resolve_home()?;
    let log_path = ensure_log_dir(&home)?;
    let file = open_log_file(&log_path)?;

    let file_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let file_layer = fmt::layer()
        .json()
        .with_writer(Mutex::new(file))
        .with_filter(file_filter);

    let stderr_layer = (cli.verbose > 0).then(|| {
        let level = if cli.verbose == 1 { "info" } else { "debug" };
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(EnvFilter::new(level))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    tracing::debug!("Logging to {}", log_path.display());
    Ok(())
}

fn open_log_file(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Could not create log file {}", path.display()))
}
