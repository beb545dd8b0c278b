use crate::catalog::Catalog;
use crate::cli::Commands;
use crate::error::{Fault, GovmError};
use crate::host::Host;
use crate::pipeline::Pipeline;
use crate::types::PlatformInfo;
use crate::ui;
use std::io::{self, BufRead};

const LIST_COLUMNS: usize = 6;
const LIST_CELL_WIDTH: usize = 15;
const RULE_WIDTH: usize = 100;

/// Lays versions out column by column, marking `installed` with `* `.
pub fn render_list(versions: &[String], installed: &str, platform: &PlatformInfo) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!(
        "Available Go versions for {}/{}\n",
        platform.os, platform.arch
    ));
    out.push_str(&format!("{}\n", rule));

    let rows = (versions.len() + LIST_COLUMNS - 1) / LIST_COLUMNS;
    for row in 0..rows {
        let mut line = String::new();
        for column in 0..LIST_COLUMNS {
            if let Some(version) = versions.get(row + column * rows) {
                let cell = if !installed.is_empty() && version == installed {
                    format!("* {}", version)
                } else {
                    version.clone()
                };
                line.push_str(&format!("{:<width$}", cell, width = LIST_CELL_WIDTH));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out.push_str(&format!("{}\n", rule));
    out.push_str("* currently in use\n");
    out.push_str(&format!("{}\n", rule));
    out
}

pub async fn list<C: Catalog, H: Host>(
    catalog: &C,
    host: &H,
    platform: &PlatformInfo,
) -> Result<String, GovmError> {
    tracing::info!("Listing available go versions");

    let releases = catalog.versions().await.map_err(|e| {
        tracing::error!(error = %e, "Listing versions");
        GovmError::Unexpected(Fault::ListVersions)
    })?;

    let installed = host.installed_version().unwrap_or_else(|e| {
        tracing::warn!("Could not detect installed go version: {}", e);
        String::new()
    });

    let versions: Vec<String> = releases.into_iter().map(|r| r.version).collect();
    Ok(render_list(&versions, &installed, platform))
}

/// Runs one CLI command against the given collaborators. Prompts are read
/// from `input`.
pub async fn execute<C: Catalog, H: Host, R: BufRead>(
    command: Commands,
    catalog: &C,
    host: &H,
    platform: PlatformInfo,
    progress: bool,
    input: &mut R,
) -> Result<(), GovmError> {
    let pipeline = Pipeline::new(catalog, host, platform.clone()).with_progress(progress);

    match command {
        Commands::List => {
            print!("{}", list(catalog, host, &platform).await?);
        }

        Commands::Install { version } => {
            pipeline.install(&version).await?;
            ui::print_success(&format!("go {} installed successfully", version));
            ui::print_reopen_terminal();
        }

        Commands::Use { version } => {
            if pipeline.use_version(&version).await? {
                ui::print_success(&format!("Now using go {}", version));
                ui::print_reopen_terminal();
            } else {
                ui::print_warning(&format!("go {} is already in use", version));
            }
        }

        Commands::Update { strategy } => {
            let version = pipeline.update(&strategy).await?;
            ui::print_success(&format!("go updated to {}", version));
            ui::print_reopen_terminal();
        }

        Commands::Uninstall { yes } => {
            let confirmed = yes
                || ui::confirm(
                    input,
                    &mut io::stdout(),
                    "Are you sure you want to uninstall the current go version?",
                )
                .unwrap_or_else(|e| {
                    tracing::warn!("Could not read confirmation: {}", e);
                    false
                });

            if !confirmed {
                tracing::info!("Uninstall declined");
                ui::print_warning("Uninstall aborted");
                return Ok(());
            }

            pipeline.uninstall().await?;
            ui::print_success("go uninstalled successfully");
            ui::print_reopen_terminal();
        }
    }

    Ok(())
}
