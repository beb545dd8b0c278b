use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "govm";
pub const APP_DIR_NAME: &str = ".govm";
pub const TOOLCHAIN_DIR_NAME: &str = "go";
pub const LOG_FILE_NAME: &str = "govm.log";

pub const DEFAULT_VERSIONS_URL: &str = "https://go.dev/dl/?mode=json&include=all";
pub const DEFAULT_DOWNLOAD_URL: &str = "https://go.dev/dl/{filename}";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Runtime settings. Defaults target go.dev; every field can be overridden
/// from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub versions_url: String,
    /// Download endpoint with a `{filename}` placeholder for the archive name.
    pub download_url: String,
    pub http_timeout: Duration,
    pub home_override: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            versions_url: DEFAULT_VERSIONS_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            home_override: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Settings::default();

        if let Some(url) = lookup("GOVM_VERSIONS_URL").filter(|v| !v.is_empty()) {
            settings.versions_url = url;
        }

        if let Some(url) = lookup("GOVM_DOWNLOAD_URL").filter(|v| !v.is_empty()) {
            settings.download_url = url;
        }

        if let Some(secs) = lookup("GOVM_HTTP_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => settings.http_timeout = Duration::from_secs(secs),
                _ => tracing::warn!("Ignoring invalid GOVM_HTTP_TIMEOUT_SECS '{}'", secs),
            }
        }

        if let Some(home) = lookup("GOVM_HOME").filter(|v| !v.is_empty()) {
            settings.home_override = Some(PathBuf::from(home));
        }

        settings
    }

    /// Home directory used for the log file. The pipeline resolves its own
    /// home through the host adapter.
    pub fn resolve_home(&self) -> Result<PathBuf> {
        match &self.home_override {
            Some(home) => Ok(home.clone()),
            None => dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }
}

pub fn log_file_path(home: &Path) -> PathBuf {
    home.join(APP_DIR_NAME).join(LOG_FILE_NAME)
}

pub fn ensure_log_dir(home: &Path) -> Result<PathBuf> {
    let dir = home.join(APP_DIR_NAME);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Could not create directory {}", dir.display()))?;
    Ok(log_file_path(home))
}
