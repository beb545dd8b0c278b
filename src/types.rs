use crate::config::{APP_DIR_NAME, TOOLCHAIN_DIR_NAME};
use crate::error::GovmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const EXPORT_BEGIN: &str = "# The next lines are added by govm";
const EXPORT_END: &str = "# End of govm path";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

/// One downloadable artifact of a release, as published by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseFile {
    pub filename: String,
    pub os: String,
    pub arch: String,
    pub kind: String,
    pub sha256: String,
}

impl ReleaseFile {
    pub fn is_archive_for(&self, platform: &PlatformInfo) -> bool {
        self.kind == "archive" && self.os == platform.os && self.arch == platform.arch
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    pub stable: bool,
    #[serde(default)]
    pub files: Vec<ReleaseFile>,
}

impl Release {
    pub fn archive_for(&self, platform: &PlatformInfo) -> Option<&ReleaseFile> {
        self.files.iter().find(|f| f.is_archive_for(platform))
    }

    pub fn is_compatible(&self, platform: &PlatformInfo) -> bool {
        self.archive_for(platform).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStrategy {
    Patch,
    Minor,
    Major,
}

impl UpdateStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateStrategy::Patch => "patch",
            UpdateStrategy::Minor => "minor",
            UpdateStrategy::Major => "major",
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateStrategy {
    type Err = GovmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patch" => Ok(UpdateStrategy::Patch),
            "minor" => Ok(UpdateStrategy::Minor),
            "major" => Ok(UpdateStrategy::Major),
            other => Err(GovmError::InvalidUpdateStrategy(other.to_string())),
        }
    }
}

/// Per-invocation request threaded through the pipeline.
///
/// Steps fill it in as they go: the home directory first, then (for updates)
/// the installed version and the resolved target version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Action {
    pub version: String,
    pub home_dir: PathBuf,
    pub installed_version: String,
    pub update_strategy: String,
}

impl Action {
    pub fn install(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn update(strategy: impl Into<String>) -> Self {
        Self {
            update_strategy: strategy.into(),
            ..Self::default()
        }
    }

    pub fn uninstall() -> Self {
        Self::default()
    }

    pub fn check_update_strategy(&self) -> Result<UpdateStrategy, GovmError> {
        self.update_strategy.parse()
    }

    /// Archive name as published on the download endpoint,
    /// e.g. `go1.22.1.linux-amd64.tar.gz`.
    pub fn archive_name(&self, platform: &PlatformInfo) -> String {
        format!("{}.{}-{}.tar.gz", self.version, platform.os, platform.arch)
    }

    pub fn download_file(&self, platform: &PlatformInfo) -> PathBuf {
        std::env::temp_dir().join(self.archive_name(platform))
    }

    pub fn govm_dir(&self) -> PathBuf {
        self.home_dir.join(APP_DIR_NAME)
    }

    pub fn go_dir(&self) -> PathBuf {
        self.govm_dir().join(TOOLCHAIN_DIR_NAME)
    }

    pub fn go_bin_dir(&self) -> PathBuf {
        self.go_dir().join("bin")
    }

    pub fn version_file(&self) -> PathBuf {
        self.go_dir().join("VERSION")
    }

    pub fn export_begin() -> &'static str {
        EXPORT_BEGIN
    }

    pub fn export_end() -> &'static str {
        EXPORT_END
    }

    /// The block appended to shell startup files, bounded by sentinel lines.
    pub fn export(&self) -> String {
        [
            EXPORT_BEGIN.to_string(),
            format!("export GOROOT={}", self.go_dir().display()),
            "export GOPATH=$HOME/go".to_string(),
            format!("export PATH=$PATH:{}", self.go_bin_dir().display()),
            EXPORT_END.to_string(),
        ]
        .join("\n")
    }
}
