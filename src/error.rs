//! Error taxonomy for govm.
//!
//! User-facing problems (a version that does not exist, nothing to update)
//! carry a readable message. Everything else is an infrastructure failure
//! and surfaces only as a [`Fault`], whose numeric code pins down the step
//! that failed; the details go to the log file.

use crate::types::UpdateStrategy;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFault {
    RemoveStale,
    CreateFile,
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumFault {
    Fetch,
    OpenFile,
    Hash,
    Mismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractFault {
    CreateDir,
    Unpack,
}

/// Failures while editing a shell startup file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcFault {
    Stat,
    Read,
    Write,
    NoShellsFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateFault {
    Stat,
    NotDirectory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    ListVersions,
    CheckUserHome,
    CheckVersion,
    Download(DownloadFault),
    Checksum(ChecksumFault),
    RemovePrevious,
    Extract(ExtractFault),
    AddToPath(RcFault),
    DetectInstalled,
    Locate(LocateFault),
    RemoveInstallation,
    RemoveFromPath(RcFault),
    CheckActive,
}

impl Fault {
    /// Stable identifier reported to the user. Never renumber these.
    pub fn code(self) -> u8 {
        match self {
            Fault::ListVersions => 1,
            Fault::CheckUserHome => 2,
            Fault::CheckVersion => 3,
            Fault::Download(DownloadFault::RemoveStale) => 4,
            Fault::Download(DownloadFault::CreateFile) => 5,
            Fault::Download(DownloadFault::Stream) => 6,
            Fault::Checksum(ChecksumFault::Fetch) => 7,
            Fault::Checksum(ChecksumFault::OpenFile) => 8,
            Fault::Checksum(ChecksumFault::Hash) => 9,
            Fault::Checksum(ChecksumFault::Mismatch) => 10,
            Fault::RemovePrevious => 11,
            Fault::Extract(ExtractFault::CreateDir) => 12,
            Fault::Extract(ExtractFault::Unpack) => 13,
            Fault::AddToPath(RcFault::Stat) => 14,
            Fault::AddToPath(RcFault::Read) => 15,
            Fault::AddToPath(RcFault::Write) => 16,
            Fault::AddToPath(RcFault::NoShellsFound) => 17,
            Fault::DetectInstalled => 18,
            Fault::Locate(LocateFault::Stat) => 19,
            Fault::Locate(LocateFault::NotDirectory) => 20,
            Fault::RemoveInstallation => 21,
            Fault::RemoveFromPath(RcFault::Stat) => 22,
            Fault::RemoveFromPath(RcFault::Read) => 23,
            Fault::RemoveFromPath(RcFault::Write) => 24,
            Fault::RemoveFromPath(RcFault::NoShellsFound) => 25,
            Fault::CheckActive => 26,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (code: {})", self, self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovmError {
    #[error("go version \"{0}\" is not available")]
    VersionNotAvailable(String),

    #[error("invalid update strategy \"{0}\", expected one of: patch, minor, major")]
    InvalidUpdateStrategy(String),

    #[error("no {strategy} updates available for go version \"{installed}\"")]
    NoUpdatesAvailable {
        strategy: UpdateStrategy,
        installed: String,
    },

    #[error("no go installation found")]
    NoInstallationFound,

    #[error(
        "an unexpected error occurred, please verify govm.log for more information (code: {})",
        .0.code()
    )]
    Unexpected(Fault),
}

impl GovmError {
    pub fn fault(&self) -> Option<Fault> {
        match self {
            GovmError::Unexpected(fault) => Some(*fault),
            _ => None,
        }
    }
}

impl From<Fault> for GovmError {
    fn from(fault: Fault) -> Self {
        GovmError::Unexpected(fault)
    }
}
