//! Install, update, use and uninstall as ordered lists of fallible steps.
//!
//! Every step reads and fills the shared [`Action`]. The first failure stops
//! the run and is returned untouched; nothing already done is rolled back.

use crate::catalog::Catalog;
use crate::checksum::sha256_hex;
use crate::error::{
    ChecksumFault, DownloadFault, ExtractFault, Fault, GovmError, LocateFault, RcFault,
};
use crate::host::{EntryKind, Host};
use crate::shell::{self, SHELL_RC_FILES};
use crate::types::{Action, PlatformInfo, UpdateStrategy};
use crate::ui::Spinner;
use crate::version::{compare_desc, find_latest, parse};
use std::fmt::Display;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CheckUpdateStrategy,
    CheckInstalledVersion,
    CheckAvailableUpdates,
    CheckUserHome,
    CheckActiveVersion,
    CheckVersion,
    Download,
    Checksum,
    RemovePrevious,
    Extract,
    AddToPath,
    LocateInstallation,
    RemoveInstallation,
    RemoveFromPath,
}

impl Step {
    pub fn message(self) -> &'static str {
        match self {
            Step::CheckUpdateStrategy => "Checking update strategy",
            Step::CheckInstalledVersion => "Detecting installed version",
            Step::CheckAvailableUpdates => "Looking for updates",
            Step::CheckUserHome => "Resolving home directory",
            Step::CheckActiveVersion => "Checking active version",
            Step::CheckVersion => "Checking version availability",
            Step::Download => "Downloading",
            Step::Checksum => "Verifying checksum",
            Step::RemovePrevious => "Removing previous installation",
            Step::Extract => "Extracting files",
            Step::AddToPath => "Adding go to PATH",
            Step::LocateInstallation => "Locating installation",
            Step::RemoveInstallation => "Removing installation",
            Step::RemoveFromPath => "Removing go from PATH",
        }
    }
}

pub const INSTALL_STEPS: &[Step] = &[
    Step::CheckUserHome,
    Step::CheckVersion,
    Step::Download,
    Step::Checksum,
    Step::RemovePrevious,
    Step::Extract,
    Step::AddToPath,
];

pub const UPDATE_STEPS: &[Step] = &[
    Step::CheckUpdateStrategy,
    Step::CheckInstalledVersion,
    Step::CheckAvailableUpdates,
    Step::CheckUserHome,
    Step::CheckVersion,
    Step::Download,
    Step::Checksum,
    Step::RemovePrevious,
    Step::Extract,
    Step::AddToPath,
];

pub const USE_STEPS: &[Step] = &[
    Step::CheckUserHome,
    Step::CheckActiveVersion,
    Step::CheckVersion,
    Step::Download,
    Step::Checksum,
    Step::RemovePrevious,
    Step::Extract,
    Step::AddToPath,
];

pub const UNINSTALL_STEPS: &[Step] = &[
    Step::CheckUserHome,
    Step::LocateInstallation,
    Step::RemoveInstallation,
    Step::RemoveFromPath,
];

/// What a step asks the runner to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop early; the command already has what it wants.
    Finish,
}

#[derive(Debug, Clone, Copy)]
enum RcEdit {
    Add,
    Remove,
}

impl RcEdit {
    fn apply(self, content: &str, action: &Action) -> String {
        match self {
            RcEdit::Add => shell::patch(content, action),
            RcEdit::Remove => shell::unpatch(content),
        }
    }

    fn fault(self, fault: RcFault) -> Fault {
        match self {
            RcEdit::Add => Fault::AddToPath(fault),
            RcEdit::Remove => Fault::RemoveFromPath(fault),
        }
    }

    fn step(self) -> Step {
        match self {
            RcEdit::Add => Step::AddToPath,
            RcEdit::Remove => Step::RemoveFromPath,
        }
    }
}

/// Logs an infrastructure failure and turns it into its coded error.
fn fail(step: Step, what: &str, err: impl Display, fault: Fault) -> GovmError {
    tracing::error!(step = ?step, code = fault.code(), error = %err, "{}", what);
    GovmError::Unexpected(fault)
}

pub struct Pipeline<'a, C, H> {
    catalog: &'a C,
    host: &'a H,
    platform: PlatformInfo,
    progress: bool,
}

impl<'a, C: Catalog, H: Host> Pipeline<'a, C, H> {
    pub fn new(catalog: &'a C, host: &'a H, platform: PlatformInfo) -> Self {
        Self {
            catalog,
            host,
            platform,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub async fn install(&self, version: &str) -> Result<(), GovmError> {
        let mut action = Action::install(version);
        self.run(INSTALL_STEPS, &mut action).await?;
        Ok(())
    }

    /// Installs the newest release allowed by `strategy` and returns it.
    pub async fn update(&self, strategy: &str) -> Result<String, GovmError> {
        let mut action = Action::update(strategy);
        self.run(UPDATE_STEPS, &mut action).await?;
        Ok(action.version)
    }

    /// Makes `version` the active toolchain. Returns false when it already
    /// was.
    pub async fn use_version(&self, version: &str) -> Result<bool, GovmError> {
        let mut action = Action::install(version);
        let flow = self.run(USE_STEPS, &mut action).await?;
        Ok(flow == Flow::Continue)
    }

    pub async fn uninstall(&self) -> Result<(), GovmError> {
        let mut action = Action::uninstall();
        self.run(UNINSTALL_STEPS, &mut action).await?;
        Ok(())
    }

    pub async fn run(&self, steps: &[Step], action: &mut Action) -> Result<Flow, GovmError> {
        let spinner = Spinner::start(self.progress);

        for &step in steps {
            spinner.set_message(step.message());
            tracing::info!(step = ?step, version = %action.version, "Running step");

            if self.execute(step, action).await? == Flow::Finish {
                tracing::info!(step = ?step, "Finished early");
                return Ok(Flow::Finish);
            }
        }
        Ok(Flow::Continue)
    }

    async fn execute(&self, step: Step, action: &mut Action) -> Result<Flow, GovmError> {
        match step {
            Step::CheckUpdateStrategy => self.check_update_strategy(action),
            Step::CheckInstalledVersion => self.check_installed_version(action),
            Step::CheckAvailableUpdates => self.check_available_updates(action).await,
            Step::CheckUserHome => self.check_user_home(action),
            Step::CheckActiveVersion => self.check_active_version(action),
            Step::CheckVersion => self.check_version(action).await,
            Step::Download => self.download(action).await,
            Step::Checksum => self.checksum(action).await,
            Step::RemovePrevious => self.remove_previous(action),
            Step::Extract => self.extract(action),
            Step::AddToPath => self.update_path(action, RcEdit::Add),
            Step::LocateInstallation => self.locate_installation(action),
            Step::RemoveInstallation => self.remove_installation(action),
            Step::RemoveFromPath => self.update_path(action, RcEdit::Remove),
        }
    }

    fn check_update_strategy(&self, action: &mut Action) -> Result<Flow, GovmError> {
        action.check_update_strategy()?;
        Ok(Flow::Continue)
    }

    fn check_installed_version(&self, action: &mut Action) -> Result<Flow, GovmError> {
        let installed = self.host.installed_version().map_err(|e| {
            fail(
                Step::CheckInstalledVersion,
                "Detecting installed go version",
                e,
                Fault::DetectInstalled,
            )
        })?;

        if installed.is_empty() {
            return Err(GovmError::NoInstallationFound);
        }
        tracing::debug!("Installed go version is {}", installed);
        action.installed_version = installed;
        Ok(Flow::Continue)
    }

    async fn check_available_updates(&self, action: &mut Action) -> Result<Flow, GovmError> {
        let strategy = action.check_update_strategy()?;
        let releases = self.catalog.versions().await.map_err(|e| {
            fail(Step::CheckAvailableUpdates, "Listing versions", e, Fault::ListVersions)
        })?;

        let candidates: Vec<&str> = releases.iter().map(|r| r.version.as_str()).collect();
        let latest = find_latest(&action.installed_version, &candidates);
        let target = match strategy {
            UpdateStrategy::Patch => latest.patch,
            UpdateStrategy::Minor => latest.minor,
            UpdateStrategy::Major => latest.major,
        };

        let installed = parse(&action.installed_version);
        match target {
            Some(target) if compare_desc(&target, &installed) => {
                tracing::info!(
                    "Updating {} to {} ({})",
                    action.installed_version,
                    target.raw,
                    strategy
                );
                action.version = target.raw;
                Ok(Flow::Continue)
            }
            _ => Err(GovmError::NoUpdatesAvailable {
                strategy,
                installed: action.installed_version.clone(),
            }),
        }
    }

    fn check_user_home(&self, action: &mut Action) -> Result<Flow, GovmError> {
        action.home_dir = self.host.home_dir().map_err(|e| {
            fail(Step::CheckUserHome, "Resolving home directory", e, Fault::CheckUserHome)
        })?;
        Ok(Flow::Continue)
    }

    fn check_active_version(&self, action: &mut Action) -> Result<Flow, GovmError> {
        let content = match self.host.read_file(&action.version_file()) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Flow::Continue),
            Err(e) => {
                return Err(fail(
                    Step::CheckActiveVersion,
                    "Reading active version",
                    e,
                    Fault::CheckActive,
                ))
            }
        };

        let active = content.lines().next().unwrap_or_default().trim();
        if !action.version.is_empty() && active == action.version {
            tracing::info!("go {} is already active", active);
            return Ok(Flow::Finish);
        }
        Ok(Flow::Continue)
    }

    async fn check_version(&self, action: &mut Action) -> Result<Flow, GovmError> {
        if action.version.is_empty() {
            return Err(GovmError::VersionNotAvailable(String::new()));
        }

        let exists = self.catalog.version_exists(&action.version).await.map_err(|e| {
            fail(Step::CheckVersion, "Checking version", e, Fault::CheckVersion)
        })?;

        if !exists {
            return Err(GovmError::VersionNotAvailable(action.version.clone()));
        }
        Ok(Flow::Continue)
    }

    async fn download(&self, action: &mut Action) -> Result<Flow, GovmError> {
        let path = action.download_file(&self.platform);

        match self.host.remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(fail(
                    Step::Download,
                    "Removing stale download",
                    e,
                    Fault::Download(DownloadFault::RemoveStale),
                ))
            }
            _ => {}
        }

        let mut file = self.host.create_file(&path).map_err(|e| {
            fail(
                Step::Download,
                "Creating download file",
                e,
                Fault::Download(DownloadFault::CreateFile),
            )
        })?;

        let streamed = match self.catalog.download_version(action, &mut *file).await {
            Ok(()) => file.flush().map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        streamed.map_err(|e| {
            fail(
                Step::Download,
                "Downloading version",
                e,
                Fault::Download(DownloadFault::Stream),
            )
        })?;

        tracing::debug!("Saved archive to {}", path.display());
        Ok(Flow::Continue)
    }

    async fn checksum(&self, action: &mut Action) -> Result<Flow, GovmError> {
        let expected = self.catalog.checksum(&action.version).await.map_err(|e| {
            fail(
                Step::Checksum,
                "Fetching checksum",
                e,
                Fault::Checksum(ChecksumFault::Fetch),
            )
        })?;

        let mut file = self
            .host
            .open_file(&action.download_file(&self.platform))
            .map_err(|e| {
                fail(
                    Step::Checksum,
                    "Opening downloaded file",
                    e,
                    Fault::Checksum(ChecksumFault::OpenFile),
                )
            })?;

        let computed = sha256_hex(&mut *file).map_err(|e| {
            fail(
                Step::Checksum,
                "Hashing downloaded file",
                e,
                Fault::Checksum(ChecksumFault::Hash),
            )
        })?;

        if computed != expected.to_lowercase() {
            return Err(fail(
                Step::Checksum,
                "Checksum does not match",
                format!("expected {}, computed {}", expected, computed),
                Fault::Checksum(ChecksumFault::Mismatch),
            ));
        }
        Ok(Flow::Continue)
    }

    fn remove_previous(&self, action: &mut Action) -> Result<Flow, GovmError> {
        self.host.remove_dir(&action.go_dir()).map_err(|e| {
            fail(
                Step::RemovePrevious,
                "Removing previous installation",
                e,
                Fault::RemovePrevious,
            )
        })?;
        Ok(Flow::Continue)
    }

    fn extract(&self, action: &mut Action) -> Result<Flow, GovmError> {
        let archive = action.download_file(&self.platform);
        let target = action.govm_dir();

        self.host.create_dir(&target).map_err(|e| {
            fail(
                Step::Extract,
                "Creating installation directory",
                e,
                Fault::Extract(ExtractFault::CreateDir),
            )
        })?;

        self.host.untar(&archive, &target).map_err(|e| {
            fail(
                Step::Extract,
                "Extracting archive",
                e,
                Fault::Extract(ExtractFault::Unpack),
            )
        })?;

        if let Err(e) = self.host.remove_file(&archive) {
            tracing::warn!("Could not remove {}: {}", archive.display(), e);
        }
        Ok(Flow::Continue)
    }

    fn locate_installation(&self, action: &mut Action) -> Result<Flow, GovmError> {
        match self.host.stat(&action.go_dir()) {
            Ok(EntryKind::Directory) => Ok(Flow::Continue),
            Ok(kind) => Err(fail(
                Step::LocateInstallation,
                "Installation path is not a directory",
                format!("{} is {:?}", action.go_dir().display(), kind),
                Fault::Locate(LocateFault::NotDirectory),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(GovmError::NoInstallationFound),
            Err(e) => Err(fail(
                Step::LocateInstallation,
                "Checking installation directory",
                e,
                Fault::Locate(LocateFault::Stat),
            )),
        }
    }

    fn remove_installation(&self, action: &mut Action) -> Result<Flow, GovmError> {
        self.host.remove_dir(&action.go_dir()).map_err(|e| {
            fail(
                Step::RemoveInstallation,
                "Removing installation",
                e,
                Fault::RemoveInstallation,
            )
        })?;
        Ok(Flow::Continue)
    }

    /// Adds or removes the export block in the user's rc files.
    ///
    /// A PATH that already reflects the desired state short-circuits. A known
    /// `$SHELL` edits only its own rc file; otherwise every known rc file is
    /// tried and the step fails only if none could be edited.
    fn update_path(&self, action: &mut Action, edit: RcEdit) -> Result<Flow, GovmError> {
        let bin_dir = action.go_bin_dir().display().to_string();
        let on_path = self.host.get_env("PATH").contains(&bin_dir);
        match edit {
            RcEdit::Add if on_path => {
                tracing::info!("go is already in PATH");
                return Ok(Flow::Continue);
            }
            RcEdit::Remove if !on_path => {
                tracing::info!("go is already removed from PATH");
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        let shell = self.host.get_env("SHELL");
        if let Some(rc) = shell::rc_file_for(&shell) {
            self.edit_rc_file(action, rc, edit).map_err(|(fault, e)| {
                fail(edit.step(), "Editing rc file", e, edit.fault(fault))
            })?;
            return Ok(Flow::Continue);
        }

        tracing::debug!("Shell '{}' not recognised, trying every known rc file", shell);
        let mut edited = 0;
        for (shell, rc) in SHELL_RC_FILES {
            match self.edit_rc_file(action, rc, edit) {
                Ok(()) => edited += 1,
                Err((fault, e)) => {
                    tracing::debug!(fault = ?fault, error = %e, "Skipped {} for {}", rc, shell)
                }
            }
        }

        if edited == 0 {
            return Err(fail(
                edit.step(),
                "No shell rc file found",
                format!("tried {} entries", SHELL_RC_FILES.len()),
                edit.fault(RcFault::NoShellsFound),
            ));
        }
        Ok(Flow::Continue)
    }

    /// Applies `edit` to one rc file. Failures carry the stage that failed
    /// so the caller decides whether they are fatal.
    fn edit_rc_file(&self, action: &Action, rc: &str, edit: RcEdit) -> Result<(), (RcFault, io::Error)> {
        let path = action.home_dir.join(rc);

        self.host.stat(&path).map_err(|e| (RcFault::Stat, e))?;
        let content = self.host.read_file(&path).map_err(|e| (RcFault::Read, e))?;

        let updated = edit.apply(&content, action);
        self.host
            .write_file(&path, &updated)
            .map_err(|e| (RcFault::Write, e))?;

        tracing::info!("Updated {}", path.display());
        Ok(())
    }
}
