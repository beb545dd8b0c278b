//! Local filesystem and process primitives.
//!
//! Each [`Host`] method is one failable operation so the pipeline can map a
//! failure to the exact step that hit it.

use crate::config::{APP_DIR_NAME, TOOLCHAIN_DIR_NAME};
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tar::Archive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

pub trait Host {
    fn home_dir(&self) -> io::Result<PathBuf>;

    fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Creates `path` and any missing parents.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Removes `path` recursively. A missing directory is not an error.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write>>;

    fn open_file(&self, path: &Path) -> io::Result<Box<dyn Read>>;

    fn read_file(&self, path: &Path) -> io::Result<String>;

    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Empty string when unset.
    fn get_env(&self, key: &str) -> String;

    /// Unpacks a gzip-compressed tarball into `target`.
    fn untar(&self, source: &Path, target: &Path) -> io::Result<()>;

    /// Version reported by `go version`, e.g. `go1.22.1`. Empty when no go
    /// binary can be found.
    fn installed_version(&self) -> io::Result<String>;
}

pub struct LocalHost {
    home: Option<PathBuf>,
    #[cfg(test)]
    env: Option<std::collections::HashMap<String, String>>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self {
            home: None,
            #[cfg(test)]
            env: None,
        }
    }

    /// Pins the home directory instead of asking the OS.
    pub fn with_home(home: Option<PathBuf>) -> Self {
        Self {
            home,
            ..Self::new()
        }
    }

    #[cfg(test)]
    pub fn with_env(mut self, vars: &[(&str, &str)]) -> Self {
        self.env = Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// Prefers the toolchain govm manages over whatever `go` is on PATH.
    fn go_binary(&self) -> PathBuf {
        if let Ok(home) = self.home_dir() {
            let managed = home
                .join(APP_DIR_NAME)
                .join(TOOLCHAIN_DIR_NAME)
                .join("bin")
                .join(if cfg!(windows) { "go.exe" } else { "go" });
            if managed.is_file() {
                return managed;
            }
        }
        PathBuf::from("go")
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Third whitespace-separated token of `go version` output.
pub fn parse_go_version_output(output: &str) -> Option<&str> {
    output.split_whitespace().nth(2)
}

impl Host for LocalHost {
    fn home_dir(&self) -> io::Result<PathBuf> {
        match &self.home {
            Some(home) => Ok(home.clone()),
            None => dirs::home_dir()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "home directory not found")),
        }
    }

    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = fs::metadata(path)?;
        Ok(if metadata.is_dir() {
            EntryKind::Directory
        } else if metadata.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        })
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        Ok(Box::new(io::BufWriter::new(fs::File::create(path)?)))
    }

    fn open_file(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(fs::File::open(path)?))
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn get_env(&self, key: &str) -> String {
        #[cfg(test)]
        {
            if let Some(env) = &self.env {
                return env.get(key).cloned().unwrap_or_default();
            }
        }
        std::env::var(key).unwrap_or_default()
    }

    fn untar(&self, source: &Path, target: &Path) -> io::Result<()> {
        let file = fs::File::open(source)?;
        let mut archive = Archive::new(GzDecoder::new(file));
        archive.set_preserve_permissions(true);
        archive.unpack(target)
    }

    fn installed_version(&self) -> io::Result<String> {
        let binary = self.go_binary();
        let output = match Command::new(&binary).arg("version").output() {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No go binary found at {}", binary.display());
                return Ok(String::new());
            }
            Err(e) => return Err(e),
        };

        if !output.status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} version exited with {}", binary.display(), output.status),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_go_version_output(&stdout)
            .map(str::to_string)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unexpected go version output: {}", stdout.trim()),
                )
            })
    }
}
