//! In-memory stand-ins for the catalog and the host, shared by unit tests.

use crate::catalog::{Catalog, CatalogError};
use crate::checksum::sha256_hex;
use crate::host::{EntryKind, Host};
use crate::types::{Action, PlatformInfo, Release, ReleaseFile};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const HOME: &str = "/home/gopher";

pub fn linux() -> PlatformInfo {
    PlatformInfo {
        os: "linux".to_string(),
        arch: "amd64".to_string(),
    }
}

pub fn release(version: &str, archive: &[u8]) -> Release {
    Release {
        version: version.to_string(),
        stable: true,
        files: vec![ReleaseFile {
            filename: format!("{}.linux-amd64.tar.gz", version),
            os: "linux".to_string(),
            arch: "amd64".to_string(),
            kind: "archive".to_string(),
            sha256: sha256_hex(&mut &archive[..]).unwrap(),
        }],
    }
}

pub fn io_error(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, what.to_string())
}

pub struct FakeCatalog {
    pub releases: Vec<Release>,
    pub archive: Vec<u8>,
    pub checksum_override: Option<String>,
    pub failing: HashSet<&'static str>,
    pub calls: RefCell<Vec<&'static str>>,
}

impl FakeCatalog {
    pub fn new(versions: &[&str]) -> Self {
        let archive = b"not really a tarball".to_vec();
        Self {
            releases: versions.iter().map(|v| release(v, &archive)).collect(),
            archive,
            checksum_override: None,
            failing: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_archive(mut self, archive: Vec<u8>) -> Self {
        let versions: Vec<String> = self.releases.iter().map(|r| r.version.clone()).collect();
        self.releases = versions.iter().map(|v| release(v, &archive)).collect();
        self.archive = archive;
        self
    }

    pub fn failing(mut self, call: &'static str) -> Self {
        self.failing.insert(call);
        self
    }

    fn record(&self, call: &'static str) -> Result<(), CatalogError> {
        self.calls.borrow_mut().push(call);
        if self.failing.contains(call) {
            return Err(CatalogError::Io(io_error(call)));
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl Catalog for FakeCatalog {
    async fn versions(&self) -> Result<Vec<Release>, CatalogError> {
        self.record("versions")?;
        Ok(self.releases.clone())
    }

    async fn checksum(&self, version: &str) -> Result<String, CatalogError> {
        self.record("checksum")?;
        if let Some(checksum) = &self.checksum_override {
            return Ok(checksum.clone());
        }
        self.releases
            .iter()
            .find(|r| r.version == version)
            .map(|r| r.files[0].sha256.clone())
            .ok_or_else(|| CatalogError::NotFound {
                version: version.to_string(),
            })
    }

    async fn version_exists(&self, version: &str) -> Result<bool, CatalogError> {
        self.record("version_exists")?;
        Ok(self.releases.iter().any(|r| r.version == version))
    }

    async fn download_version(&self, _action: &Action, sink: &mut dyn Write) -> Result<(), CatalogError> {
        self.record("download_version")?;
        sink.write_all(&self.archive)?;
        Ok(())
    }
}

pub type Files = Rc<RefCell<HashMap<PathBuf, Vec<u8>>>>;

pub struct FakeFile {
    files: Files,
    path: PathBuf,
}

impl Write for FakeFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.files
            .borrow_mut()
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reader whose every read fails, as a truncated or vanished download would.
struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "broken read"))
    }
}

/// In-memory host. Every call is recorded by name; names listed in
/// `failing` return an error, and `failing_at` pairs fail only for that path.
pub struct FakeHost {
    pub env: HashMap<String, String>,
    pub files: Files,
    pub dirs: RefCell<HashSet<PathBuf>>,
    pub installed: String,
    pub failing: HashSet<&'static str>,
    pub failing_at: HashSet<(&'static str, PathBuf)>,
    pub broken_reader: bool,
    pub calls: RefCell<Vec<&'static str>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            env: HashMap::new(),
            files: Rc::new(RefCell::new(HashMap::new())),
            dirs: RefCell::new(HashSet::new()),
            installed: String::new(),
            failing: HashSet::new(),
            failing_at: HashSet::new(),
            broken_reader: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn file(self, path: &str, content: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(PathBuf::from(path), content.as_bytes().to_vec());
        self
    }

    pub fn dir(self, path: &str) -> Self {
        self.dirs.borrow_mut().insert(PathBuf::from(path));
        self
    }

    pub fn installed(mut self, version: &str) -> Self {
        self.installed = version.to_string();
        self
    }

    pub fn failing(mut self, call: &'static str) -> Self {
        self.failing.insert(call);
        self
    }

    pub fn failing_at(mut self, call: &'static str, path: &str) -> Self {
        self.failing_at.insert((call, PathBuf::from(path)));
        self
    }

    /// Opened files hand out a reader that fails on the first read.
    pub fn broken_reader(mut self) -> Self {
        self.broken_reader = true;
        self
    }

    fn record(&self, call: &'static str) -> io::Result<()> {
        self.calls.borrow_mut().push(call);
        if self.failing.contains(call) {
            return Err(io_error(call));
        }
        Ok(())
    }

    fn record_at(&self, call: &'static str, path: &Path) -> io::Result<()> {
        self.record(call)?;
        if self.failing_at.contains(&(call, path.to_path_buf())) {
            return Err(io_error(call));
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn mutations(&self) -> Vec<&'static str> {
        const MUTATING: &[&str] = &[
            "create_dir",
            "remove_dir",
            "create_file",
            "write_file",
            "remove_file",
            "untar",
        ];
        self.calls()
            .into_iter()
            .filter(|c| MUTATING.contains(c))
            .collect()
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files
            .borrow()
            .get(Path::new(path))
            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
    }
}

impl Host for FakeHost {
    fn home_dir(&self) -> io::Result<PathBuf> {
        self.record("home_dir")?;
        Ok(PathBuf::from(HOME))
    }

    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        self.record_at("stat", path)?;
        if self.dirs.borrow().contains(path) {
            Ok(EntryKind::Directory)
        } else if self.files.borrow().contains_key(path) {
            Ok(EntryKind::File)
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "missing"))
        }
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        self.record("create_dir")?;
        self.dirs.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.record("remove_dir")?;
        self.dirs.borrow_mut().retain(|d| !d.starts_with(path));
        self.files.borrow_mut().retain(|f, _| !f.starts_with(path));
        Ok(())
    }

    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        self.record("create_file")?;
        self.files.borrow_mut().insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(FakeFile {
            files: Rc::clone(&self.files),
            path: path.to_path_buf(),
        }))
    }

    fn open_file(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        self.record_at("open_file", path)?;
        if self.broken_reader {
            return Ok(Box::new(BrokenReader));
        }
        let bytes = self
            .files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))?;
        Ok(Box::new(io::Cursor::new(bytes)))
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.record_at("read_file", path)?;
        self.files
            .borrow()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
    }

    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.record_at("write_file", path)?;
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.as_bytes().to_vec());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.record("remove_file")?;
        self.files
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
    }

    fn get_env(&self, key: &str) -> String {
        self.env.get(key).cloned().unwrap_or_default()
    }

    fn untar(&self, _source: &Path, target: &Path) -> io::Result<()> {
        self.record("untar")?;
        self.dirs.borrow_mut().insert(target.join("go"));
        Ok(())
    }

    fn installed_version(&self) -> io::Result<String> {
        self.record("installed_version")?;
        Ok(self.installed.clone())
    }
}

