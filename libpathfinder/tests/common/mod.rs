use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use libpathfinder::{
    BindMountOrchestrator, Identity, MountPlan, MountTools, NamespacePath, PathFinderConfig,
    PathFinderError,
};
use tempfile::TempDir;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RemapMount {
        source: PathBuf,
        target: PathBuf,
        user: String,
        group: String,
    },
    BindMount {
        source: PathBuf,
        target: PathBuf,
    },
    Unmount(PathBuf),
}

/// In-memory stand-in for the kernel mount table and the mount binaries.
#[derive(Default)]
pub struct FakeTools {
    pub mounted: RefCell<BTreeSet<PathBuf>>,
    pub calls: RefCell<Vec<Call>>,
    pub fail_remap: bool,
    pub fail_bind: bool,
    /// `mount --bind` reports success without anything getting mounted.
    pub silent_bind: bool,
    /// Paths whose unmount fails with "target is busy".
    pub busy: BTreeSet<PathBuf>,
    /// Paths for which the mount-point query cannot be run.
    pub failing_queries: RefCell<BTreeSet<PathBuf>>,
}

fn tool_failed(tool: &str, stderr: &str) -> PathFinderError {
    PathFinderError::ToolFailed {
        tool: tool.to_string(),
        status: ExitStatus::from_raw(1 << 8),
        stderr: stderr.to_string(),
    }
}

#[allow(dead_code)]
impl FakeTools {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn mounted(&self) -> BTreeSet<PathBuf> {
        self.mounted.borrow().clone()
    }

    pub fn force_mounted(&self, path: impl Into<PathBuf>) {
        self.mounted.borrow_mut().insert(path.into());
    }

    pub fn fail_query(&self, path: impl Into<PathBuf>) {
        self.failing_queries.borrow_mut().insert(path.into());
    }
}

impl MountTools for FakeTools {
    fn is_mountpoint(&self, path: &Path) -> libpathfinder::Result<bool> {
        if self.failing_queries.borrow().contains(path) {
            return Err(PathFinderError::ToolSpawn {
                tool: String::from("mountpoint"),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        Ok(self.mounted.borrow().contains(path))
    }

    fn remap_mount(
        &self,
        source: &Path,
        target: &Path,
        identity: &Identity,
    ) -> libpathfinder::Result<()> {
        self.calls.borrow_mut().push(Call::RemapMount {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            user: identity.name.clone(),
            group: identity.group.clone(),
        });
        if self.fail_remap {
            return Err(tool_failed("bindfs", "fuse: device not found"));
        }
        if !source.is_dir() {
            return Err(tool_failed("bindfs", "source directory does not exist"));
        }
        if !target.is_dir() {
            return Err(tool_failed("bindfs", "mount point does not exist"));
        }
        self.mounted.borrow_mut().insert(target.to_path_buf());
        Ok(())
    }

    fn bind_mount(&self, source: &Path, target: &Path) -> libpathfinder::Result<()> {
        self.calls.borrow_mut().push(Call::BindMount {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
        });
        if self.fail_bind {
            return Err(tool_failed("mount", "special device does not exist"));
        }
        if !self.silent_bind {
            self.mounted.borrow_mut().insert(target.to_path_buf());
        }
        Ok(())
    }

    fn unmount(&self, target: &Path) -> libpathfinder::Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::Unmount(target.to_path_buf()));
        if self.busy.contains(target) {
            return Err(tool_failed("umount", "target is busy"));
        }
        if !self.mounted.borrow_mut().remove(target) {
            return Err(tool_failed("umount", "not mounted"));
        }
        Ok(())
    }
}

/// Temporary home, storage and lock roots, with one replica file at
/// `<storage>/daac/a/f.fits`.
pub struct Fixture {
    pub root: TempDir,
    pub config: PathFinderConfig,
    pub identity: Identity,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let config = PathFinderConfig {
            home_root: root.path().join("home"),
            storage_root: root.path().join("skadata"),
            lock_dir: root.path().join("locks"),
            ..Default::default()
        };
        let data_dir = config.storage_root.join("daac/a");
        fs::create_dir_all(&data_dir).unwrap();
        fs::write(data_dir.join("f.fits"), b"SIMPLE  =                    T").unwrap();

        Fixture {
            root,
            config,
            identity: Identity::current().unwrap(),
        }
    }

    pub fn plan(&self, replica_path: &str, group: &str) -> libpathfinder::Result<MountPlan> {
        let path = NamespacePath::parse(replica_path)?;
        libpathfinder::plan(&self.config, &self.identity, &path, group)
    }

    pub fn orchestrator(&self, tools: FakeTools) -> BindMountOrchestrator<FakeTools> {
        BindMountOrchestrator::new(self.config.clone(), tools)
    }

    pub fn home(&self) -> PathBuf {
        self.config.home_of(&self.identity.name)
    }

    /// Every entry below the fixture root with its permission bits.
    pub fn snapshot(&self) -> Vec<(PathBuf, u32)> {
        WalkDir::new(self.root.path())
            .sort_by_file_name()
            .into_iter()
            .map(|entry| {
                let entry = entry.unwrap();
                let mode = entry.metadata().unwrap().permissions().mode();
                (entry.path().to_path_buf(), mode)
            })
            .collect()
    }
}
