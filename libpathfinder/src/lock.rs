use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};

use crate::error::{PathFinderError, Result};

/// Exclusive advisory lock serialising mount and unmount of one target.
///
/// The cycle check probes the mount table before mounting; holding this
/// lock across probe and mount keeps two invocations for the same target
/// from both passing the probe. Released on drop.
pub struct TargetLock {
    path: PathBuf,
    _flock: Flock<File>,
}

impl TargetLock {
    /// Blocks until the lock for `target` is held.
    pub fn acquire(lock_dir: &Path, target: &Path) -> Result<Self> {
        fs::create_dir_all(lock_dir)
            .map_err(|e| PathFinderError::io("create lock directory", lock_dir, e))?;

        let path = lock_dir.join(lock_file_name(target));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| PathFinderError::io("open lock file", &path, e))?;

        tracing::debug!("waiting for lock {}", path.display());
        let flock = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, source)| {
            PathFinderError::Lock {
                path: path.clone(),
                source,
            }
        })?;
        Ok(Self {
            path,
            _flock: flock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// NAME_MAX on Linux filesystems.
const MAX_FILE_NAME: usize = 255;

/// Maps `target` to a distinct single file name, e.g.
/// `/home/alice/.binds/f` -> `%2Fhome%2Falice%2F.binds%2Ff.lock`.
///
/// Names too long for the filesystem use a digest of the path instead. An
/// escaped name never contains `%h`, so the two forms cannot collide.
fn lock_file_name(target: &Path) -> String {
    let raw = target.to_string_lossy();
    let name = format!("{}.lock", raw.replace('%', "%25").replace('/', "%2F"));
    if name.len() <= MAX_FILE_NAME {
        return name;
    }
    format!("%h{}.lock", sha256::digest(raw.to_string()))
}
