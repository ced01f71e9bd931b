use std::fs::{self, File, OpenOptions, Permissions};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt, lchown};
use std::path::Path;

use nix::fcntl::OFlag;
use nix::unistd::{Gid, Uid};
use walkdir::{DirEntry, WalkDir};

use crate::error::{PathFinderError, Result};

// These run as root on paths inside a user's home. Apart from
// `create_dir_all`, which callers guard with `reject_symlink`, none of them
// follows a symlink in the last component.

pub(crate) fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| PathFinderError::io("create directory", path, e))
}

/// Fails with `InvalidPath` if `path` exists and is a symbolic link.
pub(crate) fn reject_symlink(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Err(PathFinderError::invalid_path(
            path.display().to_string(),
            "is a symbolic link; refusing to follow it",
        )),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PathFinderError::io("inspect", path, e)),
    }
}

fn open_nofollow(options: &mut OpenOptions, path: &Path, op: &'static str) -> Result<File> {
    options
        .custom_flags(OFlag::O_NOFOLLOW.bits())
        .open(path)
        .map_err(|e| PathFinderError::io(op, path, e))
}

/// Creates `path` if it is missing; an existing file is left untouched.
pub(crate) fn touch(path: &Path) -> Result<()> {
    open_nofollow(
        OpenOptions::new().create(true).append(true),
        path,
        "create file",
    )
    .map(drop)
}

pub(crate) fn set_owner(path: &Path, uid: Uid, gid: Gid) -> Result<()> {
    lchown(path, Some(uid.as_raw()), Some(gid.as_raw()))
        .map_err(|e| PathFinderError::io("change owner of", path, e))
}

/// Changes the owner of `root` and everything below it.
///
/// Symlinks are not followed. Entries on another device than `root`, which
/// includes the root directory of any view mounted below it, are skipped
/// along with their contents.
pub(crate) fn set_owner_recursive(root: &Path, uid: Uid, gid: Gid) -> Result<()> {
    let root_dev = fs::symlink_metadata(root)
        .map_err(|e| PathFinderError::io("walk", root, e))?
        .dev();
    chown_device_tree(root, root_dev, uid, gid)
}

fn chown_device_tree(root: &Path, root_dev: u64, uid: Uid, gid: Gid) -> Result<()> {
    let walker = WalkDir::new(root)
        .same_file_system(true)
        .into_iter()
        .filter_entry(|entry| on_device(entry, root_dev));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            PathFinderError::io("walk", path, e.into())
        })?;
        set_owner(entry.path(), uid, gid)?;
    }
    Ok(())
}

fn on_device(entry: &DirEntry, dev: u64) -> bool {
    match entry.metadata() {
        Ok(meta) if meta.dev() == dev => true,
        Ok(_) => {
            tracing::debug!("skipping {}: separate mount", entry.path().display());
            false
        }
        // keep it so the walk reports the error
        Err(_) => true,
    }
}

/// Sets the permission bits through a handle opened without following a
/// final symlink.
pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<()> {
    let file = open_nofollow(OpenOptions::new().read(true), path, "open")?;
    file.set_permissions(Permissions::from_mode(mode))
        .map_err(|e| PathFinderError::io("change permissions of", path, e))
}

/// Whether `path` sits on another device than its parent directory, i.e.
/// is the root of a mount. Answered by the kernel, independent of any tool.
pub(crate) fn is_mount_root(path: &Path) -> Result<bool> {
    let Some(parent) = path.parent() else {
        return Ok(true);
    };
    let dev = fs::symlink_metadata(path)
        .map_err(|e| PathFinderError::io("inspect", path, e))?
        .dev();
    let parent_dev = fs::metadata(parent)
        .map_err(|e| PathFinderError::io("inspect", parent, e))?
        .dev();
    Ok(dev != parent_dev)
}
