use std::path::PathBuf;

use crate::config::PathFinderConfig;
use crate::error::{PathFinderError, Result};
use crate::identity::Identity;
use crate::namespace::NamespacePath;

/// Every location touched by one mount or unmount request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPlan {
    /// Directory on the replica storage holding the file.
    pub source_path: PathBuf,
    pub file_name: String,
    /// Per-user root of the remapped views, e.g. `~/.binds`.
    pub remap_root: PathBuf,
    /// Where the remapped view of `source_path` is mounted.
    pub remap_target: PathBuf,
    pub projects_dir: PathBuf,
    /// The user-visible file the data ends up bound onto.
    pub project_file: PathBuf,
}

impl MountPlan {
    /// The file inside the remapped view that gets bound onto `project_file`.
    pub fn bind_source(&self) -> PathBuf {
        self.remap_target.join(&self.file_name)
    }
}

/// Derives the mount locations for `path` on behalf of `identity`.
///
/// `group` is the scope the caller is authorized for; the namespace of
/// `path` has to equal it.
pub fn plan(
    config: &PathFinderConfig,
    identity: &Identity,
    path: &NamespacePath,
    group: &str,
) -> Result<MountPlan> {
    if path.segments().len() < 2 {
        return Err(PathFinderError::invalid_path(
            path.to_string(),
            "must include at least a group and a file, like group/path/to/filename",
        ));
    }
    if path.namespace() != group {
        return Err(PathFinderError::NamespaceMismatch {
            group: group.to_string(),
            namespace: path.namespace().to_string(),
        });
    }

    let file_name = path.file_name().to_string();
    let home = config.home_of(&identity.name);
    let remap_root = home.join(&config.private_mounts_dir);
    let remap_target = remap_root.join(strip_extension(&file_name));
    let projects_dir = home.join(&config.projects_dir);
    let project_file = projects_dir.join(&file_name);
    let source_path = config.storage_root.join(path.directory());

    Ok(MountPlan {
        source_path,
        file_name,
        remap_root,
        remap_target,
        projects_dir,
        project_file,
    })
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}
