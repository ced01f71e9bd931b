use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::ToolsConfig;
use crate::error::{PathFinderError, Result};
use crate::identity::Identity;

/// The external mount primitives the orchestrator drives.
///
/// Mount state is never cached behind this trait: `is_mountpoint` asks the
/// system every time.
pub trait MountTools {
    /// Errors when the question could not be answered; callers must not
    /// read that as "not mounted".
    fn is_mountpoint(&self, path: &Path) -> Result<bool>;

    /// Mounts `source` onto `target` through bindfs, presenting every entry
    /// as owned by `identity` with owner-only permissions.
    fn remap_mount(&self, source: &Path, target: &Path, identity: &Identity) -> Result<()>;

    fn bind_mount(&self, source: &Path, target: &Path) -> Result<()>;

    fn unmount(&self, target: &Path) -> Result<()>;
}

/// Runs the configured binaries (`mountpoint`, `bindfs`, `mount`, `umount`).
#[derive(Debug, Clone, Default)]
pub struct SystemTools {
    tools: ToolsConfig,
}

impl SystemTools {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    fn run(&self, program: &str, args: Vec<OsString>) -> Result<()> {
        tracing::debug!("running {program} {args:?}");
        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PathFinderError::ToolSpawn {
                tool: program.to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }
        Err(PathFinderError::ToolFailed {
            tool: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

pub(crate) fn remap_mount_args(source: &Path, target: &Path, identity: &Identity) -> Vec<OsString> {
    vec![
        OsString::from("--perms=0700"),
        OsString::from(format!("--force-user={}", identity.name)),
        OsString::from(format!("--force-group={}", identity.group)),
        source.as_os_str().to_owned(),
        target.as_os_str().to_owned(),
    ]
}

pub(crate) fn bind_mount_args(source: &Path, target: &Path) -> Vec<OsString> {
    vec![
        OsString::from("--bind"),
        source.as_os_str().to_owned(),
        target.as_os_str().to_owned(),
    ]
}

impl MountTools for SystemTools {
    fn is_mountpoint(&self, path: &Path) -> Result<bool> {
        let status = Command::new(&self.tools.mountpoint)
            .arg("-q")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| PathFinderError::ToolSpawn {
                tool: self.tools.mountpoint.clone(),
                source,
            })?;
        match status.code() {
            Some(code) => Ok(code == 0),
            // killed by a signal: no answer at all
            None => Err(PathFinderError::ToolFailed {
                tool: self.tools.mountpoint.clone(),
                status,
                stderr: String::new(),
            }),
        }
    }

    fn remap_mount(&self, source: &Path, target: &Path, identity: &Identity) -> Result<()> {
        self.run(&self.tools.bindfs, remap_mount_args(source, target, identity))
    }

    fn bind_mount(&self, source: &Path, target: &Path) -> Result<()> {
        self.run(&self.tools.mount, bind_mount_args(source, target))
    }

    fn unmount(&self, target: &Path) -> Result<()> {
        self.run(&self.tools.umount, vec![target.as_os_str().to_owned()])
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use nix::unistd::{Gid, Uid};
    use tempfile::tempdir;

    use super::*;

    fn bob() -> Identity {
        Identity {
            name: String::from("bob"),
            uid: Uid::from_raw(1002),
            gid: Gid::from_raw(100),
            group: String::from("users"),
        }
    }

    #[test]
    fn test_remap_mount_args() {
        let args = remap_mount_args(
            Path::new("/skadata/daac/a"),
            Path::new("/home/bob/.binds/f"),
            &bob(),
        );
        assert_eq!(
            args,
            [
                "--perms=0700",
                "--force-user=bob",
                "--force-group=users",
                "/skadata/daac/a",
                "/home/bob/.binds/f",
            ]
            .map(OsString::from)
        );
    }

    #[test]
    fn test_bind_mount_args() {
        let args = bind_mount_args(
            Path::new("/home/bob/.binds/f/f.fits"),
            Path::new("/home/bob/projects/f.fits"),
        );
        assert_eq!(
            args,
            ["--bind", "/home/bob/.binds/f/f.fits", "/home/bob/projects/f.fits"].map(OsString::from)
        );
    }

    #[test]
    fn test_failed_tool_reports_stderr() {
        let tools = SystemTools::new(ToolsConfig {
            umount: String::from("sh"),
            ..Default::default()
        });
        // `sh <missing file>` exits non-zero with a diagnostic on stderr.
        let err = tools
            .unmount(Path::new("/nonexistent/pathfinder-script"))
            .unwrap_err();
        match err {
            PathFinderError::ToolFailed { tool, status, stderr } => {
                assert_eq!(tool, "sh");
                assert!(!status.success());
                assert!(!stderr.is_empty());
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_tool_is_spawn_error() {
        let tools = SystemTools::new(ToolsConfig {
            bindfs: String::from("/nonexistent/bindfs"),
            ..Default::default()
        });
        let err = tools
            .remap_mount(Path::new("/a"), Path::new("/b"), &bob())
            .unwrap_err();
        assert!(matches!(err, PathFinderError::ToolSpawn { .. }));
    }

    #[test]
    fn test_plain_directory_is_not_a_mountpoint() {
        let tmp_dir = tempdir().unwrap();
        let tools = SystemTools::default();
        assert!(!tools.is_mountpoint(tmp_dir.path()).unwrap());
        assert!(
            !tools
                .is_mountpoint(&PathBuf::from("/nonexistent/pathfinder"))
                .unwrap()
        );
    }

    #[test]
    fn test_missing_query_tool_is_an_error() {
        let tmp_dir = tempdir().unwrap();
        let tools = SystemTools::new(ToolsConfig {
            mountpoint: String::from("/nonexistent/mountpoint"),
            ..Default::default()
        });
        let err = tools.is_mountpoint(tmp_dir.path()).unwrap_err();
        assert!(matches!(err, PathFinderError::ToolSpawn { ref tool, .. } if tool == "/nonexistent/mountpoint"));
    }
}
