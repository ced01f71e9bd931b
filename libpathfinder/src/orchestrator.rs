use std::fs;
use std::io;
use std::path::Path;

use crate::config::PathFinderConfig;
use crate::error::{PathFinderError, Result};
use crate::fsutil;
use crate::identity::Identity;
use crate::lock::TargetLock;
use crate::planner::MountPlan;
use crate::tools::MountTools;

const REMAP_TARGET_MODE: u32 = 0o700;
const PROJECT_FILE_MODE: u32 = 0o600;

/// Warnings collected while tearing a mount down.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnmountReport {
    pub warnings: Vec<String>,
}

impl UnmountReport {
    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Drives the two-stage mount (bindfs view, then bind mount onto the
/// project file) and its teardown.
///
/// Whether something is mounted is always asked of `tools`; nothing here
/// remembers mount state between calls.
pub struct BindMountOrchestrator<T: MountTools> {
    config: PathFinderConfig,
    tools: T,
}

impl<T: MountTools> BindMountOrchestrator<T> {
    pub fn new(config: PathFinderConfig, tools: T) -> Self {
        Self { config, tools }
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    pub fn mount(&self, plan: &MountPlan, identity: &Identity) -> Result<()> {
        let _lock = TargetLock::acquire(&self.config.lock_dir, &plan.remap_target)?;

        self.check_no_cyclic_mount(plan)?;
        for path in [
            &plan.remap_root,
            &plan.remap_target,
            &plan.projects_dir,
            &plan.project_file,
        ] {
            fsutil::reject_symlink(path)?;
        }
        self.create_mount_paths(plan)?;
        self.apply_ownership(plan, identity)?;

        tracing::debug!(
            "mounting {} onto {} as {}",
            plan.source_path.display(),
            plan.remap_target.display(),
            identity.name
        );
        self.tools
            .remap_mount(&plan.source_path, &plan.remap_target, identity)?;

        let bind_source = plan.bind_source();
        tracing::debug!(
            "binding {} onto {}",
            bind_source.display(),
            plan.project_file.display()
        );
        if let Err(e) = self.tools.bind_mount(&bind_source, &plan.project_file) {
            // Nothing is bound on top of the view; do not leave it behind.
            if let Err(rollback) = self.tools.unmount(&plan.remap_target) {
                tracing::error!(
                    "failed to roll back mount at {}: {rollback}",
                    plan.remap_target.display()
                );
            }
            return Err(e);
        }

        if !self.tools.is_mountpoint(&plan.project_file)? {
            return Err(PathFinderError::VerificationFailed {
                file_name: plan.file_name.clone(),
                project_file: plan.project_file.clone(),
            });
        }

        tracing::info!(
            "{} is mounted at {}",
            plan.file_name,
            plan.project_file.display()
        );
        Ok(())
    }

    /// Tears down whatever is left of a mount. Never stops early: every
    /// failure is downgraded to a warning in the returned report.
    pub fn unmount(&self, plan: &MountPlan) -> Result<UnmountReport> {
        let _lock = TargetLock::acquire(&self.config.lock_dir, &plan.remap_target)?;
        let mut report = UnmountReport::default();

        for target in [&plan.project_file, &plan.remap_target] {
            if let Err(e) = self.tools.unmount(target) {
                report.warn(format!("Failed to unmount {}: {e}", target.display()));
            }
        }

        self.remove_if_unmounted(&plan.remap_target, &mut report, |p| fs::remove_dir_all(p));
        self.remove_if_unmounted(&plan.project_file, &mut report, |p| fs::remove_file(p));

        tracing::info!(
            "unmounted {} from {} ({} warnings)",
            plan.file_name,
            plan.project_file.display(),
            report.warnings.len()
        );
        Ok(report)
    }

    fn check_no_cyclic_mount(&self, plan: &MountPlan) -> Result<()> {
        let parent = plan.remap_target.parent().unwrap_or(&plan.remap_root);
        for path in [parent, plan.remap_target.as_path()] {
            if self.tools.is_mountpoint(path)? {
                return Err(PathFinderError::CyclicMount(path.to_path_buf()));
            }
        }
        Ok(())
    }

    /// Removes a leftover mount point, but only once both the mount tool and
    /// the kernel agree nothing is mounted on it. A view that is still live
    /// would otherwise have the replica data deleted through it.
    fn remove_if_unmounted(
        &self,
        path: &Path,
        report: &mut UnmountReport,
        remove: fn(&Path) -> io::Result<()>,
    ) {
        if fs::symlink_metadata(path).is_err() {
            return;
        }
        match self.is_still_mounted(path) {
            Ok(false) => {
                if let Err(e) = remove(path) {
                    report.warn(format!("Failed to remove {}: {e}", path.display()));
                }
            }
            Ok(true) => report.warn(format!(
                "{} is still mounted; leaving it in place",
                path.display()
            )),
            Err(e) => report.warn(format!(
                "Could not check whether {} is mounted ({e}); leaving it in place",
                path.display()
            )),
        }
    }

    fn is_still_mounted(&self, path: &Path) -> Result<bool> {
        Ok(self.tools.is_mountpoint(path)? || fsutil::is_mount_root(path)?)
    }

    fn create_mount_paths(&self, plan: &MountPlan) -> Result<()> {
        fsutil::create_dir_all(&plan.remap_target)?;
        fsutil::create_dir_all(&plan.projects_dir)?;
        fsutil::touch(&plan.project_file)
    }

    fn apply_ownership(&self, plan: &MountPlan, identity: &Identity) -> Result<()> {
        fsutil::set_owner_recursive(&plan.remap_root, identity.uid, identity.gid)?;
        fsutil::set_mode(&plan.remap_target, REMAP_TARGET_MODE)?;

        fsutil::set_owner(&plan.projects_dir, identity.uid, identity.gid)?;
        fsutil::set_owner(&plan.project_file, identity.uid, identity.gid)?;
        fsutil::set_mode(&plan.project_file, PROJECT_FILE_MODE)
    }
}
