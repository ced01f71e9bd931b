use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

static HOME_ROOT: &str = "/home";
static STORAGE_ROOT: &str = "/skadata";
static PRIVATE_MOUNTS_DIR: &str = ".binds";
static PROJECTS_DIR: &str = "projects";
static IDENTITY_ENV: &str = "SUDO_USER";
static LOCK_DIR: &str = "/run/pathfinder";
static DATA_MANAGEMENT_URL: &str = "https://data-management.srcnet.skao.int/api/v1";

/// Settings shared by the planner and the orchestrator.
///
/// Everything that used to come from the process environment lives here so
/// the planner stays a pure function of its inputs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PathFinderConfig {
    /// Parent of every user's home directory.
    pub home_root: PathBuf,
    /// Root under which the replica storage is mounted on this host.
    pub storage_root: PathBuf,
    /// Directory under the user's home holding the remapped views.
    pub private_mounts_dir: String,
    /// Directory under the user's home where the data files show up.
    pub projects_dir: String,
    /// Environment variable carrying the name of the invoking user.
    pub identity_env: String,
    /// Directory holding the per-target advisory lock files.
    pub lock_dir: PathBuf,
    pub data_management_url: String,
    pub tools: ToolsConfig,
}

/// Binaries used for the mount operations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    pub bindfs: String,
    pub mount: String,
    pub umount: String,
    pub mountpoint: String,
}

impl Default for PathFinderConfig {
    fn default() -> Self {
        Self {
            home_root: PathBuf::from(HOME_ROOT),
            storage_root: PathBuf::from(STORAGE_ROOT),
            private_mounts_dir: String::from(PRIVATE_MOUNTS_DIR),
            projects_dir: String::from(PROJECTS_DIR),
            identity_env: String::from(IDENTITY_ENV),
            lock_dir: PathBuf::from(LOCK_DIR),
            data_management_url: String::from(DATA_MANAGEMENT_URL),
            tools: ToolsConfig::default(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bindfs: String::from("bindfs"),
            mount: String::from("mount"),
            umount: String::from("umount"),
            mountpoint: String::from("mountpoint"),
        }
    }
}

impl PathFinderConfig {
    const APP_NAME: &'static str = "pathfinder";
    const CONFIG_NAME: &'static str = "pathfinder";

    /// Loads the config from `path`, or from the default confy location.
    ///
    /// Note: under sudo the default location resolves to root's config
    /// directory, not the invoking user's.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => confy::load_path::<Self>(path)?,
            None => confy::load::<Self>(Self::APP_NAME, Self::CONFIG_NAME)?,
        };
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    pub fn home_of(&self, user: &str) -> PathBuf {
        self.home_root.join(user)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_default_layout() {
        let config = PathFinderConfig::default();
        assert_eq!(config.home_of("alice"), PathBuf::from("/home/alice"));
        assert_eq!(config.storage_root, PathBuf::from("/skadata"));
        assert_eq!(config.private_mounts_dir, ".binds");
        assert_eq!(config.tools.bindfs, "bindfs");
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let tmp_dir = tempdir().unwrap();
        let path = tmp_dir.path().join("pathfinder.toml");

        let config = PathFinderConfig::load(Some(&path)).unwrap();
        assert_eq!(config, PathFinderConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_load_partial_file() {
        let tmp_dir = tempdir().unwrap();
        let path = tmp_dir.path().join("pathfinder.toml");
        fs::write(
            &path,
            "storage_root = \"/mnt/rse\"\n\n[tools]\nbindfs = \"/usr/local/bin/bindfs\"\n",
        )
        .unwrap();

        let config = PathFinderConfig::load(Some(&path)).unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/mnt/rse"));
        assert_eq!(config.tools.bindfs, "/usr/local/bin/bindfs");
        assert_eq!(config.tools.umount, "umount");
        assert_eq!(config.home_root, PathBuf::from("/home"));
    }
}
