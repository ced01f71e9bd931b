pub mod locate;
pub mod mount;
pub mod unmount;

pub use locate::locate;
pub use mount::mount;
pub use unmount::unmount;

use anyhow::Context;
use libpathfinder::{
    BindMountOrchestrator, Identity, MountPlan, NamespacePath, PathFinderConfig, SystemTools,
    identity,
};
use std::path::Path;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<PathFinderConfig> {
    PathFinderConfig::load(path).with_context(|| match path {
        Some(path) => format!("failed to load config file {}", path.display()),
        None => String::from("failed to load the default config file"),
    })
}

/// The user behind `sudo`, after checking that we really are root.
fn privileged_identity(config: &PathFinderConfig) -> anyhow::Result<Identity> {
    identity::ensure_privileged()?;
    let user = identity::invoking_user(&config.identity_env)?;
    Ok(Identity::lookup(&user)?)
}

fn plan_request(
    config: &PathFinderConfig,
    identity: &Identity,
    replica_path: &str,
    group: &str,
) -> anyhow::Result<MountPlan> {
    let path = NamespacePath::parse(replica_path)?;
    Ok(libpathfinder::plan(config, identity, &path, group)?)
}

fn orchestrator(config: &PathFinderConfig) -> BindMountOrchestrator<SystemTools> {
    BindMountOrchestrator::new(config.clone(), SystemTools::new(config.tools.clone()))
}
