use crate::args::ReplicaArgs;
use crate::commands::{orchestrator, plan_request, privileged_identity};
use libpathfinder::{Identity, MountPlan, PathFinderConfig};

pub fn mount(args: ReplicaArgs, config: &PathFinderConfig) -> anyhow::Result<()> {
    let identity = privileged_identity(config)?;
    let plan = plan_request(config, &identity, &args.replica_path, &args.group)?;
    mount_plan(config, &identity, &plan)
}

pub(crate) fn mount_plan(
    config: &PathFinderConfig,
    identity: &Identity,
    plan: &MountPlan,
) -> anyhow::Result<()> {
    orchestrator(config).mount(plan, identity)?;
    println!(
        "Mount verification successful: {} is mounted at {}",
        plan.file_name,
        plan.project_file.display()
    );
    Ok(())
}
