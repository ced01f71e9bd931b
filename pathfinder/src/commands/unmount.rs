use crate::args::ReplicaArgs;
use crate::commands::{orchestrator, plan_request, privileged_identity};
use libpathfinder::PathFinderConfig;

pub fn unmount(args: ReplicaArgs, config: &PathFinderConfig) -> anyhow::Result<()> {
    let identity = privileged_identity(config)?;
    let plan = plan_request(config, &identity, &args.replica_path, &args.group)?;

    // Warnings have already been logged; an unmount only fails if it could
    // not start at all.
    let report = orchestrator(config).unmount(&plan)?;
    if !report.is_clean() {
        eprintln!(
            "Warning: {} cleanup steps did not complete",
            report.warnings.len()
        );
    }
    println!(
        "Unmounted {} from {}",
        plan.file_name,
        plan.project_file.display()
    );
    Ok(())
}
