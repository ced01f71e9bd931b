use crate::args::LocateArgs;
use crate::commands::{mount::mount_plan, privileged_identity};
use crate::locate::DataManagementClient;
use crate::rt::block_on;
use libpathfinder::PathFinderConfig;

pub fn locate(args: LocateArgs, config: &PathFinderConfig) -> anyhow::Result<()> {
    // Check privileges before talking to the API when a mount will follow.
    let identity = match args.mount {
        Some(_) => Some(privileged_identity(config)?),
        None => None,
    };

    let url = args.url.as_deref().unwrap_or(&config.data_management_url);
    let client = DataManagementClient::from_env(url)?;
    let path = block_on(client.replica_path(&args.namespace, &args.file))??;
    println!("Located file path: {path}");

    if let (Some(group), Some(identity)) = (args.mount, identity) {
        let plan = libpathfinder::plan(config, &identity, &path, &group)?;
        mount_plan(config, &identity, &plan)?;
    }
    Ok(())
}
