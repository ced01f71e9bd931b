use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pathfinder",
    about = "Mount replicated data files into your projects directory"
)]
pub struct Cli {
    /// Configuration file (defaults to the pathfinder confy location)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mount a replica file at ~/projects/<file> (run with sudo)
    Mount(ReplicaArgs),
    /// Unmount a replica file and remove its mount points (run with sudo)
    Unmount(ReplicaArgs),
    /// Look a file up in the Data Management API and print its replica path
    Locate(LocateArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ReplicaArgs {
    /// Replica path including its group, like group/path/to/filename
    #[arg(value_name = "REPLICA_PATH")]
    pub replica_path: String,

    /// Namespace of the data, which is also the sudo group
    #[arg(value_name = "GROUP")]
    pub group: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LocateArgs {
    /// Namespace to search, e.g. daac
    #[arg(value_name = "NAMESPACE")]
    pub namespace: String,

    /// Path of the file within the namespace
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Base URL of the Data Management API
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Mount the located file under this group once it is resolved
    #[arg(long, value_name = "GROUP")]
    pub mount: Option<String>,
}
