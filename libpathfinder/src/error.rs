use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PathFinderError>;

#[derive(Debug, Error)]
pub enum PathFinderError {
    #[error("invalid replica path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("provided group '{group}' does not match namespace '{namespace}'; aborting")]
    NamespaceMismatch { group: String, namespace: String },

    #[error("no valid paths found for file '{file_name}' in namespace '{namespace}'")]
    NotFound { namespace: String, file_name: String },

    #[error(
        "multiple unique paths found for file '{file_name}' in namespace '{namespace}': {candidates:?}; \
         choosing between replicas is not implemented"
    )]
    AmbiguousLocation {
        namespace: String,
        file_name: String,
        candidates: Vec<String>,
    },

    #[error("{} is already mounted; aborting to avoid cyclic mounts", .0.display())]
    CyclicMount(PathBuf),

    #[error("user '{0}' not found")]
    UnknownIdentity(String),

    #[error("environment variable {0} not set; run via sudo")]
    MissingInvokingUser(String),

    #[error("this command must be run with root privileges")]
    PrivilegeRequired,

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to run {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("mount verification failed for {file_name} at {}", .project_file.display())]
    VerificationFailed {
        file_name: String,
        project_file: PathBuf,
    },

    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("user database lookup failed: {0}")]
    UserDb(#[source] nix::Error),

    #[error(transparent)]
    Config(#[from] confy::ConfyError),
}

impl PathFinderError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PathFinderError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PathFinderError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
