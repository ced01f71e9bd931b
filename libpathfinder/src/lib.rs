//! Exposes a replicated data file inside a user's workspace.
//!
//! A file is located through its replica URIs ([`resolver`]), turned into a
//! set of per-user locations ([`planner`]) and then mounted in two stages:
//! a bindfs view of the storage directory remapped to the user, and a bind
//! mount of the file from that view onto `~/projects/<file>`
//! ([`orchestrator`]).

pub mod config;
pub mod error;
mod fsutil;
pub mod identity;
pub mod lock;
pub mod namespace;
pub mod orchestrator;
pub mod planner;
pub mod resolver;
pub mod tools;

// re-export selected public API
pub use config::{PathFinderConfig, ToolsConfig};
pub use error::{PathFinderError, Result};
pub use identity::Identity;
pub use namespace::NamespacePath;
pub use orchestrator::{BindMountOrchestrator, UnmountReport};
pub use planner::{MountPlan, plan};
pub use resolver::{ReplicaMatches, resolve};
pub use tools::{MountTools, SystemTools};
