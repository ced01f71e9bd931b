use nix::unistd::{Gid, Group, Uid, User, geteuid};

use crate::error::{PathFinderError, Result};

/// The non-privileged user a mount is performed on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub uid: Uid,
    pub gid: Gid,
    /// Primary group name, or the numeric gid when the group database has
    /// no entry for it.
    pub group: String,
}

impl Identity {
    /// Looks `name` up in the system user database.
    pub fn lookup(name: &str) -> Result<Self> {
        let user = User::from_name(name)
            .map_err(PathFinderError::UserDb)?
            .ok_or_else(|| PathFinderError::UnknownIdentity(name.to_string()))?;
        Self::from_user(user)
    }

    pub fn current() -> Result<Self> {
        let uid = nix::unistd::getuid();
        let user = User::from_uid(uid)
            .map_err(PathFinderError::UserDb)?
            .ok_or_else(|| PathFinderError::UnknownIdentity(uid.to_string()))?;
        Self::from_user(user)
    }

    fn from_user(user: User) -> Result<Self> {
        let group = match Group::from_gid(user.gid).map_err(PathFinderError::UserDb)? {
            Some(group) => group.name,
            None => user.gid.to_string(),
        };
        tracing::debug!(
            "resolved identity {} (uid={}, gid={}, group={group})",
            user.name,
            user.uid,
            user.gid
        );
        Ok(Self {
            name: user.name,
            uid: user.uid,
            gid: user.gid,
            group,
        })
    }
}

/// Fails unless the process runs with an effective uid of 0.
pub fn ensure_privileged() -> Result<()> {
    if !geteuid().is_root() {
        return Err(PathFinderError::PrivilegeRequired);
    }
    Ok(())
}

/// Name of the user who invoked the privileged process, read from `var`
/// (normally `SUDO_USER`).
pub fn invoking_user(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(user) if !user.is_empty() => Ok(user),
        _ => Err(PathFinderError::MissingInvokingUser(var.to_string())),
    }
}
