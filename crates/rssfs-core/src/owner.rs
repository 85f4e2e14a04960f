//! Ownership reported for every node.

use crate::error::{RssfsError, RssfsResult};
use nix::unistd::{Gid, Uid, User};

/// User and group that own every entry of the mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    /// User ID.
    pub uid: u32,
    /// Group ID.
    pub gid: u32,
}

impl Owner {
    /// Creates an owner from raw IDs.
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Resolves the real user and primary group of the invoking process.
    ///
    /// Fails if the user has no passwd entry, since no attribute can be
    /// produced without an owner.
    pub fn current() -> RssfsResult<Self> {
        let uid = Uid::current();
        let user = User::from_uid(uid)
            .map_err(|e| RssfsError::Identity(format!("lookup of uid {uid} failed: {e}")))?
            .ok_or_else(|| RssfsError::Identity(format!("no passwd entry for uid {uid}")))?;
        let gid: Gid = user.gid;
        Ok(Self::new(uid.as_raw(), gid.as_raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_matches_process_uid() {
        // Containers may run as a uid without a passwd entry.
        match Owner::current() {
            Ok(owner) => assert_eq!(owner.uid, Uid::current().as_raw()),
            Err(e) => {
                assert!(matches!(e, RssfsError::Identity(_)), "unexpected error: {e}");
                assert!(e.to_string().contains(&Uid::current().to_string()));
            }
        }
    }
}
