//! Mounting the filesystem in a background session.

use crate::config::MountConfig;
use crate::filesystem::RssFS;
use fuser::{BackgroundSession, MountOption};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// Timeout for graceful session.join() before forcing unmount.
/// The join thread may leak on timeout, which beats blocking forever.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to a mounted feed filesystem.
///
/// Wraps the fuser `BackgroundSession`. Dropping this handle triggers unmount.
pub struct RssMountHandle {
    session: Option<BackgroundSession>,
    mountpoint: PathBuf,
}

impl std::fmt::Debug for RssMountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RssMountHandle")
            .field("mountpoint", &self.mountpoint)
            .field("mounted", &self.session.is_some())
            .finish()
    }
}

impl RssMountHandle {
    /// Where the filesystem is mounted.
    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    /// Unmounts and waits for the session to finish.
    ///
    /// Blocks while the kernel still has requests in flight.
    pub fn unmount(mut self) {
        tracing::info!(mountpoint = %self.mountpoint.display(), "Unmounting FUSE filesystem");
        if let Some(session) = self.session.take() {
            session.join();
        }
        tracing::info!(mountpoint = %self.mountpoint.display(), "FUSE unmount successful");
    }

    /// Force unmount the filesystem using system tools.
    /// This is a fallback when the normal unmount is blocked.
    fn force_unmount_impl(&self) {
        #[cfg(target_os = "macos")]
        {
            let _ = std::process::Command::new("umount")
                .arg("-f")
                .arg(&self.mountpoint)
                .output();
        }

        #[cfg(target_os = "linux")]
        {
            // Lazy unmount detaches even while files are open.
            let _ = std::process::Command::new("fusermount")
                .args(["-uz"])
                .arg(&self.mountpoint)
                .output();
        }
    }
}

impl Drop for RssMountHandle {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        tracing::debug!("Unmounting FUSE filesystem at {}", self.mountpoint.display());

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            session.join();
            let _ = tx.send(());
        });

        if rx.recv_timeout(JOIN_TIMEOUT).is_err() {
            tracing::warn!(
                "session.join() timed out after {:?} for {}, forcing unmount",
                JOIN_TIMEOUT,
                self.mountpoint.display()
            );
            self.force_unmount_impl();
        }
    }
}

/// Mount options derived from `config`.
pub fn mount_options(config: &MountConfig) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName(config.fs_name.clone()),
        MountOption::Subtype(config.fs_name.clone()),
        MountOption::RO,
        // Let the kernel check permissions against the synthesized modes.
        MountOption::DefaultPermissions,
    ];
    if config.allow_other {
        options.push(MountOption::AllowOther);
    }
    options
}

/// Mounts `fs` at `mountpoint` and serves it on a background thread.
///
/// The mountpoint directory is created if it does not exist.
pub fn mount(fs: RssFS, mountpoint: &Path, config: &MountConfig) -> io::Result<RssMountHandle> {
    if !mountpoint.exists() {
        std::fs::create_dir_all(mountpoint)?;
    }

    let options = mount_options(config);
    let session = fuser::spawn_mount2(fs, mountpoint, &options)?;

    tracing::info!(mountpoint = %mountpoint.display(), "FUSE mount successful");

    Ok(RssMountHandle {
        session: Some(session),
        mountpoint: mountpoint.to_path_buf(),
    })
}
