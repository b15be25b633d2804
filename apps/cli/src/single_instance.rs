//! PID lock file so only one copy talks to the chatbox at a time.
//!
//! Two instances would each send every message. The lock file stores the
//! owner's PID; a lock left behind by a process that no longer exists is
//! replaced instead of blocking startup forever.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    /// Lock `<temp dir>/<app_name>.lock`
    pub fn acquire(app_name: &str) -> Result<Self> {
        Self::acquire_in(&std::env::temp_dir(), app_name)
    }

    pub fn acquire_in(dir: &Path, app_name: &str) -> Result<Self> {
        let path = dir.join(format!("{}.lock", app_name));

        if path.exists() {
            let contents = fs::read_to_string(&path).context("Failed to read lock file")?;
            match contents.trim().parse::<u32>() {
                Ok(pid) if pid != std::process::id() && is_process_running(pid) => {
                    anyhow::bail!("Another instance is already running (PID: {})", pid);
                }
                Ok(pid) => tracing::warn!("Replacing stale lock file left by PID {}", pid),
                Err(_) => tracing::warn!("Replacing lock file with invalid contents"),
            }
        }

        let pid = std::process::id();
        fs::write(&path, pid.to_string()).context("Failed to write lock file")?;
        tracing::debug!("Acquired instance lock {} (PID: {})", path.display(), pid);

        Ok(Self { path })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove lock file on exit: {}", e);
        }
    }
}

#[cfg(target_os = "linux")]
fn is_process_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(target_os = "macos")]
fn is_process_running(pid: u32) -> bool {
    // kill(pid, 0) probes without sending a signal; EPERM still means alive
    let result = unsafe { libc::kill(pid as i32, 0) };
    result == 0 || std::io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}

#[cfg(target_os = "windows")]
fn is_process_running(pid: u32) -> bool {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    unsafe {
        match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(handle) => {
                let _ = CloseHandle(handle);
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_is_running() {
        assert!(is_process_running(std::process::id()));
    }

    #[test]
    fn test_stale_lock_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vrcnp.lock");
        fs::write(&path, "not a pid").unwrap();

        let lock = InstanceLock::acquire_in(dir.path(), "vrcnp").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), std::process::id().to_string());

        drop(lock);
        assert!(!path.exists());
    }
}
