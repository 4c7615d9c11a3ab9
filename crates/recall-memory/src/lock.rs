//! Advisory lock over a storage location.
//!
//! Every store operation opens `<location>/.recall.lock` and takes an
//! exclusive `flock(2)` on it. The lock lives in the open descriptor, not in
//! the file: the kernel drops it when the descriptor closes, including when
//! the holding process is killed. A leftover lock file never blocks anyone.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use recall_core::{RecallError, Result};
use tracing::{debug, warn};

const LOCK_FILE: &str = ".recall.lock";
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Held while a store operation runs. Unlocks on drop.
#[derive(Debug)]
pub struct LocationLock {
    path: PathBuf,
    file: File,
}

impl LocationLock {
    /// Acquire the lock for `location`, polling until `timeout` elapses.
    pub fn acquire(location: &Path, timeout: Duration) -> Result<Self> {
        let path = location.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| RecallError::StorageWrite {
                path: path.clone(),
                source,
            })?;

        let started = Instant::now();
        loop {
            match try_lock_exclusive(&file) {
                Ok(true) => {
                    record_owner(&file);
                    debug!(?path, "acquired location lock");
                    return Ok(Self { path, file });
                }
                Ok(false) => {
                    if started.elapsed() >= timeout {
                        return Err(RecallError::StorageLocked {
                            path,
                            waited_ms: u64::try_from(started.elapsed().as_millis())
                                .unwrap_or(u64::MAX),
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(source) => return Err(RecallError::StorageWrite { path, source }),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LocationLock {
    fn drop(&mut self) {
        // SAFETY: the descriptor is owned by `self.file` and still open.
        let rc = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        if rc != 0 {
            warn!(
                path = ?self.path,
                error = %io::Error::last_os_error(),
                "failed to unlock location, closing the descriptor releases it"
            );
        }
    }
}

/// `Ok(false)` when another descriptor holds the lock.
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
    // SAFETY: the descriptor is owned by `file` and open for the whole call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::Interrupted => Ok(false),
        _ => Err(err),
    }
}

/// Owner pid, for an operator inspecting the location. Best effort.
fn record_owner(mut file: &File) {
    let written = file
        .set_len(0)
        .and_then(|()| writeln!(file, "{}", std::process::id()));
    if let Err(e) = written {
        debug!(error = %e, "could not record lock owner");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let lock = LocationLock::acquire(dir.path(), Duration::from_millis(50)).unwrap();
        assert!(lock.path().exists());
        let owner = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());
        drop(lock);
        LocationLock::acquire(dir.path(), Duration::ZERO).unwrap();
    }

    #[test]
    fn test_contention_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let _held = LocationLock::acquire(dir.path(), Duration::from_millis(50)).unwrap();
        let err = LocationLock::acquire(dir.path(), Duration::from_millis(30)).unwrap_err();
        assert!(matches!(err, RecallError::StorageLocked { .. }));
    }

    #[test]
    fn test_leftover_lock_file_is_not_a_lock() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOCK_FILE), "4194304\n").unwrap();
        let lock = LocationLock::acquire(dir.path(), Duration::ZERO).unwrap();
        let owner = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_closing_descriptor_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let lock = LocationLock::acquire(dir.path(), Duration::from_millis(50)).unwrap();
        // Close the descriptor without running Drop, as process exit does.
        let fd = lock.file.as_raw_fd();
        std::mem::forget(lock);
        // SAFETY: `fd` was owned by the forgotten guard and is closed once.
        assert_eq!(unsafe { libc::close(fd) }, 0);
        LocationLock::acquire(dir.path(), Duration::ZERO).unwrap();
    }

    #[test]
    fn test_waiter_gets_lock_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let held = LocationLock::acquire(dir.path(), Duration::from_millis(50)).unwrap();
        let location = dir.path().to_path_buf();
        let waiter = std::thread::spawn(move || {
            LocationLock::acquire(&location, Duration::from_secs(5)).map(|_| ())
        });
        std::thread::sleep(Duration::from_millis(30));
        drop(held);
        assert!(waiter.join().unwrap().is_ok());
    }
}
