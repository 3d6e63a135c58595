use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the lock file inside the base directory.
pub const LOCK_FILE: &str = ".lock";

/// Advisory lock serializing writers to one record tree.
///
/// Uses platform-native flock (Unix). Every mutating store operation holds
/// one for its whole duration, so a registry rewrite can never interleave
/// with another process's directory removal. Readers do not lock.
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another tally process may be writing")]
    Timeout { path: PathBuf },
}

impl FileLock {
    /// Acquire the lock on `base_dir`, waiting up to `timeout`.
    pub fn acquire(base_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = base_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    tracing::trace!(path = %lock_path.display(), "acquired lock");
                    return Ok(FileLock {
                        _file: file,
                        path: lock_path,
                    });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => {
                    return Err(LockError::Timeout { path: lock_path });
                }
            }
        }
    }

    /// Acquire with default timeout (5 seconds)
    pub fn acquire_default(base_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(base_dir, Duration::from_secs(5))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// The lock file itself is left in place: unlinking it on release would let a
// waiter holding the old inode and a newcomer creating a fresh one both
// "acquire" at once. The flock is released when `_file` is closed.

/// Try to acquire an exclusive flock on the file (non-blocking)
#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    // Advisory only; single-writer is not enforced off Unix
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release_lock() {
        let tmp = TempDir::new().unwrap();

        let lock = FileLock::acquire_default(tmp.path());
        assert!(lock.is_ok());
        drop(lock);

        let lock2 = FileLock::acquire_default(tmp.path());
        assert!(lock2.is_ok());
        assert!(lock2.unwrap().path().ends_with(LOCK_FILE));
    }

    #[cfg(unix)]
    #[test]
    fn test_lock_contention() {
        let tmp = TempDir::new().unwrap();
        let _lock1 = FileLock::acquire_default(tmp.path()).unwrap();

        let lock2 = FileLock::acquire(tmp.path(), Duration::from_millis(50));
        assert!(matches!(lock2, Err(LockError::Timeout { .. })));
    }
}
