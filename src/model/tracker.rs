use std::path::PathBuf;

use super::config::TallyConfig;
use crate::io::lock::{FileLock, LockError};
use crate::io::paths::Layout;

/// An opened record tree: the bootstrapped base directory and the
/// configuration it was opened with.
///
/// Holds no session state. The active year, task and month are passed
/// explicitly to every operation.
#[derive(Debug, Clone)]
pub struct Tracker {
    /// Base directory holding `years.csv` and one directory per year
    pub root: PathBuf,
    pub config: TallyConfig,
}

impl Tracker {
    pub fn layout(&self) -> Layout<'_> {
        Layout::new(&self.root)
    }

    /// Take the single-writer lock for this tree.
    pub fn lock(&self) -> Result<FileLock, LockError> {
        FileLock::acquire_default(&self.root)
    }
}
