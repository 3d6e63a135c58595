use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::table_io;
use crate::model::table::Table;
use crate::ops::error::StoreError;

/// How to take back one completed step
#[derive(Debug)]
enum Undo {
    RemoveDir(PathBuf),
    RemoveFile(PathBuf),
    Restore { path: PathBuf, table: Table },
}

/// Commit-or-rollback wrapper for writes that must land together: a
/// registry row and the directory or file it names.
///
/// Each step records how to undo itself. When a step fails, or the
/// transaction is dropped without `commit`, completed steps are undone in
/// reverse order. A step that cannot be undone is written to the recovery
/// log and surfaces as `StoreError::PartialWrite`.
///
/// Order steps so a crash leaves an orphan rather than a dangling registry
/// row: on create, write the registry row last; on delete, rewrite the
/// registry first and remove the filesystem object last.
pub struct Transaction<'a> {
    base: &'a Path,
    operation: String,
    undo: Vec<Undo>,
    committed: bool,
}

impl<'a> Transaction<'a> {
    pub fn begin(base: &'a Path, operation: impl Into<String>) -> Self {
        Transaction {
            base,
            operation: operation.into(),
            undo: Vec::new(),
            committed: false,
        }
    }

    /// Create a directory. An existing directory is adopted and is never
    /// removed on rollback.
    pub fn create_dir(&mut self, path: &Path) -> Result<(), StoreError> {
        match table_io::create_dir_if_absent(path) {
            Ok(true) => {
                self.undo.push(Undo::RemoveDir(path.to_path_buf()));
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Write a header-only table unless the file already exists.
    pub fn ensure_table(&mut self, path: &Path, header: &[&str]) -> Result<(), StoreError> {
        match table_io::create_if_absent(path, header) {
            Ok(true) => {
                self.undo.push(Undo::RemoveFile(path.to_path_buf()));
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Write a header-only table. Fails if the file already exists.
    pub fn create_table<S: AsRef<str>>(
        &mut self,
        path: &Path,
        header: &[S],
    ) -> Result<(), StoreError> {
        match table_io::create_if_absent(path, header) {
            Ok(true) => {
                self.undo.push(Undo::RemoveFile(path.to_path_buf()));
                Ok(())
            }
            Ok(false) => self.fail(StoreError::AlreadyExists(format!(
                "file {} (not registered; see `tally check`)",
                path.display()
            ))),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Append one row, remembering the table as it was.
    pub fn append_row<S: AsRef<str>>(&mut self, path: &Path, row: &[S]) -> Result<(), StoreError> {
        let before = match table_io::read_table(path) {
            Ok(t) => t,
            Err(e) => return self.fail(e.into()),
        };
        match table_io::append_row(path, row) {
            Ok(()) => {
                self.undo.push(Undo::Restore {
                    path: path.to_path_buf(),
                    table: before,
                });
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Replace a table's contents, remembering the previous contents.
    pub fn rewrite_table(&mut self, path: &Path, table: &Table) -> Result<(), StoreError> {
        let before = match table_io::read_table(path) {
            Ok(t) => t,
            Err(e) => return self.fail(e.into()),
        };
        match table_io::rewrite_table(path, table) {
            Ok(()) => {
                self.undo.push(Undo::Restore {
                    path: path.to_path_buf(),
                    table: before,
                });
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Remove a directory tree. Irreversible, so it must be the last step.
    pub fn remove_dir_all(&mut self, path: &Path) -> Result<(), StoreError> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Remove a file. Irreversible, so it must be the last step.
    pub fn remove_file(&mut self, path: &Path) -> Result<(), StoreError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => self.fail(e.into()),
        }
    }

    pub fn commit(mut self) {
        self.committed = true;
        tracing::info!(operation = %self.operation, "committed");
    }

    /// Roll back after a failed step, then report either the original error
    /// or, if the rollback was incomplete, a partial write.
    fn fail<T>(&mut self, err: StoreError) -> Result<T, StoreError> {
        tracing::warn!(operation = %self.operation, error = %err, "rolling back");
        let leftovers = self.rollback();
        if leftovers.is_empty() {
            return Err(err);
        }
        Err(StoreError::PartialWrite {
            operation: self.operation.clone(),
            detail: format!("{}; could not undo {}", err, leftovers.join(", ")),
        })
    }

    /// Undo every recorded step, newest first. Returns a description of
    /// each step that could not be undone; those are also logged.
    fn rollback(&mut self) -> Vec<String> {
        let mut leftovers = Vec::new();
        while let Some(step) = self.undo.pop() {
            let (category, path, body, result) = match step {
                Undo::RemoveDir(path) => {
                    let r = fs::remove_dir_all(&path);
                    (RecoveryCategory::Create, path, String::new(), r.map_err(|e| e.to_string()))
                }
                Undo::RemoveFile(path) => {
                    let r = fs::remove_file(&path);
                    (RecoveryCategory::Create, path, String::new(), r.map_err(|e| e.to_string()))
                }
                Undo::Restore { path, table } => {
                    let r = table_io::rewrite_table(&path, &table).map_err(|e| e.to_string());
                    let body = if r.is_err() {
                        table_io::serialize_table(&table)
                            .map(|b| String::from_utf8_lossy(&b).into_owned())
                            .unwrap_or_default()
                    } else {
                        String::new()
                    };
                    (RecoveryCategory::Write, path, body, r)
                }
            };
            if let Err(e) = result {
                log_recovery(
                    self.base,
                    RecoveryEntry::new(category, format!("{}: rollback step failed", self.operation))
                        .field("Path", path.display().to_string())
                        .field("Error", e)
                        .body(body),
                );
                leftovers.push(path.display().to_string());
            }
        }
        leftovers
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.undo.is_empty() {
            tracing::warn!(operation = %self.operation, "dropped without commit, rolling back");
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commit_keeps_everything() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("2026");
        let registry = tmp.path().join("years.csv");
        table_io::create_if_absent(&registry, &["years"]).unwrap();

        let mut txn = Transaction::begin(tmp.path(), "add year 2026");
        txn.create_dir(&dir).unwrap();
        txn.ensure_table(&dir.join("tasks.csv"), &["tasks"]).unwrap();
        txn.append_row(&registry, &["2026"]).unwrap();
        txn.commit();

        assert!(dir.join("tasks.csv").exists());
        assert_eq!(table_io::read_table(&registry).unwrap().keys(), vec!["2026"]);
    }

    #[test]
    fn test_failed_step_rolls_back_earlier_steps() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("2026");

        let mut txn = Transaction::begin(tmp.path(), "add year 2026");
        txn.create_dir(&dir).unwrap();
        txn.ensure_table(&dir.join("tasks.csv"), &["tasks"]).unwrap();
        // Registry does not exist: this step fails
        let err = txn
            .append_row(&tmp.path().join("years.csv"), &["2026"])
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Table(table_io::TableError::NotFound { .. })
        ));
        assert!(!dir.exists());
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let tmp = TempDir::new().unwrap();
        let registry = tmp.path().join("months.csv");
        table_io::create_if_absent(&registry, &["months"]).unwrap();
        let month = tmp.path().join("Jan.csv");

        {
            let mut txn = Transaction::begin(tmp.path(), "add month Jan");
            txn.create_table(&month, &["pages"]).unwrap();
            txn.append_row(&registry, &["Jan"]).unwrap();
        }

        assert!(!month.exists());
        assert!(table_io::read_table(&registry).unwrap().is_empty());
    }

    #[test]
    fn test_adopted_dir_survives_rollback() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("2026");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("keep.txt"), "x").unwrap();

        {
            let mut txn = Transaction::begin(tmp.path(), "add year 2026");
            txn.create_dir(&dir).unwrap();
        }

        assert!(dir.join("keep.txt").exists());
    }

    #[test]
    fn test_create_table_refuses_existing_file() {
        let tmp = TempDir::new().unwrap();
        let month = tmp.path().join("Jan.csv");
        fs::write(&month, "pages\n1\n").unwrap();

        let mut txn = Transaction::begin(tmp.path(), "add month Jan");
        let err = txn.create_table(&month, &["hours"]).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(fs::read_to_string(&month).unwrap(), "pages\n1\n");
    }

    #[test]
    fn test_failed_undo_is_a_partial_write() {
        let tmp = TempDir::new().unwrap();
        let year = tmp.path().join("2026");
        fs::create_dir(&year).unwrap();
        let registry = year.join("tasks.csv");
        table_io::create_if_absent(&registry, &["tasks"]).unwrap();

        let mut txn = Transaction::begin(tmp.path(), "add task writing");
        txn.append_row(&registry, &["writing"]).unwrap();
        // The restore target's directory disappears underneath the transaction
        fs::remove_dir_all(&year).unwrap();
        let err = txn
            .append_row(&tmp.path().join("missing.csv"), &["x"])
            .unwrap_err();

        match err {
            StoreError::PartialWrite { operation, detail } => {
                assert_eq!(operation, "add task writing");
                assert!(detail.contains("tasks.csv"));
            }
            other => panic!("expected PartialWrite, got {:?}", other),
        }
        assert_eq!(crate::io::recovery::recovery_entry_count(tmp.path()), 1);
    }
}
