use std::path::Path;

use crate::io::table_io;
use crate::model::month::Month;
use crate::model::tracker::Tracker;
use crate::ops::error::StoreError;

/// True if `label` appears in any cell of the table at `path`.
///
/// Every column is scanned, not only the label column. Registries have a
/// single column, so for them this is the same as a key lookup.
pub fn exists(path: &Path, label: &str) -> Result<bool, StoreError> {
    Ok(table_io::read_table(path)?.contains_cell(label))
}

/// Registry labels in insertion order.
pub fn labels(path: &Path) -> Result<Vec<String>, StoreError> {
    Ok(table_io::read_table(path)?.keys())
}

/// Reject labels that would escape their parent directory.
pub fn ensure_path_component(label: &str) -> Result<(), StoreError> {
    if label.is_empty()
        || label.chars().all(|c| c == '.')
        || label.contains(['/', '\\'])
    {
        return Err(StoreError::InvalidFormat(format!(
            "\"{}\" cannot be used as a directory name",
            label
        )));
    }
    Ok(())
}

pub fn require_year(tracker: &Tracker, year: &str) -> Result<(), StoreError> {
    if exists(&tracker.layout().years_registry(), year)? {
        ensure_path_component(year)
    } else {
        Err(StoreError::NotFound(format!("year {}", year)))
    }
}

pub fn require_task(tracker: &Tracker, year: &str, task: &str) -> Result<(), StoreError> {
    require_year(tracker, year)?;
    if exists(&tracker.layout().task_registry(year), task)? {
        ensure_path_component(task)
    } else {
        Err(StoreError::NotFound(format!("task \"{}\" in {}", task, year)))
    }
}

pub fn require_month(
    tracker: &Tracker,
    year: &str,
    task: &str,
    month: Month,
) -> Result<(), StoreError> {
    require_task(tracker, year, task)?;
    if exists(&tracker.layout().month_registry(year, task), month.as_str())? {
        Ok(())
    } else {
        Err(StoreError::NotFound(format!(
            "month {} in task \"{}\" ({})",
            month, task, year
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exists_and_labels() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.csv");
        table_io::create_if_absent(&path, &["tasks"]).unwrap();
        table_io::append_row(&path, &["writing"]).unwrap();
        table_io::append_row(&path, &["reading"]).unwrap();

        assert!(exists(&path, "reading").unwrap());
        assert!(!exists(&path, "Reading").unwrap());
        assert!(!exists(&path, "tasks").unwrap());
        assert_eq!(labels(&path).unwrap(), vec!["writing", "reading"]);
    }

    #[test]
    fn test_exists_on_missing_registry_is_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            exists(&tmp.path().join("tasks.csv"), "x"),
            Err(StoreError::Table(table_io::TableError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_ensure_path_component() {
        assert!(ensure_path_component("writing").is_ok());
        assert!(ensure_path_component("v1.2 notes").is_ok());
        assert!(ensure_path_component("..").is_err());
        assert!(ensure_path_component(".").is_err());
        assert!(ensure_path_component("a/b").is_err());
        assert!(ensure_path_component("").is_err());
    }
}
