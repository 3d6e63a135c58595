use crate::io::paths::{
    COLUMNS_HEADER, MONTHS_HEADER, TASK_REPORT_HEADER, TASKS_FILE, TASKS_REPORT_FILE,
};
use crate::io::table_io;
use crate::model::column::ColumnKind;
use crate::model::tracker::Tracker;
use crate::ops::error::StoreError;
use crate::ops::registry::{self, ensure_path_component, require_year};
use crate::ops::txn::Transaction;
use crate::ops::validate::{ValidateError, validate};

/// Normalize a task label: trimmed and lower-cased. Rejects empty labels,
/// characters outside the label class, and names that collide with the
/// year directory's own files.
pub fn normalize_task_label(raw: &str) -> Result<String, StoreError> {
    let label = raw.trim().to_lowercase();
    if label.is_empty() {
        return Err(StoreError::EmptyInput("task name".to_string()));
    }
    validate(&label, ColumnKind::Label).map_err(|e| match e {
        ValidateError::InvalidFormat { found, .. } => StoreError::InvalidFormat(format!(
            "task name \"{}\" contains '{}' (use letters, digits, space, _, @ or .)",
            label, found
        )),
        ValidateError::EmptyInput => StoreError::EmptyInput("task name".to_string()),
    })?;
    ensure_path_component(&label)?;
    if label == TASKS_FILE || label == TASKS_REPORT_FILE {
        return Err(StoreError::InvalidFormat(format!(
            "\"{}\" is a reserved file name",
            label
        )));
    }
    Ok(label)
}

/// Tasks registered under `year`, in insertion order.
pub fn list_tasks(tracker: &Tracker, year: &str) -> Result<Vec<String>, StoreError> {
    require_year(tracker, year)?;
    registry::labels(&tracker.layout().task_registry(year))
}

/// Register a task under `year` and create its directory with an empty
/// month registry, task report and column schema. Returns the stored label.
pub fn add_task(tracker: &Tracker, year: &str, label: &str) -> Result<String, StoreError> {
    let label = normalize_task_label(label)?;

    let _lock = tracker.lock()?;
    require_year(tracker, year)?;

    let layout = tracker.layout();
    let tasks = layout.task_registry(year);
    if registry::exists(&tasks, &label)? {
        return Err(StoreError::AlreadyExists(format!(
            "task \"{}\" in {}",
            label, year
        )));
    }

    let mut txn = Transaction::begin(&tracker.root, format!("add task {}/{}", year, label));
    txn.create_dir(&layout.task_dir(year, &label))?;
    txn.ensure_table(&layout.month_registry(year, &label), &MONTHS_HEADER)?;
    txn.ensure_table(&layout.task_report(year, &label), &TASK_REPORT_HEADER)?;
    txn.ensure_table(&layout.column_schema(year, &label), &COLUMNS_HEADER)?;
    txn.append_row(&tasks, &[label.as_str()])?;
    txn.commit();

    Ok(label)
}

/// Remove a task from its year's registry and delete its directory tree.
/// Irreversible.
pub fn delete_task(tracker: &Tracker, year: &str, label: &str) -> Result<String, StoreError> {
    let label = label.trim().to_lowercase();
    let _lock = tracker.lock()?;
    require_year(tracker, year)?;

    let layout = tracker.layout();
    let tasks = layout.task_registry(year);
    let table = table_io::read_table(&tasks)?;
    if !table.contains_cell(&label) {
        return Err(StoreError::NotFound(format!(
            "task \"{}\" in {}",
            label, year
        )));
    }
    ensure_path_component(&label)?;

    let mut txn = Transaction::begin(&tracker.root, format!("delete task {}/{}", year, label));
    txn.rewrite_table(&tasks, &table.without_key(&label))?;
    txn.remove_dir_all(&layout.task_dir(year, &label))?;
    txn.commit();
    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_helpers::temp_tracker;
    use crate::ops::year_ops::add_year;

    #[test]
    fn test_normalize_task_label() {
        assert_eq!(normalize_task_label("  Deep Work ").unwrap(), "deep work");
        assert_eq!(normalize_task_label("me@club.v2").unwrap(), "me@club.v2");
        assert!(matches!(
            normalize_task_label("   "),
            Err(StoreError::EmptyInput(_))
        ));
        assert!(matches!(
            normalize_task_label("a/b"),
            Err(StoreError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_task_label(".."),
            Err(StoreError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_task_label("Tasks.csv"),
            Err(StoreError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_add_task_creates_default_files() {
        let (_tmp, tracker) = temp_tracker();
        add_year(&tracker, "2026").unwrap();

        let label = add_task(&tracker, "2026", "Writing").unwrap();
        assert_eq!(label, "writing");

        let layout = tracker.layout();
        assert_eq!(list_tasks(&tracker, "2026").unwrap(), vec!["writing"]);
        assert_eq!(
            std::fs::read_to_string(layout.month_registry("2026", "writing")).unwrap(),
            "months\n"
        );
        assert_eq!(
            std::fs::read_to_string(layout.task_report("2026", "writing")).unwrap(),
            "month,days,hours,minutes\n"
        );
        assert!(layout.column_schema("2026", "writing").exists());
    }

    #[test]
    fn test_add_task_duplicate_after_normalization() {
        let (_tmp, tracker) = temp_tracker();
        add_year(&tracker, "2026").unwrap();
        add_task(&tracker, "2026", "writing").unwrap();

        assert!(matches!(
            add_task(&tracker, "2026", " WRITING "),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(list_tasks(&tracker, "2026").unwrap(), vec!["writing"]);
    }

    #[test]
    fn test_add_task_unknown_year() {
        let (_tmp, tracker) = temp_tracker();
        assert!(matches!(
            add_task(&tracker, "2026", "writing"),
            Err(StoreError::NotFound(_))
        ));
        assert!(!tracker.layout().year_dir("2026").exists());
    }

    #[test]
    fn test_same_task_in_two_years() {
        let (_tmp, tracker) = temp_tracker();
        add_year(&tracker, "2026").unwrap();
        add_year(&tracker, "2027").unwrap();
        add_task(&tracker, "2026", "writing").unwrap();
        add_task(&tracker, "2027", "writing").unwrap();
        assert_eq!(list_tasks(&tracker, "2027").unwrap(), vec!["writing"]);
    }

    #[test]
    fn test_delete_task() {
        let (_tmp, tracker) = temp_tracker();
        add_year(&tracker, "2026").unwrap();
        add_task(&tracker, "2026", "writing").unwrap();
        add_task(&tracker, "2026", "reading").unwrap();

        assert_eq!(delete_task(&tracker, "2026", "Writing").unwrap(), "writing");
        assert_eq!(list_tasks(&tracker, "2026").unwrap(), vec!["reading"]);
        assert!(!tracker.layout().task_dir("2026", "writing").exists());
        assert!(matches!(
            delete_task(&tracker, "2026", "writing"),
            Err(StoreError::NotFound(_))
        ));
    }
}
