use serde::Serialize;

use crate::io::table_io;
use crate::model::month::Month;
use crate::model::table::Table;
use crate::model::tracker::Tracker;
use crate::ops::error::StoreError;
use crate::ops::month_ops::{latest_month, month_columns};
use crate::ops::registry::require_month;
use crate::ops::txn::Transaction;
use crate::ops::validate::validate;

/// Where `add_entry` put the new row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedEntry {
    pub month: Month,
    /// 1-based row number
    pub row: usize,
}

/// Resolve the month an entry command targets: the given month, or the
/// task's most recently registered month.
pub fn target_month(
    tracker: &Tracker,
    year: &str,
    task: &str,
    month: Option<Month>,
) -> Result<Month, StoreError> {
    match month {
        Some(m) => {
            require_month(tracker, year, task, m)?;
            Ok(m)
        }
        None => latest_month(tracker, year, task)?.ok_or_else(|| {
            StoreError::NotFound(format!("any month in task \"{}\" ({})", task, year))
        }),
    }
}

/// All entries of one month.
pub fn read_entries(
    tracker: &Tracker,
    year: &str,
    task: &str,
    month: Month,
) -> Result<Table, StoreError> {
    require_month(tracker, year, task, month)?;
    Ok(table_io::read_table(
        &tracker.layout().month_file(year, task, month),
    )?)
}

/// Append one entry to a month.
///
/// Values are trimmed, then there must be exactly one per column and
/// each must pass its column's validator. On any rejection nothing is
/// written.
pub fn add_entry<S: AsRef<str>>(
    tracker: &Tracker,
    year: &str,
    task: &str,
    month: Option<Month>,
    values: &[S],
) -> Result<AddedEntry, StoreError> {
    let values: Vec<String> = values.iter().map(|v| v.as_ref().trim().to_string()).collect();

    let _lock = tracker.lock()?;
    let month = target_month(tracker, year, task, month)?;
    let columns = month_columns(tracker, year, task, month)?;

    if values.len() != columns.len() {
        return Err(StoreError::OutOfRange(format!(
            "{} values given, {} has {} columns ({})",
            values.len(),
            month,
            columns.len(),
            columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    for (value, column) in values.iter().zip(&columns) {
        validate(value, column.kind).map_err(|e| match StoreError::from(e) {
            StoreError::EmptyInput(_) => StoreError::EmptyInput(format!("column \"{}\"", column.name)),
            other => other,
        })?;
    }

    let path = tracker.layout().month_file(year, task, month);
    let mut txn = Transaction::begin(
        &tracker.root,
        format!("add entry {}/{}/{}", year, task, month),
    );
    txn.append_row(&path, &values)?;
    txn.commit();

    let row = table_io::read_table(&path)?.len();
    Ok(AddedEntry { month, row })
}

/// Delete one entry by its 1-based row number and return its values.
/// Later rows move up by one.
pub fn delete_month_row(
    tracker: &Tracker,
    year: &str,
    task: &str,
    month: Month,
    row: usize,
) -> Result<Vec<String>, StoreError> {
    let _lock = tracker.lock()?;
    let mut table = read_entries(tracker, year, task, month)?;
    if row == 0 || row > table.len() {
        return Err(StoreError::OutOfRange(if table.is_empty() {
            format!("{} has no entries", month)
        } else {
            format!("row {} (expected 1 to {})", row, table.len())
        }));
    }

    let removed = table.rows.remove(row - 1);
    let mut txn = Transaction::begin(
        &tracker.root,
        format!("delete entry {}/{}/{} row {}", year, task, month, row),
    );
    txn.rewrite_table(&tracker.layout().month_file(year, task, month), &table)?;
    txn.commit();
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::month_ops::add_month;
    use crate::ops::task_ops::add_task;
    use crate::ops::test_helpers::tracker_with_month;

    #[test]
    fn test_add_entry_appends_row() {
        let (_tmp, tracker) = tracker_with_month("note");
        let added = add_entry(&tracker, "2026", "writing", Some(Month::Jan), &["read, then write"]).unwrap();
        assert_eq!(added, AddedEntry { month: Month::Jan, row: 1 });
        assert_eq!(
            std::fs::read_to_string(tracker.layout().month_file("2026", "writing", Month::Jan)).unwrap(),
            "note\n\"read, then write\"\n"
        );
    }

    #[test]
    fn test_add_entry_defaults_to_latest_month() {
        let (_tmp, tracker) = tracker_with_month("note");
        add_month(&tracker, "2026", "writing", "Mar", None).unwrap();
        let added = add_entry(&tracker, "2026", "writing", None, &["x"]).unwrap();
        assert_eq!(added.month, Month::Mar);
        assert!(read_entries(&tracker, "2026", "writing", Month::Jan).unwrap().is_empty());
    }

    #[test]
    fn test_add_entry_without_months() {
        let (_tmp, tracker) = tracker_with_month("note");
        add_task(&tracker, "2026", "reading").unwrap();
        assert!(matches!(
            add_entry(&tracker, "2026", "reading", None, &["x"]),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_entry_validates_by_column_kind() {
        let (_tmp, tracker) = tracker_with_month("pages:int,hours:time,who:label");
        let month = Some(Month::Jan);

        assert!(add_entry(&tracker, "2026", "writing", month, &["12", "1:30", "me@club"]).is_ok());
        assert!(matches!(
            add_entry(&tracker, "2026", "writing", month, &["12", "1h", "me"]),
            Err(StoreError::InvalidFormat(_))
        ));
        assert!(matches!(
            add_entry(&tracker, "2026", "writing", month, &["twelve", "1:30", "me"]),
            Err(StoreError::InvalidFormat(_))
        ));
        assert!(matches!(
            add_entry(&tracker, "2026", "writing", month, &["12", "  ", "me"]),
            Err(StoreError::EmptyInput(_))
        ));
        assert!(matches!(
            add_entry(&tracker, "2026", "writing", month, &["12", "1:30"]),
            Err(StoreError::OutOfRange(_))
        ));
        assert_eq!(read_entries(&tracker, "2026", "writing", Month::Jan).unwrap().len(), 1);
    }

    #[test]
    fn test_add_entry_unregistered_month() {
        let (_tmp, tracker) = tracker_with_month("note");
        assert!(matches!(
            add_entry(&tracker, "2026", "writing", Some(Month::Feb), &["x"]),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_month_row_renumbers() {
        let (_tmp, tracker) = tracker_with_month("note");
        for v in ["a", "b", "c"] {
            add_entry(&tracker, "2026", "writing", None, &[v]).unwrap();
        }

        let removed = delete_month_row(&tracker, "2026", "writing", Month::Jan, 2).unwrap();
        assert_eq!(removed, vec!["b"]);
        let table = read_entries(&tracker, "2026", "writing", Month::Jan).unwrap();
        assert_eq!(table.row(2), Some(&["c".to_string()][..]));

        for bad in [0, 3] {
            assert!(matches!(
                delete_month_row(&tracker, "2026", "writing", Month::Jan, bad),
                Err(StoreError::OutOfRange(_))
            ));
        }
    }
}
