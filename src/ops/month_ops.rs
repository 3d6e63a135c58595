use serde::Serialize;

use crate::io::paths::COLUMNS_HEADER;
use crate::io::table_io::{self, TableError};
use crate::model::column::{Column, ColumnKind};
use crate::model::month::Month;
use crate::model::table::Table;
use crate::model::tracker::Tracker;
use crate::ops::error::StoreError;
use crate::ops::registry::{self, require_month, require_task};
use crate::ops::txn::Transaction;
use crate::ops::validate::parse_header;

/// Outcome of `add_month`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AddMonth {
    Created {
        month: Month,
        columns: Vec<Column>,
        /// Month the header was copied from; `None` for a task's first month
        inherited_from: Option<Month>,
        /// A header was supplied but the task already had one
        ignored_header: bool,
    },
    /// The task has no months yet and no header was given. Nothing was
    /// written; retry with a header.
    NeedsHeader { month: Month },
}

pub fn parse_month(label: &str) -> Result<Month, StoreError> {
    if label.trim().is_empty() {
        return Err(StoreError::EmptyInput("month".to_string()));
    }
    label.parse().map_err(StoreError::InvalidFormat)
}

/// Registered months of a task, in insertion order. Labels that are not
/// month names (hand edits) are skipped.
pub fn list_months(tracker: &Tracker, year: &str, task: &str) -> Result<Vec<Month>, StoreError> {
    require_task(tracker, year, task)?;
    let labels = registry::labels(&tracker.layout().month_registry(year, task))?;
    Ok(labels
        .iter()
        .filter_map(|label| {
            let month = Month::parse_label(label);
            if month.is_none() {
                tracing::warn!(year, task, label = %label, "skipping unknown month label");
            }
            month
        })
        .collect())
}

/// The most recently registered month of a task.
pub fn latest_month(tracker: &Tracker, year: &str, task: &str) -> Result<Option<Month>, StoreError> {
    Ok(list_months(tracker, year, task)?.last().copied())
}

/// Header of a month file paired with each column's declared kind.
/// Columns with no schema row are `Text`.
pub fn month_columns(
    tracker: &Tracker,
    year: &str,
    task: &str,
    month: Month,
) -> Result<Vec<Column>, StoreError> {
    let layout = tracker.layout();
    let header = table_io::read_header(&layout.month_file(year, task, month))?;
    let schema = read_schema(&layout.column_schema(year, task))?;

    Ok(header
        .into_iter()
        .map(|name| {
            let kind = schema
                .rows
                .iter()
                .find(|r| r.first().map(String::as_str) == Some(month.as_str()) && r.get(1) == Some(&name))
                .and_then(|r| r.get(2))
                .and_then(|tag| ColumnKind::parse_tag(tag))
                .unwrap_or_default();
            Column::new(name, kind)
        })
        .collect())
}

/// A missing schema file reads as an empty schema.
fn read_schema(path: &std::path::Path) -> Result<Table, StoreError> {
    match table_io::read_table(path) {
        Ok(t) => Ok(t),
        Err(TableError::NotFound { .. }) => Ok(Table::new(COLUMNS_HEADER)),
        Err(e) => Err(e.into()),
    }
}

/// Register a month for a task and create its entry file.
///
/// The first month of a task takes its columns from `header`; when no
/// header is given, nothing is written and `AddMonth::NeedsHeader` is
/// returned. Later months copy the columns of the last registered month.
pub fn add_month(
    tracker: &Tracker,
    year: &str,
    task: &str,
    month_label: &str,
    header: Option<&str>,
) -> Result<AddMonth, StoreError> {
    let month = parse_month(month_label)?;

    let _lock = tracker.lock()?;
    require_task(tracker, year, task)?;

    let layout = tracker.layout();
    let months = layout.month_registry(year, task);
    let registered = table_io::read_table(&months)?;
    if registered.contains_cell(month.as_str()) {
        return Err(StoreError::AlreadyExists(format!(
            "month {} in task \"{}\" ({})",
            month, task, year
        )));
    }

    let (columns, inherited_from) = match registered.last_key() {
        Some(last) => {
            let source = Month::parse_label(last).ok_or_else(|| {
                StoreError::InvalidFormat(format!(
                    "last registered month \"{}\" of task \"{}\" is not a month name",
                    last, task
                ))
            })?;
            (month_columns(tracker, year, task, source)?, Some(source))
        }
        None => match header {
            Some(input) => (parse_header(input)?, None),
            None => return Ok(AddMonth::NeedsHeader { month }),
        },
    };
    let ignored_header = inherited_from.is_some() && header.is_some();

    let schema_path = layout.column_schema(year, task);
    let mut txn = Transaction::begin(
        &tracker.root,
        format!("add month {}/{}/{}", year, task, month),
    );
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    txn.create_table(&layout.month_file(year, task, month), &names)?;
    txn.ensure_table(&schema_path, &COLUMNS_HEADER)?;
    let mut schema = read_schema(&schema_path)?.without_key(month.as_str());
    schema.rows.extend(columns.iter().map(|c| {
        vec![
            month.as_str().to_string(),
            c.name.clone(),
            c.kind.tag().to_string(),
        ]
    }));
    txn.rewrite_table(&schema_path, &schema)?;
    txn.append_row(&months, &[month.as_str()])?;
    txn.commit();

    Ok(AddMonth::Created {
        month,
        columns,
        inherited_from,
        ignored_header,
    })
}

/// Remove a month from its task: registry row first, then its schema
/// rows, then the entry file. Irreversible.
pub fn delete_month(tracker: &Tracker, year: &str, task: &str, month: Month) -> Result<(), StoreError> {
    let _lock = tracker.lock()?;
    require_month(tracker, year, task, month)?;

    let layout = tracker.layout();
    let months = layout.month_registry(year, task);
    let registered = table_io::read_table(&months)?;
    let schema_path = layout.column_schema(year, task);

    let mut txn = Transaction::begin(
        &tracker.root,
        format!("delete month {}/{}/{}", year, task, month),
    );
    txn.rewrite_table(&months, &registered.without_key(month.as_str()))?;
    if schema_path.exists() {
        let schema = read_schema(&schema_path)?;
        txn.rewrite_table(&schema_path, &schema.without_key(month.as_str()))?;
    }
    txn.remove_file(&layout.month_file(year, task, month))?;
    txn.commit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::task_ops::add_task;
    use crate::ops::test_helpers::{temp_tracker, tracker_with_month};
    use crate::ops::year_ops::add_year;

    fn tracker_with_task() -> (tempfile::TempDir, Tracker) {
        let (tmp, tracker) = temp_tracker();
        add_year(&tracker, "2026").unwrap();
        add_task(&tracker, "2026", "writing").unwrap();
        (tmp, tracker)
    }

    #[test]
    fn test_first_month_without_header_needs_input() {
        let (_tmp, tracker) = tracker_with_task();
        let result = add_month(&tracker, "2026", "writing", "jan", None).unwrap();
        assert_eq!(result, AddMonth::NeedsHeader { month: Month::Jan });
        assert!(list_months(&tracker, "2026", "writing").unwrap().is_empty());
        assert!(!tracker.layout().month_file("2026", "writing", Month::Jan).exists());
    }

    #[test]
    fn test_first_month_takes_header() {
        let (_tmp, tracker) = tracker_with_task();
        let result = add_month(&tracker, "2026", "writing", " JAN ", Some("Pages:int, hours:time, note")).unwrap();
        match result {
            AddMonth::Created {
                month,
                columns,
                inherited_from,
                ignored_header,
            } => {
                assert_eq!(month, Month::Jan);
                assert_eq!(
                    columns,
                    vec![
                        Column::new("pages", ColumnKind::Integer),
                        Column::new("hours", ColumnKind::Duration),
                        Column::text("note"),
                    ]
                );
                assert_eq!(inherited_from, None);
                assert!(!ignored_header);
            }
            other => panic!("unexpected {:?}", other),
        }

        let layout = tracker.layout();
        assert_eq!(
            std::fs::read_to_string(layout.month_file("2026", "writing", Month::Jan)).unwrap(),
            "pages,hours,note\n"
        );
        assert_eq!(
            std::fs::read_to_string(layout.column_schema("2026", "writing")).unwrap(),
            "month,column,kind\nJan,pages,int\nJan,hours,time\nJan,note,text\n"
        );
        assert_eq!(list_months(&tracker, "2026", "writing").unwrap(), vec![Month::Jan]);
    }

    #[test]
    fn test_later_months_inherit_header_and_kinds() {
        let (_tmp, tracker) = tracker_with_month("pages:int,note");
        let result = add_month(&tracker, "2026", "writing", "Feb", Some("ignored")).unwrap();
        assert!(matches!(
            result,
            AddMonth::Created {
                inherited_from: Some(Month::Jan),
                ignored_header: true,
                ..
            }
        ));
        assert_eq!(
            month_columns(&tracker, "2026", "writing", Month::Feb).unwrap(),
            vec![Column::new("pages", ColumnKind::Integer), Column::text("note")]
        );
        assert_eq!(
            std::fs::read_to_string(tracker.layout().month_file("2026", "writing", Month::Feb)).unwrap(),
            "pages,note\n"
        );
        assert_eq!(latest_month(&tracker, "2026", "writing").unwrap(), Some(Month::Feb));
    }

    #[test]
    fn test_add_month_rejections() {
        let (_tmp, tracker) = tracker_with_month("note");
        assert!(matches!(
            add_month(&tracker, "2026", "writing", "Janu", None),
            Err(StoreError::InvalidFormat(_))
        ));
        assert!(matches!(
            add_month(&tracker, "2026", "writing", "jan", None),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            add_month(&tracker, "2026", "reading", "Feb", None),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            add_month(&tracker, "2026", "writing", "", None),
            Err(StoreError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_bad_header_writes_nothing() {
        let (_tmp, tracker) = tracker_with_task();
        assert!(matches!(
            add_month(&tracker, "2026", "writing", "Jan", Some("pages2")),
            Err(StoreError::InvalidFormat(_))
        ));
        assert!(!tracker.layout().month_file("2026", "writing", Month::Jan).exists());
        assert!(list_months(&tracker, "2026", "writing").unwrap().is_empty());
    }

    #[test]
    fn test_orphan_month_file_rolls_back() {
        let (_tmp, tracker) = tracker_with_task();
        let orphan = tracker.layout().month_file("2026", "writing", Month::Mar);
        std::fs::write(&orphan, "x\n").unwrap();

        assert!(matches!(
            add_month(&tracker, "2026", "writing", "Mar", Some("note")),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(std::fs::read_to_string(&orphan).unwrap(), "x\n");
        assert!(list_months(&tracker, "2026", "writing").unwrap().is_empty());
    }

    #[test]
    fn test_month_without_schema_rows_is_text() {
        let (_tmp, tracker) = tracker_with_month("pages:int");
        std::fs::write(
            tracker.layout().column_schema("2026", "writing"),
            "month,column,kind\n",
        )
        .unwrap();
        assert_eq!(
            month_columns(&tracker, "2026", "writing", Month::Jan).unwrap(),
            vec![Column::text("pages")]
        );
    }

    #[test]
    fn test_delete_month() {
        let (_tmp, tracker) = tracker_with_month("note");
        add_month(&tracker, "2026", "writing", "Feb", None).unwrap();

        delete_month(&tracker, "2026", "writing", Month::Jan).unwrap();
        let layout = tracker.layout();
        assert_eq!(list_months(&tracker, "2026", "writing").unwrap(), vec![Month::Feb]);
        assert!(!layout.month_file("2026", "writing", Month::Jan).exists());
        assert_eq!(
            std::fs::read_to_string(layout.column_schema("2026", "writing")).unwrap(),
            "month,column,kind\nFeb,note,text\n"
        );
        assert!(matches!(
            delete_month(&tracker, "2026", "writing", Month::Jan),
            Err(StoreError::NotFound(_))
        ));
    }
}
