use crate::io::paths::{TASKS_HEADER, TASKS_REPORT_HEADER};
use crate::io::table_io;
use crate::model::tracker::Tracker;
use crate::ops::error::StoreError;
use crate::ops::registry::{self, ensure_path_component};
use crate::ops::txn::Transaction;

/// Registered years, in insertion order.
pub fn list_years(tracker: &Tracker) -> Result<Vec<String>, StoreError> {
    registry::labels(&tracker.layout().years_registry())
}

/// The most recently registered year, the default scope for commands that
/// are not given one.
pub fn latest_year(tracker: &Tracker) -> Result<Option<String>, StoreError> {
    let table = table_io::read_table(&tracker.layout().years_registry())?;
    Ok(table.last_key().map(str::to_string))
}

/// The smallest year `add_year` will accept: one past the last registered
/// year, or the configured default while the registry is empty.
pub fn suggested_year(tracker: &Tracker) -> Result<u64, StoreError> {
    let fallback = u64::from(tracker.config.default_year);
    let last = latest_year(tracker)?;
    Ok(match last.as_deref().map(str::parse::<u64>) {
        Some(Ok(year)) => year
            .checked_add(1)
            .ok_or_else(|| StoreError::OutOfRange(format!("no year after {}", year)))?,
        Some(Err(_)) => {
            tracing::warn!(last = ?last, "last registered year is not numeric");
            fallback
        }
        None => fallback,
    })
}

/// Register a new year and create its directory with an empty task
/// registry and task report. Returns the stored label.
pub fn add_year(tracker: &Tracker, label: &str) -> Result<String, StoreError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(StoreError::EmptyInput("year".to_string()));
    }
    if !label.chars().all(|c| c.is_ascii_digit()) {
        return Err(StoreError::InvalidFormat(format!(
            "year \"{}\" must contain only digits",
            label
        )));
    }
    let value: u64 = label
        .parse()
        .ok()
        .filter(|v| *v < u64::MAX)
        .ok_or_else(|| StoreError::OutOfRange(format!("year {} is too large", label)))?;
    let label = value.to_string();

    let _lock = tracker.lock()?;
    let suggested = suggested_year(tracker)?;
    if value < suggested {
        return Err(StoreError::OutOfRange(format!(
            "year {} is before the next year {}",
            label, suggested
        )));
    }

    let layout = tracker.layout();
    let years = layout.years_registry();
    if registry::exists(&years, &label)? {
        return Err(StoreError::AlreadyExists(format!("year {}", label)));
    }

    let mut txn = Transaction::begin(&tracker.root, format!("add year {}", label));
    txn.create_dir(&layout.year_dir(&label))?;
    txn.ensure_table(&layout.task_registry(&label), &TASKS_HEADER)?;
    txn.ensure_table(&layout.tasks_report(&label), &TASKS_REPORT_HEADER)?;
    txn.append_row(&years, &[label.as_str()])?;
    txn.commit();

    Ok(label)
}

/// Remove a year from the registry and delete its whole directory tree.
/// Irreversible.
pub fn delete_year(tracker: &Tracker, label: &str) -> Result<(), StoreError> {
    let label = label.trim();
    let _lock = tracker.lock()?;

    let layout = tracker.layout();
    let years = layout.years_registry();
    let table = table_io::read_table(&years)?;
    if !table.contains_cell(label) {
        return Err(StoreError::NotFound(format!("year {}", label)));
    }
    ensure_path_component(label)?;

    let mut txn = Transaction::begin(&tracker.root, format!("delete year {}", label));
    txn.rewrite_table(&years, &table.without_key(label))?;
    txn.remove_dir_all(&layout.year_dir(label))?;
    txn.commit();
    Ok(())
}
