//! Read-only drill-down: years, then a year's tasks, then a task's months,
//! then one month's entries (or all of them at once).

use serde::Serialize;

use crate::model::column::Column;
use crate::model::month::Month;
use crate::model::table::Table;
use crate::model::tracker::Tracker;
use crate::ops::entry_ops::read_entries;
use crate::ops::error::StoreError;
use crate::ops::month_ops::{list_months, month_columns};
use crate::ops::task_ops::list_tasks;
use crate::ops::year_ops::list_years;

/// Labels one level down from a coordinate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    /// The coordinate being listed, e.g. `2026/writing`; empty at the root
    pub scope: String,
    pub labels: Vec<String>,
}

/// One month's entries together with its column kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthEntries {
    pub year: String,
    pub task: String,
    pub month: Month,
    pub columns: Vec<Column>,
    #[serde(flatten)]
    pub table: Table,
}

/// Every month of a task, in registry order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOverview {
    pub year: String,
    pub task: String,
    pub months: Vec<MonthEntries>,
}

pub fn year_view(tracker: &Tracker) -> Result<Listing, StoreError> {
    Ok(Listing {
        scope: String::new(),
        labels: list_years(tracker)?,
    })
}

pub fn task_view(tracker: &Tracker, year: &str) -> Result<Listing, StoreError> {
    Ok(Listing {
        scope: year.to_string(),
        labels: list_tasks(tracker, year)?,
    })
}

pub fn month_view(tracker: &Tracker, year: &str, task: &str) -> Result<Listing, StoreError> {
    Ok(Listing {
        scope: format!("{}/{}", year, task),
        labels: list_months(tracker, year, task)?
            .into_iter()
            .map(|m| m.as_str().to_string())
            .collect(),
    })
}

pub fn entries_view(
    tracker: &Tracker,
    year: &str,
    task: &str,
    month: Month,
) -> Result<MonthEntries, StoreError> {
    let table = read_entries(tracker, year, task, month)?;
    let columns = month_columns(tracker, year, task, month)?;
    Ok(MonthEntries {
        year: year.to_string(),
        task: task.to_string(),
        month,
        columns,
        table,
    })
}

/// All months of a task with their entries. A task with no registered
/// month cannot be drilled into.
pub fn task_overview(tracker: &Tracker, year: &str, task: &str) -> Result<TaskOverview, StoreError> {
    let months = list_months(tracker, year, task)?;
    if months.is_empty() {
        return Err(StoreError::NotFound(format!(
            "any month in task \"{}\" ({})",
            task, year
        )));
    }

    let months = months
        .into_iter()
        .map(|m| entries_view(tracker, year, task, m))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TaskOverview {
        year: year.to_string(),
        task: task.to_string(),
        months,
    })
}
