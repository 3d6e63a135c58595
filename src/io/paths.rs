use std::path::{Path, PathBuf};

use crate::model::month::Month;

pub const YEARS_FILE: &str = "years.csv";
pub const TASKS_FILE: &str = "tasks.csv";
pub const TASKS_REPORT_FILE: &str = "tasks_report.csv";
pub const MONTHS_FILE: &str = "months.csv";
pub const TASK_REPORT_FILE: &str = "task_report.csv";
pub const COLUMNS_FILE: &str = "columns.csv";

pub const YEARS_HEADER: [&str; 1] = ["years"];
pub const TASKS_HEADER: [&str; 1] = ["tasks"];
pub const TASKS_REPORT_HEADER: [&str; 5] = ["task", "months", "days", "hours", "minutes"];
pub const MONTHS_HEADER: [&str; 1] = ["months"];
pub const TASK_REPORT_HEADER: [&str; 4] = ["month", "days", "hours", "minutes"];
pub const COLUMNS_HEADER: [&str; 3] = ["month", "column", "kind"];

/// Maps coordinates to paths inside one base directory.
///
/// Pure: no method touches the filesystem. Layout on disk:
///
/// ```text
/// <base>/years.csv
/// <base>/<year>/tasks.csv
/// <base>/<year>/tasks_report.csv
/// <base>/<year>/<task>/months.csv
/// <base>/<year>/<task>/task_report.csv
/// <base>/<year>/<task>/columns.csv
/// <base>/<year>/<task>/<Month>.csv
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Layout<'a> {
    base: &'a Path,
}

impl<'a> Layout<'a> {
    pub fn new(base: &'a Path) -> Self {
        Layout { base }
    }

    pub fn base(&self) -> &Path {
        self.base
    }

    pub fn years_registry(&self) -> PathBuf {
        self.base.join(YEARS_FILE)
    }

    pub fn year_dir(&self, year: &str) -> PathBuf {
        self.base.join(year)
    }

    pub fn task_registry(&self, year: &str) -> PathBuf {
        self.year_dir(year).join(TASKS_FILE)
    }

    pub fn tasks_report(&self, year: &str) -> PathBuf {
        self.year_dir(year).join(TASKS_REPORT_FILE)
    }

    pub fn task_dir(&self, year: &str, task: &str) -> PathBuf {
        self.year_dir(year).join(task)
    }

    pub fn month_registry(&self, year: &str, task: &str) -> PathBuf {
        self.task_dir(year, task).join(MONTHS_FILE)
    }

    pub fn task_report(&self, year: &str, task: &str) -> PathBuf {
        self.task_dir(year, task).join(TASK_REPORT_FILE)
    }

    pub fn column_schema(&self, year: &str, task: &str) -> PathBuf {
        self.task_dir(year, task).join(COLUMNS_FILE)
    }

    pub fn month_file(&self, year: &str, task: &str, month: Month) -> PathBuf {
        self.task_dir(year, task).join(month.file_name())
    }
}

/// True if `name` is one of the fixed bookkeeping files of a task
/// directory (i.e. not a month file).
pub fn is_task_bookkeeping_file(name: &str) -> bool {
    matches!(name, MONTHS_FILE | TASK_REPORT_FILE | COLUMNS_FILE)
}
