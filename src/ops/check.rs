use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::io::paths::{TASKS_FILE, TASKS_REPORT_FILE, YEARS_FILE, is_task_bookkeeping_file};
use crate::io::recovery::recovery_entry_count;
use crate::io::table_io::{self, TableError};
use crate::model::month::Month;
use crate::model::table::Table;
use crate::model::tracker::Tracker;

/// Structured result from `tally check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// Registry and tree out of step (something that should be fixed).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// A registry row whose directory or month file is missing
    #[serde(rename = "dangling_label")]
    DanglingLabel { registry: String, label: String },
    /// A directory or month file no registry row points at
    #[serde(rename = "orphan")]
    Orphan { path: String },
    /// The same label registered more than once
    #[serde(rename = "duplicate_label")]
    DuplicateLabel { registry: String, label: String },
    /// A registry or month file that is missing or does not parse
    #[serde(rename = "unreadable")]
    Unreadable { path: String, reason: String },
    /// A month file whose header disagrees with its recorded columns
    #[serde(rename = "schema_mismatch")]
    SchemaMismatch {
        path: String,
        header: Vec<String>,
        schema: Vec<String>,
    },
}

/// Non-critical findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// A months.csv row that is not a month name
    #[serde(rename = "unknown_month")]
    UnknownMonth { registry: String, label: String },
    /// A month with no column kinds recorded; all columns accept any text
    #[serde(rename = "untyped_month")]
    UntypedMonth { path: String },
    /// The recovery log has entries waiting for review
    #[serde(rename = "recovery_log")]
    RecoveryLog { entries: usize },
}

/// Walk the whole tree and report where registries and the filesystem
/// disagree. Read-only.
pub fn check_tracker(tracker: &Tracker) -> CheckResult {
    let mut result = CheckResult::default();
    let layout = tracker.layout();

    let entries = recovery_entry_count(&tracker.root);
    if entries > 0 {
        result.warnings.push(CheckWarning::RecoveryLog { entries });
    }

    let years_path = layout.years_registry();
    if let Some(years) = read_registry(&years_path, &mut result) {
        check_children(&tracker.root, &years, &[YEARS_FILE], &years_path, &mut result);
        for year in unique_labels(&years) {
            if layout.year_dir(&year).is_dir() {
                check_year(tracker, &year, &mut result);
            }
        }
    }

    result.valid = result.errors.is_empty();
    result
}

fn check_year(tracker: &Tracker, year: &str, result: &mut CheckResult) {
    let layout = tracker.layout();
    let tasks_path = layout.task_registry(year);
    let Some(tasks) = read_registry(&tasks_path, result) else {
        return;
    };
    check_children(
        &layout.year_dir(year),
        &tasks,
        &[TASKS_FILE, TASKS_REPORT_FILE],
        &tasks_path,
        result,
    );
    for task in unique_labels(&tasks) {
        if layout.task_dir(year, &task).is_dir() {
            check_task(tracker, year, &task, result);
        }
    }
}

fn check_task(tracker: &Tracker, year: &str, task: &str, result: &mut CheckResult) {
    let layout = tracker.layout();
    let months_path = layout.month_registry(year, task);
    let Some(months) = read_registry(&months_path, result) else {
        return;
    };
    report_duplicates(&months, &months_path, result);

    let mut registered = HashSet::new();
    for label in months.keys() {
        match Month::parse_label(&label) {
            Some(month) => {
                registered.insert(month);
            }
            None => result.warnings.push(CheckWarning::UnknownMonth {
                registry: months_path.display().to_string(),
                label,
            }),
        }
    }

    let schema = match table_io::read_table(&layout.column_schema(year, task)) {
        Ok(t) => t,
        Err(TableError::NotFound { .. }) => Table::default(),
        Err(e) => {
            result.errors.push(CheckError::Unreadable {
                path: layout.column_schema(year, task).display().to_string(),
                reason: e.to_string(),
            });
            Table::default()
        }
    };

    for month in Month::ALL {
        let path = layout.month_file(year, task, month);
        match (registered.contains(&month), path.is_file()) {
            (true, true) => check_month_header(&path, month, &schema, result),
            (true, false) => result.errors.push(CheckError::DanglingLabel {
                registry: months_path.display().to_string(),
                label: month.as_str().to_string(),
            }),
            (false, true) => result.errors.push(CheckError::Orphan {
                path: path.display().to_string(),
            }),
            (false, false) => {}
        }
    }

    // Anything else in a task directory is neither a month nor bookkeeping.
    if let Ok(entries) = fs::read_dir(layout.task_dir(year, task)) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_month_file = name
                .strip_suffix(".csv")
                .and_then(Month::parse_label)
                .is_some_and(|m| m.file_name() == name);
            if name.starts_with('.') || is_month_file || is_task_bookkeeping_file(&name) {
                continue;
            }
            result.errors.push(CheckError::Orphan {
                path: entry.path().display().to_string(),
            });
        }
    }
}

fn check_month_header(path: &Path, month: Month, schema: &Table, result: &mut CheckResult) {
    let header = match table_io::read_table(path) {
        Ok(t) => t.header,
        Err(e) => {
            result.errors.push(CheckError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
            return;
        }
    };
    let recorded: Vec<String> = schema
        .rows
        .iter()
        .filter(|r| r.first().map(String::as_str) == Some(month.as_str()))
        .filter_map(|r| r.get(1).cloned())
        .collect();

    if recorded.is_empty() {
        result.warnings.push(CheckWarning::UntypedMonth {
            path: path.display().to_string(),
        });
    } else if recorded != header {
        result.errors.push(CheckError::SchemaMismatch {
            path: path.display().to_string(),
            header,
            schema: recorded,
        });
    }
}

fn read_registry(path: &Path, result: &mut CheckResult) -> Option<Table> {
    match table_io::read_table(path) {
        Ok(t) => Some(t),
        Err(e) => {
            result.errors.push(CheckError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

/// Compare a registry against the subdirectories of `dir`. Files named in
/// `own_files` and hidden entries are expected and skipped.
fn check_children(
    dir: &Path,
    registry: &Table,
    own_files: &[&str],
    registry_path: &Path,
    result: &mut CheckResult,
) {
    report_duplicates(registry, registry_path, result);
    let labels: HashSet<String> = registry.keys().into_iter().collect();

    for label in unique_labels(registry) {
        if !dir.join(&label).is_dir() {
            result.errors.push(CheckError::DanglingLabel {
                registry: registry_path.display().to_string(),
                label,
            });
        }
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || own_files.contains(&name.as_str()) || labels.contains(&name) {
            continue;
        }
        result.errors.push(CheckError::Orphan {
            path: entry.path().display().to_string(),
        });
    }
}

fn report_duplicates(registry: &Table, registry_path: &Path, result: &mut CheckResult) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for label in registry.keys() {
        if !seen.insert(label.clone()) && reported.insert(label.clone()) {
            result.errors.push(CheckError::DuplicateLabel {
                registry: registry_path.display().to_string(),
                label,
            });
        }
    }
}

/// Registry labels with duplicates removed, first occurrence kept.
fn unique_labels(registry: &Table) -> Vec<String> {
    let mut seen = HashSet::new();
    registry
        .keys()
        .into_iter()
        .filter(|l| seen.insert(l.clone()))
        .collect()
}
