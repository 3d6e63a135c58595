use serde::Serialize;

use crate::model::month::Month;
use crate::model::table::Table;
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::ops::navigate::{Listing, MonthEntries};
use crate::ops::search::EntryHit;
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

/// Cells wider than this are cut with `…` in table renderings
const MAX_CELL_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CreatedJson<'a> {
    pub created: &'a str,
    pub path: String,
}

#[derive(Serialize)]
pub struct DeletedJson<'a> {
    pub deleted: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct SearchHitJson<'a> {
    pub year: &'a str,
    pub task: &'a str,
    pub month: Month,
    pub row: usize,
    pub column: &'a str,
    pub value: &'a str,
}

pub fn hit_to_json(hit: &EntryHit) -> SearchHitJson<'_> {
    SearchHitJson {
        year: &hit.year,
        task: &hit.task,
        month: hit.month,
        row: hit.row,
        column: &hit.column,
        value: &hit.value,
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Labels as a 1-indexed list
pub fn format_listing(listing: &Listing) -> Vec<String> {
    let width = listing.labels.len().to_string().len();
    listing
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("{:>width$}  {}", i + 1, label, width = width))
        .collect()
}

/// Render a table with a 1-based row number column, each column padded to
/// its widest cell.
pub fn format_table(table: &Table) -> Vec<String> {
    let cell = |s: &str| truncate_to_width(s, MAX_CELL_WIDTH);
    let header: Vec<String> = table.header.iter().map(|h| cell(h.as_str())).collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| r.iter().map(|c| cell(c.as_str())).collect())
        .collect();

    let num_width = table.len().to_string().len();
    let mut widths: Vec<usize> = header.iter().map(|h| display_width(h)).collect();
    for row in &rows {
        for (i, c) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(display_width(c));
            }
        }
    }

    let render = |num: &str, cells: &[String]| {
        let mut line = format!("{:>width$}", num, width = num_width);
        for (c, w) in cells.iter().zip(&widths) {
            line.push_str("  ");
            line.push_str(&pad_to_width(c, *w));
        }
        line.trim_end().to_string()
    };

    let mut lines = vec![render("", header.as_slice())];
    for (i, row) in rows.iter().enumerate() {
        lines.push(render(&(i + 1).to_string(), row.as_slice()));
    }
    lines
}

/// A month's entries under a `year/task/Month` title line
pub fn format_month_entries(view: &MonthEntries) -> Vec<String> {
    let mut lines = vec![format!("{}/{}/{}", view.year, view.task, view.month)];
    if view.table.is_empty() {
        lines.push(format!("  (no entries; columns: {})", format_columns(view)));
    } else {
        lines.extend(format_table(&view.table).into_iter().map(|l| format!("  {}", l)));
    }
    lines
}

fn format_columns(view: &MonthEntries) -> String {
    view.columns
        .iter()
        .map(|c| format!("{}:{}", c.name, c.kind))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_hit(hit: &EntryHit) -> String {
    format!(
        "{}/{}/{} row {} [{}] {}",
        hit.year, hit.task, hit.month, hit.row, hit.column, hit.value
    )
}

pub fn format_check(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        for err in &result.errors {
            lines.push(format!("  {}", describe_error(err)));
        }
    }
    if !result.warnings.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Warnings:".to_string());
        for warn in &result.warnings {
            lines.push(format!("  {}", describe_warning(warn)));
        }
    }
    lines.push(if result.valid {
        "✓ records are consistent".to_string()
    } else {
        "✗ records have errors".to_string()
    });
    lines
}

fn describe_error(err: &CheckError) -> String {
    match err {
        CheckError::DanglingLabel { registry, label } => {
            format!("{} lists \"{}\" but it does not exist", registry, label)
        }
        CheckError::Orphan { path } => format!("{} is not registered", path),
        CheckError::DuplicateLabel { registry, label } => {
            format!("{} lists \"{}\" more than once", registry, label)
        }
        CheckError::Unreadable { path, reason } => format!("{}: {}", path, reason),
        CheckError::SchemaMismatch {
            path,
            header,
            schema,
        } => format!(
            "{} has columns [{}] but columns.csv records [{}]",
            path,
            header.join(", "),
            schema.join(", ")
        ),
    }
}

fn describe_warning(warn: &CheckWarning) -> String {
    match warn {
        CheckWarning::UnknownMonth { registry, label } => {
            format!("{} lists \"{}\", which is not a month", registry, label)
        }
        CheckWarning::UntypedMonth { path } => {
            format!("{} has no column kinds; every column accepts any text", path)
        }
        CheckWarning::RecoveryLog { entries } => {
            format!("{} entries in .recovery.log need review", entries)
        }
    }
}
