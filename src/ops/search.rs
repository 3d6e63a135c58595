use std::ops::Range;

use regex::Regex;
use serde::Serialize;

use crate::io::table_io;
use crate::model::month::Month;
use crate::model::tracker::Tracker;
use crate::ops::error::StoreError;
use crate::ops::month_ops::list_months;
use crate::ops::task_ops::list_tasks;
use crate::ops::year_ops::list_years;

/// One matching cell, with its full coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryHit {
    pub year: String,
    pub task: String,
    pub month: Month,
    /// 1-based row number
    pub row: usize,
    pub column: String,
    pub value: String,
    #[serde(skip)]
    pub spans: Vec<Range<usize>>,
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search every entry cell of every registered month.
///
/// If `year_filter` is `Some`, only that year is searched. Unreadable
/// task registries, month registries and month files are skipped with a
/// warning so one bad file does not hide the rest of the tree.
pub fn search_entries(
    tracker: &Tracker,
    re: &Regex,
    year_filter: Option<&str>,
) -> Result<Vec<EntryHit>, StoreError> {
    let years = match year_filter {
        Some(year) => {
            crate::ops::registry::require_year(tracker, year)?;
            vec![year.to_string()]
        }
        None => list_years(tracker)?,
    };

    let layout = tracker.layout();
    let mut hits = Vec::new();
    for year in &years {
        let tasks = match list_tasks(tracker, year) {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(year = %year, error = %e, "skipping year");
                continue;
            }
        };
        for task in tasks {
            let months = match list_months(tracker, year, &task) {
                Ok(months) => months,
                Err(e) => {
                    tracing::warn!(year = %year, task = %task, error = %e, "skipping task");
                    continue;
                }
            };
            for month in months {
                let path = layout.month_file(year, &task, month);
                let table = match table_io::read_table(&path) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping month file");
                        continue;
                    }
                };
                for (i, row) in table.rows.iter().enumerate() {
                    for (column, value) in table.header.iter().zip(row) {
                        let spans = find_matches(re, value);
                        if spans.is_empty() {
                            continue;
                        }
                        hits.push(EntryHit {
                            year: year.clone(),
                            task: task.clone(),
                            month,
                            row: i + 1,
                            column: column.clone(),
                            value: value.clone(),
                            spans,
                        });
                    }
                }
            }
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::entry_ops::add_entry;
    use crate::ops::month_ops::add_month;
    use crate::ops::task_ops::add_task;
    use crate::ops::test_helpers::tracker_with_month;
    use crate::ops::year_ops::add_year;

    #[test]
    fn test_search_reports_coordinates() {
        let (_tmp, tracker) = tracker_with_month("pages:int,note");
        add_entry(&tracker, "2026", "writing", None, &["4", "draft intro"]).unwrap();
        add_entry(&tracker, "2026", "writing", None, &["6", "edit Draft"]).unwrap();
        add_month(&tracker, "2026", "writing", "Feb", None).unwrap();
        add_entry(&tracker, "2026", "writing", None, &["2", "draft outro"]).unwrap();

        let re = Regex::new("(?i)draft").unwrap();
        let hits = search_entries(&tracker, &re, None).unwrap();
        let coords: Vec<(Month, usize, &str)> = hits
            .iter()
            .map(|h| (h.month, h.row, h.column.as_str()))
            .collect();
        assert_eq!(
            coords,
            vec![
                (Month::Jan, 1, "note"),
                (Month::Jan, 2, "note"),
                (Month::Feb, 1, "note"),
            ]
        );
        assert_eq!(hits[1].spans, vec![5..10]);
    }

    #[test]
    fn test_search_year_filter() {
        let (_tmp, tracker) = tracker_with_month("note");
        add_entry(&tracker, "2026", "writing", None, &["x"]).unwrap();
        add_year(&tracker, "2027").unwrap();

        let re = Regex::new("x").unwrap();
        assert_eq!(search_entries(&tracker, &re, Some("2026")).unwrap().len(), 1);
        assert!(search_entries(&tracker, &re, Some("2027")).unwrap().is_empty());
        assert!(matches!(
            search_entries(&tracker, &re, Some("1999")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_search_skips_unreadable_registries() {
        let (_tmp, tracker) = tracker_with_month("note");
        add_entry(&tracker, "2026", "writing", None, &["draft"]).unwrap();
        add_task(&tracker, "2026", "reading").unwrap();
        add_month(&tracker, "2026", "reading", "Jan", Some("note")).unwrap();
        add_entry(&tracker, "2026", "reading", None, &["draft notes"]).unwrap();
        std::fs::remove_file(tracker.layout().month_registry("2026", "writing")).unwrap();

        let re = Regex::new("draft").unwrap();
        let hits = search_entries(&tracker, &re, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task, "reading");
        assert_eq!(hits[0].value, "draft notes");
    }
}
