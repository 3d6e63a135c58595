use tempfile::TempDir;

use crate::io::tracker_io::open_tracker;
use crate::model::config::TallyConfig;
use crate::model::tracker::Tracker;
use crate::ops::{month_ops, task_ops, year_ops};

/// A bootstrapped tracker in a fresh temp directory.
pub fn temp_tracker() -> (TempDir, Tracker) {
    let tmp = TempDir::new().unwrap();
    let tracker = open_tracker(TallyConfig::default(), Some(&tmp.path().join("TaskData"))).unwrap();
    (tmp, tracker)
}

/// A tracker with year 2026, task "writing", and Jan created with the given header.
pub fn tracker_with_month(header: &str) -> (TempDir, Tracker) {
    let (tmp, tracker) = temp_tracker();
    year_ops::add_year(&tracker, "2026").unwrap();
    task_ops::add_task(&tracker, "2026", "writing").unwrap();
    month_ops::add_month(&tracker, "2026", "writing", "Jan", Some(header)).unwrap();
    (tmp, tracker)
}
