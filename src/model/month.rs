use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the twelve month labels a task can register.
///
/// Each label can be used at most once per task; the label doubles as the
/// month file's stem (`Jan.csv`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Capitalized label as stored in `months.csv`
    pub fn as_str(self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    /// Parse a month label, ignoring case and surrounding whitespace.
    /// `"jan"`, `"JAN"` and `" Jan "` all yield `Month::Jan`.
    pub fn parse_label(s: &str) -> Option<Month> {
        let s = s.trim();
        Month::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    /// File name of this month's entry table
    pub fn file_name(self) -> String {
        format!("{}.csv", self.as_str())
    }

    /// The month list as shown in prompts: `Jan __ Feb __ ...`
    pub fn prompt_list() -> String {
        Month::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(" __ ")
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::parse_label(s).ok_or_else(|| {
            format!(
                "unknown month \"{}\" (expected one of {})",
                s.trim(),
                Month::prompt_list()
            )
        })
    }
}
