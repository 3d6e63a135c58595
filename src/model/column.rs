use std::fmt;

use serde::{Deserialize, Serialize};

/// Validator class a column's values are checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Digits plus `.`, space and `-`
    #[serde(rename = "int")]
    Integer,
    /// Digits and `:` (e.g. `2:30`)
    #[serde(rename = "time")]
    Duration,
    /// Alphanumerics plus space, `_`, `@` and `.`
    Label,
    /// Any non-empty value
    #[default]
    Text,
}

impl ColumnKind {
    /// Tag used in header input and in `columns.csv`
    pub fn tag(self) -> &'static str {
        match self {
            ColumnKind::Integer => "int",
            ColumnKind::Duration => "time",
            ColumnKind::Label => "label",
            ColumnKind::Text => "text",
        }
    }

    pub fn parse_tag(s: &str) -> Option<ColumnKind> {
        match s.trim().to_lowercase().as_str() {
            "int" | "integer" => Some(ColumnKind::Integer),
            "time" | "duration" => Some(ColumnKind::Duration),
            "label" | "str" => Some(ColumnKind::Label),
            "text" => Some(ColumnKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One column of a month file: its header label and declared kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Column::new(name, ColumnKind::Text)
    }
}
